use std::sync::Arc;

/// Helper macro for returning an ad-hoc error.
///
/// Ad-hoc errors are used where no structured kind applies; structured
/// constructors on [`Error`] are preferred everywhere a caller may want to
/// branch on the failure class.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Helper macro for creating an ad-hoc error value.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Backoffice.
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorKind>,
}

#[derive(Debug)]
enum ErrorKind {
    /// The target has no recognizable schema binding; fatal to the request.
    ModelIntrospection { message: String },

    /// An identity could not be resolved to a registered model.
    ModelNotFound { identity: String },

    /// A field name could not be resolved on a known model.
    FieldNotFound { model: String, field: String },

    /// Required back-reference / secondary metadata is missing. Indicates a
    /// model-declaration bug, not a runtime condition.
    RelationshipConfiguration { message: String },

    /// No form converter is registered for a column's storage type.
    UnsupportedFieldType { type_name: String, field: String },

    /// User input failed a cast or form validation. Recoverable; rendered
    /// back to the caller rather than propagated.
    Validation { field: String, message: String },

    /// A row lookup returned no results.
    RecordNotFound { context: String },

    /// The storage driver reported a failure.
    Driver { message: String },

    /// Ad-hoc error raised through `bail!` / `err!`.
    Adhoc { message: String },
}

impl Error {
    pub fn model_introspection(message: impl Into<String>) -> Self {
        ErrorKind::ModelIntrospection {
            message: message.into(),
        }
        .into()
    }

    pub fn model_not_found(identity: impl Into<String>) -> Self {
        ErrorKind::ModelNotFound {
            identity: identity.into(),
        }
        .into()
    }

    pub fn field_not_found(model: impl Into<String>, field: impl Into<String>) -> Self {
        ErrorKind::FieldNotFound {
            model: model.into(),
            field: field.into(),
        }
        .into()
    }

    pub fn relationship_configuration(message: impl Into<String>) -> Self {
        ErrorKind::RelationshipConfiguration {
            message: message.into(),
        }
        .into()
    }

    pub fn unsupported_field_type(
        type_name: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        ErrorKind::UnsupportedFieldType {
            type_name: type_name.into(),
            field: field.into(),
        }
        .into()
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorKind::Validation {
            field: field.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn record_not_found(context: impl Into<String>) -> Self {
        ErrorKind::RecordNotFound {
            context: context.into(),
        }
        .into()
    }

    pub fn driver(message: impl Into<String>) -> Self {
        ErrorKind::Driver {
            message: message.into(),
        }
        .into()
    }

    #[doc(hidden)]
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Self {
        ErrorKind::Adhoc {
            message: args.to_string(),
        }
        .into()
    }

    /// True for identity-resolution failures that map to a 404 when the
    /// identity came from user input.
    pub fn is_model_not_found(&self) -> bool {
        matches!(&*self.inner, ErrorKind::ModelNotFound { .. })
    }

    pub fn is_field_not_found(&self) -> bool {
        matches!(&*self.inner, ErrorKind::FieldNotFound { .. })
    }

    pub fn is_record_not_found(&self) -> bool {
        matches!(&*self.inner, ErrorKind::RecordNotFound { .. })
    }

    pub fn is_relationship_configuration(&self) -> bool {
        matches!(&*self.inner, ErrorKind::RelationshipConfiguration { .. })
    }

    pub fn is_unsupported_field_type(&self) -> bool {
        matches!(&*self.inner, ErrorKind::UnsupportedFieldType { .. })
    }

    /// True for user-input-class errors that are caught at the request
    /// boundary and rendered as inline form errors.
    pub fn is_validation(&self) -> bool {
        matches!(&*self.inner, ErrorKind::Validation { .. })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use self::ErrorKind::*;

        match &*self.inner {
            ModelIntrospection { message } => {
                write!(f, "model introspection failed: {message}")
            }
            ModelNotFound { identity } => write!(f, "model not found: {identity}"),
            FieldNotFound { model, field } => {
                write!(f, "field not found: {model}.{field}")
            }
            RelationshipConfiguration { message } => {
                write!(f, "improperly configured relationship: {message}")
            }
            UnsupportedFieldType { type_name, field } => {
                write!(f, "no form converter registered for `{type_name}` (field `{field}`)")
            }
            Validation { field, message } => write!(f, "invalid value for `{field}`: {message}"),
            RecordNotFound { context } => write!(f, "record not found: {context}"),
            Driver { message } => write!(f, "driver error: {message}"),
            Adhoc { message } => f.write_str(message),
        }
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if f.alternate() {
            f.debug_struct("Error").field("kind", &self.inner).finish()
        } else {
            core::fmt::Display::fmt(self, f)
        }
    }
}
