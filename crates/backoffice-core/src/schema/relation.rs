use super::ModelId;

use std::fmt;
use std::sync::OnceLock;

/// Classification of a relationship between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// A named relationship from one model to another.
///
/// Declared directions are authoritative. Without one, the direction is
/// inferred once from foreign-key naming conventions and memoized; see
/// [`crate::schema::Registry::relation_direction`].
pub struct Relation {
    /// The related model.
    pub target: ModelId,

    /// Association model mediating a many-to-many relationship.
    pub secondary: Option<ModelId>,

    /// Name of the reciprocal relationship attribute on the target model.
    pub back_reference: Option<String>,

    /// Explicitly declared direction, if any.
    pub declared: Option<Direction>,

    /// Direction memoized on first resolution. Stable for the relation's
    /// lifetime; only a registry rebuild re-runs the heuristic.
    resolved: OnceLock<Direction>,
}

impl Relation {
    pub fn new(target: ModelId) -> Self {
        Self {
            target,
            secondary: None,
            back_reference: None,
            declared: None,
            resolved: OnceLock::new(),
        }
    }

    /// The memoized direction, if it has been resolved.
    pub fn cached_direction(&self) -> Option<Direction> {
        self.resolved.get().copied()
    }

    /// Memoize and return the direction. The closure runs at most once for
    /// the relation's lifetime; concurrent first calls race safely on the
    /// compute-and-swap.
    pub(crate) fn resolve_direction_with(
        &self,
        resolve: impl FnOnce() -> Direction,
    ) -> Direction {
        *self.resolved.get_or_init(resolve)
    }
}

impl Direction {
    /// The direction of the reciprocal relationship on the target model.
    pub fn inverse(self) -> Self {
        match self {
            Self::ManyToOne => Self::OneToMany,
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToMany => Self::ManyToMany,
        }
    }

    pub fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Relation")
            .field("target", &self.target)
            .field("secondary", &self.secondary)
            .field("back_reference", &self.back_reference)
            .field("declared", &self.declared)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
