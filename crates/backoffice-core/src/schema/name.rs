use heck::{ToSnakeCase, ToUpperCamelCase};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Name {
    pub parts: Vec<String>,
}

impl Name {
    pub fn new(src: &str) -> Self {
        let snake = src.to_snake_case();
        let parts = snake.split('_').map(String::from).collect();
        Self { parts }
    }

    pub fn upper_camel_case(&self) -> String {
        self.snake_case().to_upper_camel_case()
    }

    pub fn snake_case(&self) -> String {
        self.parts.join("_")
    }

    /// Human-readable form: underscores become spaces, first letter
    /// capitalized. Used for default field labels.
    pub fn human(&self) -> String {
        let mut out = self.parts.join(" ");
        if let Some(first) = out.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        out
    }

    /// Words separated for display, e.g. `UserBilling` -> `User Billing`.
    pub fn title(&self) -> String {
        self.parts
            .iter()
            .map(|part| {
                let mut part = part.clone();
                if let Some(first) = part.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                part
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&str> for Name {
    fn from(src: &str) -> Self {
        Self::new(src)
    }
}
