use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(pub String);

impl RestaurantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RestaurantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RestaurantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Branding used when displaying an order. Carries no business logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub primary_color: String,
    pub currency: String,
}

impl RestaurantProfile {
    pub const DEFAULT_CURRENCY: &'static str = "FCFA";
    pub const DEFAULT_COLOR: &'static str = "#000000";

    pub fn new(primary_color: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            name: None,
            primary_color: primary_color.into(),
            currency: currency.into(),
        }
    }

    /// Profile used when the restaurant is unknown or its profile cannot be fetched.
    pub fn fallback() -> Self {
        Self::new(Self::DEFAULT_COLOR, Self::DEFAULT_CURRENCY)
    }
}

impl Default for RestaurantProfile {
    fn default() -> Self {
        Self::fallback()
    }
}
