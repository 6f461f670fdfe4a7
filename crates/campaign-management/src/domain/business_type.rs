//! Campaign business types.

use std::fmt;
use std::str::FromStr;

use campaign_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// The kind of business a campaign is run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessType {
    /// Brick-and-mortar retail.
    Retail,
    /// Online commerce.
    Ecommerce,
    /// Anything else.
    #[default]
    Standard,
}

impl BusinessType {
    /// The wire name of this business type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Retail => "RETAIL",
            Self::Ecommerce => "ECOMMERCE",
            Self::Standard => "STANDARD",
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RETAIL" => Ok(Self::Retail),
            "ECOMMERCE" => Ok(Self::Ecommerce),
            "STANDARD" => Ok(Self::Standard),
            other => Err(DomainError::Validation(format!(
                "unknown business type: {other}"
            ))),
        }
    }
}
