//! Storage categories
//!
//! Every processed image lands in exactly one category, which is also the
//! first segment of its object address (`{category}/{key}`).
//!
//! A fourth `processing` folder exists in older deployments as a reserved
//! in-flight marker. Nothing transitions into it, so it is not modelled here.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Score at or above the threshold; original bytes stored as-is.
    GoodQuality,
    /// Enhanced bytes produced by the external tool.
    Upscaled,
    /// Original bytes stored after a decode or enhancement failure.
    CouldNotUpscale,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::GoodQuality,
        Category::Upscaled,
        Category::CouldNotUpscale,
    ];

    /// Wire name, also used as the storage prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GoodQuality => "good_quality",
            Category::Upscaled => "upscaled",
            Category::CouldNotUpscale => "could_not_upscale",
        }
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "good_quality" => Ok(Category::GoodQuality),
            "upscaled" => Ok(Category::Upscaled),
            // Legacy folder name
            "could_not_upscale" | "couldn't_upscale" => Ok(Category::CouldNotUpscale),
            other => Err(ConfigError::InvalidCategory(other.to_string())),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(Category::GoodQuality.as_str(), "good_quality");
        assert_eq!(Category::Upscaled.as_str(), "upscaled");
        assert_eq!(Category::CouldNotUpscale.as_str(), "could_not_upscale");
    }

    #[test]
    fn test_category_serde_matches_as_str() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("upscaled".parse::<Category>().unwrap(), Category::Upscaled);
        assert_eq!(
            "couldn't_upscale".parse::<Category>().unwrap(),
            Category::CouldNotUpscale
        );
        assert!("processing".parse::<Category>().is_err());
    }
}
