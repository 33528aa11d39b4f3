//! Resource Implementations
//!
//! Record types for each REST collection the harness manages, with their
//! request bodies and required-field checks.

pub mod offer;
pub mod product;
pub mod store;
pub mod user;

pub use offer::Offer;
pub use product::Product;
pub use store::Store;
pub use user::User;

use serde::{Deserialize, Serialize};

/// Geographic position attached to users and stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Form default: both coordinates zero
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// JSON for a request body; only sent when both coordinates are set
    pub(crate) fn body(location: Option<&Location>) -> Option<serde_json::Value> {
        let loc = location?;
        match (loc.latitude, loc.longitude) {
            (Some(latitude), Some(longitude)) => Some(serde_json::json!({
                "latitude": latitude,
                "longitude": longitude,
            })),
            _ => None,
        }
    }
}

/// Error text for the first blank field among `fields`
pub(crate) fn require_fields(fields: &[(&str, &str)]) -> Result<(), String> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(format!("Missing required field: {}", name)),
        None => Ok(()),
    }
}
