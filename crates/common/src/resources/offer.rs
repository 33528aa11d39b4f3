//! Offers (`/api/offers`)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use super::require_fields;
use crate::config::Service;
use crate::page::Resource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub product_id: String,
    #[serde(deserialize_with = "lenient_price")]
    pub offer_price: f64,
    pub start_date: String,
    pub end_date: String,
    pub offer_type: String,
}

/// Some deployments return the price as a string; unparseable values become 0.
fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

impl Resource for Offer {
    const SINGULAR: &'static str = "offer";
    const TITLE: &'static str = "Offer";
    const COLLECTION: &'static str = "/api/offers";
    const CREATED_ID_FIELD: &'static str = "offerId";
    const SERVICE: Service = Service::Offers;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        require_fields(&[("product_id", self.product_id.as_str())])?;
        // A zero price is an empty field
        if self.offer_price.is_nan() || self.offer_price <= 0.0 {
            return Err("Missing required field: offer_price".to_string());
        }
        require_fields(&[
            ("start_date", self.start_date.as_str()),
            ("end_date", self.end_date.as_str()),
            ("offer_type", self.offer_type.as_str()),
        ])
    }

    fn create_body(&self) -> serde_json::Value {
        json!({
            "product_id": self.product_id,
            "offer_price": self.offer_price,
            "start_date": self.start_date,
            "end_date": self.end_date,
            "offer_type": self.offer_type,
        })
    }

    fn update_body(&self) -> serde_json::Value {
        self.create_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_price_is_parsed() {
        let offer: Offer = serde_json::from_value(json!({
            "id": "o-1",
            "product_id": "p-1",
            "offer_price": "19.90",
            "start_date": "2026-01-01",
            "end_date": "2026-01-31",
            "offer_type": "discount"
        }))
        .unwrap();
        assert_eq!(offer.offer_price, 19.9);

        let garbled: Offer = serde_json::from_value(json!({"offer_price": "n/a"})).unwrap();
        assert_eq!(garbled.offer_price, 0.0);
    }

    #[test]
    fn test_dates_required() {
        let offer = Offer {
            product_id: "p-1".into(),
            offer_price: 4.5,
            offer_type: "discount".into(),
            ..Offer::default()
        };
        assert_eq!(offer.validate(), Err("Missing required field: start_date".to_string()));
    }

    #[test]
    fn test_zero_price_counts_as_missing() {
        let mut offer = Offer {
            product_id: "p-1".into(),
            start_date: "2026-01-01T08:00".into(),
            end_date: "2026-01-31T20:00".into(),
            offer_type: "discount".into(),
            ..Offer::default()
        };
        assert_eq!(offer.validate(), Err("Missing required field: offer_price".to_string()));

        offer.offer_price = -1.0;
        assert!(offer.validate().is_err());

        offer.offer_price = 9.9;
        assert_eq!(offer.validate(), Ok(()));
    }
}
