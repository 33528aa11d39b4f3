//! Stores (`/api/stores`)

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_fields, Location};
use crate::config::Service;
use crate::page::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub store_category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            address: String::new(),
            store_category: String::new(),
            description: String::new(),
            location: Some(Location::origin()),
        }
    }
}

impl Resource for Store {
    const SINGULAR: &'static str = "store";
    const TITLE: &'static str = "Store";
    const COLLECTION: &'static str = "/api/stores";
    const CREATED_ID_FIELD: &'static str = "storeId";
    const SERVICE: Service = Service::Stores;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        require_fields(&[
            ("name", self.name.as_str()),
            ("address", self.address.as_str()),
            ("store_category", self.store_category.as_str()),
        ])
    }

    fn create_body(&self) -> serde_json::Value {
        let mut body = json!({
            "name": self.name,
            "address": self.address,
            "store_category": self.store_category,
            "description": self.description,
        });
        if let Some(location) = Location::body(self.location.as_ref()) {
            body["location"] = location;
        }
        body
    }

    fn update_body(&self) -> serde_json::Value {
        self.create_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_is_optional() {
        let store = Store {
            name: "Mercadinho".into(),
            address: "Rua A, 1".into(),
            store_category: "grocery".into(),
            ..Store::default()
        };
        assert!(store.validate().is_ok());
        let body = store.create_body();
        assert_eq!(body["description"], "");
        assert!(body.get("id").is_none());
    }
}
