//! Products (`/api/products`)

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::require_fields;
use crate::config::Service;
use crate::page::Resource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub store_id: String,
    pub price: f64,
    pub category: String,
}

impl Resource for Product {
    const SINGULAR: &'static str = "product";
    const TITLE: &'static str = "Product";
    const COLLECTION: &'static str = "/api/products";
    const CREATED_ID_FIELD: &'static str = "productId";
    const SERVICE: Service = Service::Products;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        require_fields(&[("name", self.name.as_str()), ("store_id", self.store_id.as_str())])
    }

    fn create_body(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "store_id": self.store_id,
            "price": self.price,
            "category": self.category,
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
    fn test_category_is_optional() {
        let product = Product {
            name: "Café".into(),
            store_id: "s-1".into(),
            ..Product::default()
        };
        assert_eq!(product.validate(), Ok(()));
        assert_eq!(product.create_body()["category"], "");

        let no_store = Product {
            name: "Café".into(),
            ..Product::default()
        };
        assert_eq!(no_store.validate(), Err("Missing required field: store_id".to_string()));
    }
}
