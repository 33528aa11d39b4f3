//! Users (`/users`)

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{require_fields, Location};
use crate::config::Service;
use crate::page::Resource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: None,
            email: String::new(),
            name: String::new(),
            location: Some(Location::origin()),
        }
    }
}

impl Resource for User {
    const SINGULAR: &'static str = "user";
    const TITLE: &'static str = "User";
    const COLLECTION: &'static str = "/users";
    const CREATED_ID_FIELD: &'static str = "id";
    const SERVICE: Service = Service::Users;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn validate(&self) -> Result<(), String> {
        require_fields(&[("email", self.email.as_str()), ("name", self.name.as_str())])
    }

    fn create_body(&self) -> serde_json::Value {
        let mut body = json!({
            "email": self.email,
            "name": self.name,
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
