//! Store Commands

use anyhow::Result;
use apiprobe_common::resources::Store;
use clap::{Args, Subcommand};

use super::crud::{self, set, Action, ApplyFields};
use super::users::{apply_location, location_cell};
use crate::context::Context;
use crate::output::{cell, TableDisplay};

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Get store details
    Get {
        /// Store ID
        id: String,
    },

    /// Create a new store
    Create(StoreFields),

    /// Update a store
    Update {
        /// Store ID
        id: String,

        #[command(flatten)]
        fields: StoreFields,
    },

    /// Delete a store
    Delete {
        /// Store ID
        id: String,
    },
}

#[derive(Args, Default)]
pub struct StoreFields {
    /// Store name
    #[arg(long)]
    pub name: Option<String>,

    /// Street address
    #[arg(long)]
    pub address: Option<String>,

    /// Category (grocery, bakery, ...)
    #[arg(long)]
    pub category: Option<String>,

    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,

    /// Latitude
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
}

impl ApplyFields<Store> for StoreFields {
    fn apply(&self, form: &mut Store) {
        set(&mut form.name, &self.name);
        set(&mut form.address, &self.address);
        set(&mut form.store_category, &self.category);
        set(&mut form.description, &self.description);
        apply_location(&mut form.location, self.latitude, self.longitude);
    }
}

impl TableDisplay for Store {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Address", "Category", "Description", "Location"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            cell(self.id.as_deref()),
            self.name.clone(),
            self.address.clone(),
            self.store_category.clone(),
            self.description.clone(),
            location_cell(self.location.as_ref()),
        ]
    }
}

/// Execute store command
pub async fn execute(cmd: StoreCommands, ctx: &Context) -> Result<()> {
    let action = match cmd {
        StoreCommands::Get { id } => Action::Get(id),
        StoreCommands::Create(fields) => Action::Create(fields),
        StoreCommands::Update { id, fields } => Action::Update(id, fields),
        StoreCommands::Delete { id } => Action::Delete(id),
    };
    crud::run::<Store, StoreFields>(ctx, action).await
}
