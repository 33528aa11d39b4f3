//! Product Commands

use anyhow::Result;
use apiprobe_common::resources::Product;
use clap::{Args, Subcommand};

use super::crud::{self, set, Action, ApplyFields};
use crate::context::Context;
use crate::output::{cell, TableDisplay};

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Get product details
    Get {
        /// Product ID
        id: String,
    },

    /// Create a new product
    Create(ProductFields),

    /// Update a product
    Update {
        /// Product ID
        id: String,

        #[command(flatten)]
        fields: ProductFields,
    },

    /// Delete a product
    Delete {
        /// Product ID
        id: String,
    },
}

#[derive(Args, Default)]
pub struct ProductFields {
    /// Product name
    #[arg(long)]
    pub name: Option<String>,

    /// Owning store ID
    #[arg(long)]
    pub store_id: Option<String>,

    /// Unit price
    #[arg(long)]
    pub price: Option<f64>,

    /// Category
    #[arg(long)]
    pub category: Option<String>,
}

impl ApplyFields<Product> for ProductFields {
    fn apply(&self, form: &mut Product) {
        set(&mut form.name, &self.name);
        set(&mut form.store_id, &self.store_id);
        set(&mut form.price, &self.price);
        set(&mut form.category, &self.category);
    }
}

impl TableDisplay for Product {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Store ID", "Price", "Category"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            cell(self.id.as_deref()),
            self.name.clone(),
            self.store_id.clone(),
            format!("{:.2}", self.price),
            self.category.clone(),
        ]
    }
}

/// Execute product command
pub async fn execute(cmd: ProductCommands, ctx: &Context) -> Result<()> {
    let action = match cmd {
        ProductCommands::Get { id } => Action::Get(id),
        ProductCommands::Create(fields) => Action::Create(fields),
        ProductCommands::Update { id, fields } => Action::Update(id, fields),
        ProductCommands::Delete { id } => Action::Delete(id),
    };
    crud::run::<Product, ProductFields>(ctx, action).await
}
