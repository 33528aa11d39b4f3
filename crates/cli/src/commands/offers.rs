//! Offer Commands

use anyhow::Result;
use apiprobe_common::resources::Offer;
use clap::{Args, Subcommand};

use super::crud::{self, set, Action, ApplyFields};
use crate::context::Context;
use crate::output::{cell, TableDisplay};

#[derive(Subcommand)]
pub enum OfferCommands {
    /// Get offer details
    Get {
        /// Offer ID
        id: String,
    },

    /// Create a new offer
    Create(OfferFields),

    /// Update an offer
    Update {
        /// Offer ID
        id: String,

        #[command(flatten)]
        fields: OfferFields,
    },

    /// Delete an offer
    Delete {
        /// Offer ID
        id: String,
    },
}

#[derive(Args, Default)]
pub struct OfferFields {
    /// Product the offer applies to
    #[arg(long)]
    pub product_id: Option<String>,

    /// Offer price
    #[arg(long)]
    pub price: Option<f64>,

    /// First day of the offer (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day of the offer (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Offer type (discount, bundle, ...)
    #[arg(long = "type")]
    pub offer_type: Option<String>,
}

impl ApplyFields<Offer> for OfferFields {
    fn apply(&self, form: &mut Offer) {
        set(&mut form.product_id, &self.product_id);
        set(&mut form.offer_price, &self.price);
        set(&mut form.start_date, &self.start_date);
        set(&mut form.end_date, &self.end_date);
        set(&mut form.offer_type, &self.offer_type);
    }
}

impl TableDisplay for Offer {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Product ID", "Price", "Start", "End", "Type"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            cell(self.id.as_deref()),
            self.product_id.clone(),
            format!("{:.2}", self.offer_price),
            self.start_date.clone(),
            self.end_date.clone(),
            self.offer_type.clone(),
        ]
    }
}

/// Execute offer command
pub async fn execute(cmd: OfferCommands, ctx: &Context) -> Result<()> {
    let action = match cmd {
        OfferCommands::Get { id } => Action::Get(id),
        OfferCommands::Create(fields) => Action::Create(fields),
        OfferCommands::Update { id, fields } => Action::Update(id, fields),
        OfferCommands::Delete { id } => Action::Delete(id),
    };
    crud::run::<Offer, OfferFields>(ctx, action).await
}
