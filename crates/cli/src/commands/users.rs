//! User Commands

use anyhow::Result;
use apiprobe_common::resources::{Location, User};
use clap::{Args, Subcommand};

use super::crud::{self, set, Action, ApplyFields};
use crate::context::Context;
use crate::output::{cell, TableDisplay};

#[derive(Subcommand)]
pub enum UserCommands {
    /// Get user details
    Get {
        /// User ID
        id: String,
    },

    /// Create a new user
    Create(UserFields),

    /// Update a user
    Update {
        /// User ID
        id: String,

        #[command(flatten)]
        fields: UserFields,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: String,
    },
}

#[derive(Args, Default)]
pub struct UserFields {
    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Full name
    #[arg(long)]
    pub name: Option<String>,

    /// Latitude
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
}

impl ApplyFields<User> for UserFields {
    fn apply(&self, form: &mut User) {
        set(&mut form.email, &self.email);
        set(&mut form.name, &self.name);
        apply_location(&mut form.location, self.latitude, self.longitude);
    }
}

/// Merge coordinate flags into an optional location
pub(crate) fn apply_location(location: &mut Option<Location>, latitude: Option<f64>, longitude: Option<f64>) {
    if latitude.is_none() && longitude.is_none() {
        return;
    }
    let loc = location.get_or_insert_with(Location::default);
    if latitude.is_some() {
        loc.latitude = latitude;
    }
    if longitude.is_some() {
        loc.longitude = longitude;
    }
}

pub(crate) fn location_cell(location: Option<&Location>) -> String {
    match location {
        Some(Location {
            latitude: Some(lat),
            longitude: Some(lon),
        }) => format!("{:.4}, {:.4}", lat, lon),
        _ => "-".to_string(),
    }
}

impl TableDisplay for User {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Email", "Name", "Location"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            cell(self.id.as_deref()),
            self.email.clone(),
            self.name.clone(),
            location_cell(self.location.as_ref()),
        ]
    }
}

/// Execute user command
pub async fn execute(cmd: UserCommands, ctx: &Context) -> Result<()> {
    let action = match cmd {
        UserCommands::Get { id } => Action::Get(id),
        UserCommands::Create(fields) => Action::Create(fields),
        UserCommands::Update { id, fields } => Action::Update(id, fields),
        UserCommands::Delete { id } => Action::Delete(id),
    };
    crud::run::<User, UserFields>(ctx, action).await
}
