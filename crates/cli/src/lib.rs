//! apiprobe CLI
//!
//! Command-line interface for signing in to the identity provider and
//! exercising the users, stores, products, offers, monitoring, search and
//! image analysis services.

pub mod commands;
pub mod context;
pub mod output;
