//! CLI Commands

pub mod auth;
pub mod crud;
pub mod health;
pub mod image;
pub mod monitoring;
pub mod offers;
pub mod products;
pub mod search;
pub mod stores;
pub mod users;
