// src/lib.rs

pub mod browser;
pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod models;
pub mod reminders;
pub mod routes;
pub mod runner;
pub mod selector;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_router;
