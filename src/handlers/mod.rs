// src/handlers/mod.rs

pub mod admin;
pub mod data;
pub mod quiz;
pub mod topics;
pub mod user;
