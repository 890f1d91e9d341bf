//! Relay routes

pub mod forms;
pub mod health;
