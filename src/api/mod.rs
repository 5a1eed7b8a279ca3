//! API handlers for Visitlog REST endpoints

pub mod health;
pub mod openapi;
pub mod reports;
pub mod visits;
