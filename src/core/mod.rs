//! Configuration and the data model shared by validators, limiter and client.

pub mod config;
pub mod models;
