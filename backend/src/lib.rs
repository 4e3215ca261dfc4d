//! Fitness Coach Backend Library
//!
//! This library exposes the backend modules for use in tests and the binary.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod transport;
