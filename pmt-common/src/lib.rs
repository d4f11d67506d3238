//! # PMT Common Library
//!
//! Shared code for the PMT import tools including:
//! - Database initialization and schema
//! - Equipment and catalog models
//! - Configuration loading
//! - Error types

pub mod config;
pub mod db;
pub mod error;

pub use db::models::EquipmentStatus;
pub use error::{Error, Result};
