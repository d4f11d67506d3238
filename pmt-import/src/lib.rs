//! # pmt-import
//!
//! Batch importer for plant catalog and equipment CSV exports.
//!
//! Two pipelines share the one-transaction-per-file shape:
//! - the equipment hierarchy import, which reloads the whole tree and treats
//!   any row failure as fatal for the file, and
//! - the generic catalog import, which isolates each row in a savepoint and
//!   keeps going past individual failures.

pub mod batch;
pub mod catalog;
pub mod hierarchy;
pub mod reader;
pub mod reconcile;
pub mod records;
