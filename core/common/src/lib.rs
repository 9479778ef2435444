//! Common types shared across BlockVault crates.
//!
//! This crate provides the error taxonomy used throughout the workspace,
//! ensuring every component reports failures through one `Result` type.

pub mod error;

pub use error::{Error, Result};
