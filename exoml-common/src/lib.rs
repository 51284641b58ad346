//! # ExoML Common Library
//!
//! Shared code for the ExoML crates:
//! - Error type
//! - Layered configuration loading (CLI → ENV → TOML → defaults)
//! - Preprocessing and timeout settings consumed by the inference service

pub mod config;
pub mod error;

pub use config::{MissingValueFill, PreprocessingPolicy, ServiceConfig};
pub use error::{Error, Result};
