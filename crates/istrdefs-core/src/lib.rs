//! istrdefs Core
//!
//! Core types, configuration values and errors shared by the istrdefs pipeline.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Mode, PreprocessorConfig, SourceSelection};
pub use error::{Error, Result};
pub use types::*;
