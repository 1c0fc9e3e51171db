//! External Preprocessor Integration
//!
//! Fans source files out to the configured preprocessor (gcc, clang, cl, ...)
//! on a bounded worker pool and concatenates the raw output, C group first.

pub mod runner;

pub use runner::{chunk, preprocess, PreprocessError, PreprocessSummary, PreprocessorRunner};
