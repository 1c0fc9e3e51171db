//! istrdefs Extract
//!
//! The symbol-extraction and incremental-regeneration pipeline:
//! classify → preprocess → split/extract → write artifacts → aggregate.
//!
//! ## Modules
//!
//! - `classify` - C / C++ partitioning of the source list
//! - `preprocessor` - Parallel external preprocessor invocation
//! - `extract` - Line marker and macro matchers
//! - `split` - Streaming splitter attributing records to originating files
//! - `artifact` - Per-file artifact naming and writing
//! - `aggregate` - Sorted, digest-gated merge of all artifacts
//! - `header` - Hand-off to the downstream header generator

pub mod aggregate;
pub mod artifact;
pub mod classify;
pub mod extract;
pub mod header;
pub mod persist;
pub mod preprocessor;
pub mod split;

pub use aggregate::aggregate;
pub use artifact::{sanitize_artifact_name, ArtifactSink, ArtifactWriter};
pub use classify::{classify, SourceGroups};
pub use extract::{Extractor, MarkerParser};
pub use header::{generate_header, HeaderToolError};
pub use preprocessor::{preprocess, PreprocessError, PreprocessorRunner};
pub use split::{split, split_reader, SplitState, Splitter};
