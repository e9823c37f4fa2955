#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

//! File and environment backed configuration for keycopy.
//!
//! Layout: `model.rs` (typed config and the copy policy snapshot), `loader.rs`
//! (defaults, JSON file, environment overrides), `validate.rs` (field and
//! keyword parsing), `defaults.rs` (constants), `error.rs` (errors).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_from_env};
pub use model::{AppConfig, CopyPolicy};
pub use validate::{normalize_keywords, parse_keywords};
