//! Data-driven content for chainworks.
//!
//! Items, recipes and pipelines live in `items`, `recipes` and `pipelines`
//! files written in RON, JSON or TOML. [`load_content`] resolves every name
//! and fills a core [`RegistryBuilder`](chainworks_core::registry::RegistryBuilder).

pub mod loader;
pub mod schema;

pub use loader::{Content, DataLoadError, load_content};
