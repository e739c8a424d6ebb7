//! Packaging for NVDA add-ons: build variables are resolved once, manifests
//! and help pages are rendered into the staged `addon/` tree, the tree is
//! zipped into a `.nvda-addon` bundle and a store descriptor is written next
//! to it.

pub mod builder;
pub mod config;
pub mod error;
pub mod i18n;
pub mod types;
pub mod utils;

pub use error::{BuildError, Result};
