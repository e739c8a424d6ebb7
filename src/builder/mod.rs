pub mod bundle;
pub mod docs;
pub mod manifest;
pub mod pipeline;
pub mod store;

pub use pipeline::{ADDON_DIR, BuildOutput, build_addon, clean_addon};
