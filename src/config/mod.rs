pub mod build_vars;
pub mod resolver;

pub use build_vars::{BuildVars, load_build_vars};
pub use resolver::{BuildConfig, BuildOverrides, resolve};
