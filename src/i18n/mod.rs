pub mod catalog;
pub mod locales;

pub use catalog::Catalog;
pub use locales::{LocaleSet, Translator};
