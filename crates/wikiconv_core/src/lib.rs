pub mod config;
pub mod convert;
pub mod translate;

pub use translate::{Diagnostics, Stage, TranslateOptions, translate, translate_page};
