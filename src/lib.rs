pub mod config;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod subtitle;
pub mod translate;

pub use config::{Config, TranslationConfig};
pub use error::{Result, VidsubError};
pub use pipeline::{print_summary, run_translate_only, run_url, PipelineReport};
