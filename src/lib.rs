#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod layout;
pub mod model;
pub mod xml;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, load_config};
pub use layout::{GenerateError, GenerationResult, generate};
pub use xml::Document;
