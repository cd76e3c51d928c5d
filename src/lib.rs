pub mod cli;
pub mod error;
pub mod loaders;
pub mod models;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use models::{Config, OutputFormat};
