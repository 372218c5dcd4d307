pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod error_utils;
pub mod export;
pub mod pipeline;
pub mod scanner;
pub mod types;
pub mod window;

#[cfg(test)]
mod testing;

pub use error::*;
pub use error_utils::*;
pub use types::*;
