//! HTTP request handlers

pub mod generate;
pub mod health;
pub mod types;

pub use generate::*;
pub use health::*;
pub use types::*;
