pub mod config;
pub mod error;
pub mod link;

pub use config::*;
pub use error::*;
pub use link::*;
