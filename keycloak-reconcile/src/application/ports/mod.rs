pub mod auth;
pub mod config;
pub mod directory;

pub use auth::*;
pub use config::*;
pub use directory::*;
