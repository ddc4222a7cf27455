pub mod config;
pub mod identity;
pub mod intent;

pub use config::*;
pub use identity::*;
pub use intent::*;
