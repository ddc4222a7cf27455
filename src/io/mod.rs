pub mod config_io;
pub mod fs;
pub mod lock;
pub mod recent;
pub mod watcher;
