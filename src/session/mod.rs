pub mod history;
pub mod navigator;
pub mod registry;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;

pub use history::NavigationHistory;
pub use navigator::{NavError, NavOutcome, Navigator, PendingCreate, Placement, SurfaceFactory};
pub use registry::WindowRegistry;
pub use window::{DisplaySurface, WatchBinding, WindowId, WindowState, window_title};
