pub mod policy;
pub mod renumber;
pub mod resolve;

pub use policy::{Action, Confirmation, UserPrompt};
pub use resolve::resolve;
