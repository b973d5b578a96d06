pub mod adapter;
pub mod command;
pub mod context;
pub mod traits;

pub use adapter::FallbackAdapter;
pub use command::CommandProvider;
pub use context::SurroundingContext;
pub use traits::{FallbackRequest, FixProvider};
