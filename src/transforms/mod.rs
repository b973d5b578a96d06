pub mod boolean_comparison;
pub mod collection_empty;
pub mod commented_code;
pub mod private_constructor;
pub mod registry;
pub mod traits;
pub mod unused_import;
pub mod unused_variable;

pub use registry::{default_registry, Route, TransformRegistry};
pub use traits::{Transform, TransformContext, TransformResult};
