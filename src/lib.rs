pub mod cli;
pub mod core;
pub mod fallback;
pub mod index;
pub mod reporters;
pub mod syntax;
pub mod transforms;
pub mod utils;
pub mod validate;
