pub mod fix;
pub mod index;
