pub mod diff;
pub mod signature;
pub mod validator;

pub use diff::{line_hunk, patch_hunk, LineHunk, LineMap};
pub use validator::{PatchScope, Validation, Validator};
