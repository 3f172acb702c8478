pub mod evaluator;
pub mod permission;
pub mod validate;
