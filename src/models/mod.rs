pub mod attachment;
pub mod project;
pub mod proposal;
pub mod role;
