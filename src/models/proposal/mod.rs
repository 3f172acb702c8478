pub mod types;
pub mod amount;
pub mod lifecycle;
pub mod queries;

pub use types::*;
pub use amount::*;
pub use lifecycle::*;
pub use queries::*;
