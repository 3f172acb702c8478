pub mod types;
pub mod reconcile;
pub mod storage;
pub mod queries;

pub use types::*;
pub use reconcile::*;
pub use storage::FileStore;
