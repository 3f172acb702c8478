//! Client side of the suite: the backend seam, its HTTP implementation and
//! the operations the UI layer calls.

pub mod backend;
pub mod http;
pub mod roles;
pub mod service;
pub mod submit;

pub use backend::{AttachmentUpdate, Backend};
pub use http::HttpBackend;
pub use service::{EditOutcome, ProposalEdit, ProposalService};
pub use submit::{MAX_RETRIES, RetryPolicy, SubmitState, Submitted, submit_update};
