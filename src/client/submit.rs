//! Submission of one attachment update with its failure policies.
//!
//! ```text
//! Submitting --ok--> Succeeded
//! Submitting --storage_unavailable (files present)--> RetryingWithoutFiles
//! Submitting/RetryingWithoutFiles --transient (budget left)--> same state, retries + 1
//! anything else --> Failed
//! ```
//!
//! The fallback without files is taken at most once. Transient retries share
//! a single budget of [`MAX_RETRIES`] across both phases.

use std::time::Duration;

use super::backend::{AttachmentUpdate, Backend};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::attachment::{Attachment, AttachmentOwner};

/// Additional attempts allowed after a network-class failure.
pub const MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: MAX_RETRIES,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        RetryPolicy {
            max_retries: MAX_RETRIES,
            delay: config.retry_delay,
        }
    }
}

/// Result of a finished submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    /// The owner's list as stored by the server.
    pub attachments: Vec<Attachment>,
    /// The new files were left behind by the storage fallback.
    pub files_dropped: bool,
}

#[derive(Debug)]
pub enum SubmitState {
    Submitting { retries: u32 },
    RetryingWithoutFiles { retries: u32 },
    Succeeded,
    Failed(AppError),
}

impl SubmitState {
    pub fn start() -> Self {
        SubmitState::Submitting { retries: 0 }
    }

    /// Whether the next attempt carries the file parts.
    pub fn sends_files(&self) -> bool {
        matches!(self, SubmitState::Submitting { .. })
    }

    pub fn retries(&self) -> u32 {
        match self {
            SubmitState::Submitting { retries } | SubmitState::RetryingWithoutFiles { retries } => *retries,
            _ => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmitState::Succeeded | SubmitState::Failed(_))
    }

    /// Pure transition on the outcome of one attempt.
    pub fn advance(self, outcome: Result<(), AppError>, has_files: bool, max_retries: u32) -> SubmitState {
        let err = match (self, outcome) {
            (state, _) if state.is_terminal() => return state,
            (_, Ok(())) => return SubmitState::Succeeded,
            (state, Err(err)) => (state, err),
        };
        match err {
            (SubmitState::Submitting { retries }, AppError::StorageUnavailable(_)) if has_files => {
                SubmitState::RetryingWithoutFiles { retries }
            }
            (SubmitState::Submitting { retries }, e) if e.is_retryable() && retries < max_retries => {
                SubmitState::Submitting { retries: retries + 1 }
            }
            (SubmitState::RetryingWithoutFiles { retries }, e) if e.is_retryable() && retries < max_retries => {
                SubmitState::RetryingWithoutFiles { retries: retries + 1 }
            }
            (_, e) => SubmitState::Failed(e),
        }
    }
}

/// Drive one update to completion against `backend`.
pub async fn submit_update(
    backend: &dyn Backend,
    owner: AttachmentOwner,
    update: &AttachmentUpdate,
    policy: RetryPolicy,
) -> Result<Submitted, AppError> {
    let has_files = update.has_files();
    let stripped = update.without_files();
    let mut state = SubmitState::start();

    loop {
        let request = if state.sends_files() { update } else { &stripped };
        let err = match backend.update_attachments(owner, request).await {
            Ok(attachments) => {
                log::info!(
                    "{} {}: {} removed, {} added",
                    owner.kind(),
                    owner.id(),
                    request.remove.len(),
                    request.add.len()
                );
                let files_dropped = has_files && !state.sends_files();
                if files_dropped {
                    log::warn!(
                        "{} {}: saved without {} new file(s)",
                        owner.kind(),
                        owner.id(),
                        update.add.len()
                    );
                }
                return Ok(Submitted { attachments, files_dropped });
            }
            Err(e) => e,
        };

        let before = state.retries();
        state = match state.advance(Err(err), has_files, policy.max_retries) {
            SubmitState::Failed(e) => {
                log::error!("{} {} update failed: {e}", owner.kind(), owner.id());
                return Err(e);
            }
            next => next,
        };

        if state.retries() > before {
            log::warn!(
                "{} {} update hit a network error, retry {}/{} in {:?}",
                owner.kind(),
                owner.id(),
                state.retries(),
                policy.max_retries,
                policy.delay
            );
            tokio::time::sleep(policy.delay).await;
        } else {
            log::warn!(
                "{} {}: storage unavailable, saving without new files",
                owner.kind(),
                owner.id()
            );
        }
    }
}
