//! Proposal status state machine.
//!
//! `Hot`, `Cold`, `Warm` and `Scrap` move freely between each other.
//! `Confirmed` is absorbing: once there, every transition, edit and delete is
//! refused with `LockedRecord`. Reaching it is a two-phase step: the status
//! write, then (only if the backend did not already do it) an explicit
//! Project creation.

use super::types::{Proposal, ProposalStatus};
use crate::errors::AppError;

/// Refuse any mutation of a confirmed proposal.
pub fn ensure_mutable(proposal: &Proposal) -> Result<(), AppError> {
    if proposal.status.is_locked() {
        return Err(AppError::LockedRecord(format!(
            "proposal {} is confirmed",
            proposal.id
        )));
    }
    Ok(())
}

/// What a legal transition has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Persist the new status; nothing else happens.
    Persist(ProposalStatus),
    /// Persist `Confirmed`, then settle the Project.
    Confirm,
}

pub fn plan_transition(
    current: ProposalStatus,
    next: ProposalStatus,
) -> Result<TransitionPlan, AppError> {
    if current.is_locked() {
        return Err(AppError::LockedRecord(format!(
            "cannot move a confirmed proposal to {next}"
        )));
    }
    Ok(match next {
        ProposalStatus::Confirmed => TransitionPlan::Confirm,
        other => TransitionPlan::Persist(other),
    })
}

/// Second phase of a confirmation, decided from the status write's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmFollowUp {
    /// The backend created the Project while persisting the status.
    AlreadyCreated,
    /// The client must issue the explicit Project creation call.
    CreateProject,
}

pub fn after_confirm_write(project_created: bool) -> ConfirmFollowUp {
    if project_created {
        ConfirmFollowUp::AlreadyCreated
    } else {
        ConfirmFollowUp::CreateProject
    }
}

/// Result of a successful `transition` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Non-terminal status persisted.
    Updated(ProposalStatus),
    /// Confirmed, with the Project settled. `project_id` is known only when
    /// this client created it.
    Confirmed {
        auto_created: bool,
        project_id: Option<i64>,
    },
    /// Confirmed, but the explicit Project creation failed. The status is not
    /// rolled back and the confirmation must not be retried.
    ConfirmedWithoutProject { warning: String },
}

impl TransitionOutcome {
    pub fn status(&self) -> ProposalStatus {
        match self {
            TransitionOutcome::Updated(status) => *status,
            _ => ProposalStatus::Confirmed,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            TransitionOutcome::ConfirmedWithoutProject { warning } => Some(warning),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: [ProposalStatus; 4] = [
        ProposalStatus::Hot,
        ProposalStatus::Cold,
        ProposalStatus::Warm,
        ProposalStatus::Scrap,
    ];

    #[test]
    fn open_states_reach_each_other() {
        for from in OPEN {
            for to in OPEN {
                assert_eq!(plan_transition(from, to).unwrap(), TransitionPlan::Persist(to));
            }
            assert_eq!(
                plan_transition(from, ProposalStatus::Confirmed).unwrap(),
                TransitionPlan::Confirm
            );
        }
    }

    #[test]
    fn confirmed_is_absorbing() {
        for to in ProposalStatus::ALL {
            let err = plan_transition(ProposalStatus::Confirmed, to).unwrap_err();
            assert_eq!(err.kind(), crate::errors::ErrorKind::LockedRecord);
        }
    }

    #[test]
    fn follow_up_depends_only_on_flag() {
        assert_eq!(after_confirm_write(true), ConfirmFollowUp::AlreadyCreated);
        assert_eq!(after_confirm_write(false), ConfirmFollowUp::CreateProject);
    }

    #[test]
    fn outcome_reports_status_and_warning() {
        let outcome = TransitionOutcome::ConfirmedWithoutProject {
            warning: "confirmed but project not created".into(),
        };
        assert_eq!(outcome.status(), ProposalStatus::Confirmed);
        assert!(outcome.warning().is_some());
        assert_eq!(TransitionOutcome::Updated(ProposalStatus::Cold).warning(), None);
    }
}
