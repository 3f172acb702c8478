//! Proposal operations exposed to the UI layer.
//!
//! Every call takes the resolved [`User`] and runs the permission check, the
//! lock check and input validation before the first network request.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::backend::{AttachmentUpdate, Backend};
use super::submit::{RetryPolicy, Submitted, submit_update};
use crate::auth::evaluator::{User, require_permission};
use crate::auth::permission::{Action, PROPOSALS};
use crate::errors::AppError;
use crate::models::attachment::{Attachment, AttachmentOwner, EditSession};
use crate::models::proposal::{
    ConfirmFollowUp, NewProposal, Proposal, ProposalFields, ProposalPatch, ProposalStatus,
    TransitionOutcome, TransitionPlan, after_confirm_write, ensure_mutable, plan_transition,
    with_amount_option,
};

/// Everything one "save" on the proposal screen may carry.
#[derive(Debug, Clone, Default)]
pub struct ProposalEdit {
    pub status: Option<ProposalStatus>,
    pub fields: ProposalFields,
    pub attachments: Option<EditSession>,
}

#[derive(Debug, Default)]
pub struct EditOutcome {
    pub amount_recorded: bool,
    pub transition: Option<TransitionOutcome>,
    /// The owner's list after reconciliation, when one was submitted.
    pub attachments: Option<Vec<Attachment>>,
    /// New files were not stored because file storage was unavailable.
    pub files_dropped: bool,
    /// Reconciliation failure after the status write already landed. The
    /// transition above still happened and must be reported.
    pub reconcile_error: Option<AppError>,
}

#[derive(Clone)]
pub struct ProposalService {
    backend: Arc<dyn Backend>,
    policy: RetryPolicy,
}

impl ProposalService {
    pub fn new(backend: Arc<dyn Backend>, policy: RetryPolicy) -> Self {
        ProposalService { backend, policy }
    }

    pub async fn get(&self, user: &User, id: i64) -> Result<Proposal, AppError> {
        require_permission(user, PROPOSALS.name, Action::View)?;
        self.backend.get_proposal(id).await
    }

    pub async fn create(&self, user: &User, proposal: &NewProposal) -> Result<Proposal, AppError> {
        require_permission(user, PROPOSALS.name, Action::Create)?;
        let errors = proposal.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let created = self.backend.create_proposal(proposal).await?;
        log::info!("proposal {} created by user {}", created.id, user.id);
        Ok(created)
    }

    /// Append the proposal's current amount to its options. Returns whether a
    /// write was needed.
    pub async fn record_amount_option(&self, user: &User, proposal: &mut Proposal) -> Result<bool, AppError> {
        require_permission(user, PROPOSALS.name, Action::Edit)?;
        ensure_mutable(proposal)?;
        let amount = proposal.amount;
        self.append_amount(proposal, amount).await
    }

    async fn append_amount(&self, proposal: &mut Proposal, amount: f64) -> Result<bool, AppError> {
        let Some(options) = with_amount_option(&proposal.amount_options, amount) else {
            return Ok(false);
        };
        let resp = self
            .backend
            .patch_proposal(proposal.id, &ProposalPatch::amount_options(options.clone()))
            .await?;
        proposal.amount_options = if resp.proposal.amount_options.is_empty() {
            options
        } else {
            resp.proposal.amount_options
        };
        Ok(true)
    }

    pub async fn transition(
        &self,
        user: &User,
        proposal: &mut Proposal,
        next: ProposalStatus,
    ) -> Result<TransitionOutcome, AppError> {
        require_permission(user, PROPOSALS.name, Action::Edit)?;
        ensure_mutable(proposal)?;
        let amount = proposal.amount;
        self.append_amount(proposal, amount).await?;
        self.apply_transition(proposal, next).await
    }

    async fn apply_transition(
        &self,
        proposal: &mut Proposal,
        next: ProposalStatus,
    ) -> Result<TransitionOutcome, AppError> {
        match plan_transition(proposal.status, next)? {
            TransitionPlan::Persist(status) => {
                let resp = self
                    .backend
                    .patch_proposal(proposal.id, &ProposalPatch::status(status))
                    .await?;
                proposal.status = resp.proposal.status;
                log::info!("proposal {} moved to {status}", proposal.id);
                Ok(TransitionOutcome::Updated(status))
            }
            TransitionPlan::Confirm => self.confirm(proposal).await,
        }
    }

    async fn confirm(&self, proposal: &mut Proposal) -> Result<TransitionOutcome, AppError> {
        let resp = self
            .backend
            .patch_proposal(proposal.id, &ProposalPatch::status(ProposalStatus::Confirmed))
            .await?;
        // the status write landed; from here on nothing rolls it back
        proposal.status = ProposalStatus::Confirmed;
        if !resp.proposal.amount_options.is_empty() {
            proposal.amount_options = resp.proposal.amount_options;
        }

        match after_confirm_write(resp.project_created) {
            ConfirmFollowUp::AlreadyCreated => {
                log::info!("proposal {} confirmed, project created by backend", proposal.id);
                Ok(TransitionOutcome::Confirmed { auto_created: true, project_id: None })
            }
            ConfirmFollowUp::CreateProject => {
                match self.backend.create_project_from_proposal(proposal.id).await {
                    Ok(project) => {
                        log::info!("proposal {} confirmed, project {} created", proposal.id, project.id);
                        Ok(TransitionOutcome::Confirmed {
                            auto_created: false,
                            project_id: Some(project.id),
                        })
                    }
                    Err(e) => {
                        log::warn!("proposal {} confirmed but project not created: {e}", proposal.id);
                        Ok(TransitionOutcome::ConfirmedWithoutProject {
                            warning: format!("confirmed but project not created: {}", e.user_message()),
                        })
                    }
                }
            }
        }
    }

    pub async fn delete(&self, user: &User, proposal: &Proposal) -> Result<(), AppError> {
        require_permission(user, PROPOSALS.name, Action::Delete)?;
        ensure_mutable(proposal)?;
        self.backend.delete_proposal(proposal.id).await?;
        log::info!("proposal {} deleted by user {}", proposal.id, user.id);
        Ok(())
    }

    /// Submit the session's attachment delta together with changed scalar
    /// fields. On success the local record reflects the server's list.
    pub async fn reconcile(
        &self,
        user: &User,
        proposal: &mut Proposal,
        session: &EditSession,
        fields: &ProposalFields,
    ) -> Result<Submitted, AppError> {
        require_permission(user, PROPOSALS.name, Action::Edit)?;
        ensure_mutable(proposal)?;
        let errors = fields.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let delta = session.delta();
        if delta.is_empty() && fields.is_empty() {
            log::debug!("proposal {}: nothing to save", proposal.id);
            return Ok(Submitted { attachments: proposal.attachments.clone(), files_dropped: false });
        }

        let update = AttachmentUpdate::new(fields_map(fields)?, delta);
        let submitted =
            submit_update(self.backend.as_ref(), AttachmentOwner::Proposal(proposal.id), &update, self.policy)
                .await?;
        fields.apply_to(proposal);
        proposal.attachments = submitted.attachments.clone();
        Ok(submitted)
    }

    /// Reconciliation for any owner. A proposal owner is fetched first so the
    /// lock applies to it as well.
    pub async fn reconcile_owner(
        &self,
        user: &User,
        owner: AttachmentOwner,
        session: &EditSession,
    ) -> Result<Submitted, AppError> {
        require_permission(user, owner.page().name, Action::Edit)?;
        if let AttachmentOwner::Proposal(id) = owner {
            let proposal = self.backend.get_proposal(id).await?;
            ensure_mutable(&proposal)?;
        }
        let delta = session.delta();
        if delta.is_empty() {
            return Ok(Submitted { attachments: session.snapshot().to_vec(), files_dropped: false });
        }
        let update = AttachmentUpdate::new(Map::new(), delta);
        submit_update(self.backend.as_ref(), owner, &update, self.policy).await
    }

    /// One save from the proposal screen, strictly ordered: amount
    /// bookkeeping, then the status transition, then reconciliation. A save
    /// that confirms the proposal refuses the reconciliation that follows;
    /// that refusal lands in `reconcile_error` next to the transition outcome.
    pub async fn apply_edit(
        &self,
        user: &User,
        proposal: &mut Proposal,
        edit: ProposalEdit,
    ) -> Result<EditOutcome, AppError> {
        require_permission(user, PROPOSALS.name, Action::Edit)?;
        ensure_mutable(proposal)?;
        let errors = edit.fields.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let mut outcome = EditOutcome::default();
        let amount = edit.fields.amount.unwrap_or(proposal.amount);
        outcome.amount_recorded = self.append_amount(proposal, amount).await?;

        if let Some(next) = edit.status {
            outcome.transition = Some(self.apply_transition(proposal, next).await?);
        }

        let session = edit.attachments.unwrap_or_else(|| EditSession::start(&proposal.attachments));
        if !edit.fields.is_empty() || !session.delta().is_empty() {
            match self.reconcile(user, proposal, &session, &edit.fields).await {
                Ok(submitted) => {
                    outcome.files_dropped = submitted.files_dropped;
                    outcome.attachments = Some(submitted.attachments);
                }
                Err(e) if outcome.transition.is_some() => {
                    log::debug!("proposal {}: reconciliation after status write refused: {e}", proposal.id);
                    outcome.reconcile_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }
}

fn fields_map(fields: &ProposalFields) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(fields)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Unexpected(format!("fields serialized to {other}"))),
    }
}
