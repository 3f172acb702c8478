//! Shared test infrastructure: an in-memory recording [`Backend`] plus
//! fixtures for users and proposals.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use homedesk::auth::evaluator::User;
use homedesk::auth::permission::{Actions, PagePermission, PROPOSALS, PROJECTS, ROLES, TASKS};
use homedesk::client::{AttachmentUpdate, Backend, RetryPolicy};
use homedesk::errors::{AppError, ErrorKind};
use homedesk::models::attachment::{Attachment, AttachmentField, AttachmentOwner, apply_reconciliation};
use homedesk::models::project::{Project, ProjectStatus};
use homedesk::models::proposal::{
    NewProposal, PatchResponse, Proposal, ProposalPatch, ProposalStatus, Service,
    merge_amount_options,
};
use homedesk::models::role::{Role, RoleForm};

// ============================================================================
// RECORDED CALLS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetProposal(i64),
    CreateProposal,
    Patch(i64, ProposalPatch),
    DeleteProposal(i64),
    CreateProject(i64),
    UpdateAttachments {
        owner: AttachmentOwner,
        remove: Vec<String>,
        files: usize,
    },
    ListRoles,
    CreateRole(String),
    UpdateRole(i64),
    DeleteRole(i64),
}

// ============================================================================
// MOCK BACKEND
// ============================================================================

#[derive(Default)]
struct State {
    proposals: HashMap<i64, Proposal>,
    owner_attachments: HashMap<AttachmentOwner, Vec<Attachment>>,
    projects: HashMap<i64, i64>,
    roles: Vec<Role>,
    calls: Vec<Call>,
    update_failures: VecDeque<ErrorKind>,
    project_failure: Option<ErrorKind>,
    next_id: i64,
}

/// Behaves like the reference server: confirmed proposals are locked, the
/// status write may create the project itself, and attachment updates are
/// reconciled against the stored list.
pub struct MockBackend {
    auto_create: bool,
    state: Mutex<State>,
}

impl MockBackend {
    pub fn new(auto_create: bool) -> Self {
        MockBackend {
            auto_create,
            state: Mutex::new(State { next_id: 100, ..Default::default() }),
        }
    }

    pub fn with_proposal(self, proposal: Proposal) -> Self {
        self.state.lock().unwrap().proposals.insert(proposal.id, proposal);
        self
    }

    pub fn with_owner_attachments(self, owner: AttachmentOwner, list: Vec<Attachment>) -> Self {
        self.state.lock().unwrap().owner_attachments.insert(owner, list);
        self
    }

    /// Fail the next attachment updates with these kinds, in order.
    pub fn fail_updates(&self, kinds: &[ErrorKind]) {
        self.state.lock().unwrap().update_failures.extend(kinds.iter().copied());
    }

    pub fn fail_project_creation(&self, kind: ErrorKind) {
        self.state.lock().unwrap().project_failure = Some(kind);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn project_creations(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateProject(_)))
    }

    pub fn stored_proposal(&self, id: i64) -> Option<Proposal> {
        self.state.lock().unwrap().proposals.get(&id).cloned()
    }

    pub fn projects_for(&self, proposal_id: i64) -> usize {
        let state = self.state.lock().unwrap();
        state.projects.values().filter(|p| **p == proposal_id).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn fail(kind: ErrorKind) -> AppError {
    AppError::from_kind(kind, format!("scripted {}", kind.as_str()))
}

fn locked(id: i64) -> AppError {
    AppError::LockedRecord(format!("proposal {id} is confirmed"))
}

#[async_trait]
impl Backend for MockBackend {
    async fn get_proposal(&self, id: i64) -> Result<Proposal, AppError> {
        self.record(Call::GetProposal(id));
        self.stored_proposal(id).ok_or(AppError::NotFound)
    }

    async fn create_proposal(&self, proposal: &NewProposal) -> Result<Proposal, AppError> {
        self.record(Call::CreateProposal);
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let created = Proposal {
            id: state.next_id,
            customer_name: proposal.customer_name.clone(),
            customer_email: proposal.customer_email.clone(),
            customer_phone: proposal.customer_phone.clone(),
            address: proposal.address.clone(),
            service: proposal.service,
            description: proposal.description.clone(),
            size: proposal.size.clone(),
            amount: proposal.amount,
            amount_options: Vec::new(),
            status: ProposalStatus::Hot,
            comment: proposal.comment.clone(),
            date: proposal.date.unwrap_or_else(today),
            attachments: Vec::new(),
        };
        state.proposals.insert(created.id, created.clone());
        Ok(created)
    }

    async fn patch_proposal(&self, id: i64, patch: &ProposalPatch) -> Result<PatchResponse, AppError> {
        self.record(Call::Patch(id, patch.clone()));
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let project_id = state.next_id;
        let proposal = state.proposals.get_mut(&id).ok_or(AppError::NotFound)?;
        if proposal.status.is_locked() {
            return Err(locked(id));
        }
        if let Some(options) = &patch.amount_options {
            proposal.amount_options = merge_amount_options(&proposal.amount_options, options);
        }
        let mut project_created = false;
        if let Some(status) = patch.status {
            proposal.status = status;
            project_created = status == ProposalStatus::Confirmed && self.auto_create;
        }
        let snapshot = proposal.clone();
        if project_created {
            state.projects.insert(project_id, id);
        }
        Ok(PatchResponse { proposal: snapshot, project_created })
    }

    async fn delete_proposal(&self, id: i64) -> Result<(), AppError> {
        self.record(Call::DeleteProposal(id));
        let mut state = self.state.lock().unwrap();
        match state.proposals.get(&id) {
            None => Err(AppError::NotFound),
            Some(p) if p.status.is_locked() => Err(locked(id)),
            Some(_) => {
                state.proposals.remove(&id);
                Ok(())
            }
        }
    }

    async fn create_project_from_proposal(&self, proposal_id: i64) -> Result<Project, AppError> {
        self.record(Call::CreateProject(proposal_id));
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.project_failure.take() {
            return Err(fail(kind));
        }
        if state.projects.values().any(|p| *p == proposal_id) {
            return Err(AppError::Conflict(format!("project exists for proposal {proposal_id}")));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.projects.insert(id, proposal_id);
        Ok(Project {
            id,
            proposal_id: Some(proposal_id),
            name: format!("project for {proposal_id}"),
            status: ProjectStatus::New,
            created_at: chrono::Utc::now(),
            attachments: Vec::new(),
        })
    }

    async fn update_attachments(
        &self,
        owner: AttachmentOwner,
        update: &AttachmentUpdate,
    ) -> Result<Vec<Attachment>, AppError> {
        self.record(Call::UpdateAttachments {
            owner,
            remove: update.remove.clone(),
            files: update.add.len(),
        });
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.update_failures.pop_front() {
            return Err(fail(kind));
        }

        let stored: Vec<Attachment> = update
            .add
            .iter()
            .enumerate()
            .map(|(i, f)| Attachment {
                filename: format!("s{i}-{}", f.name),
                original_name: f.name.clone(),
                mimetype: f.mimetype.clone(),
                url: format!("/uploads/s{i}-{}", f.name),
                field: f.field,
            })
            .collect();

        match owner {
            AttachmentOwner::Proposal(id) => {
                let proposal = state.proposals.get_mut(&id).ok_or(AppError::NotFound)?;
                if proposal.status.is_locked() {
                    return Err(locked(id));
                }
                if let Some(comment) = update.fields.get("comment").and_then(|v| v.as_str()) {
                    proposal.comment = comment.to_string();
                }
                proposal.attachments = apply_reconciliation(&proposal.attachments, &update.remove, stored);
                Ok(proposal.attachments.clone())
            }
            other => {
                let list = state.owner_attachments.entry(other).or_default();
                *list = apply_reconciliation(list, &update.remove, stored);
                Ok(list.clone())
            }
        }
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.record(Call::ListRoles);
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn create_role(&self, form: &RoleForm) -> Result<Role, AppError> {
        self.record(Call::CreateRole(form.name.clone()));
        let mut state = self.state.lock().unwrap();
        if state.roles.iter().any(|r| r.name == form.name) {
            return Err(AppError::Conflict(format!("A role named '{}' already exists", form.name)));
        }
        state.next_id += 1;
        let role = Role { id: state.next_id, name: form.name.clone(), permissions: form.permissions.clone() };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn update_role(&self, id: i64, form: &RoleForm) -> Result<Role, AppError> {
        self.record(Call::UpdateRole(id));
        let mut state = self.state.lock().unwrap();
        let role = state.roles.iter_mut().find(|r| r.id == id).ok_or(AppError::NotFound)?;
        role.name = form.name.clone();
        role.permissions = form.permissions.clone();
        Ok(role.clone())
    }

    async fn delete_role(&self, id: i64) -> Result<(), AppError> {
        self.record(Call::DeleteRole(id));
        let mut state = self.state.lock().unwrap();
        let before = state.roles.len();
        state.roles.retain(|r| r.id != id);
        if state.roles.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

/// Retries without waiting.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy { delay: Duration::ZERO, ..RetryPolicy::default() }
}

pub fn attachment(name: &str) -> Attachment {
    Attachment {
        filename: format!("{name}-stored"),
        original_name: name.to_string(),
        mimetype: "application/pdf".to_string(),
        url: format!("/uploads/{name}-stored"),
        field: AttachmentField::Attachments,
    }
}

pub fn proposal(id: i64, status: ProposalStatus) -> Proposal {
    Proposal {
        id,
        customer_name: "Ada Lovelace".to_string(),
        customer_email: "ada@example.com".to_string(),
        customer_phone: String::new(),
        address: "1 Analytical Way".to_string(),
        service: Service::Painting,
        description: "Living room".to_string(),
        size: "40 m2".to_string(),
        amount: 2500.0,
        amount_options: vec!["2500".to_string()],
        status,
        comment: String::new(),
        date: today(),
        attachments: vec![attachment("quote.pdf"), attachment("plan.pdf")],
    }
}

/// Sales user: full rights on proposals, projects and tasks.
pub fn sales_user() -> User {
    let role = Role {
        id: 2,
        name: "Sales".to_string(),
        permissions: vec![
            PagePermission::for_page(&PROPOSALS, Actions::ALL),
            PagePermission::for_page(&PROJECTS, Actions::ALL),
            PagePermission::for_page(&TASKS, Actions::ALL),
        ],
    };
    User::with_role(10, "sam", Some(&role))
}

/// Can look at proposals, nothing else.
pub fn viewer_user() -> User {
    let role = Role {
        id: 3,
        name: "Viewer".to_string(),
        permissions: vec![PagePermission::for_page(
            &PROPOSALS,
            Actions { view: true, ..Actions::NONE },
        )],
    };
    User::with_role(11, "vic", Some(&role))
}

pub fn role_manager() -> User {
    let role = Role {
        id: 4,
        name: "Role manager".to_string(),
        permissions: vec![PagePermission::for_page(&ROLES, Actions::ALL)],
    };
    User::with_role(12, "rita", Some(&role))
}
