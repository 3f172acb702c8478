use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::attachment::{Attachment, AttachmentDelta, AttachmentOwner, LocalFile};
use crate::models::project::Project;
use crate::models::proposal::{NewProposal, PatchResponse, Proposal, ProposalPatch};
use crate::models::role::{Role, RoleForm};

/// One multipart update: scalar fields, the removal manifest and new files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentUpdate {
    pub fields: Map<String, Value>,
    pub remove: Vec<String>,
    pub add: Vec<LocalFile>,
}

impl AttachmentUpdate {
    pub fn new(fields: Map<String, Value>, delta: AttachmentDelta) -> Self {
        AttachmentUpdate {
            fields,
            remove: delta.to_remove,
            add: delta.to_add,
        }
    }

    pub fn has_files(&self) -> bool {
        !self.add.is_empty()
    }

    /// The same logical update with the file parts dropped.
    pub fn without_files(&self) -> Self {
        AttachmentUpdate {
            fields: self.fields.clone(),
            remove: self.remove.clone(),
            add: Vec::new(),
        }
    }
}

/// Remote persistence collaborator. Every call resolves to a success value or
/// a classified [`AppError`].
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_proposal(&self, id: i64) -> Result<Proposal, AppError>;

    async fn create_proposal(&self, proposal: &NewProposal) -> Result<Proposal, AppError>;

    /// Write status and/or amount options. The response says whether the
    /// backend created the Project on its own.
    async fn patch_proposal(&self, id: i64, patch: &ProposalPatch) -> Result<PatchResponse, AppError>;

    async fn delete_proposal(&self, id: i64) -> Result<(), AppError>;

    async fn create_project_from_proposal(&self, proposal_id: i64) -> Result<Project, AppError>;

    /// Multipart update of an owner's scalar fields and attachment list.
    /// Returns the list after the server reconciled it.
    async fn update_attachments(
        &self,
        owner: AttachmentOwner,
        update: &AttachmentUpdate,
    ) -> Result<Vec<Attachment>, AppError>;

    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;

    async fn create_role(&self, form: &RoleForm) -> Result<Role, AppError>;

    async fn update_role(&self, id: i64, form: &RoleForm) -> Result<Role, AppError>;

    async fn delete_role(&self, id: i64) -> Result<(), AppError>;
}
