use serde::{Deserialize, Serialize};

use crate::auth::permission::{Page, PROJECTS, PROPOSALS, TASKS};

/// Which attachment slot of the owning record a file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttachmentField {
    #[default]
    #[serde(rename = "attachments")]
    Attachments,
    #[serde(rename = "beforeAttachments")]
    Before,
    #[serde(rename = "afterAttachments")]
    After,
}

impl AttachmentField {
    pub const ALL: [AttachmentField; 3] =
        [AttachmentField::Attachments, AttachmentField::Before, AttachmentField::After];

    /// Multipart field name the file part is sent under.
    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentField::Attachments => "attachments",
            AttachmentField::Before => "beforeAttachments",
            AttachmentField::After => "afterAttachments",
        }
    }

    pub fn from_form_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// A stored file descriptor. `filename` is the server-assigned storage name
/// and the only identifier used for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub url: String,
    #[serde(default)]
    pub field: AttachmentField,
}

/// Body returned by every attachment update: the owner's list after
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentsResponse {
    pub attachments: Vec<Attachment>,
}

/// Record that owns an attachment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentOwner {
    Proposal(i64),
    Project(i64),
    Task(i64),
}

impl AttachmentOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            AttachmentOwner::Proposal(_) => "proposal",
            AttachmentOwner::Project(_) => "project",
            AttachmentOwner::Task(_) => "task",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            AttachmentOwner::Proposal(id) | AttachmentOwner::Project(id) | AttachmentOwner::Task(id) => *id,
        }
    }

    /// Page whose `edit` action guards changes to this owner's files.
    pub fn page(&self) -> &'static Page {
        match self {
            AttachmentOwner::Proposal(_) => &PROPOSALS,
            AttachmentOwner::Project(_) => &PROJECTS,
            AttachmentOwner::Task(_) => &TASKS,
        }
    }

    /// Collection path relative to the API base, e.g. `proposals/12`.
    pub fn api_path(&self) -> String {
        let collection = match self {
            AttachmentOwner::Proposal(_) => "proposals",
            AttachmentOwner::Project(_) => "projects",
            AttachmentOwner::Task(_) => "tasks",
        };
        format!("{collection}/{}", self.id())
    }
}

/// A file picked on the device that has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mimetype: String,
    pub bytes: Vec<u8>,
    pub field: AttachmentField,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mimetype: impl Into<String>, bytes: Vec<u8>) -> Self {
        LocalFile {
            name: name.into(),
            mimetype: mimetype.into(),
            bytes,
            field: AttachmentField::Attachments,
        }
    }

    pub fn in_field(mut self, field: AttachmentField) -> Self {
        self.field = field;
        self
    }
}
