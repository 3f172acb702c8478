use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::attachment::Attachment;

/// Delivery status of a project. Deliberately a separate type from
/// `ProposalStatus`; the two sets share no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    Complete,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::New,
        ProjectStatus::InProgress,
        ProjectStatus::Done,
        ProjectStatus::Complete,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::New => "New",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Done => "Done",
            ProjectStatus::Complete => "Complete",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown project status '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    /// Set when the project was spawned by a confirmed proposal.
    #[serde(default)]
    pub proposal_id: Option<i64>,
    pub name: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
}
