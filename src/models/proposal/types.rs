use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::validate;
use crate::errors::AppError;
use crate::models::attachment::Attachment;

/// Sales status of a proposal. `Confirmed` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[default]
    Hot,
    Cold,
    Warm,
    Scrap,
    Confirmed,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 5] = [
        ProposalStatus::Hot,
        ProposalStatus::Cold,
        ProposalStatus::Warm,
        ProposalStatus::Scrap,
        ProposalStatus::Confirmed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Hot => "Hot",
            ProposalStatus::Cold => "Cold",
            ProposalStatus::Warm => "Warm",
            ProposalStatus::Scrap => "Scrap",
            ProposalStatus::Confirmed => "Confirmed",
        }
    }

    /// A locked proposal refuses every edit, transition and delete.
    pub fn is_locked(self) -> bool {
        self == ProposalStatus::Confirmed
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown proposal status '{s}'")))
    }
}

/// Service offered on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    Painting,
    Plumbing,
    Electrical,
    Carpentry,
    Cleaning,
    Renovation,
    Landscaping,
    Other,
}

impl Service {
    pub const ALL: [Service; 8] = [
        Service::Painting,
        Service::Plumbing,
        Service::Electrical,
        Service::Carpentry,
        Service::Cleaning,
        Service::Renovation,
        Service::Landscaping,
        Service::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Service::Painting => "Painting",
            Service::Plumbing => "Plumbing",
            Service::Electrical => "Electrical",
            Service::Carpentry => "Carpentry",
            Service::Cleaning => "Cleaning",
            Service::Renovation => "Renovation",
            Service::Landscaping => "Landscaping",
            Service::Other => "Other",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sv| sv.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown service '{s}'")))
    }
}

/// Full proposal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: i64,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub address: String,
    pub service: Service,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: String,
    pub amount: f64,
    /// Previously used amounts as formatted strings; append-only, no duplicates.
    #[serde(default)]
    pub amount_options: Vec<String>,
    pub status: ProposalStatus,
    #[serde(default)]
    pub comment: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Input for creating a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProposal {
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub address: String,
    pub service: Service,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: String,
    pub amount: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewProposal {
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = vec![];
        errors.extend(validate::validate_required(&self.customer_name, "Customer name", 200));
        errors.extend(validate::validate_optional_email(&self.customer_email));
        errors.extend(validate::validate_optional(&self.customer_phone, "Phone", 50));
        errors.extend(validate::validate_required(&self.address, "Address", 500));
        errors.extend(validate::validate_optional(&self.size, "Size", 100));
        errors.extend(validate::validate_amount(self.amount));
        errors
    }
}

/// Scalar fields sent alongside an attachment update. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Service>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl ProposalFields {
    pub fn is_empty(&self) -> bool {
        *self == ProposalFields::default()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = vec![];
        if let Some(name) = &self.customer_name {
            errors.extend(validate::validate_required(name, "Customer name", 200));
        }
        if let Some(email) = &self.customer_email {
            errors.extend(validate::validate_optional_email(email));
        }
        if let Some(phone) = &self.customer_phone {
            errors.extend(validate::validate_optional(phone, "Phone", 50));
        }
        if let Some(address) = &self.address {
            errors.extend(validate::validate_required(address, "Address", 500));
        }
        if let Some(size) = &self.size {
            errors.extend(validate::validate_optional(size, "Size", 100));
        }
        if let Some(amount) = self.amount {
            errors.extend(validate::validate_amount(amount));
        }
        errors
    }

    /// Apply the set fields to a local copy of the record.
    pub fn apply_to(&self, proposal: &mut Proposal) {
        if let Some(v) = &self.customer_name {
            proposal.customer_name = v.trim().to_string();
        }
        if let Some(v) = &self.customer_email {
            proposal.customer_email = v.trim().to_string();
        }
        if let Some(v) = &self.customer_phone {
            proposal.customer_phone = v.trim().to_string();
        }
        if let Some(v) = &self.address {
            proposal.address = v.trim().to_string();
        }
        if let Some(v) = self.service {
            proposal.service = v;
        }
        if let Some(v) = &self.description {
            proposal.description = v.clone();
        }
        if let Some(v) = &self.size {
            proposal.size = v.trim().to_string();
        }
        if let Some(v) = self.amount {
            proposal.amount = v;
        }
        if let Some(v) = &self.comment {
            proposal.comment = v.clone();
        }
        if let Some(v) = self.date {
            proposal.date = v;
        }
    }
}

/// Body of `PATCH proposal-by-id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProposalStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_options: Option<Vec<String>>,
}

impl ProposalPatch {
    pub fn status(status: ProposalStatus) -> Self {
        ProposalPatch { status: Some(status), amount_options: None }
    }

    pub fn amount_options(options: Vec<String>) -> Self {
        ProposalPatch { status: None, amount_options: Some(options) }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.amount_options.is_none()
    }
}

/// Response of `PATCH proposal-by-id`. `project_created` is set when the
/// status write made the backend create the Project itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    pub proposal: Proposal,
    #[serde(default)]
    pub project_created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&ProposalStatus::Confirmed).unwrap(), "\"Confirmed\"");
        assert_eq!("Warm".parse::<ProposalStatus>().unwrap(), ProposalStatus::Warm);
        assert!("Won".parse::<ProposalStatus>().is_err());
        assert!(ProposalStatus::Confirmed.is_locked());
        assert!(!ProposalStatus::Scrap.is_locked());
    }

    #[test]
    fn patch_response_flag_defaults_to_false() {
        let json = r#"{"proposal":{"id":3,"customerName":"Ada","address":"1 Main St",
            "service":"Painting","amount":1200,"status":"Confirmed","date":"2024-05-01"}}"#;
        let resp: PatchResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.project_created);
        assert_eq!(resp.proposal.status, ProposalStatus::Confirmed);
        assert!(resp.proposal.attachments.is_empty());
    }

    #[test]
    fn new_proposal_validation_lists_every_field() {
        let p = NewProposal {
            customer_name: " ".to_string(),
            customer_email: "nope".to_string(),
            customer_phone: String::new(),
            address: String::new(),
            service: Service::Cleaning,
            description: String::new(),
            size: String::new(),
            amount: -5.0,
            comment: String::new(),
            date: None,
        };
        assert_eq!(p.validate().len(), 4);
    }

    #[test]
    fn fields_serialize_only_what_changed() {
        let fields = ProposalFields { comment: Some("call back".into()), ..Default::default() };
        assert_eq!(serde_json::to_string(&fields).unwrap(), r#"{"comment":"call back"}"#);
        assert!(ProposalFields::default().is_empty());
    }
}
