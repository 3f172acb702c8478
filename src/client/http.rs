//! reqwest implementation of [`Backend`] against the homedesk REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::backend::{AttachmentUpdate, Backend};
use crate::config::Config;
use crate::errors::{AppError, classify_response};
use crate::models::attachment::{Attachment, AttachmentOwner, AttachmentsResponse};
use crate::models::project::Project;
use crate::models::proposal::{NewProposal, PatchResponse, Proposal, ProposalPatch};
use crate::models::role::{Role, RoleForm};

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpBackend {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    /// Bearer token obtained by the host application's login flow.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Turn a response into `T`, classifying any non-success status.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, AppError> {
    let resp = check(resp).await?;
    resp.json::<T>()
        .await
        .map_err(|e| AppError::Unexpected(format!("decode: {e}")))
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    let err = classify_response(status.as_u16(), &body);
    log::debug!("{url} -> {status}: {err}");
    Err(err)
}

fn multipart_form(update: &AttachmentUpdate) -> Result<Form, AppError> {
    let mut form = Form::new()
        .text("data", serde_json::to_string(&update.fields)?)
        .text("removeAttachments", serde_json::to_string(&update.remove)?);
    for file in &update.add {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mimetype)
            .map_err(|_| AppError::validation(format!("Invalid file type '{}'", file.mimetype)))?;
        form = form.part(file.field.as_str(), part);
    }
    Ok(form)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_proposal(&self, id: i64) -> Result<Proposal, AppError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("proposals/{id}"))
            .send()
            .await?;
        decode(resp).await
    }

    async fn create_proposal(&self, proposal: &NewProposal) -> Result<Proposal, AppError> {
        let resp = self
            .request(reqwest::Method::POST, "proposals")
            .json(proposal)
            .send()
            .await?;
        decode(resp).await
    }

    async fn patch_proposal(&self, id: i64, patch: &ProposalPatch) -> Result<PatchResponse, AppError> {
        let resp = self
            .request(reqwest::Method::PATCH, &format!("proposals/{id}"))
            .json(patch)
            .send()
            .await?;
        decode(resp).await
    }

    async fn delete_proposal(&self, id: i64) -> Result<(), AppError> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("proposals/{id}"))
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn create_project_from_proposal(&self, proposal_id: i64) -> Result<Project, AppError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("projects/from-proposal/{proposal_id}"))
            .send()
            .await?;
        decode(resp).await
    }

    async fn update_attachments(
        &self,
        owner: AttachmentOwner,
        update: &AttachmentUpdate,
    ) -> Result<Vec<Attachment>, AppError> {
        let form = multipart_form(update)?;
        let resp = self
            .request(reqwest::Method::PUT, &owner.api_path())
            .multipart(form)
            .send()
            .await?;
        let body: AttachmentsResponse = decode(resp).await?;
        Ok(body.attachments)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let resp = self.request(reqwest::Method::GET, "roles").send().await?;
        decode(resp).await
    }

    async fn create_role(&self, form: &RoleForm) -> Result<Role, AppError> {
        let resp = self
            .request(reqwest::Method::POST, "roles")
            .json(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn update_role(&self, id: i64, form: &RoleForm) -> Result<Role, AppError> {
        let resp = self
            .request(reqwest::Method::PUT, &format!("roles/{id}"))
            .json(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn delete_role(&self, id: i64) -> Result<(), AppError> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("roles/{id}"))
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attachment::LocalFile;

    #[test]
    fn urls_are_joined_without_double_slashes() {
        let backend = HttpBackend::new("http://localhost:8080/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.url("/proposals/4"), "http://localhost:8080/api/proposals/4");
        assert_eq!(
            backend.url(&AttachmentOwner::Task(9).api_path()),
            "http://localhost:8080/api/tasks/9"
        );
    }

    #[test]
    fn bad_mimetype_is_a_validation_error() {
        let update = AttachmentUpdate {
            add: vec![LocalFile::new("a.bin", "not a mime", vec![0])],
            ..Default::default()
        };
        let err = multipart_form(&update).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);
    }
}
