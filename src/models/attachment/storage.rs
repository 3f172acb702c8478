use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use rand::Rng;

use super::types::{Attachment, LocalFile};
use crate::errors::AppError;

/// Disk storage for uploaded attachments.
///
/// Files live flat under `root`, named `<unix-millis>-<16 hex>.<ext>`. The
/// root is provisioned by deployment and never created here: a missing root
/// is reported as `StorageUnavailable`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    public_url: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        FileStore {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_root(&self) -> Result<(), AppError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(AppError::StorageUnavailable(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(AppError::StorageUnavailable(
                format!("upload directory {} does not exist", self.root.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn put(&self, file: &LocalFile) -> Result<Attachment, AppError> {
        self.ensure_root().await?;
        let filename = storage_name(&file.name);
        let path = self.root.join(&filename);
        tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
            if e.kind() == IoErrorKind::NotFound {
                AppError::StorageUnavailable(format!("cannot write {}: {e}", path.display()))
            } else {
                AppError::from(e)
            }
        })?;
        log::debug!("stored {} as {}", file.name, filename);
        Ok(Attachment {
            url: format!("{}/{}", self.public_url, filename),
            filename,
            original_name: file.name.clone(),
            mimetype: file.mimetype.clone(),
            field: file.field,
        })
    }

    /// Store every file or none: on failure the files written so far are
    /// removed again.
    pub async fn put_all(&self, files: &[LocalFile]) -> Result<Vec<Attachment>, AppError> {
        let mut stored: Vec<Attachment> = Vec::with_capacity(files.len());
        for file in files {
            match self.put(file).await {
                Ok(a) => stored.push(a),
                Err(e) => {
                    self.remove_all(stored.iter().map(|a| a.filename.as_str())).await;
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Best-effort delete. Already-missing files are fine.
    pub async fn remove(&self, filename: &str) {
        if !is_plain_name(filename) {
            log::warn!("refusing to delete suspicious attachment name {filename:?}");
            return;
        }
        match tokio::fs::remove_file(self.root.join(filename)).await {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to delete attachment {filename}: {e}"),
        }
    }

    pub async fn remove_all<'a>(&self, filenames: impl IntoIterator<Item = &'a str>) {
        for filename in filenames {
            self.remove(filename).await;
        }
    }
}

fn is_plain_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
}

/// Generate a collision-resistant storage name, keeping a sane extension.
fn storage_name(original: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    let millis = chrono::Utc::now().timestamp_millis();
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) => format!("{millis}-{}.{ext}", hex::encode(bytes)),
        None => format!("{millis}-{}", hex::encode(bytes)),
    }
}
