//! Filesystem storage for uploaded user images.

use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

/// An uploaded image as received from a multipart request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    /// Extension taken from the client-supplied filename
    pub extension: String,
}

/// Stores user images on disk under a configured root directory.
///
/// Filenames are `<unix-timestamp>.<extension>`; two uploads within the
/// same second collide. Known weakness inherited from the external
/// contract, left unchanged.
#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist an upload and return the generated filename.
    pub async fn save(&self, upload: &ImageUpload) -> AppResult<String> {
        let extension = sanitize_extension(&upload.extension)?;
        let filename = format!("{}.{}", chrono::Utc::now().timestamp(), extension);

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&filename), &upload.data).await?;

        tracing::debug!("Stored image {}", filename);
        Ok(filename)
    }

    /// Delete a stored image if it exists on disk. A missing file is
    /// not an error (the record may reference an already-removed file).
    pub async fn remove(&self, filename: &str) -> AppResult<()> {
        let path = self.path_of(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted image {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::from(e)),
        }
    }

    /// Check whether a stored image is present on disk.
    pub async fn exists(&self, filename: &str) -> bool {
        match self.path_of(filename) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Resolve a stored filename, rejecting anything that would escape
    /// the storage root.
    fn path_of(&self, filename: &str) -> AppResult<PathBuf> {
        let name = Path::new(filename);
        if name.components().count() != 1 || filename.contains("..") {
            return Err(AppError::bad_request("Invalid image filename"));
        }
        Ok(self.root.join(name))
    }
}

/// Keep only plain alphanumeric extensions so the client-supplied
/// filename cannot smuggle path components.
fn sanitize_extension(extension: &str) -> AppResult<&str> {
    if extension.is_empty()
        || extension.len() > 10
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AppError::bad_request("Unsupported image extension"));
    }
    Ok(extension)
}
