use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::upload::{DocumentType, Upload};
use crate::storage::ObjectStorage;
use crate::store::{NewUpload, UploadStore};

/// MIME types accepted for uploaded documents.
const ALLOWED_FILE_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

pub struct StoredUpload {
    pub upload: Upload,
    pub url: String,
}

/// Uploaded CV and job-description documents: the blob lives at
/// `{user_id}/{document_type}/{filename}` with a metadata row alongside it.
pub struct DocumentStore {
    uploads: Arc<dyn UploadStore>,
    storage: Arc<dyn ObjectStorage>,
}

impl DocumentStore {
    pub fn new(uploads: Arc<dyn UploadStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { uploads, storage }
    }

    /// Validates and stores one document. The storage key is deterministic,
    /// so re-uploading the same filename for a user and type overwrites the
    /// previous bytes.
    pub async fn store(
        &self,
        user_id: Uuid,
        document_type: &str,
        filename: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<StoredUpload, AppError> {
        let document_type =
            DocumentType::parse(document_type).ok_or(AppError::InvalidDocumentType)?;

        if !ALLOWED_FILE_TYPES.contains(&mime_type) {
            return Err(AppError::UnsupportedFileType);
        }

        let key = object_key(user_id, document_type, filename);
        let file_size = bytes.len() as i64;

        self.storage.put(&key, bytes, mime_type).await?;
        let url = self.storage.url_for(&key).await?;

        let upload = match self
            .uploads
            .insert_upload(NewUpload {
                user_id,
                document_type,
                file_type: mime_type.to_string(),
                original_filename: filename.to_string(),
                file_size,
            })
            .await
        {
            Ok(upload) => upload,
            Err(err) => {
                // The blob landed but the metadata row did not.
                warn!("metadata insert failed, orphaned blob at {key}: {err}");
                return Err(err.into());
            }
        };

        info!(
            "stored {} ({file_size} bytes) at {key}",
            upload.original_filename
        );

        Ok(StoredUpload { upload, url })
    }

    /// Resolves an upload reference to text. The upload must belong to the
    /// user and match the requested document type. Stored bytes are decoded
    /// as UTF-8 text, lossily for binary formats.
    pub async fn fetch_text(
        &self,
        user_id: Uuid,
        document_type: DocumentType,
        upload_id: Uuid,
    ) -> Result<String, AppError> {
        let upload = self
            .uploads
            .find_upload(upload_id)
            .await?
            .filter(|upload| upload.user_id == user_id && upload.document_type == document_type)
            .ok_or_else(|| missing(document_type))?;

        let key = object_key(user_id, document_type, &upload.original_filename);
        let bytes = self
            .storage
            .get(&key)
            .await?
            .ok_or_else(|| missing(document_type))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Newest first, for the dashboard.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Upload>, AppError> {
        Ok(self.uploads.uploads_for_user(user_id).await?)
    }
}

fn object_key(user_id: Uuid, document_type: DocumentType, filename: &str) -> String {
    format!("{user_id}/{document_type}/{filename}")
}

fn missing(document_type: DocumentType) -> AppError {
    let message = match document_type {
        DocumentType::Cv => "CV file not found",
        DocumentType::JobDescription => "Job description file not found",
    };
    AppError::DocumentNotFound(message.to_string())
}
