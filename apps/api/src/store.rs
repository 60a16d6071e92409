use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::letter::{GeneratedLetter, LetterType, PaymentStatus};
use crate::models::upload::{DocumentType, Upload};
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted value no longer matches the domain model.
    #[error("invalid stored record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-user free-letter allowance.
#[async_trait]
pub trait EntitlementLedger: Send + Sync + 'static {
    /// Looks up a user by email, creating one with a single free letter when
    /// absent. Concurrent calls for the same email resolve to one user.
    async fn get_or_create(&self, email: &str) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Atomically consumes one free letter. Returns false when no credit
    /// remains; under concurrent calls at most one caller wins the last
    /// credit.
    async fn try_consume_free(&self, user_id: Uuid) -> Result<bool, StoreError>;
}

pub struct NewUpload {
    pub user_id: Uuid,
    pub document_type: DocumentType,
    pub file_type: String,
    pub original_filename: String,
    pub file_size: i64,
}

#[async_trait]
pub trait UploadStore: Send + Sync + 'static {
    async fn insert_upload(&self, upload: NewUpload) -> Result<Upload, StoreError>;

    async fn find_upload(&self, id: Uuid) -> Result<Option<Upload>, StoreError>;

    /// Newest first.
    async fn uploads_for_user(&self, user_id: Uuid) -> Result<Vec<Upload>, StoreError>;
}

pub struct NewLetter {
    pub user_id: Uuid,
    pub letter_type: LetterType,
    pub cv_upload_id: Uuid,
    pub job_desc_upload_id: Uuid,
    pub content: String,
    pub payment_status: PaymentStatus,
}

#[async_trait]
pub trait LetterStore: Send + Sync + 'static {
    async fn insert_letter(&self, letter: NewLetter) -> Result<GeneratedLetter, StoreError>;

    /// Stamps a gateway reference onto the user's newest pending letter that
    /// carries none yet. Returns false when no such letter exists.
    async fn attach_payment_reference(
        &self,
        user_id: Uuid,
        reference: &str,
    ) -> Result<bool, StoreError>;

    /// Marks pending letters carrying this reference as completed and
    /// returns the number of rows that changed. Already-completed letters
    /// are untouched, so repeating a reference changes nothing.
    async fn complete_by_reference(&self, reference: &str) -> Result<u64, StoreError>;

    /// Newest first.
    async fn letters_for_user(&self, user_id: Uuid) -> Result<Vec<GeneratedLetter>, StoreError>;
}

/// PostgreSQL implementation of all three store traits.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Enum columns are stored as text and validated into domain types on read.

#[derive(FromRow)]
struct UploadRow {
    id: Uuid,
    user_id: Uuid,
    document_type: String,
    file_type: String,
    original_filename: String,
    file_size: i64,
    created_at: DateTime<Utc>,
}

impl UploadRow {
    fn into_upload(self) -> Result<Upload, StoreError> {
        let document_type = DocumentType::parse(&self.document_type).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "upload {} has document_type '{}'",
                self.id, self.document_type
            ))
        })?;

        Ok(Upload {
            id: self.id,
            user_id: self.user_id,
            document_type,
            file_type: self.file_type,
            original_filename: self.original_filename,
            file_size: self.file_size,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct LetterRow {
    id: Uuid,
    user_id: Uuid,
    letter_type: String,
    cv_upload_id: Uuid,
    job_desc_upload_id: Uuid,
    content: Option<String>,
    payment_status: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl LetterRow {
    fn into_letter(self) -> Result<GeneratedLetter, StoreError> {
        let letter_type = LetterType::parse(&self.letter_type).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "letter {} has letter_type '{}'",
                self.id, self.letter_type
            ))
        })?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "letter {} has payment_status '{}'",
                self.id, self.payment_status
            ))
        })?;

        Ok(GeneratedLetter {
            id: self.id,
            user_id: self.user_id,
            letter_type,
            cv_upload_id: self.cv_upload_id,
            job_desc_upload_id: self.job_desc_upload_id,
            content: self.content,
            payment_status,
            payment_reference: self.payment_reference,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl EntitlementLedger for PgStore {
    async fn get_or_create(&self, email: &str) -> Result<User, StoreError> {
        if let Some(user) = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
        {
            return Ok(user);
        }

        // Two callers may race the insert; the conflict clause makes the
        // re-select below authoritative either way.
        sqlx::query(
            "INSERT INTO users (id, email, free_letters_remaining) VALUES ($1, $2, 1) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn try_consume_free(&self, user_id: Uuid) -> Result<bool, StoreError> {
        // Single conditional UPDATE so concurrent requests serialize in the
        // database; the counter cannot go below zero.
        let result = sqlx::query(
            "UPDATE users SET free_letters_remaining = free_letters_remaining - 1 \
             WHERE id = $1 AND free_letters_remaining > 0",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl UploadStore for PgStore {
    async fn insert_upload(&self, upload: NewUpload) -> Result<Upload, StoreError> {
        let row = sqlx::query_as::<_, UploadRow>(
            "INSERT INTO uploads (id, user_id, document_type, file_type, original_filename, file_size) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(upload.user_id)
        .bind(upload.document_type.as_str())
        .bind(&upload.file_type)
        .bind(&upload.original_filename)
        .bind(upload.file_size)
        .fetch_one(&self.pool)
        .await?;

        row.into_upload()
    }

    async fn find_upload(&self, id: Uuid) -> Result<Option<Upload>, StoreError> {
        let row = sqlx::query_as::<_, UploadRow>("SELECT * FROM uploads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UploadRow::into_upload).transpose()
    }

    async fn uploads_for_user(&self, user_id: Uuid) -> Result<Vec<Upload>, StoreError> {
        let rows = sqlx::query_as::<_, UploadRow>(
            "SELECT * FROM uploads WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UploadRow::into_upload).collect()
    }
}

#[async_trait]
impl LetterStore for PgStore {
    async fn insert_letter(&self, letter: NewLetter) -> Result<GeneratedLetter, StoreError> {
        let row = sqlx::query_as::<_, LetterRow>(
            "INSERT INTO generated_letters \
             (id, user_id, letter_type, cv_upload_id, job_desc_upload_id, content, payment_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(letter.user_id)
        .bind(letter.letter_type.as_str())
        .bind(letter.cv_upload_id)
        .bind(letter.job_desc_upload_id)
        .bind(&letter.content)
        .bind(letter.payment_status.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.into_letter()
    }

    async fn attach_payment_reference(
        &self,
        user_id: Uuid,
        reference: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE generated_letters SET payment_reference = $2 \
             WHERE id = (\
                 SELECT id FROM generated_letters \
                 WHERE user_id = $1 AND payment_status = 'pending' AND payment_reference IS NULL \
                 ORDER BY created_at DESC LIMIT 1\
             )",
        )
        .bind(user_id)
        .bind(reference)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete_by_reference(&self, reference: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE generated_letters SET payment_status = 'completed' \
             WHERE payment_reference = $1 AND payment_status = 'pending'",
        )
        .bind(reference)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn letters_for_user(&self, user_id: Uuid) -> Result<Vec<GeneratedLetter>, StoreError> {
        let rows = sqlx::query_as::<_, LetterRow>(
            "SELECT * FROM generated_letters WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LetterRow::into_letter).collect()
    }
}
