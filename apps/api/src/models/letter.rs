use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two letter variants the synthesizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterType {
    CoverLetter,
    MotivationLetter,
}

impl LetterType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cover_letter" => Some(LetterType::CoverLetter),
            "motivation_letter" => Some(LetterType::MotivationLetter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterType::CoverLetter => "cover_letter",
            LetterType::MotivationLetter => "motivation_letter",
        }
    }

    /// Human-readable name used inside the generation prompt.
    pub fn display_name(&self) -> &'static str {
        match self {
            LetterType::CoverLetter => "cover letter",
            LetterType::MotivationLetter => "motivation letter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
        }
    }
}

/// One generated letter. Content is synthesized and stored at creation time
/// in both branches, but stays undeliverable until payment completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedLetter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub letter_type: LetterType,
    pub cv_upload_id: Uuid,
    pub job_desc_upload_id: Uuid,
    pub content: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedLetter {
    /// Withholds `content` unless payment has completed. Every letter that
    /// leaves the service passes through here.
    pub fn deliverable(mut self) -> Self {
        if self.payment_status != PaymentStatus::Completed {
            self.content = None;
        }
        self
    }
}
