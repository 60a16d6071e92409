use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::documents::DocumentStore;
use crate::errors::AppError;
use crate::models::letter::{GeneratedLetter, LetterType, PaymentStatus};
use crate::models::upload::{DocumentType, Upload};
use crate::payments::{InitializedPayment, PaymentGateway, PaymentVerification};
use crate::store::{EntitlementLedger, LetterStore, NewLetter};
use crate::synthesis::LetterSynthesizer;

/// Price of one letter in minor currency units (R4.99).
pub const LETTER_PRICE: u32 = 499;
pub const LETTER_CURRENCY: &str = "ZAR";
pub const FREE_TIER_MESSAGE: &str = "You have a free letter available!";

pub enum PaymentInitOutcome {
    /// The user still has free credit; no transaction needed.
    FreeTier,
    Redirect(InitializedPayment),
}

pub enum PaymentConfirmation {
    Verified,
    Declined { gateway_message: String },
}

pub struct Dashboard {
    pub uploads: Vec<Upload>,
    pub letters: Vec<GeneratedLetter>,
}

/// Orchestrates a letter request end to end: entitlement check, document
/// retrieval, synthesis, persistence, and the paid-unlock flow around it.
pub struct LetterWorkflow {
    ledger: Arc<dyn EntitlementLedger>,
    documents: Arc<DocumentStore>,
    letters: Arc<dyn LetterStore>,
    synthesizer: Arc<dyn LetterSynthesizer>,
    payments: Arc<dyn PaymentGateway>,
    callback_url: String,
}

impl LetterWorkflow {
    pub fn new(
        ledger: Arc<dyn EntitlementLedger>,
        documents: Arc<DocumentStore>,
        letters: Arc<dyn LetterStore>,
        synthesizer: Arc<dyn LetterSynthesizer>,
        payments: Arc<dyn PaymentGateway>,
        callback_url: String,
    ) -> Self {
        Self {
            ledger,
            documents,
            letters,
            synthesizer,
            payments,
            callback_url,
        }
    }

    /// Generates a letter from two previously uploaded documents.
    ///
    /// Free credit is consumed up front and decides the branch: a consumed
    /// credit completes the letter immediately, otherwise the record stays
    /// pending until payment is verified. Content is synthesized and stored
    /// in both branches so verification never re-runs synthesis; the
    /// returned record withholds it while pending.
    pub async fn request_letter(
        &self,
        user_id: Uuid,
        letter_type: &str,
        cv_upload_id: Uuid,
        job_desc_upload_id: Uuid,
    ) -> Result<GeneratedLetter, AppError> {
        let letter_type = LetterType::parse(letter_type).ok_or(AppError::InvalidLetterType)?;

        let user = self
            .ledger
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let free_granted = self.ledger.try_consume_free(user.id).await?;

        let cv_text = self
            .documents
            .fetch_text(user.id, DocumentType::Cv, cv_upload_id)
            .await?;
        let job_description = self
            .documents
            .fetch_text(user.id, DocumentType::JobDescription, job_desc_upload_id)
            .await?;

        let content = self
            .synthesizer
            .synthesize(&cv_text, &job_description, letter_type)
            .await?;

        let payment_status = if free_granted {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        };

        let letter = self
            .letters
            .insert_letter(NewLetter {
                user_id: user.id,
                letter_type,
                cv_upload_id,
                job_desc_upload_id,
                content,
                payment_status,
            })
            .await?;

        info!(
            "letter {} generated for user {} ({})",
            letter.id,
            user.id,
            letter.payment_status.as_str()
        );

        Ok(letter.deliverable())
    }

    /// Decides between the free tier and a gateway transaction for this
    /// email, creating the user on first contact.
    pub async fn initialize_payment(&self, email: &str) -> Result<PaymentInitOutcome, AppError> {
        let user = self.ledger.get_or_create(email).await?;

        if user.free_letters_remaining > 0 {
            return Ok(PaymentInitOutcome::FreeTier);
        }

        let payment = self
            .payments
            .initialize(email, user.id, LETTER_PRICE, LETTER_CURRENCY, &self.callback_url)
            .await
            .map_err(AppError::PaymentInit)?;

        // Stamp the reference on the letter awaiting payment; verification
        // completes it by this reference later.
        let attached = self
            .letters
            .attach_payment_reference(user.id, &payment.reference)
            .await?;
        if !attached {
            warn!(
                "payment {} initialized for user {} with no pending letter to attach",
                payment.reference, user.id
            );
        }

        info!("payment {} initialized for user {}", payment.reference, user.id);

        Ok(PaymentInitOutcome::Redirect(payment))
    }

    /// Verifies a gateway reference and completes the matching pending
    /// letters. Safe to repeat: a completed letter is never re-processed.
    pub async fn confirm_payment(&self, reference: &str) -> Result<PaymentConfirmation, AppError> {
        let verification = self
            .payments
            .verify(reference)
            .await
            .map_err(AppError::PaymentVerify)?;

        match verification {
            PaymentVerification::Success => {
                // A failed status write is logged, not escalated; the next
                // verification call retries the transition.
                match self.letters.complete_by_reference(reference).await {
                    Ok(count) => {
                        info!("payment {reference} verified, {count} letter(s) completed")
                    }
                    Err(err) => {
                        error!("payment {reference} verified but status update failed: {err}")
                    }
                }
                Ok(PaymentConfirmation::Verified)
            }
            PaymentVerification::Failed { gateway_message } => {
                info!("payment {reference} not successful: {gateway_message}");
                Ok(PaymentConfirmation::Declined { gateway_message })
            }
        }
    }

    /// Uploads and letters for one user, newest first. Pending letters keep
    /// their content withheld.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<Dashboard, AppError> {
        let uploads = self.documents.list_for_user(user_id).await?;
        let letters = self
            .letters
            .letters_for_user(user_id)
            .await?
            .into_iter()
            .map(GeneratedLetter::deliverable)
            .collect();

        Ok(Dashboard { uploads, letters })
    }
}
