use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user keyed by email. Created on first contact with one free letter;
/// the counter only ever decreases.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub free_letters_remaining: i32,
    pub created_at: DateTime<Utc>,
}
