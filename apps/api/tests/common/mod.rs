#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

use letterai_api::documents::DocumentStore;
use letterai_api::models::letter::{GeneratedLetter, LetterType, PaymentStatus};
use letterai_api::models::upload::Upload;
use letterai_api::models::user::User;
use letterai_api::payments::{
    InitializedPayment, PaymentError, PaymentGateway, PaymentVerification,
};
use letterai_api::routes::build_router;
use letterai_api::state::AppState;
use letterai_api::storage::{ObjectStorage, StorageError};
use letterai_api::store::{
    EntitlementLedger, LetterStore, NewLetter, NewUpload, StoreError, UploadStore,
};
use letterai_api::synthesis::{LetterSynthesizer, SynthesisError};
use letterai_api::workflow::LetterWorkflow;

pub const TEST_CALLBACK_URL: &str = "https://app.test/payment-complete";

/// In-memory stand-in for the Postgres store. Timestamps increase strictly
/// in insertion order so newest-first listings are deterministic.
pub struct InMemoryStore {
    users: Mutex<Vec<User>>,
    uploads: Mutex<Vec<Upload>>,
    letters: Mutex<Vec<GeneratedLetter>>,
    base_time: DateTime<Utc>,
    ticks: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            letters: Mutex::new(Vec::new()),
            base_time: Utc::now(),
            ticks: AtomicUsize::new(0),
        }
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) as i64;
        self.base_time + Duration::milliseconds(tick)
    }

    pub fn seed_user(&self, email: &str, free_letters_remaining: i32) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            free_letters_remaining,
            created_at: self.next_timestamp(),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.email == email)
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn free_letters_remaining(&self, user_id: Uuid) -> i32 {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.free_letters_remaining)
            .expect("user not seeded")
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn letters(&self) -> Vec<GeneratedLetter> {
        self.letters.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitlementLedger for InMemoryStore {
    async fn get_or_create(&self, email: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter().find(|user| user.email == email) {
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            free_letters_remaining: 1,
            created_at: self.next_timestamp(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn try_consume_free(&self, user_id: Uuid) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|user| user.id == user_id) {
            Some(user) if user.free_letters_remaining > 0 => {
                user.free_letters_remaining -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UploadStore for InMemoryStore {
    async fn insert_upload(&self, new: NewUpload) -> Result<Upload, StoreError> {
        let upload = Upload {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            document_type: new.document_type,
            file_type: new.file_type,
            original_filename: new.original_filename,
            file_size: new.file_size,
            created_at: self.next_timestamp(),
        };
        self.uploads.lock().unwrap().push(upload.clone());
        Ok(upload)
    }

    async fn find_upload(&self, id: Uuid) -> Result<Option<Upload>, StoreError> {
        Ok(self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .find(|upload| upload.id == id)
            .cloned())
    }

    async fn uploads_for_user(&self, user_id: Uuid) -> Result<Vec<Upload>, StoreError> {
        let mut uploads: Vec<Upload> = self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .filter(|upload| upload.user_id == user_id)
            .cloned()
            .collect();
        uploads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(uploads)
    }
}

#[async_trait]
impl LetterStore for InMemoryStore {
    async fn insert_letter(&self, new: NewLetter) -> Result<GeneratedLetter, StoreError> {
        let letter = GeneratedLetter {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            letter_type: new.letter_type,
            cv_upload_id: new.cv_upload_id,
            job_desc_upload_id: new.job_desc_upload_id,
            content: Some(new.content),
            payment_status: new.payment_status,
            payment_reference: None,
            created_at: self.next_timestamp(),
        };
        self.letters.lock().unwrap().push(letter.clone());
        Ok(letter)
    }

    async fn attach_payment_reference(
        &self,
        user_id: Uuid,
        reference: &str,
    ) -> Result<bool, StoreError> {
        let mut letters = self.letters.lock().unwrap();
        let target = letters
            .iter_mut()
            .filter(|letter| {
                letter.user_id == user_id
                    && letter.payment_status == PaymentStatus::Pending
                    && letter.payment_reference.is_none()
            })
            .max_by_key(|letter| letter.created_at);

        match target {
            Some(letter) => {
                letter.payment_reference = Some(reference.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete_by_reference(&self, reference: &str) -> Result<u64, StoreError> {
        let mut letters = self.letters.lock().unwrap();
        let mut changed = 0;
        for letter in letters.iter_mut() {
            if letter.payment_reference.as_deref() == Some(reference)
                && letter.payment_status == PaymentStatus::Pending
            {
                letter.payment_status = PaymentStatus::Completed;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn letters_for_user(&self, user_id: Uuid) -> Result<Vec<GeneratedLetter>, StoreError> {
        let mut letters: Vec<GeneratedLetter> = self
            .letters
            .lock()
            .unwrap()
            .iter()
            .filter(|letter| letter.user_id == user_id)
            .cloned()
            .collect();
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }
}

/// In-memory blob storage keyed like S3.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, (String, Bytes)>>,
}

impl FakeStorage {
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, bytes)| bytes.clone())
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        Ok(self.object(key))
    }

    async fn url_for(&self, key: &str) -> Result<String, StorageError> {
        Ok(format!("https://storage.test/{key}"))
    }
}

/// Records synthesis calls and returns canned letter text.
pub struct FakeSynthesizer {
    calls: AtomicUsize,
    last_inputs: Mutex<Option<(String, String, LetterType)>>,
}

impl FakeSynthesizer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_inputs: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_inputs(&self) -> Option<(String, String, LetterType)> {
        self.last_inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LetterSynthesizer for FakeSynthesizer {
    async fn synthesize(
        &self,
        cv_text: &str,
        job_description: &str,
        letter_type: LetterType,
    ) -> Result<String, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_inputs.lock().unwrap() = Some((
            cv_text.to_string(),
            job_description.to_string(),
            letter_type,
        ));
        Ok(format!(
            "Dear Hiring Manager,\n\nThis {} was generated for your application.",
            letter_type.display_name()
        ))
    }
}

/// Hands out sequential references and replays configured verification
/// outcomes (default: success).
pub struct FakePaymentGateway {
    init_calls: AtomicUsize,
    verify_calls: AtomicUsize,
    last_init: Mutex<Option<(String, Uuid, u32, String, String)>>,
    verify_outcomes: Mutex<HashMap<String, PaymentVerification>>,
}

impl FakePaymentGateway {
    pub fn new() -> Self {
        Self {
            init_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            last_init: Mutex::new(None),
            verify_outcomes: Mutex::new(HashMap::new()),
        }
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn last_init(&self) -> Option<(String, Uuid, u32, String, String)> {
        self.last_init.lock().unwrap().clone()
    }

    pub fn set_verify_outcome(&self, reference: &str, outcome: PaymentVerification) {
        self.verify_outcomes
            .lock()
            .unwrap()
            .insert(reference.to_string(), outcome);
    }
}

#[async_trait]
impl PaymentGateway for FakePaymentGateway {
    async fn initialize(
        &self,
        email: &str,
        user_id: Uuid,
        amount: u32,
        currency: &str,
        callback_url: &str,
    ) -> Result<InitializedPayment, PaymentError> {
        let n = self.init_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_init.lock().unwrap() = Some((
            email.to_string(),
            user_id,
            amount,
            currency.to_string(),
            callback_url.to_string(),
        ));
        Ok(InitializedPayment {
            authorization_url: format!("https://checkout.test/pay/{n}"),
            reference: format!("ref-{n}"),
        })
    }

    async fn verify(&self, reference: &str) -> Result<PaymentVerification, PaymentError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let outcomes = self.verify_outcomes.lock().unwrap();
        Ok(outcomes
            .get(reference)
            .cloned()
            .unwrap_or(PaymentVerification::Success))
    }
}

/// Full application wired against in-memory fakes, exercised through the
/// router with `oneshot` requests.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub storage: Arc<FakeStorage>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub payments: Arc<FakePaymentGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let storage = Arc::new(FakeStorage::default());
        let synthesizer = Arc::new(FakeSynthesizer::new());
        let payments = Arc::new(FakePaymentGateway::new());

        let documents = Arc::new(DocumentStore::new(store.clone(), storage.clone()));
        let workflow = Arc::new(LetterWorkflow::new(
            store.clone(),
            documents.clone(),
            store.clone(),
            synthesizer.clone(),
            payments.clone(),
            TEST_CALLBACK_URL.to_string(),
        ));

        let router = build_router(AppState {
            documents,
            workflow,
        });

        Self {
            router,
            store,
            storage,
            synthesizer,
            payments,
        }
    }

    pub async fn post_json(&self, path: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        document_type: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        self.upload_raw(&user_id.to_string(), document_type, filename, content_type, data)
            .await
    }

    pub async fn upload_raw(
        &self,
        user_id: &str,
        document_type: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend(data);
        body.extend(b"\r\n");

        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(b"Content-Disposition: form-data; name=\"user_id\"\r\n\r\n");
        body.extend(user_id.as_bytes());
        body.extend(b"\r\n");

        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(b"Content-Disposition: form-data; name=\"document_type\"\r\n\r\n");
        body.extend(document_type.as_bytes());
        body.extend(b"\r\n");

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        self.send(request).await
    }

    /// Multipart body with the text fields only, no file part.
    pub async fn upload_without_file(
        &self,
        user_id: Uuid,
        document_type: &str,
    ) -> (StatusCode, Value) {
        let boundary = format!("boundary-{}", Uuid::new_v4());
        let mut body = Vec::new();

        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(b"Content-Disposition: form-data; name=\"user_id\"\r\n\r\n");
        body.extend(user_id.to_string().as_bytes());
        body.extend(b"\r\n");

        body.extend(format!("--{boundary}\r\n").as_bytes());
        body.extend(b"Content-Disposition: form-data; name=\"document_type\"\r\n\r\n");
        body.extend(document_type.as_bytes());
        body.extend(b"\r\n");

        body.extend(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("response body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

/// Uploads one CV and one job description, returning both upload ids.
pub async fn upload_documents(app: &TestApp, user_id: Uuid) -> (String, String) {
    let (status, cv) = app
        .upload(
            user_id,
            "cv",
            "cv.pdf",
            "application/pdf",
            b"Experienced Rust engineer",
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, jd) = app
        .upload(
            user_id,
            "job_description",
            "role.pdf",
            "application/pdf",
            b"Backend role, Rust required",
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    (
        cv["data"]["id"].as_str().expect("cv upload id").to_string(),
        jd["data"]["id"].as_str().expect("jd upload id").to_string(),
    )
}

pub fn generate_payload(user_id: &str, letter_type: &str, cv_id: &str, job_desc_id: &str) -> Value {
    serde_json::json!({
        "userId": user_id,
        "letterType": letter_type,
        "cvId": cv_id,
        "jobDescId": job_desc_id
    })
}
