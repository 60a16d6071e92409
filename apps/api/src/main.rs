use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use letterai_api::config::Config;
use letterai_api::db::create_pool;
use letterai_api::documents::DocumentStore;
use letterai_api::payments::PaystackGateway;
use letterai_api::routes::build_router;
use letterai_api::state::AppState;
use letterai_api::storage::S3Storage;
use letterai_api::store::PgStore;
use letterai_api::synthesis::{self, AnthropicSynthesizer};
use letterai_api::workflow::LetterWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Letter AI API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL pool + migrations
    let db = create_pool(&config.database_url).await?;

    // S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let store = Arc::new(PgStore::new(db));
    let storage = Arc::new(S3Storage::new(s3, config.s3_bucket.clone()));
    let documents = Arc::new(DocumentStore::new(store.clone(), storage));

    let synthesizer = Arc::new(AnthropicSynthesizer::new(config.anthropic_api_key.clone()));
    info!("Anthropic client initialized (model: {})", synthesis::MODEL);

    let payments = Arc::new(PaystackGateway::new(config.paystack_secret_key.clone()));
    info!("Paystack client initialized");

    let workflow = Arc::new(LetterWorkflow::new(
        store.clone(),
        documents.clone(),
        store,
        synthesizer,
        payments,
        config.payment_callback_url.clone(),
    ));

    let state = AppState {
        documents,
        workflow,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds an S3 client against MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "letterai-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
