use anyhow::Context;
use gh_user_summary::application::use_cases::aggregate_user_data::AggregateUserDataInteractor;
use gh_user_summary::config::Config;
use gh_user_summary::infrastructures::adapters::primary::web::{AppState, create_router};
use gh_user_summary::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use gh_user_summary::infrastructures::adapters::secondary::identity::github_oauth::{
    GitHubOAuthAdapter, GitHubOAuthSettings,
};
use gh_user_summary::infrastructures::adapters::secondary::sessions::in_memory::InMemorySessionStore;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be populated
    dotenvy::dotenv().ok();

    // Initialize tracing; spans are exported only when a collector is configured
    let provider = if env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()
            .context("Failed to create OTLP exporter")?;
        Some(
            SdkTracerProvider::builder()
                .with_batch_exporter(otlp_exporter)
                .build(),
        )
    } else {
        None
    };
    let telemetry = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("gh-user-summary")));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let initialize_span = info_span!("initialize");
    let initialize_guard = initialize_span.enter();
    info!("Application starting");

    let config = Config::from_env().context("Failed to load configuration")?;

    // Build dependencies
    let github_api_adapter = Arc::new(GitHubApiAdapter::with_per_page(
        config.github_api_base_url.clone(),
        config.github_per_page,
    ));
    let use_case = Arc::new(AggregateUserDataInteractor::with_concurrency(
        github_api_adapter,
        config.commit_fetch_concurrency,
    ));
    let identity_provider = Arc::new(GitHubOAuthAdapter::new(GitHubOAuthSettings {
        client_id: config.github_client_id.clone(),
        client_secret: config.github_client_secret.clone(),
        callback_url: config.github_callback_url.clone(),
        oauth_base_url: config.github_oauth_base_url.clone(),
        api_base_url: config.github_api_base_url.clone(),
    }));
    let app_state = Arc::new(AppState {
        use_case,
        identity_provider,
        sessions: Arc::new(InMemorySessionStore::with_ttl(config.session_ttl)),
        public_dir: config.public_dir.clone(),
        secure_cookies: config.session_cookie_secure,
        session_ttl: config.session_ttl,
    });

    // Create router
    let app = create_router(app_state);

    drop(initialize_guard);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .instrument(initialize_span.clone())
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    initialize_span.in_scope(|| info!("Listening on http://{}", local_addr));

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Flush batched spans before exiting
    if let Some(Err(e)) = provider.map(|provider| provider.shutdown()) {
        tracing::error!("Failed to shut down tracer provider: {}", e);
    }

    served.context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
