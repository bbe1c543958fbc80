use crate::{
    cli::globals::GlobalArgs,
    rag::{HttpCompleter, HttpEmbedder, HttpRetriever},
    store::{MemoryUserStore, UserStore},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod error;
pub mod handlers;

use handlers::{
    auth::{self, AuthConfig, AuthState, TokenKeys},
    chat::{self, ChatContext},
    health,
};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Shared state handed to the router; tests build this with fakes.
pub struct AppContext {
    pub auth: Arc<AuthState>,
    pub store: Arc<dyn UserStore>,
    pub chat: Arc<ChatContext>,
}

/// Build the application router with all routes and state extensions.
#[must_use]
pub fn router(context: &AppContext) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/chat", post(chat::chat))
        .layer(
            ServiceBuilder::new()
                .layer(axum::Extension(context.auth.clone()))
                .layer(axum::Extension(context.store.clone()))
                .layer(axum::Extension(context.chat.clone())),
        )
}

async fn root() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn serve(port: u16, frontend_url: &str, globals: &GlobalArgs) -> Result<()> {
    let keys = TokenKeys::new(globals.access_secret.clone(), globals.refresh_secret.clone());
    let auth_state = Arc::new(AuthState::new(
        AuthConfig::new(frontend_url.to_string()),
        keys,
    ));
    let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    let chat_context = Arc::new(ChatContext {
        embedder: Arc::new(HttpEmbedder::new(globals.embedding_url.clone())?),
        retriever: Arc::new(HttpRetriever::new(globals.retrieval_url.clone())?),
        completer: Arc::new(HttpCompleter::new(
            globals.completion_url.clone(),
            globals.completion_model.clone(),
            globals.completion_api_key.clone(),
        )?),
    });
    let context = AppContext {
        auth: auth_state,
        store,
        chat: chat_context,
    };

    let frontend_origin = frontend_origin(frontend_url)?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = router(&context).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
