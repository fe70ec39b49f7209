use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use axum_server::tls_rustls::RustlsConfig;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use webchat_shared::constants::CLIENTS_DISABLED_BODY;
use webchat_shared::to_pretty_json;

use crate::config::ServerConfig;
use crate::pages::{self, CHAT_PAGE, LANDING_PAGE};
use crate::session::{credential, peer_address, resolve_username, SessionGate};
use crate::state::ChatState;

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatState,
    pub gate: SessionGate,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(chat: ChatState, config: ServerConfig) -> Self {
        Self {
            gate: SessionGate::new(chat.clone()),
            chat,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/register", get(register).post(register))
        .route("/chat", get(chat))
        .route("/get_messages", get(get_messages))
        .route("/get_clients", get(get_clients))
        .route("/post_message", post(post_message))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct RegisterForm {
    username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PostForm {
    message: Option<String>,
}

/// 301 rather than axum's 308 so browsers follow a POST with a GET.
fn moved_permanently(location: &'static str) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

fn pretty_or_empty<T: Serialize + ?Sized>(value: &T) -> String {
    to_pretty_json(value).unwrap_or_else(|e| {
        error!(error = %e, "Failed to serialize response");
        String::new()
    })
}

async fn index(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
) -> Response {
    if state.gate.validate_jar(&jar, &peer_address(&addr)).await {
        return moved_permanently("/chat");
    }
    pages::render(&state.config.docs_dir, LANDING_PAGE)
        .await
        .into_response()
}

/// Registers the submitted name for the caller's address. A caller who is
/// already validated is sent straight to the chat without a new record.
async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    form: Option<Form<RegisterForm>>,
) -> Response {
    let address = peer_address(&addr);
    if state.gate.validate_jar(&jar, &address).await {
        return moved_permanently("/chat");
    }

    let submitted = form.and_then(|Form(f)| f.username);
    let name = resolve_username(submitted.as_deref());
    let cookie = state.gate.register(name, address).await;

    (jar.add(cookie), moved_permanently("/chat")).into_response()
}

async fn chat(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
) -> Response {
    if !state.gate.validate_jar(&jar, &peer_address(&addr)).await {
        return moved_permanently("/");
    }
    pages::render(&state.config.docs_dir, CHAT_PAGE)
        .await
        .into_response()
}

async fn get_messages(State(state): State<AppState>) -> String {
    pretty_or_empty(&state.chat.messages().await)
}

async fn get_clients(State(state): State<AppState>) -> String {
    if !state.config.get_clients {
        return CLIENTS_DISABLED_BODY.to_string();
    }
    pretty_or_empty(&state.chat.clients().await)
}

/// Unvalidated posts are dropped without telling the caller.
async fn post_message(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    form: Option<Form<PostForm>>,
) -> StatusCode {
    let author = credential(&jar);
    if !state.gate.validate(author, &peer_address(&addr)).await {
        return StatusCode::OK;
    }

    if let Some(author) = author {
        let body = form.and_then(|Form(f)| f.message).unwrap_or_default();
        state.chat.post_message(author, &body).await;
    }
    StatusCode::OK
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let addr = config.listen_addr();
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    if config.ssl {
        let (cert, key) = config.tls_paths()?;
        info!(
            cert = %cert.display(),
            key = %key.display(),
            "Using certificate and key for SSL"
        );
        let tls = RustlsConfig::from_pem_file(cert, key).await?;

        info!(addr = %addr, "Listening (TLS)");
        axum_server::bind_rustls(addr, tls).serve(app).await?;
    } else {
        info!(addr = %addr, "Listening");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}
