//! HTTP API for the Vibe node.
//!
//! Users, chats and messages. Every successful message write ends with a
//! realtime notification; see [`commit_message`].

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};
use validator::{Validate, ValidationErrors};
use vibe_realtime::{Dispatcher, EventKind, RealtimeError};
use vibe_store::{
    BlobStore, ChatStore, DocumentId, MemoryBlobStore, MemoryStore, StoreError,
};
use vibe_types::{Chat, Message, User};

use crate::config::NodeConfig;
use crate::media_api::media_routes;
use crate::observability::request_id_middleware;
use crate::realtime_api::realtime_routes;
use crate::validation::{
    validate_text, validate_url, validate_username, FieldChecks, ValidationErrorResponse,
    MAX_DISPLAY_NAME_LENGTH, MAX_MESSAGE_LENGTH, MAX_STATUS_LENGTH,
};

/// Number of collection names reported by `/test`.
const DIAGNOSTIC_COLLECTIONS: usize = 10;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, chats and messages.
    pub store: ChatStore,
    /// Uploaded media.
    pub blobs: Arc<dyn BlobStore>,
    /// Realtime fan-out to push streams and sockets.
    pub realtime: Arc<Dispatcher>,
    /// Largest accepted decoded media upload, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// State backed by in-memory stores.
    pub fn in_memory(config: &NodeConfig) -> Self {
        Self {
            store: ChatStore::new(Arc::new(MemoryStore::new())),
            blobs: Arc::new(MemoryBlobStore::new()),
            realtime: Arc::new(Dispatcher::new(&config.realtime_config())),
            max_upload_bytes: config.media.max_upload_bytes,
        }
    }
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("realtime unavailable: {0}")]
    Realtime(#[from] RealtimeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(errors) => {
                return ValidationErrorResponse::from(errors.clone()).into_response()
            }
            ApiError::Store(StoreError::InvalidId(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Realtime(RealtimeError::ConnectionLimit(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Realtime(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Parses a client-supplied chat id.
pub(crate) fn parse_chat_id(raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid chat_id".to_string()))
}

/// Looks up the sender of a new message.
pub(crate) fn require_sender(state: &AppState, username: &str) -> Result<DocumentId, ApiError> {
    state
        .store
        .find_user_by_username(username)?
        .map(|user| user.id)
        .ok_or_else(|| ApiError::NotFound("Sender not found".to_string()))
}

/// Fails unless the chat exists.
pub(crate) fn require_chat(state: &AppState, chat_id: &DocumentId) -> Result<(), ApiError> {
    match state.store.find_chat(chat_id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Chat not found".to_string())),
    }
}

/// Stores a message, refreshes the chat's preview, then notifies live clients.
///
/// The notification is the last step and its outcome does not affect the
/// result: the write has committed by then.
pub(crate) fn commit_message(
    state: &AppState,
    chat_id: &DocumentId,
    message: &Message,
) -> Result<DocumentId, ApiError> {
    let message_id = state.store.create_message(message)?;
    let preview = message.preview();
    state.store.set_last_message_preview(chat_id, &preview)?;

    let report = state.realtime.notify(
        EventKind::NewMessage,
        chat_id.as_str(),
        message_id.as_str(),
        &preview,
    );
    debug!(
        chat_id = %chat_id,
        message_id = %message_id,
        push_delivered = report.push.delivered,
        socket_delivered = report.socket.delivered,
        "Message committed"
    );

    Ok(message_id)
}

/// Creates the full application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/test", get(diagnostics))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/chats", get(list_chats).post(create_chat))
        .route("/api/messages", get(list_messages).post(send_message))
        .merge(media_routes(state.max_upload_bytes))
        .merge(realtime_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Vibe Chat API is running" }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Backend and storage diagnostic.
#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosticsResponse {
    pub backend: String,
    pub database: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

async fn diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    let response = match state.store.collections() {
        Ok(mut collections) => {
            collections.truncate(DIAGNOSTIC_COLLECTIONS);
            DiagnosticsResponse {
                backend: "running".to_string(),
                database: "connected".to_string(),
                connection_status: "ok".to_string(),
                collections,
            }
        }
        Err(e) => DiagnosticsResponse {
            backend: "running".to_string(),
            database: "error".to_string(),
            connection_status: e.to_string(),
            collections: Vec::new(),
        },
    };
    Json(response)
}

// ==================== Users ====================

/// Request to create a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = FieldChecks::new()
            .check("username", validate_username(&self.username))
            .check(
                "display_name",
                validate_text("Display name", &self.display_name, MAX_DISPLAY_NAME_LENGTH, false),
            );
        if let Some(avatar) = &self.avatar {
            checks = checks.check("avatar", validate_url(avatar));
        }
        if let Some(status) = &self.status {
            checks = checks.check(
                "status",
                validate_text("Status", status, MAX_STATUS_LENGTH, true),
            );
        }
        checks.finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserIdResponse {
    pub user_id: DocumentId,
}

/// Creates a user, or returns the existing id when the username is taken.
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    if let Some(existing) = state.store.find_user_by_username(&req.username)? {
        debug!(username = %req.username, "User already exists");
        return Ok(Json(UserIdResponse {
            user_id: existing.id,
        }));
    }

    let mut user = User::new(req.username, req.display_name).with_avatar(req.avatar);
    if req.status.is_some() {
        user.status = req.status;
    }
    let user_id = state.store.create_user(&user)?;
    info!(user_id = %user_id, username = %user.username, "User created");

    Ok(Json(UserIdResponse { user_id }))
}

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.list_users()?))
}

// ==================== Chats ====================

/// Request to create a chat between existing users.
#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    /// Participant usernames.
    pub participant_usernames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatIdResponse {
    pub chat_id: DocumentId,
}

async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.participant_usernames.len() < Chat::MIN_PARTICIPANTS {
        return Err(ApiError::BadRequest(format!(
            "A chat needs at least {} participants",
            Chat::MIN_PARTICIPANTS
        )));
    }

    let mut participant_ids = Vec::with_capacity(req.participant_usernames.len());
    for username in &req.participant_usernames {
        let user = state
            .store
            .find_user_by_username(username)?
            .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))?;
        participant_ids.push(user.id.to_string());
    }

    let chat_id = state.store.create_chat(&Chat::new(participant_ids))?;
    info!(chat_id = %chat_id, participants = req.participant_usernames.len(), "Chat created");

    Ok(Json(ChatIdResponse { chat_id }))
}

#[derive(Debug, Deserialize)]
pub struct ChatsQuery {
    /// Only chats this user takes part in.
    pub username: Option<String>,
}

async fn list_chats(
    State(state): State<AppState>,
    Query(query): Query<ChatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let participant = match &query.username {
        Some(username) => Some(
            state
                .store
                .find_user_by_username(username)?
                .ok_or_else(|| ApiError::NotFound(format!("User {} not found", username)))?
                .id,
        ),
        None => None,
    };

    Ok(Json(state.store.list_chats(participant.as_ref())?))
}

// ==================== Messages ====================

/// Request to post a text message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub sender_username: String,
    pub content: String,
}

impl Validate for SendMessageRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldChecks::new()
            .check(
                "content",
                validate_text("Content", &self.content, MAX_MESSAGE_LENGTH, false),
            )
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageIdResponse {
    pub message_id: DocumentId,
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = parse_chat_id(&req.chat_id)?;
    req.validate()?;
    require_chat(&state, &chat_id)?;
    let sender_id = require_sender(&state, &req.sender_username)?;

    let message = Message::text(chat_id.as_str(), sender_id.as_str(), req.content);
    let message_id = commit_message(&state, &chat_id, &message)?;

    Ok(Json(MessageIdResponse { message_id }))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub chat_id: String,
}

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = parse_chat_id(&query.chat_id)?;
    Ok(Json(state.store.list_messages(&chat_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Store(StoreError::InvalidId("x".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Store(StoreError::NotAnObject("chats".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Realtime(RealtimeError::ConnectionLimit(1)),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_parse_chat_id() {
        assert!(parse_chat_id(DocumentId::generate().as_str()).is_ok());
        let err = parse_chat_id("bogus").unwrap_err();
        assert_eq!(err.to_string(), "Invalid chat_id");
    }

    #[test]
    fn test_commit_message_notifies_after_storing() {
        let state = AppState::in_memory(&NodeConfig::default());
        let (_id, mut outbox) = state.realtime.sockets().connect_channel().unwrap();
        let chat_id = state
            .store
            .create_chat(&Chat::new(vec!["a".into(), "b".into()]))
            .unwrap();

        let message = Message::text(chat_id.as_str(), "a", "hello there");
        let message_id = commit_message(&state, &chat_id, &message).unwrap();

        let chat = state.store.find_chat(&chat_id).unwrap().unwrap();
        assert_eq!(chat.value.last_message_preview.as_deref(), Some("hello there"));

        let frame: serde_json::Value = serde_json::from_str(&outbox.try_recv().unwrap()).unwrap();
        assert_eq!(frame["type"], "new_message");
        assert_eq!(frame["chat_id"], chat_id.as_str());
        assert_eq!(frame["message_id"], message_id.as_str());
        assert_eq!(frame["preview"], "hello there");
    }

    #[test]
    fn test_create_user_validation() {
        let req = CreateUserRequest {
            username: "bad name".into(),
            display_name: String::new(),
            avatar: Some("nope".into()),
            status: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("display_name"));
        assert!(fields.contains_key("avatar"));
    }
}
