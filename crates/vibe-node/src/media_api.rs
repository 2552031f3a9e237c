//! Media upload and download.
//!
//! - `POST /api/media` - store a base64 image or audio clip and post it as a message
//! - `GET /api/media/{id}` - raw bytes with the stored content type

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};
use vibe_store::DocumentId;
use vibe_types::{Message, MessageKind};

use crate::api::{commit_message, parse_chat_id, require_chat, require_sender, ApiError, AppState};
use crate::validation::{validate_text, FieldChecks, MAX_CAPTION_LENGTH};

/// Request body limit for an upload of `max_upload_bytes` decoded bytes:
/// the base64 expansion plus room for the other JSON fields.
fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes.div_ceil(3) * 4 + 64 * 1024
}

/// Create the media routes.
pub fn media_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/media",
            post(upload_media).layer(DefaultBodyLimit::max(body_limit(max_upload_bytes))),
        )
        .route("/api/media/{id}", get(download_media))
}

/// Request to upload media into a chat.
#[derive(Debug, Deserialize)]
pub struct UploadMediaRequest {
    pub chat_id: String,
    pub sender_username: String,
    /// `image` or `audio`.
    pub kind: MessageKind,
    /// MIME type, which must match `kind`.
    pub content_type: String,
    /// Base64-encoded bytes.
    pub data: String,
    #[serde(default)]
    pub caption: String,
}

fn validate_media_type(kind: MessageKind, content_type: &str) -> Result<(), ValidationError> {
    let prefix = match kind {
        MessageKind::Image => "image/",
        MessageKind::Audio => "audio/",
        MessageKind::Text => {
            let mut err = ValidationError::new("kind");
            err.message = Some("Media must be an image or audio clip".into());
            return Err(err);
        }
    };

    if content_type.starts_with(prefix) {
        Ok(())
    } else {
        let mut err = ValidationError::new("content_type");
        err.message = Some(format!("Content type must start with '{}'", prefix).into());
        Err(err)
    }
}

impl Validate for UploadMediaRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        FieldChecks::new()
            .check("content_type", validate_media_type(self.kind, &self.content_type))
            .check(
                "caption",
                validate_text("Caption", &self.caption, MAX_CAPTION_LENGTH, true),
            )
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadMediaResponse {
    pub message_id: DocumentId,
    pub media_id: DocumentId,
}

async fn upload_media(
    State(state): State<AppState>,
    Json(req): Json<UploadMediaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let chat_id = parse_chat_id(&req.chat_id)?;
    req.validate()?;

    let data = STANDARD
        .decode(req.data.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid base64 data: {}", e)))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Media data is empty".to_string()));
    }
    if data.len() > state.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "Media exceeds {} bytes",
            state.max_upload_bytes
        )));
    }

    require_chat(&state, &chat_id)?;
    let sender_id = require_sender(&state, &req.sender_username)?;

    let size = data.len();
    let media_id = state.blobs.put(Bytes::from(data), &req.content_type)?;
    info!(media_id = %media_id, kind = %req.kind, size, "Media stored");

    let message = Message::media(
        chat_id.as_str(),
        sender_id.as_str(),
        req.kind,
        media_id.as_str(),
        req.caption,
    );
    let message_id = commit_message(&state, &chat_id, &message)?;

    Ok(Json(UploadMediaResponse {
        message_id,
        media_id,
    }))
}

async fn download_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = DocumentId::parse(&id)
        .map_err(|_| ApiError::BadRequest("Invalid media id".to_string()))?;
    let blob = state
        .blobs
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound("Media not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, blob.content_type)], blob.data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_must_match_kind() {
        assert!(validate_media_type(MessageKind::Image, "image/png").is_ok());
        assert!(validate_media_type(MessageKind::Audio, "audio/ogg").is_ok());

        assert!(validate_media_type(MessageKind::Image, "audio/ogg").is_err());
        assert!(validate_media_type(MessageKind::Text, "text/plain").is_err());
    }

    #[test]
    fn test_body_limit_covers_base64_expansion() {
        for max in [1, 10, 1000, 1024 * 1024] {
            let encoded = STANDARD.encode(vec![0u8; max]);
            assert!(encoded.len() <= body_limit(max));
        }
    }
}
