//! Retrieval-augmented chat endpoint. The heavy lifting (embedding,
//! similarity search, completion) happens in external collaborators; this
//! handler authenticates the caller and composes the pipeline.

use axum::{extract::Extension, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::rag::{
    build_context_prompt, ChatMessage, Completer, Embedder, Retriever, MATCH_COUNT,
    MATCH_THRESHOLD,
};

use super::auth::{session::extract_bearer_token, AuthState};

/// Collaborator handles shared with the chat route.
pub struct ChatContext {
    pub embedder: Arc<dyn Embedder>,
    pub retriever: Arc<dyn Retriever>,
    pub completer: Arc<dyn Completer>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
}

#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Missing message"),
        (status = 401, description = "Missing, invalid, or expired access token"),
        (status = 500, description = "Collaborator failure")
    ),
    tag = "chat"
)]
#[instrument(skip_all)]
pub async fn chat(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    context: Extension<Arc<ChatContext>>,
    payload: Option<Json<ChatRequest>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::authentication("Invalid access token"))?;
    auth_state
        .verify_access(&token)
        .ok_or_else(|| ApiError::authentication("Invalid access token"))?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("Missing payload"));
    };
    let question = request
        .messages
        .last()
        .map(|message| message.content.trim())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ApiError::validation("Missing message"))?
        .to_string();

    let embedding = context.embedder.embed(&question).await?;
    let chunks = context
        .retriever
        .relevant_chunks(&embedding, MATCH_THRESHOLD, MATCH_COUNT)
        .await?;

    let mut messages = vec![build_context_prompt(&chunks, &question)];
    messages.extend(request.messages.iter().cloned());

    let reply = context.completer.complete(&messages).await?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}
