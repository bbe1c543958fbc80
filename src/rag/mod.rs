//! Chat collaborators. Embedding, similarity retrieval, and text completion
//! are owned by external services; this module defines the narrow
//! interfaces the chat endpoint consumes and thin HTTP clients for them.

mod http;

pub use http::{HttpCompleter, HttpEmbedder, HttpRetriever};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Similarity floor for retrieved context.
pub const MATCH_THRESHOLD: f32 = 0.2;
/// Ranked chunks requested per question.
pub const MATCH_COUNT: usize = 6;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Ranked knowledge-base excerpt returned by the vector store.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContextChunk {
    pub content: String,
    pub url: String,
    pub date_updated: String,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn relevant_chunks(
        &self,
        embedding: &[f32],
        threshold: f32,
        count: usize,
    ) -> Result<Vec<ContextChunk>>;
}

#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Build the system message grounding the completion in retrieved context.
#[must_use]
pub fn build_context_prompt(chunks: &[ContextChunk], question: &str) -> ChatMessage {
    let mut context = String::new();
    for chunk in chunks {
        context.push_str(&format!(
            "Source: {}\nDate Updated: {}\nContent: {}\n\n",
            chunk.url, chunk.date_updated, chunk.content
        ));
    }

    let content = format!(
        "You are a knowledgeable assistant. Answer using the knowledge base \
         content below, citing the source and update date where relevant. \
         If the knowledge base does not cover the question, say so before \
         answering from general knowledge.\n\
         ----------------\n\
         {context}\
         ----------------\n\
         Question: {question}"
    );

    ChatMessage {
        role: "system".to_string(),
        content,
    }
}
