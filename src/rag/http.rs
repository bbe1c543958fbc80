//! Reqwest-backed collaborator clients.
//!
//! The wire contracts stay out of the chat handler: each client checks the
//! response status, then pulls the fields it needs out of the JSON body.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::APP_USER_AGENT;

use super::{ChatMessage, Completer, ContextChunk, Embedder, Retriever};

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

pub struct HttpEmbedder {
    client: Client,
    url: String,
}

impl HttpEmbedder {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let payload = json!({ "input": text });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("embedding request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("{} - {}", self.url, response.status()));
        }

        let json_response: Value = response.json().await?;
        let embedding = json_response["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow!("Error parsing JSON response: no embedding found"))?;

        embedding
            .iter()
            .map(|value| {
                value
                    .as_f64()
                    .map(|v| v as f32)
                    .ok_or_else(|| anyhow!("Error parsing JSON response: non-numeric embedding"))
            })
            .collect()
    }
}

pub struct HttpRetriever {
    client: Client,
    url: String,
}

impl HttpRetriever {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url,
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn relevant_chunks(
        &self,
        embedding: &[f32],
        threshold: f32,
        count: usize,
    ) -> Result<Vec<ContextChunk>> {
        let payload = json!({
            "query_vector": embedding,
            "match_threshold": threshold,
            "match_count": count,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("retrieval request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("{} - {}", self.url, response.status()));
        }

        let json_response: Value = response.json().await?;
        let chunks: Vec<ContextChunk> = serde_json::from_value(json_response)
            .context("Error parsing JSON response: unexpected chunk shape")?;

        debug!("Retrieved {} context chunks", chunks.len());

        Ok(chunks)
    }
}

pub struct HttpCompleter {
    client: Client,
    url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl HttpCompleter {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: String, model: String, api_key: Option<SecretString>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            url,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl Completer for HttpCompleter {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.context("completion request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("{} - {}", self.url, response.status()));
        }

        let json_response: Value = response.json().await?;
        let reply = json_response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("Error parsing JSON response: no completion found"))?;

        Ok(reply.to_string())
    }
}
