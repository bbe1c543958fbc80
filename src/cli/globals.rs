use secrecy::SecretString;

/// Configuration shared across actions. Signing secrets stay wrapped in
/// `SecretString` so they never land in debug output or logs.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub access_secret: SecretString,
    pub refresh_secret: SecretString,
    pub embedding_url: String,
    pub retrieval_url: String,
    pub completion_url: String,
    pub completion_model: String,
    pub completion_api_key: Option<SecretString>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn debug_output_redacts_secrets() {
        let globals = GlobalArgs {
            access_secret: SecretString::from("access-secret-value"),
            refresh_secret: SecretString::from("refresh-secret-value"),
            embedding_url: "http://localhost:8081/embeddings".to_string(),
            retrieval_url: "http://localhost:8082/rpc/relevant_chunks".to_string(),
            completion_url: "http://localhost:8083/v1/chat/completions".to_string(),
            completion_model: "qwen-turbo".to_string(),
            completion_api_key: Some(SecretString::from("api-key-value")),
        };

        let debug = format!("{globals:?}");
        assert!(!debug.contains("access-secret-value"));
        assert!(!debug.contains("refresh-secret-value"));
        assert!(!debug.contains("api-key-value"));
        assert_eq!(globals.access_secret.expose_secret(), "access-secret-value");
    }
}
