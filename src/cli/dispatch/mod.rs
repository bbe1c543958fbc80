use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let required = |name: &str| -> Result<String> {
        matches
            .get_one::<String>(name)
            .map(String::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{name}"))
    };

    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        frontend_url: required("frontend-url")?,
    };

    let globals = GlobalArgs {
        access_secret: SecretString::from(required("access-secret")?),
        refresh_secret: SecretString::from(required("refresh-secret")?),
        embedding_url: required("embedding-url")?,
        retrieval_url: required("retrieval-url")?,
        completion_url: required("completion-url")?,
        completion_model: required("completion-model")?,
        completion_api_key: matches
            .get_one::<String>("completion-api-key")
            .map(|key| SecretString::from(key.as_str())),
    };

    Ok((action, globals))
}
