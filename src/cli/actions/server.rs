use crate::api;
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, frontend_url } => {
            // Fail fast on an unparseable frontend URL before binding.
            Url::parse(&frontend_url)
                .with_context(|| format!("Invalid frontend URL: {frontend_url}"))?;

            api::serve(port, &frontend_url, globals).await?;
        }
    }

    Ok(())
}
