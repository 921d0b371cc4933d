//! Connection status command handler.

use std::sync::Arc;

use crate::auth::{resolve_app_token, KeyringTokenStore};
use crate::cli::args::ApiArgs;
use crate::cli::commands::apply_api_args;
use crate::client::HttpTransport;
use crate::config::FreeboxConfig;
use crate::connection::fetch_connection_status;
use crate::error::Result;

/// Handle the `connection-status` command.
///
/// Prints the attribute mapping the provider's `connection_status` data
/// source exposes.
pub async fn handle_connection_status(config: FreeboxConfig, args: ApiArgs) -> Result<()> {
    let config = apply_api_args(config, &args);
    let app_token = resolve_app_token(&config, &KeyringTokenStore)?;
    let transport = Arc::new(HttpTransport::new(&config.api)?);

    let status = fetch_connection_status(
        transport,
        config.api.base_url.clone(),
        &config.app.app_id,
        app_token,
        config.session.refresh_on_rejection,
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&status.to_attributes())?);
    Ok(())
}
