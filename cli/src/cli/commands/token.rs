//! Application token command handlers.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::{
    ApplicationToken, Authorizer, KeyringTokenStore, StoredToken, TokenStore,
};
use crate::cli::args::CreateTokenArgs;
use crate::cli::commands::apply_api_args;
use crate::client::HttpTransport;
use crate::config::FreeboxConfig;
use crate::error::Result;

/// Handle the `create-token` command.
///
/// Registers the application, waits for confirmation on the device and
/// prints the token with the remaining manual steps. Ctrl-C stops waiting.
pub async fn handle_create_token(config: FreeboxConfig, args: CreateTokenArgs) -> Result<()> {
    let config = apply_api_args(config, &args.api);

    let mut identity = config.app.identity();
    if let Some(name) = args.app_name {
        identity.app_name = name;
    }
    if let Some(version) = args.app_version {
        identity.app_version = version;
    }
    if let Some(device) = args.device_name {
        identity.device_name = device;
    }

    let mut options = config.authorization.poll_options();
    if let Some(secs) = args.max_wait {
        options.max_wait = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let authorizer = Authorizer::new(transport, config.api.base_url.clone(), options);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    print!("Registering application and token. Please confirm on your Freebox' touch display... ");
    std::io::stdout().flush()?;

    let outcome = authorizer.register_and_wait(&identity, &cancel).await;
    watcher.abort();

    let app_token = match outcome {
        Ok(token) => token,
        Err(e) => {
            println!("FAILED");
            return Err(e);
        }
    };
    println!("OK");

    if args.store {
        let stored = StoredToken::new(
            &identity.app_id,
            app_token.clone(),
            config.api.base_url.as_str(),
        );
        KeyringTokenStore.save(&stored)?;
        println!("Token saved in the system keyring.");
    }

    println!();
    println!("Final manual steps:");
    println!();
    println!("1. Grant required permissions to the newly created application in FreeboxOS");
    println!(
        "({}, \"Paramètres de la Freebox\", \"Gestion des accès\", \"Applications\")",
        freebox_os_url(&config.api.base_url)
    );
    println!("See https://github.com/jacquev6/terraform-provider-freebox#permissions for details");
    println!();
    println!("2. Copy-paste the following block in your Terraform configuration. Keep the token secret:");
    println!();
    print!("{}", provider_block(&identity.app_id, &app_token));

    Ok(())
}

/// Handle the `forget-token` command.
pub fn handle_forget_token(config: &FreeboxConfig, app_id: Option<String>) -> Result<()> {
    let app_id = app_id.unwrap_or_else(|| config.app.app_id.clone());

    if KeyringTokenStore.delete(&app_id)? {
        println!("Removed the stored token for '{app_id}'.");
        println!("The application stays registered on the Freebox; revoke it in FreeboxOS if needed.");
    } else {
        println!("No token stored for '{app_id}'.");
    }

    Ok(())
}

/// FreeboxOS web interface location for an API base URL.
fn freebox_os_url(api_base_url: &Url) -> Url {
    let mut url = api_base_url.clone();
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Terraform provider block for the created token.
fn provider_block(app_id: &str, app_token: &ApplicationToken) -> String {
    format!(
        "provider freebox {{\n  app_id = \"{app_id}\"\n  app_token = \"{}\"\n}}\n",
        app_token.expose()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freebox_os_url_is_api_root() {
        let url = Url::parse("http://mafreebox.freebox.fr/api/v4").unwrap();
        assert_eq!(freebox_os_url(&url).as_str(), "http://mafreebox.freebox.fr/");

        let url = Url::parse("https://fbx.example.net:8443/api/v8/?x=1").unwrap();
        assert_eq!(freebox_os_url(&url).as_str(), "https://fbx.example.net:8443/");
    }

    #[test]
    fn provider_block_embeds_credentials() {
        let block = provider_block("terraform", &ApplicationToken::new("s3cr3t"));
        assert_eq!(
            block,
            "provider freebox {\n  app_id = \"terraform\"\n  app_token = \"s3cr3t\"\n}\n"
        );
    }
}
