//! Command implementations.

pub mod completions;
pub mod status;
pub mod token;

pub use completions::handle_completions;
pub use status::handle_connection_status;
pub use token::{handle_create_token, handle_forget_token};

use crate::cli::args::ApiArgs;
use crate::config::FreeboxConfig;

/// Applies command-line API options over the loaded configuration.
pub fn apply_api_args(mut config: FreeboxConfig, args: &ApiArgs) -> FreeboxConfig {
    if let Some(url) = &args.api_base_url {
        config.api.base_url = url.clone();
    }
    if let Some(app_id) = args.app_id.as_ref().filter(|id| **id != config.app.app_id) {
        // The configured token belongs to the configured application.
        config.app.app_id = app_id.clone();
        config.app.app_token = None;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn flags_override_configuration() {
        let args = ApiArgs {
            api_base_url: Some(Url::parse("http://192.168.1.254/api/v4").unwrap()),
            app_id: Some("homelab".to_string()),
        };

        let config = apply_api_args(FreeboxConfig::default(), &args);
        assert_eq!(config.api.base_url.as_str(), "http://192.168.1.254/api/v4");
        assert_eq!(config.app.app_id, "homelab");
    }

    #[test]
    fn other_app_id_drops_configured_token() {
        let mut config = FreeboxConfig::default();
        config.app.app_token = Some("terraform-secret".to_string());

        let args = ApiArgs {
            app_id: Some("homelab".to_string()),
            ..ApiArgs::default()
        };
        let config = apply_api_args(config, &args);
        assert_eq!(config.app.app_id, "homelab");
        assert_eq!(config.app.app_token, None);
    }

    #[test]
    fn same_app_id_keeps_configured_token() {
        let mut config = FreeboxConfig::default();
        config.app.app_token = Some("terraform-secret".to_string());

        let args = ApiArgs {
            app_id: Some("terraform".to_string()),
            ..ApiArgs::default()
        };
        let config = apply_api_args(config, &args);
        assert_eq!(config.app.app_token.as_deref(), Some("terraform-secret"));
    }

    #[test]
    fn absent_flags_keep_configuration() {
        let config = apply_api_args(FreeboxConfig::default(), &ApiArgs::default());
        assert_eq!(config.app.app_id, "terraform");
    }
}
