//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

/// Freebox OS helper for the Terraform Freebox provider.
///
/// Creates the application token the provider logs in with, and reads the
/// data the provider exposes.
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-freebox")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register an application and create its token.
    ///
    /// Requests access for the application, then waits until someone
    /// confirms on the Freebox touch display.
    CreateToken(CreateTokenArgs),

    /// Print the WAN connection status as JSON.
    ConnectionStatus(ApiArgs),

    /// Remove the application token stored by `create-token --store`.
    ForgetToken {
        /// The application ID whose token to remove.
        #[arg(long)]
        app_id: Option<String>,
    },

    /// Generate shell completion scripts.
    ///
    /// Outputs completion script for the specified shell.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// API location and application selection.
#[derive(Args, Debug, Default)]
pub struct ApiArgs {
    /// The base URL for the Freebox API, in the same format as
    /// `http://mafreebox.freebox.fr/api/v4`.
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<Url>,

    /// The application ID, used to identify the application.
    #[arg(long)]
    pub app_id: Option<String>,
}

/// Application definition for `create-token`.
///
/// The token is associated to an application visible in FreeboxOS
/// ("Paramètres de la Freebox", "Gestion des accès", "Applications").
#[derive(Args, Debug, Default)]
pub struct CreateTokenArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// The application name, displayed in FreeboxOS.
    #[arg(long)]
    pub app_name: Option<String>,

    /// The application version.
    #[arg(long)]
    pub app_version: Option<String>,

    /// The device name, displayed in FreeboxOS (defaults to the host name).
    #[arg(long)]
    pub device_name: Option<String>,

    /// Stop waiting for confirmation after this many seconds (0 waits forever).
    #[arg(long, value_name = "SECS")]
    pub max_wait: Option<u64>,

    /// Also save the token in the system keyring.
    #[arg(long)]
    pub store: bool,
}

/// Supported shell types for completions.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_token_parses_identity_overrides() {
        let cli = Cli::try_parse_from([
            "terraform-provider-freebox",
            "create-token",
            "--api-base-url",
            "http://192.168.1.254/api/v4",
            "--app-id",
            "homelab",
            "--device-name",
            "nas",
            "--max-wait",
            "60",
            "--store",
        ])
        .unwrap();

        let Commands::CreateToken(args) = cli.command else {
            panic!("expected create-token");
        };
        assert_eq!(args.api.app_id.as_deref(), Some("homelab"));
        assert_eq!(
            args.api.api_base_url.unwrap().as_str(),
            "http://192.168.1.254/api/v4"
        );
        assert_eq!(args.device_name.as_deref(), Some("nas"));
        assert_eq!(args.max_wait, Some(60));
        assert!(args.store);
        assert!(args.app_name.is_none());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = Cli::try_parse_from([
            "terraform-provider-freebox",
            "connection-status",
            "--api-base-url",
            "not a url",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "terraform-provider-freebox",
            "connection-status",
            "--config",
            "/etc/freebox.toml",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/freebox.toml")));
    }
}
