//! Shell completion command handler.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::{Cli, ShellType};

/// Handles the `completions <shell>` command.
///
/// Generates shell completion scripts.
pub fn handle_completions(shell: ShellType) {
    let mut cmd = Cli::command();
    let shell = match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
    };

    generate(shell, &mut cmd, "terraform-provider-freebox", &mut std::io::stdout());
}
