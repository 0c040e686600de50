//! Shell completions generation.

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;
use crate::error::SyncError;

/// Binary name used in generated scripts.
const BIN_NAME: &str = "savoir-sync";

/// Generate shell completions for the specified shell.
///
/// # Errors
///
/// Returns `SyncError::Parse` if the generated script is not valid UTF-8.
pub fn generate_completions(shell: Shell) -> Result<String, SyncError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut buf);
    String::from_utf8(buf).map_err(|e| SyncError::Parse(format!("UTF-8 error: {e}")))
}
