use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "savoir-sync")]
#[command(about = "Offline action queue for the Savoir+ learning platform")]
#[command(long_about = "savoir-sync - Offline action queue for Savoir+

Captures quiz answers and progress forms while the LMS is unreachable,
keeps them in a durable queue, and replays them in order once the
connection comes back.

QUICK START:
  savoir-sync submit /quiz/submit/42/ -f answer=Paris   Submit or queue
  savoir-sync status                                    Show queue status
  savoir-sync watch                                     Replay on reconnect

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

Configuration is read from ~/.savoir/config.yaml.")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Base URL that relative targets are resolved against
    #[arg(long, env = "SAVOIR_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// CSRF token sent with every submission
    #[arg(long, env = "SAVOIR_CSRF_TOKEN", global = true, hide_env_values = true)]
    pub csrf_token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.endpoint.base_url.clone_from(base_url);
        }
        if let Some(token) = &self.csrf_token {
            config.endpoint.csrf_token = Some(token.clone());
        }
    }
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show offline queue status
    ///
    /// Displays how many actions are waiting and when the oldest was captured.
    Status,

    /// List queued actions in replay order
    List {
        /// Maximum actions to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Submit a form, or queue it if the LMS is unreachable
    ///
    /// # Examples
    ///
    ///   savoir-sync submit /quiz/submit/42/ -f questionId=42 -f answer=Paris
    ///   savoir-sync submit /progress/update/ -f section=3 -f completed=true
    Submit(SubmitArgs),

    /// Replay every queued action now
    ///
    /// Actions are sent one at a time in capture order. A failed action is
    /// logged and skipped.
    Flush,

    /// Drop every queued action without replaying it
    Clear {
        /// Confirm clearing
        #[arg(long)]
        force: bool,
    },

    /// Watch connectivity and replay the queue on every reconnect
    ///
    /// Runs until interrupted. The first successful probe counts as a
    /// reconnect, so anything already queued is replayed right away.
    Watch {
        /// Seconds between reachability probes
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Exit after the first replay
        #[arg(long)]
        once: bool,
    },

    /// Generate shell completions
    ///
    /// Example: savoir-sync completions bash > ~/.bash_completion.d/savoir-sync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for `submit`.
#[derive(Args)]
pub struct SubmitArgs {
    /// Target URL, absolute or relative to the base URL
    pub target: String,

    /// Form field as key=value (repeatable)
    #[arg(short = 'f', long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

/// Parse a `key=value` form field.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}
