pub mod chat;
pub mod config;
pub mod run;

use std::path::Path;

use clap::{Parser, Subcommand};

use cc_domain::config::Config;

/// ConfigChat: a chat gateway driven by remote AI configs.
#[derive(Debug, Parser)]
#[command(name = "configchat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Send a single message and print the response.
    Run {
        /// The message to send.
        message: String,
        /// Session id (defaults to "cli").
        #[arg(long, default_value = "cli")]
        session: String,
        /// Identity key the AI config is evaluated for.
        #[arg(long)]
        user: Option<String>,
        /// Output the full result as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Interactive chat in the terminal.
    Chat {
        /// Session id to start in.
        #[arg(long, default_value = "cli")]
        session: String,
        /// Identity key the AI config is evaluated for.
        #[arg(long)]
        user: Option<String>,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `CC_CONFIG` (or `config.toml`
/// by default), then apply environment overrides. Returns the parsed
/// [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("CC_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let mut config = load_config_from(Path::new(&config_path))?;
    config.apply_env_overrides();
    Ok((config, config_path))
}

/// Parse `path`, or fall back to defaults when it does not exist.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn file_values_are_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[aiconfig]\nchat_config_key = \"support-bot\""
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.aiconfig.chat_config_key, "support-bot");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn cli_parses_run() {
        let cli = Cli::parse_from(["configchat", "run", "hello", "--session", "s1", "--json"]);
        match cli.command {
            Some(Command::Run {
                message,
                session,
                user,
                json,
            }) => {
                assert_eq!(message, "hello");
                assert_eq!(session, "s1");
                assert!(user.is_none());
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["configchat"]);
        assert!(cli.command.is_none());
    }
}
