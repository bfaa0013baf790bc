//! CLI entry point for the relay.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Assistant run relay
#[derive(Parser, Debug)]
#[command(name = "runrelay", version, about = "Drive assistant runs and their tool calls")]
pub struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the turn endpoint over HTTP
    Serve(ServeArgs),
    /// Run a single turn and print the JSON response
    Ask(AskArgs),
}

/// Arguments for `runrelay serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind, overriding the configured one
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Arguments for `runrelay ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Message to send
    pub message: String,

    /// Continue an existing conversation thread
    #[arg(short, long)]
    pub thread: Option<String>,

    /// User id the interaction is recorded under
    #[arg(short, long)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_serve_with_bind() {
        let cli = Cli::try_parse_from(["runrelay", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("expected Serve, got {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_ask_with_all_options() {
        let cli = Cli::try_parse_from([
            "runrelay",
            "ask",
            "What changed today?",
            "--thread",
            "thread_abc",
            "-u",
            "user_123",
            "--config",
            "relay.toml",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.message, "What changed today?");
                assert_eq!(args.thread.as_deref(), Some("thread_abc"));
                assert_eq!(args.user.as_deref(), Some("user_123"));
            }
            other => panic!("expected Ask, got {other:?}"),
        }
        assert_eq!(cli.config, Some(PathBuf::from("relay.toml")));
    }

    #[test]
    fn parse_ask_without_message_is_error() {
        assert!(Cli::try_parse_from(["runrelay", "ask"]).is_err());
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["runrelay"]).is_err());
    }
}
