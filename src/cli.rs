//! Command-line interface built on clap.
//!
//! [`Cli`] carries the global flags (`--config`, `--verbose`) and one
//! [`Command`]: run the webhook server, place a test call, or query a ticket.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// DIGI9 IVR brain: answers carrier voice webhooks with call-flow markup.
#[derive(Debug, Parser)]
#[command(name = "ivr-brain", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "IVR_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of the configured filter.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the call-flow webhooks.
    Serve,

    /// Ask the carrier to ring a phone and connect it to the webhook.
    Call {
        /// Number to ring; defaults to `test_call.to`.
        #[arg(long)]
        to: Option<String>,

        /// Caller number; defaults to `test_call.from`.
        #[arg(long)]
        from: Option<String>,

        /// Webhook URL; defaults to `test_call.webhook_url`.
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the status of one ticket from the configured store.
    Lookup {
        ticket_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_serve_subcommand() {
        let cli = Cli::parse_from(["ivr-brain", "serve"]);
        assert!(matches!(cli.command, Command::Serve));
        assert!(!cli.verbose);
    }

    #[test]
    fn cli_parses_call_overrides() {
        let cli = Cli::parse_from([
            "ivr-brain",
            "call",
            "--to",
            "+15550001111",
            "--url",
            "https://ivr.test/twilio_call_handler",
        ]);
        match cli.command {
            Command::Call { to, from, url } => {
                assert_eq!(to.as_deref(), Some("+15550001111"));
                assert!(from.is_none());
                assert_eq!(url.as_deref(), Some("https://ivr.test/twilio_call_handler"));
            }
            _ => panic!("expected Call command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["ivr-brain", "--config", "prod.toml", "-v", "lookup", "123456"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        match cli.command {
            Command::Lookup { ticket_id } => assert_eq!(ticket_id, "123456"),
            _ => panic!("expected Lookup command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
