//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// upnext - Your upcoming Google Calendar events
#[derive(Debug, Parser)]
#[command(name = "upnext")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "UPNEXT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// OAuth client file downloaded from the Google Cloud Console
    #[arg(long, env = "UPNEXT_PROVISIONING_FILE")]
    pub provisioning_file: Option<PathBuf>,

    /// Where the authorized_user credential is cached
    #[arg(long, env = "UPNEXT_CREDENTIAL_FILE")]
    pub credential_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List up to ten upcoming events (default)
    Events,

    /// Authorize without listing events
    Auth {
        /// Run the browser consent even if a credential is cached
        #[arg(long, short)]
        force: bool,
    },

    /// Delete the cached credential
    Logout,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
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
    fn no_subcommand_means_events() {
        let cli = Cli::try_parse_from(["upnext"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn auth_force_and_file_overrides() {
        let cli = Cli::try_parse_from([
            "upnext",
            "--provisioning-file",
            "/tmp/client.json",
            "--credential-file",
            "/tmp/token.json",
            "auth",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.provisioning_file, Some(PathBuf::from("/tmp/client.json")));
        assert_eq!(cli.credential_file, Some(PathBuf::from("/tmp/token.json")));
        assert!(matches!(cli.command, Some(Command::Auth { force: true })));
    }

    #[test]
    fn config_subcommands() {
        let cli = Cli::try_parse_from(["upnext", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Validate
            })
        ));
    }
}
