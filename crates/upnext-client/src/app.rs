//! Command dispatch and the top-level error handler.

use std::io::Write;
use std::process::ExitCode;

use tracing::error;

use crate::cli::{Cli, Command, ConfigAction};
use crate::commands;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Loads the configuration and runs the selected command.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    let config = config.with_paths(cli.provisioning_file, cli.credential_file);

    match cli.command {
        None | Some(Command::Events) => {
            let authorizer = commands::auth::google_authorizer(&config)?;
            let lister = commands::events::google_lister(&config)?;
            commands::events::run(&authorizer, &lister, out).await?;
            Ok(())
        }
        Some(Command::Auth { force }) => {
            let authorizer = commands::auth::google_authorizer(&config)?;
            commands::auth::run(&authorizer, force, out).await?;
            Ok(())
        }
        Some(Command::Logout) => commands::auth::logout(&config, out),
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path, out),
            ConfigAction::Validate => commands::config::validate(&config, out),
            ConfigAction::Path => commands::config::path(&config_path, out),
        },
    }
}

/// Turns the outcome of [`run`] into an exit status.
///
/// Every failure gets the same generic line on `err`; the category only goes
/// to the log.
pub fn report<E: Write>(result: ClientResult<()>, err: &mut E) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), "command failed");
            let _ = writeln!(err, "Error during OAuth or API call: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use clap::Parser;
    use upnext_providers::AuthError;

    use super::*;

    fn cli(dir: &Path, command: &[&str]) -> Cli {
        let config = dir.join("config.toml");
        fs::write(&config, "[oauth]\nopen_browser = false\n").unwrap();

        let mut args = vec![
            "upnext".to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--provisioning-file".to_string(),
            dir.join("credentials_google_calendar.json").display().to_string(),
            "--credential-file".to_string(),
            dir.join("token.json").display().to_string(),
        ];
        args.extend(command.iter().map(|s| s.to_string()));
        Cli::try_parse_from(args).unwrap()
    }

    fn assert_exit(actual: ExitCode, expected: ExitCode) {
        assert_eq!(format!("{actual:?}"), format!("{expected:?}"));
    }

    #[test]
    fn success_exits_cleanly() {
        let mut err = Vec::new();
        assert_exit(report(Ok(()), &mut err), ExitCode::SUCCESS);
        assert!(err.is_empty());
    }

    #[test]
    fn failure_prints_generic_line() {
        let mut err = Vec::new();
        let result = Err(AuthError::interactive("consent declined").into());
        assert_exit(report(result, &mut err), ExitCode::FAILURE);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            format!(
                "Error during OAuth or API call: {}\n",
                AuthError::interactive("consent declined")
            )
        );
    }

    #[tokio::test]
    async fn missing_provisioning_file_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let result = run(cli(dir.path(), &[]), &mut out).await;

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "No existing token found. Proceeding to authenticate...\n"
        );
        match &result {
            Err(ClientError::Auth(e)) => {
                assert_eq!(e.category(), upnext_providers::ErrorCategory::Provisioning)
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let mut err = Vec::new();
        assert_exit(report(result, &mut err), ExitCode::FAILURE);
        assert!(
            String::from_utf8(err)
                .unwrap()
                .starts_with("Error during OAuth or API call: ")
        );
        assert!(!dir.path().join("token.json").exists());
    }

    #[tokio::test]
    async fn missing_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "upnext",
            "--config",
            &dir.path().join("absent.toml").display().to_string(),
            "config",
            "path",
        ])
        .unwrap();

        let mut out = Vec::new();
        let result = run(cli, &mut out).await;
        assert!(matches!(result, Err(ClientError::Config(_))));

        let mut err = Vec::new();
        assert_exit(report(result, &mut err), ExitCode::FAILURE);
        assert!(String::from_utf8(err).unwrap().contains("failed to read config"));
    }

    #[tokio::test]
    async fn logout_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("token.json"),
            r#"{"type":"authorized_user","client_id":"A","client_secret":"B","refresh_token":"R"}"#,
        )
        .unwrap();

        let mut out = Vec::new();
        run(cli(dir.path(), &["logout"]), &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("Removed "));
        assert!(!dir.path().join("token.json").exists());
    }
}
