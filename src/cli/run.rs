//! CLI entry point and dispatch
//!
//! `run()` parses arguments, discovers configuration, initializes logging,
//! creates the tokio runtime, dispatches, and owns all error output.

use clap::Parser;

use followfetch_utils::logging::init_tracing;
use followfetch_utils::redaction::CredentialRedactor;

use super::args::{Cli, Commands};
use super::commands::{self, RequestSource};
use crate::{CliArgs, Config, ExitCode, FollowfetchError};

/// Main CLI execution function.
///
/// Prints everything, including errors, and returns the exit code for
/// main.rs to pass to `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let cli_args = build_cli_args(&cli);

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report_error(&err, &CredentialRedactor::default())),
    };

    if let Err(e) = init_tracing(config.verbose(), config.log_format()) {
        eprintln!("⚠ Failed to initialize logging: {e}");
    }

    let redactor = CredentialRedactor::new(
        [
            config.credentials.session_token.as_deref(),
            config.credentials.api_key.as_deref(),
        ]
        .into_iter()
        .flatten(),
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match &cli.command {
            Commands::Scrape {
                account,
                method,
                request,
                json,
                ..
            } => {
                let source = match request {
                    Some(path) => RequestSource::File(path),
                    None => RequestSource::Args {
                        account: account.as_deref().unwrap_or_default(),
                        method: method.as_str(),
                    },
                };
                commands::execute_scrape_command(source, *json, &config).await
            }
            Commands::Methods { json } => commands::execute_methods_command(*json, &config),
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => Err(code),
        Err(err) => Err(report_error(&err, &redactor)),
    }
}

/// Map parsed flags onto configuration overrides.
fn build_cli_args(cli: &Cli) -> CliArgs {
    let mut args = CliArgs {
        config_path: cli.config.clone(),
        scripts_dir: cli.scripts_dir.clone(),
        python: cli.python.clone(),
        node: cli.node.clone(),
        verbose: cli.verbose.then_some(true),
        log_format: cli.log_format,
        ..CliArgs::default()
    };

    if let Commands::Scrape {
        session_token,
        api_key,
        timeout,
        ..
    } = &cli.command
    {
        args.session_token = session_token.clone();
        args.api_key = api_key.clone();
        args.timeout_secs = *timeout;
    }
    args
}

/// Print an error for the user and pick the exit code.
fn report_error(err: &anyhow::Error, redactor: &CredentialRedactor) -> ExitCode {
    if let Some(ff_err) = err.downcast_ref::<FollowfetchError>() {
        eprint!("{}", redactor.redact(&ff_err.display_for_user()));
        ff_err.to_exit_code()
    } else {
        eprintln!("✗ Unexpected error: {}", redactor.redact(&format!("{err:#}")));
        eprintln!("\n  Run with --verbose for more detailed output");
        ExitCode::INTERNAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use followfetch_utils::error::ConfigError;

    #[test]
    fn test_scrape_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "followfetch",
            "--python",
            "/usr/bin/python3.12",
            "scrape",
            "alice",
            "--session-token",
            "tok",
            "--timeout",
            "30",
        ])
        .unwrap();

        let args = build_cli_args(&cli);

        assert_eq!(args.python.as_deref(), Some("/usr/bin/python3.12"));
        assert_eq!(args.session_token.as_deref(), Some("tok"));
        assert_eq!(args.timeout_secs, Some(30));
        assert_eq!(args.verbose, None);
    }

    #[test]
    fn test_verbose_flag_only_overrides_when_set() {
        let cli = Cli::try_parse_from(["followfetch", "-v", "config"]).unwrap();
        assert_eq!(build_cli_args(&cli).verbose, Some(true));
    }

    #[test]
    fn test_report_error_exit_codes() {
        let config_err = anyhow::Error::new(FollowfetchError::Config(ConfigError::InvalidValue {
            key: "timeout_secs".to_string(),
            value: "0".to_string(),
        }));
        assert_eq!(
            report_error(&config_err, &CredentialRedactor::default()),
            ExitCode::CLI_ARGS
        );

        let other = anyhow::anyhow!("boom");
        assert_eq!(
            report_error(&other, &CredentialRedactor::default()),
            ExitCode::INTERNAL
        );
    }
}
