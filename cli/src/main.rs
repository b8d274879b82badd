mod config;
mod logging;
mod path_utils;
mod service;

use std::path::PathBuf;

use anyhow::Context;
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use otp_protocol::EmailAddress;
use otp_protocol::EmailChallengeForm;
use otp_tui::CodePromptOutcome;
use otp_tui::CodePromptParams;
use otp_tui::EmailPromptOutcome;
use otp_tui::VerifyTui;
use serde_json::json;
use url::Url;

use crate::config::ConfigStore;
use crate::config::VerifyConfig;
use crate::service::FormService;
use crate::service::ServiceReply;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Verify an email address with a one-time code, entered in the terminal"
)]
struct Cli {
    /// Email address to verify. Skips the email step when set.
    #[arg(long, env = "OTP_VERIFY_EMAIL")]
    email: Option<String>,

    /// Endpoint that sends the verification email (form field `email`).
    ///
    /// Without it the flow runs as a dry run and prints the forms it would have sent.
    #[arg(long, env = "OTP_VERIFY_CHALLENGE_URL", value_name = "URL")]
    challenge_url: Option<Url>,

    /// Endpoint that checks the 6-digit code (form field `code`).
    #[arg(long, env = "OTP_VERIFY_CHECK_URL", value_name = "URL")]
    check_url: Option<Url>,

    /// Seconds before "Resend" becomes available (0 disables the countdown).
    #[arg(long, value_name = "SECS")]
    cooldown_secs: Option<u32>,

    /// Config file to read instead of `~/.otp-verify/config.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file to append to instead of `~/.otp-verify/log/otp-verify.log`.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn parse_cli() -> Cli {
    let matches = Cli::command()
        .version(otp_tui::OTP_VERIFY_VERSION)
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

/// Effective settings after CLI flags are layered over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    email: Option<String>,
    cooldown_secs: u32,
    challenge_url: Option<Url>,
    check_url: Option<Url>,
}

impl Settings {
    fn resolve(cli: &Cli, config: VerifyConfig) -> Self {
        Self {
            email: cli.email.clone(),
            cooldown_secs: cli.cooldown_secs.unwrap_or(config.resend_cooldown_secs),
            challenge_url: cli.challenge_url.clone().or(config.challenge_url),
            check_url: cli.check_url.clone().or(config.check_url),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FlowOutcome {
    Verified { location: Option<String> },
    Cancelled,
}

/// What happened, reported once the terminal has been restored.
#[derive(Debug)]
struct FlowReport {
    outcome: FlowOutcome,
    dry_run_forms: Vec<serde_json::Value>,
}

impl FlowReport {
    fn finish(self, outcome: FlowOutcome) -> Self {
        Self { outcome, ..self }
    }
}

/// Where the email step gets its address.
#[derive(Debug, PartialEq, Eq)]
enum EmailSource {
    /// `--email` passed the shape check; the email step is skipped.
    Preset(EmailAddress),
    /// Ask for it, prefilled with a `--email` value that failed the check.
    Prompt { initial: Option<String> },
}

impl EmailSource {
    fn from_flag(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Prompt { initial: None };
        };
        match EmailAddress::parse(raw) {
            Ok(email) => Self::Preset(email),
            Err(err) => {
                tracing::warn!("--email {raw:?} rejected: {err}");
                Self::Prompt {
                    initial: Some(raw.to_string()),
                }
            }
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = parse_cli();

    let config_store = match &cli.config {
        Some(path) => ConfigStore::new(path_utils::expand_tilde(path)),
        None => ConfigStore::new_default()?,
    };
    let config = config_store.load().with_context(|| {
        format!(
            "load config from {}",
            path_utils::display_with_tilde(config_store.path())
        )
    })?;

    let log_file = cli
        .log_file
        .as_deref()
        .map(path_utils::expand_tilde)
        .or_else(logging::default_log_file);
    if let Some(log_file) = &log_file
        && let Err(err) = logging::init(log_file)
    {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let settings = Settings::resolve(&cli, config);
    tracing::info!(
        cooldown_secs = settings.cooldown_secs,
        challenge_url = ?settings.challenge_url.as_ref().map(Url::as_str),
        check_url = ?settings.check_url.as_ref().map(Url::as_str),
        "starting otp-verify {}",
        otp_tui::OTP_VERIFY_VERSION
    );

    let email_source = EmailSource::from_flag(settings.email.as_deref());

    let service = FormService::new(settings.challenge_url.clone(), settings.check_url.clone())?;

    let mut ui = VerifyTui::new()?;
    let result = run_flow(&mut ui, &service, &settings, email_source).await;
    drop(ui);

    let report = result?;
    for form in &report.dry_run_forms {
        println!("{form}");
    }
    match report.outcome {
        FlowOutcome::Verified {
            location: Some(location),
        } => println!("Email verified. Continue at {location}"),
        FlowOutcome::Verified { location: None } => {
            println!("Dry run complete; no service endpoint configured.");
        }
        FlowOutcome::Cancelled => eprintln!("Verification cancelled."),
    }
    Ok(())
}

async fn run_flow(
    ui: &mut VerifyTui,
    service: &FormService,
    settings: &Settings,
    email_source: EmailSource,
) -> anyhow::Result<FlowReport> {
    let mut report = FlowReport {
        outcome: FlowOutcome::Cancelled,
        dry_run_forms: Vec::new(),
    };

    let email_form = match email_source {
        EmailSource::Preset(email) => EmailChallengeForm { email },
        EmailSource::Prompt { initial } => match ui.prompt_email(initial).await? {
            EmailPromptOutcome::Submitted(form) => form,
            EmailPromptOutcome::Cancelled => return Ok(report),
        },
    };

    ui.show_status(&format!(
        "Sending a verification code to {}...",
        email_form.email.as_str()
    ))?;
    match service
        .request_challenge(&email_form)
        .await
        .context("request verification email")?
    {
        ServiceReply::DryRun => report
            .dry_run_forms
            .push(json!({ "step": "challenge", "form": email_form })),
        reply => tracing::info!(?reply, "verification email requested"),
    }

    let mut params = CodePromptParams {
        email: Some(email_form.email.as_str().to_string()),
        cooldown_secs: settings.cooldown_secs,
        previous_attempt_rejected: false,
    };
    loop {
        let form = match ui.prompt_code(params.clone()).await? {
            CodePromptOutcome::Submitted(form) => form,
            CodePromptOutcome::Cancelled => return Ok(report),
        };

        ui.show_status("Checking code...")?;
        match service
            .check_code(&form)
            .await
            .context("check verification code")?
        {
            ServiceReply::Redirected { location } => {
                return Ok(report.finish(FlowOutcome::Verified {
                    location: Some(location),
                }));
            }
            ServiceReply::DryRun => {
                report
                    .dry_run_forms
                    .push(json!({ "step": "check", "form": form }));
                return Ok(report.finish(FlowOutcome::Verified { location: None }));
            }
            ServiceReply::Rendered { status } => {
                tracing::info!(status, "code page re-rendered; mounting a fresh code entry");
                params.previous_attempt_rejected = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::try_parse_from([
            "otp-verify",
            "--cooldown-secs",
            "5",
            "--check-url",
            "https://cli.example.test/check",
        ])
        .expect("parse args");
        let config = VerifyConfig {
            resend_cooldown_secs: 90,
            challenge_url: Some(Url::parse("https://cfg.example.test/verify").expect("url")),
            check_url: Some(Url::parse("https://cfg.example.test/check").expect("url")),
        };

        let settings = Settings::resolve(&cli, config);
        assert_eq!(settings.cooldown_secs, 5);
        assert_eq!(
            settings.challenge_url.as_ref().map(Url::as_str),
            Some("https://cfg.example.test/verify")
        );
        assert_eq!(
            settings.check_url.as_ref().map(Url::as_str),
            Some("https://cli.example.test/check")
        );
    }

    #[test]
    fn config_defaults_apply_without_flags() {
        let cli = Cli::try_parse_from(["otp-verify"]).expect("parse args");
        let settings = Settings::resolve(&cli, VerifyConfig::default());
        assert_eq!(settings.cooldown_secs, config::DEFAULT_COOLDOWN_SECS);
        assert_eq!(settings.challenge_url, None);
    }

    #[test]
    fn email_flag_skips_or_prefills_the_email_step() {
        assert_eq!(
            EmailSource::from_flag(Some(" a@b.c ")),
            EmailSource::Preset(EmailAddress::parse("a@b.c").expect("email"))
        );
        assert_eq!(
            EmailSource::from_flag(Some("a@b")),
            EmailSource::Prompt {
                initial: Some("a@b".to_string())
            }
        );
        assert_eq!(
            EmailSource::from_flag(None),
            EmailSource::Prompt { initial: None }
        );
    }

    #[test]
    fn malformed_urls_are_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["otp-verify", "--challenge-url", "not a url"]).is_err());
        assert!(Cli::try_parse_from(["otp-verify", "--cooldown-secs", "-1"]).is_err());
    }
}
