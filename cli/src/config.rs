use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use url::Url;

pub const DEFAULT_COOLDOWN_SECS: u32 = otp_tui::DEFAULT_COOLDOWN_SECS;

/// Values read from `config.toml`. Anything missing falls back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyConfig {
    pub resend_cooldown_secs: u32,
    pub challenge_url: Option<Url>,
    pub check_url: Option<Url>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            resend_cooldown_secs: DEFAULT_COOLDOWN_SECS,
            challenge_url: None,
            check_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config file. A missing file yields the defaults; a file that isn't valid TOML
    /// still honors a top-level `resend_cooldown_secs = N` line.
    pub fn load(&self) -> anyhow::Result<VerifyConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(VerifyConfig::default());
        };

        let doc = match content.parse::<DocumentMut>() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!("config {} is not valid TOML: {err}", self.path.display());
                return Ok(VerifyConfig {
                    resend_cooldown_secs: parse_cooldown_fallback(&content)
                        .unwrap_or(DEFAULT_COOLDOWN_SECS),
                    ..VerifyConfig::default()
                });
            }
        };

        Ok(VerifyConfig {
            resend_cooldown_secs: read_cooldown(&doc).unwrap_or(DEFAULT_COOLDOWN_SECS),
            challenge_url: read_service_url(&doc, "challenge_url")?,
            check_url: read_service_url(&doc, "check_url")?,
        })
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".otp-verify").join("config.toml")
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}

fn read_cooldown(doc: &DocumentMut) -> Option<u32> {
    doc.get("resend_cooldown_secs")
        .and_then(TomlItem::as_value)
        .and_then(toml_edit::Value::as_integer)
        .and_then(|secs| u32::try_from(secs).ok())
}

fn read_service_url(doc: &DocumentMut, key: &str) -> anyhow::Result<Option<Url>> {
    let Some(raw) = doc
        .get("service")
        .and_then(TomlItem::as_table)
        .and_then(|service| service.get(key))
        .and_then(TomlItem::as_value)
        .and_then(toml_edit::Value::as_str)
    else {
        return Ok(None);
    };
    Url::parse(raw)
        .map(Some)
        .with_context(|| format!("invalid service.{key}: {raw}"))
}

fn parse_cooldown_fallback(contents: &str) -> Option<u32> {
    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            // Only top-level keys count.
            break;
        }
        let Some(line) = strip_toml_comment(trimmed) else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != "resend_cooldown_secs" {
            continue;
        }
        let token = value.split_whitespace().next().unwrap_or_default();
        return token.parse().ok();
    }

    None
}

fn strip_toml_comment(line: &str) -> Option<&str> {
    let line = line.split_once('#').map_or(line, |(head, _)| head).trim();
    if line.is_empty() { None } else { Some(line) }
}
