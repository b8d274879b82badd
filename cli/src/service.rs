//! Form submission to the external challenge and verification services.
//!
//! This plays the part of the browser's native form POST: one urlencoded field per form,
//! redirects are reported rather than followed so the caller can tell "verified, go elsewhere"
//! from "page re-rendered".

use anyhow::Context;
use otp_protocol::CodeCheckForm;
use otp_protocol::EmailChallengeForm;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceReply {
    /// The service answered with a redirect (absolute target).
    Redirected { location: String },
    /// The service rendered a page in place.
    Rendered { status: u16 },
    /// No endpoint configured; nothing was sent.
    DryRun,
}

pub struct FormService {
    client: reqwest::Client,
    challenge_url: Option<Url>,
    check_url: Option<Url>,
}

impl FormService {
    pub fn new(challenge_url: Option<Url>, check_url: Option<Url>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("otp-verify/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            challenge_url,
            check_url,
        })
    }

    pub async fn request_challenge(
        &self,
        form: &EmailChallengeForm,
    ) -> anyhow::Result<ServiceReply> {
        self.post_form(self.challenge_url.as_ref(), form).await
    }

    pub async fn check_code(&self, form: &CodeCheckForm) -> anyhow::Result<ServiceReply> {
        self.post_form(self.check_url.as_ref(), form).await
    }

    async fn post_form<T: Serialize>(
        &self,
        url: Option<&Url>,
        form: &T,
    ) -> anyhow::Result<ServiceReply> {
        let Some(url) = url else {
            return Ok(ServiceReply::DryRun);
        };
        let response = self
            .client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let reply = classify_response(url, response.status(), location)?;
        tracing::info!(%url, status = %response.status(), ?reply, "form submitted");
        Ok(reply)
    }
}

pub fn classify_response(
    url: &Url,
    status: StatusCode,
    location: Option<String>,
) -> anyhow::Result<ServiceReply> {
    if status.is_redirection() {
        let Some(location) = location else {
            anyhow::bail!("{url} answered {status} without a Location header");
        };
        let location = url
            .join(&location)
            .map(String::from)
            .unwrap_or(location);
        return Ok(ServiceReply::Redirected { location });
    }
    if status.is_success() {
        return Ok(ServiceReply::Rendered {
            status: status.as_u16(),
        });
    }
    anyhow::bail!("{url} answered {status}")
}
