//! Login strategies
//!
//! The session does not know how authentication works; it delegates to a
//! [`LoginStrategy`]. The only strategy shipped here replays a cosign cookie
//! obtained elsewhere (e.g. copied from a browser).

use super::endpoints::Endpoint;
use super::Session;
use crate::error::{Result, WebUiError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub const DEFAULT_COSIGN_LOGOUT_URL: &str = "https://login.uniba.sk/logout.cgi";

static COOKIE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cosign-[a-zA-Z0-9._-]+$").unwrap());
static COOKIE_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9 +.@-]+)(/\d+)$").unwrap());
static COOKIE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").unwrap());

#[async_trait]
pub trait LoginStrategy: Send + Sync {
    async fn login(&self, session: &Session) -> Result<()>;

    async fn logout(&self, session: &Session) -> Result<()>;
}

/// Strategy for sessions that need no authentication (public or test servers)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogin;

#[async_trait]
impl LoginStrategy for NoLogin {
    async fn login(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    async fn logout(&self, _session: &Session) -> Result<()> {
        Ok(())
    }
}

/// A validated cosign service cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosignCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// Validate raw cookie material and normalise the value.
///
/// The value arrives as `<token>/<timestamp>`; the timestamp is dropped and
/// spaces in the token become `+`.
pub fn create_cosign_cookie(name: &str, value: &str, domain: &str) -> Result<CosignCookie> {
    if !COOKIE_NAME_RE.is_match(name) {
        return Err(WebUiError::Validation {
            field: "cookie name",
            value: name.to_string(),
        });
    }

    let caps = COOKIE_VALUE_RE
        .captures(value)
        .ok_or_else(|| WebUiError::Validation {
            field: "cookie value",
            value: value.to_string(),
        })?;
    let token = caps[1].replace(' ', "+");

    if !COOKIE_DOMAIN_RE.is_match(domain) {
        return Err(WebUiError::Validation {
            field: "cookie domain",
            value: domain.to_string(),
        });
    }

    Ok(CosignCookie {
        name: name.to_string(),
        value: token,
        domain: domain.to_string(),
    })
}

/// Logs in by installing a pre-obtained cosign cookie into the session jar
#[derive(Debug, Clone)]
pub struct CosignCookieLogin {
    cookie: CosignCookie,
    logout_url: String,
}

impl CosignCookieLogin {
    pub fn new(cookie: CosignCookie) -> Self {
        Self {
            cookie,
            logout_url: DEFAULT_COSIGN_LOGOUT_URL.to_string(),
        }
    }

    pub fn with_logout_url(mut self, logout_url: impl Into<String>) -> Self {
        self.logout_url = logout_url.into();
        self
    }
}

#[async_trait]
impl LoginStrategy for CosignCookieLogin {
    async fn login(&self, session: &Session) -> Result<()> {
        let cookie_url = Url::parse(&format!(
            "{}://{}/",
            session.urls().scheme(),
            self.cookie.domain
        ))?;
        session.cookie_jar().add_cookie_str(
            &format!("{}={}; Path=/", self.cookie.name, self.cookie.value),
            &cookie_url,
        );
        tracing::debug!(cookie = %self.cookie.name, domain = %self.cookie.domain, "Installed cosign cookie");

        let login_url = session.urls().resolve(Endpoint::Login, &[])?;
        session
            .http()
            .get(login_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn logout(&self, session: &Session) -> Result<()> {
        let main_url = session.urls().resolve(Endpoint::Main, &[])?;
        let response = session
            .http()
            .post(&self.logout_url)
            .form(&[("verify", "Odhlásiť"), ("url", main_url.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let start_url = session.urls().resolve(Endpoint::Start, &[])?;
        if response.url() != &start_url {
            tracing::warn!(landed = %response.url(), "Logout ended on an unexpected page");
            return Err(WebUiError::protocol(format!(
                "landed at unexpected page after logout: {}",
                response.url()
            )));
        }
        Ok(())
    }
}
