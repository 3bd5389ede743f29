//! WebUI session
//!
//! A [`Session`] owns the cookie-bearing HTTP client, the URL resolver for one
//! host and the lazily fetched server version. Applications borrow it through
//! an `Arc`, so several applications can share one login.

pub mod endpoints;
pub mod login;
pub mod version;

pub use endpoints::{Endpoint, UrlResolver};
pub use login::{create_cosign_cookie, CosignCookie, CosignCookieLogin, LoginStrategy, NoLogin};
pub use version::AisVersion;

use crate::config::SessionConfig;
use crate::error::{Result, WebUiError};
use crate::markup::{parse_html, select_first};
use crate::webui::Application;
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct Session {
    http: Client,
    jar: Arc<Jar>,
    urls: UrlResolver,
    login: Box<dyn LoginStrategy>,
    version: OnceCell<AisVersion>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("urls", &self.urls)
            .field("version", &self.version.get())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(config: SessionConfig, login: impl LoginStrategy + 'static) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            jar,
            urls: UrlResolver::new(config.host, config.scheme),
            login: Box::new(login),
            version: OnceCell::new(),
        })
    }

    /// Session from `WEBUI_*` environment variables
    pub fn from_env(login: impl LoginStrategy + 'static) -> Result<Self> {
        Self::new(SessionConfig::from_env()?, login)
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn cookie_jar(&self) -> &Jar {
        &self.jar
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }

    pub async fn login(&self) -> Result<()> {
        tracing::info!(host = %self.urls.host(), "Logging in");
        self.login.login(self).await
    }

    pub async fn logout(&self) -> Result<()> {
        tracing::info!(host = %self.urls.host(), "Logging out");
        self.login.logout(self).await
    }

    /// GET an endpoint and return the body text
    pub(crate) async fn get_text(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<String> {
        let url = self.urls.resolve(endpoint, params)?;
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Server version, fetched from the start page on first use and cached
    pub async fn version(&self) -> Result<AisVersion> {
        let version = self
            .version
            .get_or_try_init(|| async {
                let body = self.get_text(Endpoint::Start, &[]).await?;
                let version = parse_version_page(&body)?;
                tracing::debug!(%version, "Loaded server version");
                Ok::<_, WebUiError>(version)
            })
            .await?;
        Ok(*version)
    }

    /// Start a remote application, see [`Application::open`]
    pub async fn open_application(
        self: &Arc<Self>,
        class_name: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<Application> {
        Application::open(Arc::clone(self), class_name, extra_params).await
    }
}

fn parse_version_page(body: &str) -> Result<AisVersion> {
    let html = parse_html(body);
    let banner: String = select_first(&html, version::VERSION_SELECTOR)?.text().collect();
    AisVersion::parse(&banner).inspect_err(|_| {
        tracing::warn!(banner = %banner, "Unrecognised version banner");
    })
}
