//! Endpoint resolution
//!
//! The server exposes a fixed set of pages. Each logical endpoint maps to a
//! path relative to the site root; [`UrlResolver`] turns it into an absolute URL.

use crate::error::{Result, WebUiError};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Logical endpoints of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The WebUI servlet: application bootstrap, round trips and dialog markup
    WebUi,
    Files,
    Login,
    Logout,
    /// Portal start page, carries the version banner
    Start,
    ChangeModule,
    /// Site root
    Main,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::WebUi,
        Endpoint::Files,
        Endpoint::Login,
        Endpoint::Logout,
        Endpoint::Start,
        Endpoint::ChangeModule,
        Endpoint::Main,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::WebUi => "ais/servlets/WebUIServlet",
            Endpoint::Files => "ais/files/",
            Endpoint::Login => "ais/login.do",
            Endpoint::Logout => "ais/logout.do",
            Endpoint::Start => "ais/start.do",
            Endpoint::ChangeModule => "ais/portal/changeModul.do",
            Endpoint::Main => "",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::WebUi => "webui",
            Endpoint::Files => "files",
            Endpoint::Login => "login",
            Endpoint::Logout => "logout",
            Endpoint::Start => "start",
            Endpoint::ChangeModule => "change_module",
            Endpoint::Main => "main",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = WebUiError;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| WebUiError::UnknownEndpoint(s.to_string()))
    }
}

/// Builds absolute URLs for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    host: String,
    scheme: String,
}

impl UrlResolver {
    pub fn new(host: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: scheme.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// `scheme://host/path`, plus a form-encoded query string when `params` is non-empty
    pub fn resolve(&self, endpoint: Endpoint, params: &[(&str, &str)]) -> Result<Url> {
        let base = format!("{}://{}/{}", self.scheme, self.host, endpoint.path());
        if params.is_empty() {
            Ok(Url::parse(&base)?)
        } else {
            Ok(Url::parse_with_params(&base, params)?)
        }
    }

    /// Same as [`resolve`](Self::resolve), looking the endpoint up by its logical name
    pub fn resolve_named(&self, name: &str, params: &[(&str, &str)]) -> Result<Url> {
        self.resolve(name.parse()?, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> UrlResolver {
        UrlResolver::new("example.test", "https")
    }

    #[test]
    fn test_login_without_params() {
        let url = resolver().resolve_named("login", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.test/ais/login.do");
    }

    #[test]
    fn test_params_are_encoded() {
        let url = resolver()
            .resolve(
                Endpoint::WebUi,
                &[("appClassName", "ais.gui.vs.es.VSES017App"), ("q", "a b&c")],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/ais/servlets/WebUIServlet?appClassName=ais.gui.vs.es.VSES017App&q=a+b%26c"
        );
    }

    #[test]
    fn test_main_is_site_root() {
        let url = resolver().resolve(Endpoint::Main, &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.test/");
    }

    #[test]
    fn test_unknown_name_is_lookup_error() {
        let err = resolver().resolve_named("admin", &[]).unwrap_err();
        assert!(matches!(err, WebUiError::UnknownEndpoint(name) if name == "admin"));
    }

    #[test]
    fn test_names_round_trip() {
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.name().parse::<Endpoint>().unwrap(), endpoint);
        }
    }
}
