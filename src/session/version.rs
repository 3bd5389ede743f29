//! Server version banner

use crate::error::{Result, WebUiError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// CSS class of the element that carries the banner on the start page
pub const VERSION_SELECTOR: &str = ".verzia";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AiS2 verzia (2)\.([0-9]+)\.([0-9]+)\.([0-9]+)").unwrap());

/// Four-part server version, e.g. `2.3.24.18`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AisVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl AisVersion {
    /// Parse the banner text, e.g. `AiS2 verzia 2.3.24.18`
    pub fn parse(banner: &str) -> Result<Self> {
        let invalid = || WebUiError::protocol(format!("invalid AIS version string: {:?}", banner));
        let caps = VERSION_RE.captures(banner.trim()).ok_or_else(invalid)?;
        let part = |idx: usize| caps[idx].parse::<u32>().map_err(|_| invalid());
        Ok(Self {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
            build: part(4)?,
        })
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.major, self.minor, self.patch, self.build)
    }
}

impl fmt::Display for AisVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}
