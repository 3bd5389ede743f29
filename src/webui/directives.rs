//! Response directives
//!
//! The server drives the client through fixed JavaScript calls embedded in
//! the first `<script>` of each response. The call shapes are owned by the
//! server and are matched literally here, one matcher per directive.

use crate::error::{Result, WebUiError};
use regex::Regex;
use std::sync::LazyLock;

static CLOSE_APPLICATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"webui\(\)\.serverCloseApplication\(\);").unwrap());

static MESSAGE_BOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"webui\(\)\.messageBox\("((?:[^"\\]|\\.)+)","Chyba","",""\);"#).unwrap()
});

/// Marks the start of an open-dialog call, well-formed or not
const OPEN_MAIN_DIALOG_CALL: &str = "dm().openMainDialog(";

static OPEN_MAIN_DIALOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"dm\(\)\.openMainDialog\("([^"]+)","([^"]+)","([^"]+)","#,
        r"(-?\d+),(-?\d+),(-?\d+),(-?\d+),(-?\d+),(-?\d+),",
        r"(true|false),(true|false),(true|false),(true|false)\);"
    ))
    .unwrap()
});

static BOOTSTRAP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^window\.setTimeout\("WebUI_init\(\\"([0-9]+)\\", \\"ais\\", \\"ais/webui2\\"\)", 1\)"#)
        .unwrap()
});

/// One `dm().openMainDialog(...)` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDialogDirective {
    pub name: String,
    pub title: String,
    /// Type tag of the dialog body, `body` in practice
    pub body_type: String,
    /// Position and size hints, passed through untouched
    pub layout: [i64; 6],
    pub flags: [bool; 4],
}

/// `webui().serverCloseApplication();`
pub fn is_close_application(script: &str) -> bool {
    CLOSE_APPLICATION_RE.is_match(script)
}

/// Error text of a `webui().messageBox("<text>","Chyba","","");` call
pub fn find_error_message(script: &str) -> Option<String> {
    MESSAGE_BOX_RE
        .captures(script)
        .map(|caps| unescape_js(&caps[1]))
}

/// Undo backslash escapes of a JavaScript string literal body
fn unescape_js(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Every open-dialog call, in script order.
///
/// A call that starts like an open-dialog call but does not match the full
/// argument list is a protocol error.
pub fn find_open_dialogs(script: &str) -> Result<Vec<OpenDialogDirective>> {
    let mut directives = Vec::new();
    for caps in OPEN_MAIN_DIALOG_RE.captures_iter(script) {
        let mut layout = [0i64; 6];
        for (slot, idx) in layout.iter_mut().zip(4..10) {
            *slot = caps[idx].parse().map_err(|_| {
                WebUiError::protocol(format!("layout value out of range: {}", &caps[idx]))
            })?;
        }
        let mut flags = [false; 4];
        for (slot, idx) in flags.iter_mut().zip(10..14) {
            *slot = &caps[idx] == "true";
        }
        directives.push(OpenDialogDirective {
            name: caps[1].to_string(),
            title: caps[2].to_string(),
            body_type: caps[3].to_string(),
            layout,
            flags,
        });
    }

    let calls = script.matches(OPEN_MAIN_DIALOG_CALL).count();
    if calls != directives.len() {
        tracing::warn!(calls, parsed = directives.len(), "Malformed openMainDialog call");
        return Err(WebUiError::protocol(format!(
            "malformed openMainDialog directive ({} calls, {} well-formed)",
            calls,
            directives.len()
        )));
    }
    Ok(directives)
}

/// Application id from the bootstrap page's `<body onload=...>` attribute
pub fn parse_bootstrap_app_id(onload: &str) -> Option<i64> {
    BOOTSTRAP_RE
        .captures(onload)
        .and_then(|caps| caps[1].parse().ok())
}
