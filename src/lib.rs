//! Client for the WebUI remote application protocol
//!
//! Instead of driving a browser, this crate talks to a WebUI server directly:
//! it rebuilds the server's component tree from HTML fragments, queues UI
//! events, sends them as XML over HTTP and interprets the script directives
//! that come back (dialog opened, application closed, error raised).
//!
//! ```no_run
//! use std::sync::Arc;
//! use webui_client::{Session, SessionConfig, NoLogin};
//!
//! # async fn run() -> webui_client::Result<()> {
//! let session = Arc::new(Session::new(SessionConfig::new("ais2.example.test"), NoLogin)?);
//! let mut app = session
//!     .open_application("ais.gui.vs.es.VSES017App", &[("kodAplikacie", "VSES017")])
//!     .await?;
//! app.open_active_dialog().await?;
//! app.close();
//! app.execute().await?;
//! assert!(app.is_closed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod markup;
pub mod session;
pub mod webui;

pub use config::SessionConfig;
pub use error::{Result, WebUiError};
pub use session::{AisVersion, Endpoint, LoginStrategy, NoLogin, Session, UrlResolver};
pub use webui::{Application, Component, ComponentTree, Dialog, Event, Properties};
