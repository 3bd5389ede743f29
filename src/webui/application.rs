//! Remote application state machine
//!
//! An [`Application`] is one server-side instance of a WebUI program. It goes
//! from initializing (bootstrap handshake) to active and finally to closed,
//! which is terminal.
//!
//! Every round trip sends the queued events together with the serial number
//! and interprets the directives in the response script.

use super::dialog::Dialog;
use super::directives::{self, OpenDialogDirective};
use super::event::Event;
use super::properties::Properties;
use crate::error::{Result, WebUiError};
use crate::markup::{parse_html, select_first, XmlBuilder};
use crate::session::{Endpoint, Session};
use std::collections::HashMap;
use std::sync::Arc;

/// Property of the `app` bag naming the active dialog
pub const ACTIVE_DIALOG_PROPERTY: &str = "activeDlgName";

#[derive(Debug)]
pub struct Application {
    session: Arc<Session>,
    id: i64,
    serial: u64,
    events: Vec<Event>,
    dialogs: HashMap<String, Dialog>,
    active_dialog: Option<String>,
    closed: bool,
    properties: Properties,
}

impl Application {
    /// Application state right after a successful bootstrap, with the
    /// initialization event queued
    pub fn new(session: Arc<Session>, id: i64) -> Self {
        Self {
            session,
            id,
            serial: 0,
            events: vec![Event::init()],
            dialogs: HashMap::new(),
            active_dialog: None,
            closed: false,
            properties: Properties::new("app"),
        }
    }

    /// Start `class_name` on the server and complete the handshake with one
    /// round trip. `extra_params` are appended to the bootstrap query.
    pub async fn open(
        session: Arc<Session>,
        class_name: &str,
        extra_params: &[(&str, &str)],
    ) -> Result<Self> {
        let mut params = vec![("appClassName", class_name), ("fajr", "A")];
        params.extend_from_slice(extra_params);

        let body = session.get_text(Endpoint::WebUi, &params).await?;
        let id = bootstrap_app_id(&body).ok_or_else(|| {
            tracing::warn!(class_name, "No application id in bootstrap page");
            WebUiError::protocol(format!(
                "cannot find appId in the bootstrap response of application {}",
                class_name
            ))
        })?;
        tracing::info!(class_name, app_id = id, "Opened application");

        let mut app = Self::new(session, id);
        app.execute().await?;
        Ok(app)
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Serial number the next round trip will carry
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Events waiting for the next round trip, in enqueue order
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    pub fn dialog(&self, name: &str) -> Option<&Dialog> {
        self.dialogs.get(name)
    }

    pub fn dialogs(&self) -> impl Iterator<Item = &Dialog> {
        self.dialogs.values()
    }

    pub fn active_dialog(&self) -> Option<&Dialog> {
        self.active_dialog
            .as_deref()
            .and_then(|name| self.dialogs.get(name))
    }

    /// Make a registered dialog the active one
    pub fn set_active_dialog(&mut self, name: &str) -> Result<()> {
        if !self.dialogs.contains_key(name) {
            return Err(WebUiError::UnknownDialog(name.to_string()));
        }
        tracing::info!(app_id = self.id, dialog = name, "Active dialog");
        self.active_dialog = Some(name.to_string());
        self.properties.set(ACTIVE_DIALOG_PROPERTY, name);
        Ok(())
    }

    /// Queue an event for the next round trip
    pub fn fire_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Queue an event raised inside a dialog, routed through the dialog so it
    /// carries the dialog name and, if given, the component name
    pub fn fire_component_event(&mut self, dialog: &str, component: Option<&str>, event: Event) -> Result<()> {
        let owner = self
            .dialogs
            .get(dialog)
            .ok_or_else(|| WebUiError::UnknownDialog(dialog.to_string()))?;
        let origin = match component {
            Some(name) => Some(
                owner
                    .component(name)
                    .ok_or_else(|| WebUiError::UnknownComponent(format!("{} in dialog {}", name, dialog)))?
                    .id(),
            ),
            None => None,
        };
        let event = owner.route_event(origin, event)?;
        self.fire_event(event);
        Ok(())
    }

    /// Ask the server to terminate the application. Takes effect on the next
    /// [`execute`](Self::execute).
    pub fn close(&mut self) {
        tracing::info!(app_id = self.id, "Closing application");
        self.fire_event(Event::kill());
    }

    /// Fetch a dialog's markup and build its component tree
    pub async fn open_dialog(&mut self, name: &str) -> Result<&Dialog> {
        let dialog = self
            .dialogs
            .get_mut(name)
            .ok_or_else(|| WebUiError::UnknownDialog(name.to_string()))?;
        dialog.open(&self.session).await?;
        Ok(dialog)
    }

    /// [`open_dialog`](Self::open_dialog) for the active dialog
    pub async fn open_active_dialog(&mut self) -> Result<&Dialog> {
        let name = self
            .active_dialog
            .clone()
            .ok_or_else(|| WebUiError::UnknownDialog("<no active dialog>".to_string()))?;
        self.open_dialog(&name).await
    }

    /// The `xml_spec` document for the queued events
    pub fn request_xml(&self, serial: u64) -> Result<String> {
        let mut xml = XmlBuilder::new();
        xml.start("request", &[])?;
        xml.text_element("serial", &serial.to_string())?;
        xml.start("events", &[])?;
        for event in &self.events {
            event.write_xml(&mut xml)?;
        }
        xml.end("events")?;
        xml.end("request")?;
        xml.finish()
    }

    /// One round trip: send the queued events and apply the response.
    ///
    /// The serial number advances on every call. A message-box directive in
    /// the response fails the call with [`WebUiError::RemoteApplication`].
    pub async fn execute(&mut self) -> Result<()> {
        if self.closed {
            return Err(WebUiError::ApplicationClosed(self.id));
        }

        let serial = self.serial;
        self.serial += 1;
        let xml_spec = self.request_xml(serial)?;
        let app_id = self.id.to_string();

        tracing::debug!(
            app_id = self.id,
            serial,
            events = self.events.len(),
            "Executing round trip"
        );

        let url = self
            .session
            .urls()
            .resolve(Endpoint::WebUi, &[("appId", app_id.as_str())])?;
        let response = self
            .session
            .http()
            .post(url)
            .form(&[("appId", app_id.as_str()), ("xml_spec", xml_spec.as_str())])
            .send()
            .await?
            .error_for_status()?;
        self.events.clear();

        let body = response.text().await?;
        let script = response_script(&body)?;
        self.apply_script(&script)
    }

    /// Interpret the directives of a response script: close, then error,
    /// then dialogs. An error directive stops processing.
    pub fn apply_script(&mut self, script: &str) -> Result<()> {
        if directives::is_close_application(script) && !self.closed {
            tracing::info!(app_id = self.id, "Server closed the application");
            self.closed = true;
        }

        if let Some(message) = directives::find_error_message(script) {
            tracing::warn!(app_id = self.id, message = %message, "Remote application error");
            return Err(WebUiError::RemoteApplication(message));
        }

        for directive in directives::find_open_dialogs(script)? {
            self.register_dialog(directive)?;
        }
        Ok(())
    }

    fn register_dialog(&mut self, directive: OpenDialogDirective) -> Result<()> {
        let name = directive.name.clone();
        tracing::debug!(app_id = self.id, dialog = %name, title = %directive.title, "Dialog announced");
        self.dialogs
            .insert(name.clone(), Dialog::from_directive(self.id, directive));
        if self.active_dialog.is_none() {
            self.set_active_dialog(&name)?;
        }
        Ok(())
    }
}

fn bootstrap_app_id(body: &str) -> Option<i64> {
    let html = parse_html(body);
    let page_body = select_first(&html, "body").ok()?;
    let onload = page_body.value().attr("onload")?;
    directives::parse_bootstrap_app_id(onload)
}

fn response_script(body: &str) -> Result<String> {
    let html = parse_html(body);
    let script = select_first(&html, "script")?;
    Ok(script.text().collect())
}
