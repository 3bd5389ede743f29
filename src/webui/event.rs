//! Client events
//!
//! An [`Event`] is one user action reported to the server. Events are queued
//! on the application and sent as a batch on the next round trip.

use crate::error::Result;
use crate::markup::XmlBuilder;
use std::collections::BTreeMap;

/// Sent once when an application is created
pub const INIT_EVENT_CLASS: &str = "avc.ui.event.AVCComponentEvent";
/// Sent to ask the server to terminate the application
pub const KILL_EVENT_CLASS: &str = "avc.framework.webui.WebUIKillEvent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    class_name: String,
    dialog: Option<String>,
    component: Option<String>,
    // BTreeMap keeps the serialized field order stable
    fields: BTreeMap<String, String>,
}

impl Event {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            dialog: None,
            component: None,
            fields: BTreeMap::new(),
        }
    }

    /// The event queued when an application starts
    pub fn init() -> Self {
        Self::new(INIT_EVENT_CLASS).with_field("command", "INIT")
    }

    /// The event that asks the server to close the application
    pub fn kill() -> Self {
        Self::new(KILL_EVENT_CLASS).with_field("command", "CLOSE")
    }

    /// Add a field; the value is sent as text
    pub fn with_field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.insert(name.into(), value.to_string());
        self
    }

    /// Associate the event with a component by name
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn dialog(&self) -> Option<&str> {
        self.dialog.as_deref()
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Set by the routing chain when the event passes through a dialog
    pub(crate) fn set_dialog(&mut self, dialog: &str) {
        self.dialog = Some(dialog.to_string());
    }

    /// Write the `<ev>` element for this event
    pub fn write_xml(&self, xml: &mut XmlBuilder) -> Result<()> {
        xml.start("ev", &[])?;
        if let Some(dialog) = &self.dialog {
            xml.text_element("dlgName", dialog)?;
        }
        if let Some(component) = &self.component {
            xml.text_element("compName", component)?;
        }
        xml.start("event", &[("class", self.class_name.as_str())])?;
        for (name, value) in &self.fields {
            xml.text_element(name, value)?;
        }
        xml.end("event")?;
        xml.end("ev")?;
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = XmlBuilder::new();
        self.write_xml(&mut xml)?;
        xml.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_event_xml() {
        assert_eq!(
            Event::init().to_xml().unwrap(),
            r#"<ev><event class="avc.ui.event.AVCComponentEvent"><command>INIT</command></event></ev>"#
        );
    }

    #[test]
    fn test_dialog_and_component_names_come_first() {
        let mut event = Event::new("avc.ui.event.AVCActionEvent")
            .with_component("btnOk")
            .with_field("zeta", 26)
            .with_field("alpha", true);
        event.set_dialog("F1");

        assert_eq!(
            event.to_xml().unwrap(),
            concat!(
                "<ev><dlgName>F1</dlgName><compName>btnOk</compName>",
                r#"<event class="avc.ui.event.AVCActionEvent">"#,
                "<alpha>true</alpha><zeta>26</zeta></event></ev>"
            )
        );
    }

    #[test]
    fn test_field_text_is_escaped() {
        let xml = Event::new("x").with_field("value", "a<b&c").to_xml().unwrap();
        assert!(xml.contains("<value>a&lt;b&amp;c</value>"));
    }

    #[test]
    fn test_kill_event() {
        let event = Event::kill();
        assert_eq!(event.class_name(), KILL_EVENT_CLASS);
        assert_eq!(event.fields().get("command").map(String::as_str), Some("CLOSE"));
        assert!(event.dialog().is_none());
    }
}
