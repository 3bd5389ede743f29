//! Main dialogs
//!
//! A [`Dialog`] is one top-level form of an application. It is announced by
//! an open-dialog directive; its components are only known after
//! [`Dialog::open`] has fetched and parsed the form markup.

use super::component::{Component, ComponentId, ComponentRegistry, ComponentTree, Container};
use super::directives::OpenDialogDirective;
use super::event::Event;
use crate::error::{Result, WebUiError};
use crate::markup::{parse_html, select_first};
use crate::session::{Endpoint, Session};
use std::fmt;

/// Selector of the root element of a form's markup
const BODY_SELECTOR: &str = "[jsct=body]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    app_id: i64,
    name: String,
    title: String,
    layout: [i64; 6],
    flags: [bool; 4],
    tree: ComponentTree,
}

impl Dialog {
    pub fn new(app_id: i64, name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            app_id,
            name: name.into(),
            title: title.into(),
            layout: [0; 6],
            flags: [false; 4],
            tree: ComponentTree::default(),
        }
    }

    pub(crate) fn from_directive(app_id: i64, directive: OpenDialogDirective) -> Self {
        Self {
            layout: directive.layout,
            flags: directive.flags,
            ..Self::new(app_id, directive.name, directive.title)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Id of the owning application
    pub fn app_id(&self) -> i64 {
        self.app_id
    }

    pub fn layout(&self) -> [i64; 6] {
        self.layout
    }

    pub fn flags(&self) -> [bool; 4] {
        self.flags
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    /// Top-level components, in document order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.tree.children()
    }

    /// Any component of the dialog by name
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.tree.by_name(name)
    }

    /// Children and name index of the dialog as a container
    pub fn container(&self) -> &Container {
        self.tree.root()
    }

    /// Fetch the form markup and rebuild the component tree from it
    pub async fn open(&mut self, session: &Session) -> Result<()> {
        let app_id = self.app_id.to_string();
        let body = session
            .get_text(
                Endpoint::WebUi,
                &[("appId", app_id.as_str()), ("form", self.name.as_str())],
            )
            .await?;
        self.rebuild(&body, ComponentRegistry::builtin())?;
        tracing::debug!(dialog = %self.name, components = self.tree.len(), "Opened dialog");
        Ok(())
    }

    /// Replace the component tree with one built from form markup
    pub fn rebuild(&mut self, markup: &str, registry: &ComponentRegistry) -> Result<()> {
        let html = parse_html(markup);
        let body = select_first(&html, BODY_SELECTOR)?;
        self.tree = ComponentTree::build(body, registry)?;
        Ok(())
    }

    /// Route an event raised by one of this dialog's components (or by the
    /// dialog itself when `origin` is `None`) and stamp it with the dialog.
    pub fn route_event(&self, origin: Option<ComponentId>, mut event: Event) -> Result<Event> {
        if let Some(id) = origin {
            let component = self
                .tree
                .get(id)
                .ok_or_else(|| WebUiError::UnknownComponent(format!("{} in dialog {}", id, self.name)))?;
            if tracing::enabled!(tracing::Level::TRACE) {
                let chain: Vec<&str> = self.tree.ancestors(id).map(|owner| owner.name()).collect();
                tracing::trace!(component = %component.name(), via = ?chain, dialog = %self.name, "Routing event");
            }
            if event.component().is_none() {
                event = event.with_component(component.name());
            }
        }
        event.set_dialog(&self.name);
        Ok(event)
    }

    /// Indented listing of the component tree
    pub fn outline(&self) -> String {
        self.tree.outline()
    }
}

impl fmt::Display for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog {} '{}' in application {}", self.name, self.title, self.app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"<html><body>
        <div jsct="body" id="VSES017_StudentZapisneListyDlg0">
          <div jsct="panel" id="mainPanel">
            <span jsct="label" id="popisLabel">Popis</span>
            <button jsct="button" id="zobrazitButton">Zobraziť</button>
          </div>
        </div></body></html>"#;

    fn opened_dialog() -> Dialog {
        let mut dialog = Dialog::new(42, "VSES017_StudentZapisneListyDlg0", "Zápisné listy");
        dialog.rebuild(FORM, ComponentRegistry::builtin()).unwrap();
        dialog
    }

    #[test]
    fn test_rebuild_replaces_tree() {
        let mut dialog = opened_dialog();
        assert_eq!(dialog.components().count(), 1);
        assert!(dialog.component("zobrazitButton").is_some());

        dialog
            .rebuild(
                r#"<div jsct="body" id="x"><span jsct="button" id="other"></span></div>"#,
                ComponentRegistry::builtin(),
            )
            .unwrap();
        assert!(dialog.component("zobrazitButton").is_none());
        assert!(dialog.component("other").is_some());
    }

    #[test]
    fn test_markup_without_body_is_protocol_error() {
        let mut dialog = Dialog::new(1, "F1", "t");
        let err = dialog
            .rebuild("<html><body><p>session expired</p></body></html>", ComponentRegistry::builtin())
            .unwrap_err();
        assert!(matches!(err, WebUiError::ProtocolFormat(_)));
    }

    #[test]
    fn test_route_event_from_component() {
        let dialog = opened_dialog();
        let button = dialog.component("zobrazitButton").unwrap().id();
        let event = dialog
            .route_event(Some(button), Event::new("avc.ui.event.AVCActionEvent"))
            .unwrap();
        assert_eq!(event.dialog(), Some("VSES017_StudentZapisneListyDlg0"));
        assert_eq!(event.component(), Some("zobrazitButton"));
    }

    #[test]
    fn test_route_event_from_dialog() {
        let dialog = opened_dialog();
        let event = dialog.route_event(None, Event::new("x")).unwrap();
        assert_eq!(event.dialog(), Some("VSES017_StudentZapisneListyDlg0"));
        assert_eq!(event.component(), None);
    }

    #[test]
    fn test_route_event_unknown_component() {
        let dialog = Dialog::new(1, "F1", "t");
        let foreign = opened_dialog().component("mainPanel").unwrap().id();
        let err = dialog.route_event(Some(foreign), Event::new("x")).unwrap_err();
        assert!(matches!(err, WebUiError::UnknownComponent(_)));
    }

    #[test]
    fn test_from_directive_keeps_layout() {
        let dialog = Dialog::from_directive(
            7,
            OpenDialogDirective {
                name: "F1".to_string(),
                title: "Hlavné okno".to_string(),
                body_type: "body".to_string(),
                layout: [1, 2, 3, 4, 5, 6],
                flags: [true, false, true, false],
            },
        );
        assert_eq!(dialog.layout(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(dialog.flags(), [true, false, true, false]);
        assert_eq!(dialog.to_string(), "dialog F1 'Hlavné okno' in application 7");
    }
}
