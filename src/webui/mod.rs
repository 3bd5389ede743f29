//! WebUI application protocol
//!
//! This module provides:
//! - Events and dirty-tracked properties sent to the server
//! - The component tree mirrored from server-rendered markup
//! - Dialogs and the application round-trip state machine
//! - Matchers for the directives embedded in response scripts

pub mod application;
pub mod component;
pub mod dialog;
pub mod directives;
pub mod event;
pub mod properties;

pub use application::Application;
pub use component::{
    Component, ComponentId, ComponentKind, ComponentRegistry, ComponentTree, ComponentType, Container, Parent,
};
pub use dialog::Dialog;
pub use directives::OpenDialogDirective;
pub use event::Event;
pub use properties::Properties;
