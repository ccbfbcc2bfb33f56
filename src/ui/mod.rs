//! Presentation seam.
//!
//! The mirrors never touch widgets. They drive a [`Presenter`], which a host
//! shell implements with its own menu toolkit, and they receive user intents
//! back as [`Command`]s attached to the elements they create.

mod channel;
mod model;

pub use channel::{ChannelPresenter, UiEvent};
pub use model::{Element, UiModel};

use crate::backend::Command;

/// Opaque handle to one presentation element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// What an element is, so the host can pick a widget for it.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Group of services for one technology
    TechnologySection { label: String },
    /// Per-interface container inside the wireless section
    InterfaceMenu { interface: String },
    /// Expandable entry for one service
    ServiceItem,
    /// Status glyph shown in the panel, outside the menu
    Indicator,
    /// Activatable entry; activation sends `command` to the backend
    Button { label: String, command: Command },
    /// Opens the host settings panel named here
    SettingsLink { label: String, panel: String },
    /// Modal network chooser
    PickerDialog { title: String },
    PickerEntry { command: Command },
    /// Modal credential collection dialog
    CredentialPrompt { service: String },
    /// Masked input inside a credential prompt
    SecretField { name: String },
}

/// Capability interface the mirrors call into.
///
/// `parent == None` addresses the applet's top-level menu (or the panel, for
/// indicators). Destroying an element destroys its children.
pub trait Presenter {
    fn create(&mut self, parent: Option<ElementId>, position: Option<usize>, kind: ElementKind)
        -> ElementId;
    fn set_visible(&mut self, element: ElementId, visible: bool);
    fn set_label(&mut self, element: ElementId, label: &str);
    fn set_status(&mut self, element: ElementId, status: &str);
    fn set_icon(&mut self, element: ElementId, icon: &str);
    fn set_badge(&mut self, element: ElementId, badge: Option<&str>);
    fn set_sensitive(&mut self, element: ElementId, sensitive: bool);
    fn destroy(&mut self, element: ElementId);
    /// Called after any technology or service removal under `parent`.
    fn fixup_after_removal(&mut self, parent: Option<ElementId>);
    /// Show or hide the whole applet (menu section and indicators).
    fn set_applet_visible(&mut self, visible: bool);
}
