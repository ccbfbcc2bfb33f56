use async_channel::Sender;

use super::{ElementId, ElementKind, Presenter};

/// Events sent from backend to UI
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Created {
        id: ElementId,
        parent: Option<ElementId>,
        position: Option<usize>,
        kind: ElementKind,
    },
    Visible(ElementId, bool),
    Label(ElementId, String),
    Status(ElementId, String),
    Icon(ElementId, String),
    Badge(ElementId, Option<String>),
    Sensitive(ElementId, bool),
    Destroyed(ElementId),
    RemovalFixup(Option<ElementId>),
    AppletVisible(bool),
}

/// Presenter that forwards every call to a UI thread over a channel.
///
/// Element ids are allocated here so the backend never waits on the UI.
pub struct ChannelPresenter {
    evt_tx: Sender<UiEvent>,
    next_id: u64,
}

impl ChannelPresenter {
    pub fn new(evt_tx: Sender<UiEvent>) -> Self {
        Self { evt_tx, next_id: 1 }
    }

    fn send(&self, event: UiEvent) {
        if let Err(e) = self.evt_tx.try_send(event) {
            tracing::warn!("Dropping UI event: {}", e);
        }
    }
}

impl Presenter for ChannelPresenter {
    fn create(
        &mut self,
        parent: Option<ElementId>,
        position: Option<usize>,
        kind: ElementKind,
    ) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.send(UiEvent::Created {
            id,
            parent,
            position,
            kind,
        });
        id
    }

    fn set_visible(&mut self, element: ElementId, visible: bool) {
        self.send(UiEvent::Visible(element, visible));
    }

    fn set_label(&mut self, element: ElementId, label: &str) {
        self.send(UiEvent::Label(element, label.to_string()));
    }

    fn set_status(&mut self, element: ElementId, status: &str) {
        self.send(UiEvent::Status(element, status.to_string()));
    }

    fn set_icon(&mut self, element: ElementId, icon: &str) {
        self.send(UiEvent::Icon(element, icon.to_string()));
    }

    fn set_badge(&mut self, element: ElementId, badge: Option<&str>) {
        self.send(UiEvent::Badge(element, badge.map(str::to_string)));
    }

    fn set_sensitive(&mut self, element: ElementId, sensitive: bool) {
        self.send(UiEvent::Sensitive(element, sensitive));
    }

    fn destroy(&mut self, element: ElementId) {
        self.send(UiEvent::Destroyed(element));
    }

    fn fixup_after_removal(&mut self, parent: Option<ElementId>) {
        self.send(UiEvent::RemovalFixup(parent));
    }

    fn set_applet_visible(&mut self, visible: bool) {
        self.send(UiEvent::AppletVisible(visible));
    }
}
