//! In-memory element tree.
//!
//! Used by the headless runner to render the menu into the log, and by
//! tests as the presentation double.

use std::collections::HashMap;
use std::fmt::Write;

use super::{ElementId, ElementKind, Presenter, UiEvent};
use crate::backend::Command;

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub visible: bool,
    pub sensitive: bool,
    pub label: Option<String>,
    pub status: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
}

#[derive(Debug, Default)]
pub struct UiModel {
    elements: HashMap<ElementId, Element>,
    roots: Vec<ElementId>,
    panel: Vec<ElementId>,
    next_id: u64,
    fixups: usize,
    applet_visible: bool,
}

impl UiModel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Replay an event produced by a [`super::ChannelPresenter`].
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Created {
                id,
                parent,
                position,
                kind,
            } => {
                self.next_id = self.next_id.max(id.0 + 1);
                self.insert(id, parent, position, kind);
            }
            UiEvent::Visible(id, visible) => self.set_visible(id, visible),
            UiEvent::Label(id, label) => self.set_label(id, &label),
            UiEvent::Status(id, status) => self.set_status(id, &status),
            UiEvent::Icon(id, icon) => self.set_icon(id, &icon),
            UiEvent::Badge(id, badge) => self.set_badge(id, badge.as_deref()),
            UiEvent::Sensitive(id, sensitive) => self.set_sensitive(id, sensitive),
            UiEvent::Destroyed(id) => self.destroy(id),
            UiEvent::RemovalFixup(parent) => self.fixup_after_removal(parent),
            UiEvent::AppletVisible(visible) => self.set_applet_visible(visible),
        }
    }

    fn insert(
        &mut self,
        id: ElementId,
        parent: Option<ElementId>,
        position: Option<usize>,
        kind: ElementKind,
    ) {
        let label = match &kind {
            ElementKind::TechnologySection { label }
            | ElementKind::Button { label, .. }
            | ElementKind::SettingsLink { label, .. } => Some(label.clone()),
            ElementKind::InterfaceMenu { interface } => Some(interface.clone()),
            ElementKind::PickerDialog { title } => Some(title.clone()),
            ElementKind::SecretField { name } => Some(name.clone()),
            _ => None,
        };
        let at = self.insertion_index(parent, position, &kind);
        let siblings = match (parent.and_then(|p| self.elements.get_mut(&p)), &kind) {
            (Some(parent), _) => &mut parent.children,
            (None, ElementKind::Indicator) => &mut self.panel,
            (None, _) => &mut self.roots,
        };
        match at {
            Some(index) => siblings.insert(index, id),
            None => siblings.push(id),
        }
        self.elements.insert(
            id,
            Element {
                kind,
                parent,
                children: Vec::new(),
                visible: true,
                sensitive: true,
                label,
                status: None,
                icon: None,
                badge: None,
            },
        );
    }

    /// `position` counts siblings of the same kind only, so sections keep
    /// their order whatever else shares the top level.
    fn insertion_index(
        &self,
        parent: Option<ElementId>,
        position: Option<usize>,
        kind: &ElementKind,
    ) -> Option<usize> {
        let position = position?;
        let siblings = match (parent.and_then(|p| self.elements.get(&p)), kind) {
            (Some(parent), _) => &parent.children,
            (None, ElementKind::Indicator) => &self.panel,
            (None, _) => &self.roots,
        };
        let same_kind: Vec<usize> = siblings
            .iter()
            .enumerate()
            .filter(|(_, id)| {
                self.elements
                    .get(id)
                    .map(|e| std::mem::discriminant(&e.kind) == std::mem::discriminant(kind))
                    .unwrap_or(false)
            })
            .map(|(index, _)| index)
            .collect();
        match same_kind.get(position) {
            Some(index) => Some(*index),
            None => same_kind.last().map(|index| index + 1),
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn exists(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn children(&self, parent: Option<ElementId>) -> Vec<ElementId> {
        match parent {
            Some(id) => self
                .elements
                .get(&id)
                .map(|e| e.children.clone())
                .unwrap_or_default(),
            None => self.roots.clone(),
        }
    }

    /// Indicators shown in the panel, outside the menu.
    pub fn panel(&self) -> Vec<ElementId> {
        self.panel.clone()
    }

    /// Panel indicators currently visible.
    pub fn visible_indicators(&self) -> Vec<ElementId> {
        self.panel
            .iter()
            .copied()
            .filter(|id| self.is_visible(*id))
            .collect()
    }

    pub fn label(&self, id: ElementId) -> Option<&str> {
        self.get(id)?.label.as_deref()
    }

    pub fn status(&self, id: ElementId) -> Option<&str> {
        self.get(id)?.status.as_deref()
    }

    pub fn icon(&self, id: ElementId) -> Option<&str> {
        self.get(id)?.icon.as_deref()
    }

    pub fn badge(&self, id: ElementId) -> Option<&str> {
        self.get(id)?.badge.as_deref()
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.get(id).map(|e| e.visible).unwrap_or(false)
    }

    pub fn is_sensitive(&self, id: ElementId) -> bool {
        self.get(id).map(|e| e.sensitive).unwrap_or(false)
    }

    /// Command raised when the element is activated.
    pub fn command(&self, id: ElementId) -> Option<&Command> {
        match &self.get(id)?.kind {
            ElementKind::Button { command, .. } | ElementKind::PickerEntry { command } => {
                Some(command)
            }
            _ => None,
        }
    }

    /// All live elements matching a predicate, in id order.
    pub fn find(&self, predicate: impl Fn(&Element) -> bool) -> Vec<ElementId> {
        let mut ids: Vec<_> = self
            .elements
            .iter()
            .filter(|(_, e)| predicate(e))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn find_label(&self, label: &str) -> Vec<ElementId> {
        self.find(|e| e.label.as_deref() == Some(label))
    }

    pub fn fixups(&self) -> usize {
        self.fixups
    }

    pub fn applet_visible(&self) -> bool {
        self.applet_visible
    }

    /// Indented dump of the visible tree.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for id in &self.roots {
            self.render_into(*id, 0, &mut out);
        }
        out
    }

    fn render_into(&self, id: ElementId, depth: usize, out: &mut String) {
        let Some(element) = self.elements.get(&id) else {
            return;
        };
        if !element.visible {
            return;
        }
        let _ = writeln!(
            out,
            "{:indent$}{} [{}] {}",
            "",
            element.label.as_deref().unwrap_or("-"),
            element.icon.as_deref().unwrap_or(""),
            element.status.as_deref().unwrap_or(""),
            indent = depth * 2
        );
        for child in &element.children {
            self.render_into(*child, depth + 1, out);
        }
    }

    fn with_element(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) {
        match self.elements.get_mut(&id) {
            Some(element) => f(element),
            None => tracing::debug!("UI update for unknown element {:?}", id),
        }
    }
}

impl Presenter for UiModel {
    fn create(
        &mut self,
        parent: Option<ElementId>,
        position: Option<usize>,
        kind: ElementKind,
    ) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.insert(id, parent, position, kind);
        id
    }

    fn set_visible(&mut self, element: ElementId, visible: bool) {
        self.with_element(element, |e| e.visible = visible);
    }

    fn set_label(&mut self, element: ElementId, label: &str) {
        self.with_element(element, |e| e.label = Some(label.to_string()));
    }

    fn set_status(&mut self, element: ElementId, status: &str) {
        self.with_element(element, |e| e.status = Some(status.to_string()));
    }

    fn set_icon(&mut self, element: ElementId, icon: &str) {
        self.with_element(element, |e| e.icon = Some(icon.to_string()));
    }

    fn set_badge(&mut self, element: ElementId, badge: Option<&str>) {
        self.with_element(element, |e| e.badge = badge.map(str::to_string));
    }

    fn set_sensitive(&mut self, element: ElementId, sensitive: bool) {
        self.with_element(element, |e| e.sensitive = sensitive);
    }

    fn destroy(&mut self, element: ElementId) {
        let Some(removed) = self.elements.remove(&element) else {
            return;
        };
        match removed.parent.and_then(|p| self.elements.get_mut(&p)) {
            Some(parent) => parent.children.retain(|id| *id != element),
            None => {
                self.roots.retain(|id| *id != element);
                self.panel.retain(|id| *id != element);
            }
        }
        for child in removed.children {
            self.destroy(child);
        }
    }

    fn fixup_after_removal(&mut self, _parent: Option<ElementId>) {
        self.fixups += 1;
    }

    fn set_applet_visible(&mut self, visible: bool) {
        self.applet_visible = visible;
    }
}
