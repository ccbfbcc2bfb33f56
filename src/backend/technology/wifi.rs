//! Wireless technology: services grouped per network interface.

use std::collections::HashMap;

use super::super::error::{Error, Result};
use super::super::properties::PropertyMap;
use super::super::remote::MirrorCtx;
use super::super::service::ServiceMirror;
use super::super::types::{Command, ConnectionType};
use super::picker::PickerSession;
use crate::ui::{ElementId, ElementKind, Presenter};

const SELECT_LABEL: &str = "Select wireless network";

/// Services of one wireless interface, e.g. `wlan0`.
pub struct WirelessInterface {
    name: String,
    menu: ElementId,
    selector: ElementId,
    services: Vec<ServiceMirror>,
    /// Services that are neither idle, disconnected nor failed
    active: usize,
}

impl WirelessInterface {
    fn new(name: &str, section: ElementId, ui: &mut dyn Presenter) -> Self {
        tracing::debug!("Adding interface {}", name);
        let menu = ui.create(
            Some(section),
            None,
            ElementKind::InterfaceMenu {
                interface: name.into(),
            },
        );
        ui.set_icon(menu, "network-wireless-signal-none-symbolic");
        let selector = ui.create(
            Some(menu),
            Some(0),
            ElementKind::Button {
                label: SELECT_LABEL.into(),
                command: Command::OpenPicker {
                    interface: name.into(),
                },
            },
        );
        let interface = Self {
            name: name.to_string(),
            menu,
            selector,
            services: Vec::new(),
            active: 0,
        };
        interface.sync_selector(ui);
        interface
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn menu(&self) -> ElementId {
        self.menu
    }

    pub fn selector(&self) -> ElementId {
        self.selector
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn services(&self) -> &[ServiceMirror] {
        &self.services
    }

    /// The network selector is offered only while nothing is active.
    fn sync_selector(&self, ui: &mut dyn Presenter) {
        ui.set_visible(self.selector, self.active == 0);
        ui.set_status(self.menu, if self.active == 0 { "Idle" } else { "Connected" });
    }
}

pub struct WirelessTechnology {
    interfaces: Vec<WirelessInterface>,
    /// Service path to interface name
    service_interfaces: HashMap<String, String>,
    picker: Option<PickerSession>,
}

impl WirelessTechnology {
    pub fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            service_interfaces: HashMap::new(),
            picker: None,
        }
    }

    pub fn interface(&self, name: &str) -> Option<&WirelessInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn interfaces(&self) -> &[WirelessInterface] {
        &self.interfaces
    }

    pub fn picker(&self) -> Option<&PickerSession> {
        self.picker.as_ref()
    }

    pub fn services(&self) -> Box<dyn Iterator<Item = &ServiceMirror> + '_> {
        Box::new(self.interfaces.iter().flat_map(|i| i.services.iter()))
    }

    pub fn services_mut(&mut self) -> Box<dyn Iterator<Item = &mut ServiceMirror> + '_> {
        Box::new(self.interfaces.iter_mut().flat_map(|i| i.services.iter_mut()))
    }

    fn interface_index(&mut self, name: &str, section: ElementId, ui: &mut dyn Presenter) -> usize {
        match self.interfaces.iter().position(|i| i.name == name) {
            Some(index) => index,
            None => {
                self.interfaces.push(WirelessInterface::new(name, section, ui));
                self.interfaces.len() - 1
            }
        }
    }

    pub fn add_service(
        &mut self,
        path: &str,
        kind: ConnectionType,
        properties: &PropertyMap,
        section: ElementId,
        ctx: &mut MirrorCtx,
    ) -> Result<()> {
        if self.service_interfaces.contains_key(path) {
            tracing::debug!("Replacing stale wifi service {}", path);
            self.remove_service(path, ctx.ui);
        }
        let name = properties
            .nested_str("Ethernet", "Interface")
            .ok_or_else(|| Error::MissingInterface(path.to_string()))?
            .to_string();

        let index = self.interface_index(&name, section, ctx.ui);
        let interface = &mut self.interfaces[index];

        let mut service = ServiceMirror::new(path, kind, properties, interface.menu, ctx);
        ctx.ui.create(
            Some(service.item()),
            None,
            ElementKind::Button {
                label: SELECT_LABEL.into(),
                command: Command::OpenPicker {
                    interface: name.clone(),
                },
            },
        );
        let active = service.state().is_active();
        service.set_visible(active, ctx.ui);
        if let Some(picker) = self.picker.as_mut().filter(|p| p.interface() == name) {
            picker.service_added(&service, ctx.ui);
        }
        interface.services.push(service);
        if active {
            interface.active += 1;
        }
        interface.sync_selector(ctx.ui);

        self.service_interfaces.insert(path.to_string(), name);
        Ok(())
    }

    pub fn update_service(&mut self, path: &str, delta: &PropertyMap, ui: &mut dyn Presenter) -> bool {
        let Some(name) = self.service_interfaces.get(path) else {
            return false;
        };
        let Some(interface) = self.interfaces.iter_mut().find(|i| &i.name == name) else {
            tracing::error!("Tried to update nonexisting wifi interface {}", name);
            return false;
        };
        let Some(service) = interface.services.iter_mut().find(|s| s.path() == path) else {
            return false;
        };

        let change = service.update(delta, ui);
        let active = change.after.is_active();
        service.set_visible(active, ui);
        if let Some(picker) = self.picker.as_mut().filter(|p| p.interface() == name.as_str()) {
            picker.service_updated(service, ui);
        }

        match (change.before.is_active(), active) {
            (false, true) => interface.active += 1,
            (true, false) => interface.active -= 1,
            _ => {}
        }
        interface.sync_selector(ui);
        true
    }

    pub fn remove_service(&mut self, path: &str, ui: &mut dyn Presenter) -> bool {
        let Some(name) = self.service_interfaces.remove(path) else {
            return false;
        };
        let Some(interface) = self.interfaces.iter_mut().find(|i| i.name == name) else {
            tracing::error!("Tried to remove from nonexisting wifi interface {}", name);
            return false;
        };
        let Some(pos) = interface.services.iter().position(|s| s.path() == path) else {
            return false;
        };

        let service = interface.services.remove(pos);
        if service.state().is_active() {
            interface.active -= 1;
        }
        service.destroy(ui);
        interface.sync_selector(ui);

        if let Some(picker) = self.picker.as_mut().filter(|p| p.interface() == name) {
            picker.service_removed(path, ui);
        }
        true
    }

    /// Open the picker for one interface. Only one picker may be open.
    pub fn open_picker(&mut self, name: &str, technology: &str, ctx: &mut MirrorCtx) {
        if let Some(open) = &self.picker {
            tracing::info!(
                "Network picker for {} already open, ignoring request for {}",
                open.interface(),
                name
            );
            return;
        }
        let Some(interface) = self.interface(name) else {
            tracing::info!("Tried to open picker for unknown interface {}", name);
            return;
        };
        let session = PickerSession::open(name, technology, &interface.services, ctx);
        self.picker = Some(session);
    }

    /// Toggle the chosen service and close the picker.
    pub fn picker_select(&mut self, path: &str, ctx: &mut MirrorCtx) {
        let Some(picker) = self.picker.take() else {
            tracing::info!("No network picker open");
            return;
        };
        if picker.is_selectable(path) {
            match self.services().find(|s| s.path() == path) {
                Some(service) => service.connect_or_disconnect(ctx.remote),
                None => tracing::info!("Picked unknown service {}", path),
            }
        } else {
            tracing::info!("Picked inactive entry {}", path);
        }
        picker.close(ctx.ui);
    }

    pub fn picker_cancel(&mut self, ui: &mut dyn Presenter) {
        if let Some(picker) = self.picker.take() {
            tracing::info!("User canceled wifi dialog");
            picker.close(ui);
        }
    }

    pub fn destroy(mut self, ui: &mut dyn Presenter) {
        if let Some(picker) = self.picker.take() {
            picker.close(ui);
        }
        for interface in self.interfaces.drain(..) {
            for service in interface.services {
                service.destroy(ui);
            }
            ui.destroy(interface.menu);
        }
    }
}

impl Default for WirelessTechnology {
    fn default() -> Self {
        Self::new()
    }
}
