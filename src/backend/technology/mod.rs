//! Mirror of one ConnMan technology and the services it owns.

pub mod picker;
pub mod wifi;

use super::error::Result;
use super::properties::PropertyMap;
use super::remote::{self, MirrorCtx, Remote, Subscription};
use super::service::ServiceMirror;
use super::types::{Command, ConnectionType, ServiceState};
use crate::ui::{ElementId, ElementKind, Presenter};

use wifi::WirelessTechnology;

enum Services {
    Flat(Vec<ServiceMirror>),
    Wireless(WirelessTechnology),
}

pub struct TechnologyMirror {
    kind: ConnectionType,
    /// `None` for the synthetic VPN technology, which has no daemon object.
    path: Option<String>,
    properties: PropertyMap,
    section: ElementId,
    power: Option<ElementId>,
    subscription: Option<Subscription>,
    services: Services,
}

pub fn section_label(kind: ConnectionType) -> &'static str {
    match kind {
        ConnectionType::Ethernet => "Wired",
        ConnectionType::Wifi => "Wireless",
        ConnectionType::Bluetooth => "Bluetooth",
        ConnectionType::P2p => "Peer to Peer",
        ConnectionType::Cellular => "Mobile Broadband",
        ConnectionType::Vpn => "VPN",
        ConnectionType::Other => "Other",
    }
}

impl TechnologyMirror {
    /// Create the section at `position` among the other technology sections.
    pub fn new(
        kind: ConnectionType,
        path: Option<&str>,
        properties: PropertyMap,
        position: usize,
        ctx: &mut MirrorCtx,
    ) -> Self {
        let section = ctx.ui.create(
            None,
            Some(position),
            ElementKind::TechnologySection {
                label: section_label(kind).into(),
            },
        );
        let power = path.map(|_| {
            ctx.ui.create(
                Some(section),
                Some(0),
                ElementKind::Button {
                    label: "Turn Off".into(),
                    command: Command::TogglePowered { technology: kind },
                },
            )
        });
        let subscription = path.map(|p| ctx.remote.watch_technology(p));
        let services = match kind {
            ConnectionType::Wifi => Services::Wireless(WirelessTechnology::new()),
            _ => Services::Flat(Vec::new()),
        };

        let technology = Self {
            kind,
            path: path.map(str::to_string),
            properties,
            section,
            power,
            subscription,
            services,
        };
        technology.sync_power(ctx.ui);
        technology
    }

    pub fn kind(&self) -> ConnectionType {
        self.kind
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn section(&self) -> ElementId {
        self.section
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn is_powered(&self) -> bool {
        self.properties.bool("Powered").unwrap_or(false)
    }

    pub fn wireless(&self) -> Option<&WirelessTechnology> {
        match &self.services {
            Services::Wireless(wireless) => Some(wireless),
            Services::Flat(_) => None,
        }
    }

    pub fn services(&self) -> Box<dyn Iterator<Item = &ServiceMirror> + '_> {
        match &self.services {
            Services::Flat(services) => Box::new(services.iter()),
            Services::Wireless(wireless) => wireless.services(),
        }
    }

    fn services_mut(&mut self) -> Box<dyn Iterator<Item = &mut ServiceMirror> + '_> {
        match &mut self.services {
            Services::Flat(services) => Box::new(services.iter_mut()),
            Services::Wireless(wireless) => wireless.services_mut(),
        }
    }

    pub fn service(&self, path: &str) -> Option<&ServiceMirror> {
        self.services().find(|s| s.path() == path)
    }

    /// Register a service, replacing a stale entry with the same path.
    pub fn add_service(
        &mut self,
        path: &str,
        kind: ConnectionType,
        properties: &PropertyMap,
        ctx: &mut MirrorCtx,
    ) -> Result<()> {
        match &mut self.services {
            Services::Flat(services) => {
                if let Some(pos) = services.iter().position(|s| s.path() == path) {
                    tracing::debug!("Replacing stale service {}", path);
                    services.remove(pos).destroy(ctx.ui);
                }
                let service = ServiceMirror::new(path, kind, properties, self.section, ctx);
                services.push(service);
            }
            Services::Wireless(wireless) => {
                wireless.add_service(path, kind, properties, self.section, ctx)?;
            }
        }
        self.refresh_indicator(ctx.ui);
        Ok(())
    }

    /// Returns false if the service is not owned by this technology.
    pub fn update_service(&mut self, path: &str, delta: &PropertyMap, ui: &mut dyn Presenter) -> bool {
        let updated = match &mut self.services {
            Services::Flat(services) => match services.iter_mut().find(|s| s.path() == path) {
                Some(service) => {
                    service.update(delta, ui);
                    true
                }
                None => false,
            },
            Services::Wireless(wireless) => wireless.update_service(path, delta, ui),
        };
        if updated {
            self.refresh_indicator(ui);
        }
        updated
    }

    /// Returns false if the service is not owned by this technology.
    pub fn remove_service(&mut self, path: &str, ui: &mut dyn Presenter) -> bool {
        let removed = match &mut self.services {
            Services::Flat(services) => match services.iter().position(|s| s.path() == path) {
                Some(pos) => {
                    services.remove(pos).destroy(ui);
                    true
                }
                None => false,
            },
            Services::Wireless(wireless) => wireless.remove_service(path, ui),
        };
        if removed {
            self.refresh_indicator(ui);
        }
        removed
    }

    /// Show only the indicator of the most relevant service.
    fn refresh_indicator(&mut self, ui: &mut dyn Presenter) {
        let picked = pick_indicator(self.services()).map(str::to_string);
        for service in self.services_mut() {
            let indicated = picked.as_deref() == Some(service.path());
            service.show_indicator(indicated, ui);
        }
    }

    /// Path of the service whose indicator is shown, if any.
    pub fn indicated_service(&self) -> Option<&str> {
        self.services()
            .find(|s| s.is_indicated())
            .map(ServiceMirror::path)
    }

    pub fn property_changed(&mut self, delta: &PropertyMap, ui: &mut dyn Presenter) {
        for (name, value) in delta.iter() {
            tracing::debug!("Technology {} property {} changed: {:?}", self.kind, name, value);
        }
        self.properties.merge(delta);
        self.sync_power(ui);
    }

    fn sync_power(&self, ui: &mut dyn Presenter) {
        let powered = self.is_powered();
        ui.set_visible(self.section, powered);
        if let Some(power) = self.power {
            ui.set_label(power, if powered { "Turn Off" } else { "Turn On" });
        }
    }

    pub fn toggle_powered(&self, remote: &dyn Remote) {
        match &self.path {
            Some(path) => {
                let powered = !self.is_powered();
                tracing::info!("Setting {} powered: {}", self.kind, powered);
                remote.set_powered(path, powered);
            }
            None => tracing::info!("Technology {} has no power switch", self.kind),
        }
    }

    pub fn open_picker(&mut self, interface: &str, ctx: &mut MirrorCtx) {
        let Some(path) = self.path.as_deref() else {
            tracing::info!("Technology {} cannot scan", self.kind);
            return;
        };
        match &mut self.services {
            Services::Wireless(wireless) => wireless.open_picker(interface, path, ctx),
            Services::Flat(_) => tracing::info!("Technology {} has no network picker", self.kind),
        }
    }

    pub fn picker_select(&mut self, path: &str, ctx: &mut MirrorCtx) {
        if let Services::Wireless(wireless) = &mut self.services {
            wireless.picker_select(path, ctx);
        }
    }

    pub fn picker_cancel(&mut self, ui: &mut dyn Presenter) {
        if let Services::Wireless(wireless) = &mut self.services {
            wireless.picker_cancel(ui);
        }
    }

    /// Tear down every service, the picker, the watch and the section.
    pub fn destroy(mut self, ui: &mut dyn Presenter) {
        tracing::info!("Removing technology {}", self.kind);
        match std::mem::replace(&mut self.services, Services::Flat(Vec::new())) {
            Services::Flat(services) => {
                for service in services {
                    service.destroy(ui);
                }
            }
            Services::Wireless(wireless) => wireless.destroy(ui),
        }
        remote::release(self.subscription.take());
        ui.destroy(self.section);
    }
}

fn indicator_rank(state: ServiceState) -> u8 {
    match state {
        ServiceState::Idle => 0,
        ServiceState::Failure => 1,
        _ => 2,
    }
}

/// Pick the service whose indicator represents the technology.
///
/// The first service is the default. A later non-idle service replaces it,
/// and a later service that is neither idle nor failed replaces that. Ties
/// go to the last one seen.
pub fn pick_indicator<'a>(services: impl Iterator<Item = &'a ServiceMirror>) -> Option<&'a str> {
    let mut picked: Option<(u8, &ServiceMirror)> = None;
    for service in services {
        let rank = indicator_rank(service.state());
        match picked {
            None => picked = Some((rank, service)),
            Some((best, _)) if rank > 0 && rank >= best => picked = Some((rank, service)),
            _ => {}
        }
    }
    picked.map(|(_, service)| service.path())
}
