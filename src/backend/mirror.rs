//! Registry of technologies and the services they own.
//!
//! One mirror lives for as long as the backend runs. The core daemon's
//! technologies are cleared when it vanishes and rebuilt from enumeration when
//! it returns; the VPN technology follows the VPN daemon the same way.

use std::collections::HashMap;

use super::error::{Error, Result};
use super::properties::{PropertyMap, PropertyValue};
use super::remote::MirrorCtx;
use super::technology::TechnologyMirror;
use super::types::{Command, ConnectionType};

/// Notifications from the daemons, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    TechnologyAdded {
        path: String,
        properties: PropertyMap,
    },
    TechnologyRemoved {
        path: String,
    },
    TechnologyPropertyChanged {
        path: String,
        delta: PropertyMap,
    },
    ServicesChanged {
        changed: Vec<(String, PropertyMap)>,
        removed: Vec<String>,
    },
    ServicePropertyChanged {
        path: String,
        delta: PropertyMap,
    },
    ManagerPropertyChanged {
        name: String,
        value: PropertyValue,
    },
    VpnConnectionAdded {
        path: String,
        properties: PropertyMap,
    },
    VpnConnectionRemoved {
        path: String,
    },
}

#[derive(Default)]
pub struct ManagerMirror {
    /// Sorted by display priority
    technologies: Vec<TechnologyMirror>,
    /// Service path to owning technology
    service_index: HashMap<String, ConnectionType>,
}

impl ManagerMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn technology(&self, kind: ConnectionType) -> Option<&TechnologyMirror> {
        self.technologies.iter().find(|t| t.kind() == kind)
    }

    fn technology_mut(&mut self, kind: ConnectionType) -> Option<&mut TechnologyMirror> {
        self.technologies.iter_mut().find(|t| t.kind() == kind)
    }

    pub fn technology_kinds(&self) -> Vec<ConnectionType> {
        self.technologies.iter().map(|t| t.kind()).collect()
    }

    pub fn service_owner(&self, path: &str) -> Option<ConnectionType> {
        self.service_index.get(path).copied()
    }

    /// Display name of a tracked service, for prompts.
    pub fn service_name(&self, path: &str) -> Option<String> {
        self.technology(self.service_owner(path)?)?
            .service(path)
            .map(|s| s.display_name())
    }

    pub fn service_count(&self) -> usize {
        self.service_index.len()
    }

    pub fn technology_added(
        &mut self,
        path: &str,
        properties: PropertyMap,
        ctx: &mut MirrorCtx,
    ) -> Result<()> {
        let kind = ConnectionType::from_technology_path(path);
        if kind == ConnectionType::Other {
            let key = path.rsplit('/').next().unwrap_or(path);
            return Err(Error::UnknownTechnology(key.to_string()));
        }
        if kind == ConnectionType::Vpn {
            tracing::debug!("Skipping VPN technology {}, tracked through the VPN daemon", path);
            return Ok(());
        }
        self.insert_technology(kind, Some(path), properties, ctx);
        Ok(())
    }

    fn insert_technology(
        &mut self,
        kind: ConnectionType,
        path: Option<&str>,
        properties: PropertyMap,
        ctx: &mut MirrorCtx,
    ) {
        if self.technology(kind).is_some() {
            tracing::info!("Technology {} already registered", kind);
            return;
        }
        tracing::info!("Adding technology {}", kind);
        let position = self
            .technologies
            .partition_point(|t| t.kind().priority() < kind.priority());
        let technology = TechnologyMirror::new(kind, path, properties, position, ctx);
        self.technologies.insert(position, technology);
    }

    pub fn technology_removed(&mut self, path: &str, ctx: &mut MirrorCtx) {
        let kind = ConnectionType::from_technology_path(path);
        if kind == ConnectionType::Vpn {
            tracing::debug!("Ignoring removal of VPN technology {}", path);
            return;
        }
        self.remove_technology(kind, ctx);
    }

    fn remove_technology(&mut self, kind: ConnectionType, ctx: &mut MirrorCtx) {
        let Some(pos) = self.technologies.iter().position(|t| t.kind() == kind) else {
            tracing::info!("Tried to remove unknown technology {}", kind);
            return;
        };
        self.technologies.remove(pos).destroy(ctx.ui);
        self.service_index.retain(|_, owner| *owner != kind);
        ctx.ui.fixup_after_removal(None);
    }

    /// Merge a service's properties, creating its mirror on first sight.
    pub fn service_changed(
        &mut self,
        path: &str,
        properties: &PropertyMap,
        ctx: &mut MirrorCtx,
    ) -> Result<()> {
        if let Some(kind) = self.service_owner(path) {
            tracing::debug!("Updating service {}", path);
            if let Some(technology) = self.technology_mut(kind) {
                technology.update_service(path, properties, ctx.ui);
            }
            return Ok(());
        }

        let kind = properties
            .str("Type")
            .map(ConnectionType::parse)
            .unwrap_or_else(|| ConnectionType::from_service_path(path));
        if kind == ConnectionType::Vpn {
            tracing::debug!("Skipping VPN service {}, tracked through the VPN daemon", path);
            return Ok(());
        }
        self.add_service(path, kind, properties, ctx)
    }

    fn add_service(
        &mut self,
        path: &str,
        kind: ConnectionType,
        properties: &PropertyMap,
        ctx: &mut MirrorCtx,
    ) -> Result<()> {
        tracing::debug!("Adding service {}", path);
        let technology = self
            .technology_mut(kind)
            .ok_or_else(|| Error::MissingTechnology {
                kind,
                path: path.to_string(),
            })?;
        technology.add_service(path, kind, properties, ctx)?;
        self.service_index.insert(path.to_string(), kind);
        Ok(())
    }

    pub fn service_removed(&mut self, path: &str, ctx: &mut MirrorCtx) {
        let Some(kind) = self.service_index.remove(path) else {
            tracing::info!("Tried to remove unknown service {}", path);
            return;
        };
        tracing::debug!("Removing service {}", path);
        let parent = match self.technology_mut(kind) {
            Some(technology) => {
                technology.remove_service(path, ctx.ui);
                Some(technology.section())
            }
            None => None,
        };
        ctx.ui.fixup_after_removal(parent);
    }

    /// Apply one `ServicesChanged` batch. A bad entry never blocks the rest.
    pub fn services_changed(
        &mut self,
        changed: &[(String, PropertyMap)],
        removed: &[String],
        ctx: &mut MirrorCtx,
    ) {
        for (path, properties) in changed {
            if let Err(e) = self.service_changed(path, properties, ctx) {
                tracing::warn!("Failed to apply change to {}: {}", path, e);
            }
        }
        for path in removed {
            self.service_removed(path, ctx);
        }
    }

    pub fn technology_property_changed(
        &mut self,
        path: &str,
        delta: &PropertyMap,
        ctx: &mut MirrorCtx,
    ) {
        let kind = ConnectionType::from_technology_path(path);
        match self.technology_mut(kind) {
            Some(technology) => technology.property_changed(delta, ctx.ui),
            None => tracing::info!("Property change for unknown technology {}", path),
        }
    }

    pub fn vpn_connection_added(
        &mut self,
        path: &str,
        properties: &PropertyMap,
        ctx: &mut MirrorCtx,
    ) -> Result<()> {
        let mut properties = properties.clone();
        properties.insert("Type", "vpn");
        if self.service_owner(path).is_some() {
            self.service_changed(path, &properties, ctx)
        } else {
            self.add_service(path, ConnectionType::Vpn, &properties, ctx)
        }
    }

    /// Drop every technology except VPN.
    pub fn clear(&mut self, ctx: &mut MirrorCtx) {
        let kinds: Vec<_> = self
            .technology_kinds()
            .into_iter()
            .filter(|k| *k != ConnectionType::Vpn)
            .collect();
        for kind in kinds {
            self.remove_technology(kind, ctx);
        }
    }

    pub fn clear_vpn(&mut self, ctx: &mut MirrorCtx) {
        if self.technology(ConnectionType::Vpn).is_some() {
            self.remove_technology(ConnectionType::Vpn, ctx);
        }
    }

    /// Rebuild the core daemon's tree from a fresh enumeration.
    pub fn resync(
        &mut self,
        technologies: Vec<(String, PropertyMap)>,
        services: Vec<(String, PropertyMap)>,
        ctx: &mut MirrorCtx,
    ) {
        tracing::info!("Updating all technologies");
        self.clear(ctx);
        for (path, properties) in technologies {
            if let Err(e) = self.technology_added(&path, properties, ctx) {
                tracing::warn!("Failed to add technology {}: {}", path, e);
            }
        }
        tracing::info!("Updating all services");
        self.services_changed(&services, &[], ctx);
    }

    /// Rebuild the VPN technology from `GetConnections`.
    pub fn resync_vpn(&mut self, connections: Vec<(String, PropertyMap)>, ctx: &mut MirrorCtx) {
        tracing::info!("Updating all vpn connections");
        self.clear_vpn(ctx);
        self.insert_technology(
            ConnectionType::Vpn,
            None,
            PropertyMap::new().with("Powered", true),
            ctx,
        );
        for (path, properties) in connections {
            if let Err(e) = self.vpn_connection_added(&path, &properties, ctx) {
                tracing::warn!("Failed to add vpn connection {}: {}", path, e);
            }
        }
    }

    /// Apply one notification, logging instead of failing.
    pub fn dispatch(&mut self, inbound: Inbound, ctx: &mut MirrorCtx) {
        match inbound {
            Inbound::TechnologyAdded { path, properties } => {
                if let Err(e) = self.technology_added(&path, properties, ctx) {
                    tracing::warn!("Failed to add technology {}: {}", path, e);
                }
            }
            Inbound::TechnologyRemoved { path } => self.technology_removed(&path, ctx),
            Inbound::TechnologyPropertyChanged { path, delta } => {
                self.technology_property_changed(&path, &delta, ctx)
            }
            Inbound::ServicesChanged { changed, removed } => {
                self.services_changed(&changed, &removed, ctx)
            }
            Inbound::ServicePropertyChanged { path, delta } => {
                match self.service_owner(&path) {
                    Some(_) => {
                        if let Err(e) = self.service_changed(&path, &delta, ctx) {
                            tracing::warn!("Failed to update {}: {}", path, e);
                        }
                    }
                    None => tracing::debug!("Property change for untracked service {}", path),
                }
            }
            Inbound::ManagerPropertyChanged { name, value } => {
                tracing::debug!("Global property {} changed: {:?}", name, value);
            }
            Inbound::VpnConnectionAdded { path, properties } => {
                if let Err(e) = self.vpn_connection_added(&path, &properties, ctx) {
                    tracing::warn!("Failed to add vpn connection {}: {}", path, e);
                }
            }
            Inbound::VpnConnectionRemoved { path } => self.service_removed(&path, ctx),
        }
    }

    /// Handle a user intent aimed at the mirror tree.
    pub fn handle_command(&mut self, command: Command, ctx: &mut MirrorCtx) {
        match command {
            Command::ToggleService { path } => {
                let service = self
                    .service_owner(&path)
                    .and_then(|kind| self.technology(kind))
                    .and_then(|t| t.service(&path));
                match service {
                    Some(service) => service.connect_or_disconnect(ctx.remote),
                    None => tracing::info!("Toggle for unknown service {}", path),
                }
            }
            Command::TogglePowered { technology } => match self.technology(technology) {
                Some(t) => t.toggle_powered(ctx.remote),
                None => tracing::info!("Power toggle for unknown technology {}", technology),
            },
            Command::OpenPicker { interface } => match self.technology_mut(ConnectionType::Wifi) {
                Some(wifi) => wifi.open_picker(&interface, ctx),
                None => tracing::info!("No wifi technology for picker on {}", interface),
            },
            Command::PickerSelect { path } => {
                if let Some(wifi) = self.technology_mut(ConnectionType::Wifi) {
                    wifi.picker_select(&path, ctx);
                }
            }
            Command::PickerCancel => {
                if let Some(wifi) = self.technology_mut(ConnectionType::Wifi) {
                    wifi.picker_cancel(ctx.ui);
                }
            }
            Command::Shutdown
            | Command::SubmitCredentials { .. }
            | Command::CancelCredentials => {
                tracing::debug!("Command is not for the mirror")
            }
        }
    }
}
