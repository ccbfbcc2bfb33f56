//! Mirror of one ConnMan service or VPN connection.

pub mod profile;

use super::properties::PropertyMap;
use super::remote::{self, MirrorCtx, Remote, Subscription};
use super::types::{Command, ConnectionType, Origin, ServiceState};
use crate::ui::{ElementId, ElementKind, Presenter};

use profile::{ServiceProfile, ERROR_ICON};

/// State seen before and after applying a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: ServiceState,
    pub after: ServiceState,
}

pub struct ServiceMirror {
    path: String,
    origin: Origin,
    profile: &'static ServiceProfile,
    properties: PropertyMap,
    state: ServiceState,
    item: ElementId,
    switch: ElementId,
    indicator: ElementId,
    shown: bool,
    indicated: bool,
    subscription: Option<Subscription>,
}

impl ServiceMirror {
    /// Build the mirror under `parent` and apply the initial properties.
    pub fn new(
        path: &str,
        kind: ConnectionType,
        properties: &PropertyMap,
        parent: ElementId,
        ctx: &mut MirrorCtx,
    ) -> Self {
        let profile = profile::profile_for(kind);
        let origin = match kind {
            ConnectionType::Vpn => Origin::VpnConnection,
            _ => Origin::Service,
        };

        let item = ctx.ui.create(Some(parent), None, ElementKind::ServiceItem);
        ctx.ui.set_label(item, profile.default_label);
        let switch = ctx.ui.create(
            Some(item),
            None,
            ElementKind::Button {
                label: ServiceState::Idle.action_label().into(),
                command: Command::ToggleService { path: path.into() },
            },
        );
        ctx.ui.create(
            Some(item),
            None,
            ElementKind::SettingsLink {
                label: profile.settings_label.into(),
                panel: profile.settings_panel.into(),
            },
        );
        let indicator = ctx.ui.create(None, None, ElementKind::Indicator);
        ctx.ui.set_visible(indicator, false);

        let subscription = ctx.remote.watch_service(path, origin);

        let mut service = Self {
            path: path.to_string(),
            origin,
            profile,
            properties: PropertyMap::new(),
            state: ServiceState::Unknown,
            item,
            switch,
            indicator,
            shown: true,
            indicated: false,
            subscription: Some(subscription),
        };
        service.update(properties, ctx.ui);
        service
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ConnectionType {
        self.profile.kind
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn item(&self) -> ElementId {
        self.item
    }

    pub fn indicator(&self) -> ElementId {
        self.indicator
    }

    pub fn is_indicated(&self) -> bool {
        self.indicated
    }

    /// `Ethernet.Interface`, the network device the service runs on.
    pub fn interface(&self) -> Option<&str> {
        self.properties.nested_str("Ethernet", "Interface")
    }

    /// Merge a partial update and refresh every derived attribute.
    pub fn update(&mut self, delta: &PropertyMap, ui: &mut dyn Presenter) -> Transition {
        let before = self.state;
        self.properties.merge(delta);
        if let Some(state) = delta.str("State") {
            self.state = ServiceState::parse(state);
        }

        ui.set_label(self.switch, self.state.action_label());
        ui.set_label(self.item, &self.display_name());
        ui.set_status(self.item, &self.status_text());
        let icon = self.status_icon();
        ui.set_icon(self.item, &icon);
        ui.set_icon(self.indicator, &icon);
        if self.profile.security_badge {
            ui.set_badge(
                self.item,
                profile::security_badge(self.properties.first_str("Security")),
            );
        }
        ui.set_visible(self.item, self.shown);
        ui.set_visible(self.indicator, self.shown && self.indicated);

        Transition {
            before,
            after: self.state,
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.properties.str("Name") {
            return name.to_string();
        }
        match self.profile.kind {
            ConnectionType::Wifi => {
                profile::hidden_network_label(self.properties.first_str("Security")).to_string()
            }
            _ => self.profile.default_label.to_string(),
        }
    }

    pub fn status_text(&self) -> String {
        if self.profile.interface_status {
            if let Some(interface) = self.interface() {
                return interface.to_string();
            }
        }
        match self.state {
            ServiceState::Unknown => String::new(),
            state => state.as_str().to_string(),
        }
    }

    pub fn status_icon(&self) -> String {
        match self.state {
            ServiceState::Online | ServiceState::Ready => {
                self.profile.connected_icon(self.properties.int("Strength"))
            }
            ServiceState::Configuration | ServiceState::Association => {
                self.profile.acquiring.to_string()
            }
            ServiceState::Disconnect | ServiceState::Idle => self.profile.offline.to_string(),
            ServiceState::Failure | ServiceState::Unknown => ERROR_ICON.to_string(),
        }
    }

    /// Connect when idle or failed, disconnect otherwise.
    pub fn connect_or_disconnect(&self, remote: &dyn Remote) {
        if self.state.wants_connect() {
            tracing::info!("Connecting {}", self.path);
            remote.connect_service(&self.path, self.origin);
        } else {
            tracing::info!("Disconnecting {}", self.path);
            remote.disconnect_service(&self.path, self.origin);
        }
    }

    pub fn set_visible(&mut self, visible: bool, ui: &mut dyn Presenter) {
        self.shown = visible;
        ui.set_visible(self.item, visible);
        ui.set_visible(self.indicator, visible && self.indicated);
    }

    pub fn show_indicator(&mut self, indicated: bool, ui: &mut dyn Presenter) {
        if self.indicated == indicated {
            return;
        }
        self.indicated = indicated;
        ui.set_visible(self.indicator, self.shown && indicated);
    }

    /// Release the property watch and every element.
    pub fn destroy(mut self, ui: &mut dyn Presenter) {
        tracing::debug!("Destroying service {}", self.path);
        remote::release(self.subscription.take());
        ui.destroy(self.indicator);
        ui.destroy(self.item);
    }
}

impl std::fmt::Debug for ServiceMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceMirror")
            .field("path", &self.path)
            .field("kind", &self.profile.kind)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::{
        ethernet_service, state, wifi_service, Harness, RemoteCall,
    };

    const SVC: &str = "/net/connman/service/wifi_0011_home_managed_psk";

    fn section(h: &mut Harness) -> ElementId {
        h.ui.create(
            None,
            None,
            ElementKind::TechnologySection {
                label: "Wireless".into(),
            },
        )
    }

    #[test]
    fn update_derives_label_icon_and_action() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        let mut svc = ServiceMirror::new(
            SVC,
            ConnectionType::Wifi,
            &wifi_service("Home", "idle", "wlan0"),
            parent,
            &mut h.ctx(),
        );

        assert_eq!(h.ui.label(svc.item()), Some("Home"));
        assert_eq!(h.ui.icon(svc.item()), Some("network-wireless-offline-symbolic"));
        assert_eq!(h.ui.badge(svc.item()), Some("security-medium-symbolic"));
        assert_eq!(h.ui.find_label("Connect").len(), 1);

        let change = svc.update(&state("ready"), &mut h.ui);
        assert_eq!(change.before, ServiceState::Idle);
        assert_eq!(change.after, ServiceState::Ready);
        assert_eq!(
            h.ui.icon(svc.item()),
            Some("network-wireless-signal-good-symbolic")
        );
        assert_eq!(h.ui.find_label("Disconnect").len(), 1);

        svc.update(&state("failure"), &mut h.ui);
        assert_eq!(h.ui.icon(svc.item()), Some(ERROR_ICON));
        assert_eq!(h.ui.find_label("Reconnect").len(), 1);

        svc.update(&state("association"), &mut h.ui);
        assert_eq!(
            h.ui.icon(svc.item()),
            Some("network-wireless-acquiring-symbolic")
        );
    }

    #[test]
    fn nameless_wifi_gets_hidden_label_by_security() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        let props = PropertyMap::new()
            .with("Type", "wifi")
            .with("State", "idle")
            .with("Security", vec!["wep"]);
        let svc = ServiceMirror::new(SVC, ConnectionType::Wifi, &props, parent, &mut h.ctx());
        assert_eq!(h.ui.label(svc.item()), Some("Hidden WEP network"));
        assert_eq!(h.ui.badge(svc.item()), Some("security-low-symbolic"));
    }

    #[test]
    fn name_survives_later_deltas() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        let mut svc = ServiceMirror::new(
            SVC,
            ConnectionType::Wifi,
            &wifi_service("Home", "idle", "wlan0"),
            parent,
            &mut h.ctx(),
        );
        svc.update(&PropertyMap::new().with("Strength", 20u8), &mut h.ui);
        assert_eq!(svc.display_name(), "Home");
        assert_eq!(svc.interface(), Some("wlan0"));
    }

    #[test]
    fn wired_status_shows_interface() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        let svc = ServiceMirror::new(
            "/net/connman/service/ethernet_0011_cable",
            ConnectionType::Ethernet,
            &ethernet_service("online", "eth0"),
            parent,
            &mut h.ctx(),
        );
        assert_eq!(h.ui.label(svc.item()), Some("Wired Connection"));
        assert_eq!(h.ui.status(svc.item()), Some("eth0"));
        assert_eq!(h.ui.icon(svc.item()), Some("network-wired-symbolic"));
        assert_eq!(h.ui.badge(svc.item()), None);
    }

    #[test]
    fn toggle_follows_state() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        let mut svc = ServiceMirror::new(
            SVC,
            ConnectionType::Wifi,
            &wifi_service("Home", "failure", "wlan0"),
            parent,
            &mut h.ctx(),
        );
        h.remote.take_calls();

        svc.connect_or_disconnect(&h.remote);
        svc.update(&state("online"), &mut h.ui);
        svc.connect_or_disconnect(&h.remote);

        assert_eq!(
            h.remote.calls(),
            vec![
                RemoteCall::Connect {
                    path: SVC.into(),
                    origin: Origin::Service
                },
                RemoteCall::Disconnect {
                    path: SVC.into(),
                    origin: Origin::Service
                },
            ]
        );
    }

    #[test]
    fn destroy_survives_failed_unsubscribe() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        h.remote.fail_teardown(true);
        let svc = ServiceMirror::new(
            SVC,
            ConnectionType::Wifi,
            &wifi_service("Home", "idle", "wlan0"),
            parent,
            &mut h.ctx(),
        );
        let (item, indicator) = (svc.item(), svc.indicator());

        svc.destroy(&mut h.ui);

        assert_eq!(h.remote.cancel_count(&format!("service {}", SVC)), 1);
        assert!(!h.ui.exists(item));
        assert!(!h.ui.exists(indicator));
    }

    #[test]
    fn vpn_connections_use_vpn_origin() {
        let mut h = Harness::new();
        let parent = section(&mut h);
        let path = "/net/connman/vpn/connection/example_com";
        let svc = ServiceMirror::new(
            path,
            ConnectionType::Vpn,
            &PropertyMap::new().with("Type", "vpn").with("State", "idle"),
            parent,
            &mut h.ctx(),
        );
        svc.connect_or_disconnect(&h.remote);
        assert!(h.remote.calls().contains(&RemoteCall::Connect {
            path: path.into(),
            origin: Origin::VpnConnection
        }));
        assert_eq!(h.ui.label(svc.item()), Some("VPN Connection"));
    }
}
