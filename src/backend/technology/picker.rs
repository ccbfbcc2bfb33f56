//! Modal network chooser for one wireless interface.
//!
//! While open the technology is rescanned periodically. Entries whose
//! service disappears are greyed out rather than removed, and come back if
//! the service reappears before the picker closes.

use super::super::remote::{self, MirrorCtx, Subscription};
use super::super::service::ServiceMirror;
use super::super::types::Command;
use crate::ui::{ElementId, ElementKind, Presenter};

struct PickerEntry {
    path: String,
    element: ElementId,
    active: bool,
}

pub struct PickerSession {
    interface: String,
    dialog: ElementId,
    entries: Vec<PickerEntry>,
    rescan: Option<Subscription>,
}

impl PickerSession {
    pub fn open(
        interface: &str,
        technology: &str,
        services: &[ServiceMirror],
        ctx: &mut MirrorCtx,
    ) -> Self {
        tracing::info!("Opening network picker for {}", interface);
        let dialog = ctx.ui.create(
            None,
            None,
            ElementKind::PickerDialog {
                title: "Connect to...".into(),
            },
        );
        let mut session = Self {
            interface: interface.to_string(),
            dialog,
            entries: Vec::new(),
            rescan: None,
        };
        for service in services {
            session.service_added(service, ctx.ui);
        }

        ctx.remote.scan(technology);
        session.rescan = Some(
            ctx.remote
                .start_rescan_timer(technology, ctx.settings.rescan_interval),
        );
        session
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn dialog(&self) -> ElementId {
        self.dialog
    }

    /// Element of the entry for `path`, live or greyed out.
    pub fn entry(&self, path: &str) -> Option<ElementId> {
        self.find(path).map(|e| e.element)
    }

    pub fn is_selectable(&self, path: &str) -> bool {
        self.find(path).map(|e| e.active).unwrap_or(false)
    }

    fn find(&self, path: &str) -> Option<&PickerEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn service_added(&mut self, service: &ServiceMirror, ui: &mut dyn Presenter) {
        let element = match self.entries.iter_mut().find(|e| e.path == service.path()) {
            Some(entry) => {
                entry.active = true;
                ui.set_sensitive(entry.element, true);
                entry.element
            }
            None => {
                let element = ui.create(
                    Some(self.dialog),
                    None,
                    ElementKind::PickerEntry {
                        command: Command::PickerSelect {
                            path: service.path().into(),
                        },
                    },
                );
                self.entries.push(PickerEntry {
                    path: service.path().to_string(),
                    element,
                    active: true,
                });
                element
            }
        };
        render(element, service, ui);
    }

    pub fn service_updated(&mut self, service: &ServiceMirror, ui: &mut dyn Presenter) {
        match self.find(service.path()) {
            Some(entry) => render(entry.element, service, ui),
            None => self.service_added(service, ui),
        }
    }

    pub fn service_removed(&mut self, path: &str, ui: &mut dyn Presenter) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.active = false;
            ui.set_sensitive(entry.element, false);
        }
    }

    /// Stop rescanning and dismiss the dialog.
    pub fn close(mut self, ui: &mut dyn Presenter) {
        tracing::debug!("Closing network picker for {}", self.interface);
        remote::release(self.rescan.take());
        ui.destroy(self.dialog);
    }
}

fn render(element: ElementId, service: &ServiceMirror, ui: &mut dyn Presenter) {
    ui.set_label(element, &service.display_name());
    ui.set_icon(element, &service.status_icon());
    ui.set_status(element, &service.status_text());
}

#[cfg(test)]
mod tests {
    use super::super::TechnologyMirror;
    use crate::backend::test_support::{
        powered, state, wifi_service, Harness, RemoteCall, WIFI_TECH,
    };
    use crate::backend::types::{ConnectionType, Origin};
    use std::time::Duration;

    const HOME: &str = "/net/connman/service/wifi_0011_home_managed_psk";
    const CAFE: &str = "/net/connman/service/wifi_0011_cafe_managed_none";
    const RESCAN: &str = "rescan /net/connman/technology/wifi";

    fn wifi_with_home(h: &mut Harness) -> TechnologyMirror {
        let mut tech = TechnologyMirror::new(
            ConnectionType::Wifi,
            Some(WIFI_TECH),
            powered(true),
            0,
            &mut h.ctx(),
        );
        tech.add_service(
            HOME,
            ConnectionType::Wifi,
            &wifi_service("Home", "idle", "wlan0"),
            &mut h.ctx(),
        )
        .unwrap();
        h.remote.take_calls();
        tech
    }

    fn picker_entry(tech: &TechnologyMirror, path: &str) -> Option<crate::ui::ElementId> {
        tech.wireless()
            .and_then(|w| w.picker())
            .and_then(|p| p.entry(path))
    }

    #[test]
    fn opening_scans_now_and_starts_timer() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());

        assert_eq!(
            h.remote.calls(),
            vec![
                RemoteCall::Scan {
                    technology: WIFI_TECH.into()
                },
                RemoteCall::StartRescan {
                    technology: WIFI_TECH.into(),
                    every: Duration::from_secs(15)
                },
            ]
        );
        let entry = picker_entry(&tech, HOME).unwrap();
        assert_eq!(h.ui.label(entry), Some("Home"));
    }

    #[test]
    fn second_open_is_ignored() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());
        tech.open_picker("wlan0", &mut h.ctx());
        let timers = h
            .remote
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RemoteCall::StartRescan { .. }))
            .count();
        assert_eq!(timers, 1);
        assert_eq!(h.ui.find_label("Connect to...").len(), 1);
    }

    #[test]
    fn select_toggles_and_cancels_timer_once() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());
        let dialog = tech.wireless().and_then(|w| w.picker()).map(|p| p.dialog()).unwrap();

        tech.picker_select(HOME, &mut h.ctx());
        tech.picker_cancel(&mut h.ui);

        assert!(h.remote.calls().contains(&RemoteCall::Connect {
            path: HOME.into(),
            origin: Origin::Service
        }));
        assert_eq!(h.remote.cancel_count(RESCAN), 1);
        assert!(!h.ui.exists(dialog));
        assert!(tech.wireless().and_then(|w| w.picker()).is_none());
    }

    #[test]
    fn cancel_closes_without_side_effect() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());
        tech.picker_cancel(&mut h.ui);

        assert!(!h
            .remote
            .calls()
            .iter()
            .any(|c| matches!(c, RemoteCall::Connect { .. } | RemoteCall::Disconnect { .. })));
        assert_eq!(h.remote.cancel_count(RESCAN), 1);
    }

    #[test]
    fn removed_entries_grey_out_and_come_back() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());

        tech.add_service(
            CAFE,
            ConnectionType::Wifi,
            &wifi_service("Cafe", "idle", "wlan0"),
            &mut h.ctx(),
        )
        .unwrap();
        let cafe = picker_entry(&tech, CAFE).unwrap();
        assert!(h.ui.is_sensitive(cafe));

        tech.remove_service(CAFE, &mut h.ui);
        assert_eq!(picker_entry(&tech, CAFE), Some(cafe));
        assert!(!h.ui.is_sensitive(cafe));

        tech.picker_select(CAFE, &mut h.ctx());
        assert!(!h
            .remote
            .calls()
            .iter()
            .any(|c| matches!(c, RemoteCall::Connect { .. })));
    }

    #[test]
    fn reappearing_entry_is_reenabled_and_updated() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());
        let home = picker_entry(&tech, HOME).unwrap();

        tech.remove_service(HOME, &mut h.ui);
        tech.add_service(
            HOME,
            ConnectionType::Wifi,
            &wifi_service("Home", "idle", "wlan0"),
            &mut h.ctx(),
        )
        .unwrap();
        assert_eq!(picker_entry(&tech, HOME), Some(home));
        assert!(h.ui.is_sensitive(home));

        tech.update_service(HOME, &state("association"), &mut h.ui);
        assert_eq!(h.ui.icon(home), Some("network-wireless-acquiring-symbolic"));
    }

    #[test]
    fn removing_technology_closes_picker() {
        let mut h = Harness::new();
        let mut tech = wifi_with_home(&mut h);
        tech.open_picker("wlan0", &mut h.ctx());
        tech.destroy(&mut h.ui);
        assert_eq!(h.remote.cancel_count(RESCAN), 1);
        assert!(h.ui.find_label("Connect to...").is_empty());
    }
}
