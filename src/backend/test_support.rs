//! Doubles for driving the mirrors without a bus.

use std::cell::{Cell, RefCell};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::Error;
use super::properties::PropertyMap;
use super::remote::{MirrorCtx, Remote, Subscription};
use super::settings::Settings;
use super::types::Origin;
use crate::ui::UiModel;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Connect { path: String, origin: Origin },
    Disconnect { path: String, origin: Origin },
    Scan { technology: String },
    SetPowered { technology: String, powered: bool },
    WatchService { path: String },
    WatchTechnology { path: String },
    StartRescan { technology: String, every: Duration },
}

/// Records outbound calls and subscription cancellations.
#[derive(Default)]
pub struct RecordingRemote {
    calls: RefCell<Vec<RemoteCall>>,
    cancelled: Arc<Mutex<Vec<String>>>,
    failing_teardown: Cell<bool>,
}

impl RecordingRemote {
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<RemoteCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    /// Labels of every subscription cancelled so far, in order.
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn cancel_count(&self, label: &str) -> usize {
        self.cancelled().iter().filter(|l| l.as_str() == label).count()
    }

    /// Subscriptions handed out after this call fail to tear down.
    pub fn fail_teardown(&self, failing: bool) {
        self.failing_teardown.set(failing);
    }

    fn record(&self, call: RemoteCall) {
        self.calls.borrow_mut().push(call);
    }

    fn subscription(&self, label: String) -> Subscription {
        let cancelled = self.cancelled.clone();
        let failing = self.failing_teardown.get();
        let name = label.clone();
        Subscription::new(label, move || {
            if let Ok(mut log) = cancelled.lock() {
                log.push(name.clone());
            }
            if failing {
                return Err(Error::Teardown(name));
            }
            Ok(())
        })
    }
}

impl Remote for RecordingRemote {
    fn connect_service(&self, path: &str, origin: Origin) {
        self.record(RemoteCall::Connect {
            path: path.into(),
            origin,
        });
    }

    fn disconnect_service(&self, path: &str, origin: Origin) {
        self.record(RemoteCall::Disconnect {
            path: path.into(),
            origin,
        });
    }

    fn scan(&self, technology: &str) {
        self.record(RemoteCall::Scan {
            technology: technology.into(),
        });
    }

    fn set_powered(&self, technology: &str, powered: bool) {
        self.record(RemoteCall::SetPowered {
            technology: technology.into(),
            powered,
        });
    }

    fn watch_service(&self, path: &str, _origin: Origin) -> Subscription {
        self.record(RemoteCall::WatchService { path: path.into() });
        self.subscription(format!("service {}", path))
    }

    fn watch_technology(&self, path: &str) -> Subscription {
        self.record(RemoteCall::WatchTechnology { path: path.into() });
        self.subscription(format!("technology {}", path))
    }

    fn start_rescan_timer(&self, technology: &str, every: Duration) -> Subscription {
        self.record(RemoteCall::StartRescan {
            technology: technology.into(),
            every,
        });
        self.subscription(format!("rescan {}", technology))
    }
}

/// Presenter, remote and settings bundled so tests can borrow a context.
pub struct Harness {
    pub ui: UiModel,
    pub remote: RecordingRemote,
    pub settings: Settings,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            ui: UiModel::new(),
            remote: RecordingRemote::default(),
            settings: Settings::default(),
        }
    }

    pub fn ctx(&mut self) -> MirrorCtx<'_> {
        MirrorCtx {
            ui: &mut self.ui,
            remote: &self.remote,
            settings: &self.settings,
        }
    }
}

pub const WIFI_TECH: &str = "/net/connman/technology/wifi";
pub const ETHERNET_TECH: &str = "/net/connman/technology/ethernet";

pub fn powered(on: bool) -> PropertyMap {
    PropertyMap::new().with("Powered", on)
}

pub fn wifi_service(name: &str, state: &str, interface: &str) -> PropertyMap {
    PropertyMap::new()
        .with("Type", "wifi")
        .with("Name", name)
        .with("State", state)
        .with("Security", vec!["psk"])
        .with("Strength", 70u8)
        .with(
            "Ethernet",
            PropertyMap::new().with("Interface", interface),
        )
}

pub fn ethernet_service(state: &str, interface: &str) -> PropertyMap {
    PropertyMap::new()
        .with("Type", "ethernet")
        .with("State", state)
        .with(
            "Ethernet",
            PropertyMap::new().with("Interface", interface),
        )
}

pub fn state(value: &str) -> PropertyMap {
    PropertyMap::new().with("State", value)
}
