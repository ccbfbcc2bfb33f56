//! Outbound seam between the mirrors and the daemon.
//!
//! Mirrors never await. Every outbound request is fire-and-forget and every
//! watch hands back a [`Subscription`] that the mirror owns and cancels when
//! it is destroyed.

use std::time::Duration;

use tokio::task::AbortHandle;

use super::error::{Error, Result};
use super::settings::Settings;
use super::types::Origin;
use crate::ui::Presenter;

pub trait Remote {
    fn connect_service(&self, path: &str, origin: Origin);
    fn disconnect_service(&self, path: &str, origin: Origin);
    /// Ask a technology to scan for services.
    fn scan(&self, technology: &str);
    fn set_powered(&self, technology: &str, powered: bool);
    /// Forward `PropertyChanged` of one service or VPN connection.
    fn watch_service(&self, path: &str, origin: Origin) -> Subscription;
    fn watch_technology(&self, path: &str) -> Subscription;
    /// Issue `scan(technology)` every `every` until the subscription is cancelled.
    fn start_rescan_timer(&self, technology: &str, every: Duration) -> Subscription;
}

type CancelFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// Handle to a live watch or timer.
///
/// The cancel action runs at most once: either through [`Subscription::cancel`]
/// or, silently, when the handle is dropped.
pub struct Subscription {
    label: String,
    cancel: Option<CancelFn>,
}

impl Subscription {
    pub fn new(label: impl Into<String>, cancel: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            label: label.into(),
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription backed by a spawned task.
    ///
    /// Cancelling fails if the task already ended, which happens when the
    /// remote object went away and its signal stream closed.
    pub fn from_task(label: impl Into<String>, handle: AbortHandle) -> Self {
        let label = label.into();
        let name = label.clone();
        Self::new(label, move || {
            if handle.is_finished() {
                return Err(Error::Teardown(name));
            }
            handle.abort();
            Ok(())
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cancel(mut self) -> Result<()> {
        match self.cancel.take() {
            Some(cancel) => cancel(),
            None => Ok(()),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            if let Err(e) = cancel() {
                tracing::debug!("Dropped subscription {}: {}", self.label, e);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

/// Everything a mirror needs while applying one change.
pub struct MirrorCtx<'a> {
    pub ui: &'a mut dyn Presenter,
    pub remote: &'a dyn Remote,
    pub settings: &'a Settings,
}

/// Cancel a subscription, logging instead of failing.
pub(crate) fn release(subscription: Option<Subscription>) {
    if let Some(subscription) = subscription {
        let label = subscription.label().to_string();
        if let Err(e) = subscription.cancel() {
            tracing::warn!("Failed to release {}: {}", label, e);
        }
    }
}
