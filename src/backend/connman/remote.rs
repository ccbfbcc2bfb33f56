//! [`Remote`] backed by the system bus.
//!
//! Calls are spawned and never awaited by the loop; failures are logged.
//! Watches are spawned tasks that forward `PropertyChanged` signals into the
//! inbound channel until their subscription aborts them.

use std::future::Future;
use std::time::Duration;

use async_channel::Sender;
use futures::StreamExt;
use zbus::zvariant::{OwnedValue, Value};

use super::super::mirror::Inbound;
use super::super::properties::PropertyMap;
use super::super::remote::{Remote, Subscription};
use super::super::settings::Settings;
use super::super::types::Origin;
use super::proxy::{ServiceProxy, TechnologyProxy, VpnConnectionProxy};

#[derive(Clone)]
pub struct DbusRemote {
    conn: zbus::Connection,
    inbound_tx: Sender<Inbound>,
    bus_name: String,
    vpn_bus_name: String,
}

impl DbusRemote {
    pub fn new(conn: zbus::Connection, inbound_tx: Sender<Inbound>, settings: &Settings) -> Self {
        Self {
            conn,
            inbound_tx,
            bus_name: settings.bus_name.clone(),
            vpn_bus_name: settings.vpn_bus_name.clone(),
        }
    }

    fn spawn_call<F>(&self, action: &'static str, target: String, call: F)
    where
        F: Future<Output = zbus::Result<()>> + Send + 'static,
    {
        tokio::spawn(async move {
            match call.await {
                Ok(()) => tracing::debug!("{} {} done", action, target),
                Err(e) => tracing::warn!("{} {} failed: {}", action, target, e),
            }
        });
    }
}

async fn service_proxy(
    conn: &zbus::Connection,
    bus: String,
    path: String,
) -> zbus::Result<ServiceProxy<'static>> {
    ServiceProxy::builder(conn)
        .destination(bus)?
        .path(path)?
        .build()
        .await
}

async fn connection_proxy(
    conn: &zbus::Connection,
    bus: String,
    path: String,
) -> zbus::Result<VpnConnectionProxy<'static>> {
    VpnConnectionProxy::builder(conn)
        .destination(bus)?
        .path(path)?
        .build()
        .await
}

pub(crate) async fn technology_proxy(
    conn: &zbus::Connection,
    bus: String,
    path: String,
) -> zbus::Result<TechnologyProxy<'static>> {
    TechnologyProxy::builder(conn)
        .destination(bus)?
        .path(path)?
        .build()
        .await
}

/// Decode one `PropertyChanged` payload, logging malformed ones.
fn decode_change(path: &str, name: &str, value: &OwnedValue) -> Option<PropertyMap> {
    match PropertyMap::from_change(name, value) {
        Ok(delta) => Some(delta),
        Err(e) => {
            tracing::warn!("Ignoring property change on {}: {}", path, e);
            None
        }
    }
}

impl Remote for DbusRemote {
    fn connect_service(&self, path: &str, origin: Origin) {
        let conn = self.conn.clone();
        let target = path.to_string();
        match origin {
            Origin::Service => {
                let bus = self.bus_name.clone();
                self.spawn_call("Connect", target.clone(), async move {
                    service_proxy(&conn, bus, target).await?.connect().await
                });
            }
            Origin::VpnConnection => {
                let bus = self.vpn_bus_name.clone();
                self.spawn_call("Connect", target.clone(), async move {
                    connection_proxy(&conn, bus, target).await?.connect().await
                });
            }
        }
    }

    fn disconnect_service(&self, path: &str, origin: Origin) {
        let conn = self.conn.clone();
        let target = path.to_string();
        match origin {
            Origin::Service => {
                let bus = self.bus_name.clone();
                self.spawn_call("Disconnect", target.clone(), async move {
                    service_proxy(&conn, bus, target).await?.disconnect().await
                });
            }
            Origin::VpnConnection => {
                let bus = self.vpn_bus_name.clone();
                self.spawn_call("Disconnect", target.clone(), async move {
                    connection_proxy(&conn, bus, target).await?.disconnect().await
                });
            }
        }
    }

    fn scan(&self, technology: &str) {
        let conn = self.conn.clone();
        let bus = self.bus_name.clone();
        let target = technology.to_string();
        self.spawn_call("Scan", target.clone(), async move {
            technology_proxy(&conn, bus, target).await?.scan().await
        });
    }

    fn set_powered(&self, technology: &str, powered: bool) {
        let conn = self.conn.clone();
        let bus = self.bus_name.clone();
        let target = technology.to_string();
        self.spawn_call("SetProperty Powered on", target.clone(), async move {
            technology_proxy(&conn, bus, target)
                .await?
                .set_technology_property("Powered", &Value::from(powered))
                .await
        });
    }

    fn watch_service(&self, path: &str, origin: Origin) -> Subscription {
        let conn = self.conn.clone();
        let tx = self.inbound_tx.clone();
        let target = path.to_string();
        let handle = match origin {
            Origin::Service => {
                let bus = self.bus_name.clone();
                tokio::spawn(async move {
                    let result: zbus::Result<()> = async {
                        let proxy = service_proxy(&conn, bus, target.clone()).await?;
                        let mut changes = proxy.receive_service_property_changed().await?;
                        while let Some(signal) = changes.next().await {
                            let args = signal.args()?;
                            let Some(delta) = decode_change(&target, args.name(), args.value())
                            else {
                                continue;
                            };
                            let event = Inbound::ServicePropertyChanged {
                                path: target.clone(),
                                delta,
                            };
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(())
                    }
                    .await;
                    if let Err(e) = result {
                        tracing::warn!("Watch on service {} ended: {}", target, e);
                    }
                })
            }
            Origin::VpnConnection => {
                let bus = self.vpn_bus_name.clone();
                tokio::spawn(async move {
                    let result: zbus::Result<()> = async {
                        let proxy = connection_proxy(&conn, bus, target.clone()).await?;
                        let mut changes = proxy.receive_connection_property_changed().await?;
                        while let Some(signal) = changes.next().await {
                            let args = signal.args()?;
                            let Some(delta) = decode_change(&target, args.name(), args.value())
                            else {
                                continue;
                            };
                            let event = Inbound::ServicePropertyChanged {
                                path: target.clone(),
                                delta,
                            };
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(())
                    }
                    .await;
                    if let Err(e) = result {
                        tracing::warn!("Watch on vpn connection {} ended: {}", target, e);
                    }
                })
            }
        };
        Subscription::from_task(format!("service {}", path), handle.abort_handle())
    }

    fn watch_technology(&self, path: &str) -> Subscription {
        let conn = self.conn.clone();
        let bus = self.bus_name.clone();
        let tx = self.inbound_tx.clone();
        let target = path.to_string();
        let handle = tokio::spawn(async move {
            let result: zbus::Result<()> = async {
                let proxy = technology_proxy(&conn, bus, target.clone()).await?;
                let mut changes = proxy.receive_technology_property_changed().await?;
                while let Some(signal) = changes.next().await {
                    let args = signal.args()?;
                    let Some(delta) = decode_change(&target, args.name(), args.value()) else {
                        continue;
                    };
                    let event = Inbound::TechnologyPropertyChanged {
                        path: target.clone(),
                        delta,
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(())
            }
            .await;
            if let Err(e) = result {
                tracing::warn!("Watch on technology {} ended: {}", target, e);
            }
        });
        Subscription::from_task(format!("technology {}", path), handle.abort_handle())
    }

    fn start_rescan_timer(&self, technology: &str, every: Duration) -> Subscription {
        let conn = self.conn.clone();
        let bus = self.bus_name.clone();
        let target = technology.to_string();
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            loop {
                ticks.tick().await;
                tracing::debug!("Rescanning {}", target);
                let scan = async {
                    technology_proxy(&conn, bus.clone(), target.clone())
                        .await?
                        .scan()
                        .await
                };
                if let Err(e) = scan.await {
                    tracing::warn!("Periodic scan of {} failed: {}", target, e);
                }
            }
        });
        Subscription::from_task(format!("rescan {}", technology), handle.abort_handle())
    }
}
