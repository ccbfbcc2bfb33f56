use async_channel::Receiver;
use zbus::fdo::NameOwnerChangedStream;

use super::super::connman::proxy::{
    ConnectionAddedStream, ConnectionRemovedStream, ManagerPropertyChangedStream, ManagerProxy,
    ServicesChangedStream, TechnologyAddedStream, TechnologyRemovedStream, VpnManagerProxy,
};
use super::super::connman::AgentEvent;
use super::super::mirror::Inbound;
use super::super::types::Command;
use super::helpers::{self, next_from};
use super::LoopEvent;

pub struct EventStreams {
    pub cmd_rx: Receiver<Command>,
    /// Per-object watches and agent requests
    pub inbound_rx: Receiver<Inbound>,
    pub agent_rx: Receiver<AgentEvent>,

    pub daemon_owner: Option<NameOwnerChangedStream<'static>>,
    pub vpn_owner: Option<NameOwnerChangedStream<'static>>,

    pub technology_added: Option<TechnologyAddedStream<'static>>,
    pub technology_removed: Option<TechnologyRemovedStream<'static>>,
    pub services_changed: Option<ServicesChangedStream<'static>>,
    pub manager_property_changed: Option<ManagerPropertyChangedStream<'static>>,

    pub connection_added: Option<ConnectionAddedStream<'static>>,
    pub connection_removed: Option<ConnectionRemovedStream<'static>>,
}

impl EventStreams {
    pub fn new(
        cmd_rx: Receiver<Command>,
        inbound_rx: Receiver<Inbound>,
        agent_rx: Receiver<AgentEvent>,
    ) -> Self {
        Self {
            cmd_rx,
            inbound_rx,
            agent_rx,
            daemon_owner: None,
            vpn_owner: None,
            technology_added: None,
            technology_removed: None,
            services_changed: None,
            manager_property_changed: None,
            connection_added: None,
            connection_removed: None,
        }
    }

    /// Subscribe to the core manager's signals.
    pub async fn subscribe_manager(&mut self, manager: &ManagerProxy<'static>) -> zbus::Result<()> {
        self.technology_added = Some(manager.receive_technology_added().await?);
        self.technology_removed = Some(manager.receive_technology_removed().await?);
        self.services_changed = Some(manager.receive_services_changed().await?);
        self.manager_property_changed = Some(manager.receive_manager_property_changed().await?);
        Ok(())
    }

    pub fn drop_manager(&mut self) {
        self.technology_added = None;
        self.technology_removed = None;
        self.services_changed = None;
        self.manager_property_changed = None;
    }

    pub async fn subscribe_vpn(&mut self, manager: &VpnManagerProxy<'static>) -> zbus::Result<()> {
        self.connection_added = Some(manager.receive_connection_added().await?);
        self.connection_removed = Some(manager.receive_connection_removed().await?);
        Ok(())
    }

    pub fn drop_vpn(&mut self) {
        self.connection_added = None;
        self.connection_removed = None;
    }

    pub async fn next_event(&mut self) -> LoopEvent {
        loop {
            tokio::select! {
                // net.connman owner changes
                Some(signal) = next_from(&mut self.daemon_owner) => {
                    match signal.args() {
                        Ok(args) if args.new_owner().is_some() => return LoopEvent::DaemonAppeared,
                        Ok(_) => return LoopEvent::DaemonVanished,
                        Err(e) => {
                            tracing::warn!("Failed to parse NameOwnerChanged: {}", e);
                            continue;
                        }
                    }
                }

                // net.connman.vpn owner changes
                Some(signal) = next_from(&mut self.vpn_owner) => {
                    match signal.args() {
                        Ok(args) if args.new_owner().is_some() => return LoopEvent::VpnAppeared,
                        Ok(_) => return LoopEvent::VpnVanished,
                        Err(e) => {
                            tracing::warn!("Failed to parse NameOwnerChanged: {}", e);
                            continue;
                        }
                    }
                }

                Some(signal) = next_from(&mut self.technology_added) => {
                    if let Some(inbound) = helpers::technology_added(signal) {
                        return LoopEvent::Inbound(inbound);
                    }
                }

                Some(signal) = next_from(&mut self.technology_removed) => {
                    if let Some(inbound) = helpers::technology_removed(signal) {
                        return LoopEvent::Inbound(inbound);
                    }
                }

                Some(signal) = next_from(&mut self.services_changed) => {
                    if let Some(inbound) = helpers::services_changed(signal) {
                        return LoopEvent::Inbound(inbound);
                    }
                }

                Some(signal) = next_from(&mut self.manager_property_changed) => {
                    if let Some(inbound) = helpers::manager_property_changed(signal) {
                        return LoopEvent::Inbound(inbound);
                    }
                }

                Some(signal) = next_from(&mut self.connection_added) => {
                    if let Some(inbound) = helpers::connection_added(signal) {
                        return LoopEvent::Inbound(inbound);
                    }
                }

                Some(signal) = next_from(&mut self.connection_removed) => {
                    if let Some(inbound) = helpers::connection_removed(signal) {
                        return LoopEvent::Inbound(inbound);
                    }
                }

                // Service, technology and connection property watches
                Ok(inbound) = self.inbound_rx.recv() => {
                    return LoopEvent::Inbound(inbound);
                }

                // Credential requests from both agents
                Ok(event) = self.agent_rx.recv() => {
                    return LoopEvent::Agent(event);
                }

                // UI commands
                result = self.cmd_rx.recv() => {
                    match result {
                        Ok(cmd) => return LoopEvent::Command(cmd),
                        Err(_) => return LoopEvent::CommandChannelClosed,
                    }
                }
            }
        }
    }
}
