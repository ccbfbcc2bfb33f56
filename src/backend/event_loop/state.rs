use zbus::zvariant::ObjectPath;

use super::super::connman::proxy::{ManagerProxy, VpnManagerProxy};
use super::super::connman::{self, AgentEvent, AgentOwner, DbusRemote};
use super::super::mirror::ManagerMirror;
use super::super::prompt::PromptBroker;
use super::super::remote::MirrorCtx;
use super::super::settings::Settings;
use super::super::types::Command;
use super::streams::EventStreams;
use super::LoopEvent;
use crate::ui::Presenter;

pub enum LoopAction {
    Continue,
    Break,
}

/// Everything the mirrors write to.
pub struct Outlets {
    pub ui: Box<dyn Presenter + Send>,
    pub remote: DbusRemote,
    pub settings: Settings,
}

impl Outlets {
    pub fn ctx(&mut self) -> MirrorCtx<'_> {
        MirrorCtx {
            ui: self.ui.as_mut(),
            remote: &self.remote,
            settings: &self.settings,
        }
    }
}

pub struct BackendState {
    pub conn: zbus::Connection,
    pub outlets: Outlets,
    pub mirror: ManagerMirror,
    pub broker: PromptBroker,
    /// Present while the core daemon owns its bus name
    pub manager: Option<ManagerProxy<'static>>,
    /// Present while the VPN daemon owns its bus name
    pub vpn_manager: Option<VpnManagerProxy<'static>>,
}

impl BackendState {
    pub fn new(conn: zbus::Connection, outlets: Outlets) -> Self {
        Self {
            conn,
            outlets,
            mirror: ManagerMirror::new(),
            broker: PromptBroker::new(),
            manager: None,
            vpn_manager: None,
        }
    }

    pub async fn handle_event(
        &mut self,
        event: LoopEvent,
        streams: &mut EventStreams,
    ) -> LoopAction {
        match event {
            LoopEvent::DaemonAppeared => self.daemon_appeared(streams).await,
            LoopEvent::DaemonVanished => self.daemon_vanished(streams),
            LoopEvent::VpnAppeared => self.vpn_appeared(streams).await,
            LoopEvent::VpnVanished => self.vpn_vanished(streams),

            LoopEvent::Inbound(inbound) => {
                self.mirror.dispatch(inbound, &mut self.outlets.ctx());
            }

            LoopEvent::Agent(event) => self.handle_agent_event(event),

            LoopEvent::Command(cmd) => {
                return self.handle_command(cmd, streams).await;
            }

            LoopEvent::CommandChannelClosed => {
                self.shutdown(streams).await;
                return LoopAction::Break;
            }
        }

        LoopAction::Continue
    }

    /// Show the applet while either daemon is around.
    pub fn sync_applet_visibility(&mut self) {
        let visible = self.manager.is_some() || self.vpn_manager.is_some();
        self.outlets.ui.set_applet_visible(visible);
    }

    async fn daemon_appeared(&mut self, streams: &mut EventStreams) {
        if self.manager.is_some() {
            tracing::info!("ConnMan changed owner, rebuilding");
            self.daemon_vanished(streams);
        }
        tracing::info!("ConnMan appeared on {}", self.outlets.settings.bus_name);
        if let Err(e) = self.connect_manager(streams).await {
            tracing::warn!("Failed to set up ConnMan manager: {}", e);
        }
        self.sync_applet_visibility();
    }

    async fn connect_manager(&mut self, streams: &mut EventStreams) -> zbus::Result<()> {
        let manager = ManagerProxy::builder(&self.conn)
            .destination(self.outlets.settings.bus_name.clone())?
            .build()
            .await?;
        streams.subscribe_manager(&manager).await?;
        self.manager = Some(manager.clone());

        let agent_path = self.outlets.settings.agent_path.clone();
        let registrar = manager.clone();
        tokio::spawn(async move {
            let result: zbus::Result<()> = async {
                let path = ObjectPath::try_from(agent_path.as_str())?;
                registrar.register_agent(&path).await
            }
            .await;
            match result {
                Ok(()) => tracing::info!("Registered agent at {} with ConnMan", agent_path),
                Err(e) => tracing::warn!("Failed to register agent with ConnMan: {}", e),
            }
        });

        let (technologies, services) = connman::enumerate(&manager).await?;
        self.mirror
            .resync(technologies, services, &mut self.outlets.ctx());
        Ok(())
    }

    fn daemon_vanished(&mut self, streams: &mut EventStreams) {
        if self.manager.take().is_none() {
            return;
        }
        tracing::info!("ConnMan vanished");
        streams.drop_manager();
        forget_daemon(
            AgentOwner::Connman,
            &mut self.mirror,
            &mut self.broker,
            &mut self.outlets.ctx(),
        );
        self.sync_applet_visibility();
    }

    async fn vpn_appeared(&mut self, streams: &mut EventStreams) {
        if self.vpn_manager.is_some() {
            tracing::info!("ConnMan VPN changed owner, rebuilding");
            self.vpn_vanished(streams);
        }
        tracing::info!("ConnMan VPN appeared on {}", self.outlets.settings.vpn_bus_name);
        if let Err(e) = self.connect_vpn_manager(streams).await {
            tracing::warn!("Failed to set up ConnMan VPN manager: {}", e);
        }
        self.sync_applet_visibility();
    }

    async fn connect_vpn_manager(&mut self, streams: &mut EventStreams) -> zbus::Result<()> {
        let manager = VpnManagerProxy::builder(&self.conn)
            .destination(self.outlets.settings.vpn_bus_name.clone())?
            .build()
            .await?;
        streams.subscribe_vpn(&manager).await?;
        self.vpn_manager = Some(manager.clone());

        let agent_path = self.outlets.settings.vpn_agent_path.clone();
        let registrar = manager.clone();
        tokio::spawn(async move {
            let result: zbus::Result<()> = async {
                let path = ObjectPath::try_from(agent_path.as_str())?;
                registrar.register_agent(&path).await
            }
            .await;
            match result {
                Ok(()) => tracing::info!("Registered agent at {} with ConnMan VPN", agent_path),
                Err(e) => tracing::warn!("Failed to register agent with ConnMan VPN: {}", e),
            }
        });

        let connections = connman::enumerate_vpn(&manager).await?;
        self.mirror
            .resync_vpn(connections, &mut self.outlets.ctx());
        Ok(())
    }

    fn vpn_vanished(&mut self, streams: &mut EventStreams) {
        if self.vpn_manager.take().is_none() {
            return;
        }
        tracing::info!("ConnMan VPN vanished");
        streams.drop_vpn();
        forget_daemon(
            AgentOwner::Vpn,
            &mut self.mirror,
            &mut self.broker,
            &mut self.outlets.ctx(),
        );
        self.sync_applet_visibility();
    }

    fn handle_agent_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Request(request) => {
                let title = self
                    .mirror
                    .service_name(&request.service)
                    .unwrap_or_else(|| request.service.clone());
                self.broker.open(request, &title, self.outlets.ui.as_mut());
            }
            AgentEvent::Cancel(owner) | AgentEvent::Release(owner) => {
                self.broker.cancel_from(owner, self.outlets.ui.as_mut());
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command, streams: &mut EventStreams) -> LoopAction {
        match cmd {
            Command::Shutdown => {
                tracing::info!("Backend shutdown requested");
                self.shutdown(streams).await;
                return LoopAction::Break;
            }
            Command::SubmitCredentials { values } => {
                tracing::debug!("Received credentials for {} fields", values.len());
                self.broker.submit(values, self.outlets.ui.as_mut());
            }
            Command::CancelCredentials => {
                self.broker.cancel(self.outlets.ui.as_mut());
            }
            cmd => {
                tracing::debug!("Received command: {:?}", cmd);
                self.mirror.handle_command(cmd, &mut self.outlets.ctx());
            }
        }
        LoopAction::Continue
    }

    /// Cancel the prompt, release every watch and unregister the agents.
    async fn shutdown(&mut self, streams: &mut EventStreams) {
        self.broker.cancel(self.outlets.ui.as_mut());
        streams.drop_manager();
        streams.drop_vpn();
        self.mirror.clear(&mut self.outlets.ctx());
        self.mirror.clear_vpn(&mut self.outlets.ctx());

        if let Some(manager) = self.manager.take() {
            let result: zbus::Result<()> = async {
                let path = ObjectPath::try_from(self.outlets.settings.agent_path.as_str())?;
                manager.unregister_agent(&path).await
            }
            .await;
            if let Err(e) = result {
                tracing::warn!("Failed to unregister agent with ConnMan: {}", e);
            }
        }
        if let Some(manager) = self.vpn_manager.take() {
            let result: zbus::Result<()> = async {
                let path = ObjectPath::try_from(self.outlets.settings.vpn_agent_path.as_str())?;
                manager.unregister_agent(&path).await
            }
            .await;
            if let Err(e) = result {
                tracing::warn!("Failed to unregister agent with ConnMan VPN: {}", e);
            }
        }
        self.sync_applet_visibility();
    }
}

/// Drop what a vanished daemon left behind: its prompt and its mirrored tree.
fn forget_daemon(
    owner: AgentOwner,
    mirror: &mut ManagerMirror,
    broker: &mut PromptBroker,
    ctx: &mut MirrorCtx,
) {
    broker.cancel_from(owner, &mut *ctx.ui);
    match owner {
        AgentOwner::Connman => mirror.clear(ctx),
        AgentOwner::Vpn => mirror.clear_vpn(ctx),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::sync::oneshot;

    use super::*;
    use crate::backend::connman::CredentialRequest;
    use crate::backend::test_support::{powered, wifi_service, Harness, WIFI_TECH};
    use crate::backend::types::ConnectionType;

    const HOME: &str = "/net/connman/service/wifi_0011_home_managed_psk";

    type Reply = oneshot::Receiver<Option<HashMap<String, String>>>;

    fn open_prompt(
        broker: &mut PromptBroker,
        owner: AgentOwner,
        service: &str,
        h: &mut Harness,
    ) -> Reply {
        let (response_tx, response_rx) = oneshot::channel();
        let request = CredentialRequest {
            owner,
            service: service.into(),
            fields: vec!["Passphrase".into()],
            response_tx,
        };
        broker.open(request, "Home", &mut h.ui);
        response_rx
    }

    fn populated(h: &mut Harness) -> ManagerMirror {
        let mut mirror = ManagerMirror::new();
        mirror
            .technology_added(WIFI_TECH, powered(true), &mut h.ctx())
            .unwrap();
        mirror
            .service_changed(HOME, &wifi_service("Home", "idle", "wlan0"), &mut h.ctx())
            .unwrap();
        mirror.resync_vpn(vec![], &mut h.ctx());
        mirror
    }

    #[test]
    fn vanished_daemon_closes_its_own_prompt() {
        let mut h = Harness::new();
        let mut mirror = populated(&mut h);
        let mut broker = PromptBroker::new();
        let mut reply = open_prompt(&mut broker, AgentOwner::Connman, HOME, &mut h);

        forget_daemon(AgentOwner::Connman, &mut mirror, &mut broker, &mut h.ctx());

        assert!(!broker.is_open());
        assert_eq!(reply.try_recv().unwrap(), None);
        assert_eq!(mirror.technology_kinds(), vec![ConnectionType::Vpn]);
    }

    #[test]
    fn vpn_vanish_leaves_the_connman_prompt_open() {
        let mut h = Harness::new();
        let mut mirror = populated(&mut h);
        let mut broker = PromptBroker::new();
        let mut reply = open_prompt(&mut broker, AgentOwner::Connman, HOME, &mut h);

        forget_daemon(AgentOwner::Vpn, &mut mirror, &mut broker, &mut h.ctx());

        assert!(broker.is_open());
        assert!(reply.try_recv().is_err());
        assert_eq!(mirror.technology_kinds(), vec![ConnectionType::Wifi]);
        assert_eq!(mirror.service_owner(HOME), Some(ConnectionType::Wifi));
    }
}
