mod helpers;
mod state;
mod streams;

use async_channel::Receiver;
use zbus::names::BusName;

use super::connman::{AgentCore, AgentEvent, AgentOwner, ConnmanAgent, DbusRemote, VpnAgent};
use super::mirror::Inbound;
use super::settings::Settings;
use super::types::Command;
use crate::ui::Presenter;

pub use state::{BackendState, LoopAction, Outlets};
pub use streams::EventStreams;

pub enum LoopEvent {
    DaemonAppeared,
    DaemonVanished,
    VpnAppeared,
    VpnVanished,
    Inbound(Inbound),
    Agent(AgentEvent),
    Command(Command),
    CommandChannelClosed,
}

/// Initialize the backend: D-Bus, agents, presence watches.
/// Returns (BackendState, EventStreams) ready for the event loop.
pub async fn init(
    cmd_rx: Receiver<Command>,
    presenter: Box<dyn Presenter + Send>,
    settings: Settings,
) -> Result<(BackendState, EventStreams), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Starting backend...");

    // Connect to system D-Bus
    let conn = zbus::Connection::system().await?;
    tracing::info!("Connected to system D-Bus");

    let (inbound_tx, inbound_rx) = async_channel::unbounded::<Inbound>();
    let (agent_tx, agent_rx) = async_channel::unbounded::<AgentEvent>();

    // Export both agents; they are registered whenever their daemon appears
    conn.object_server()
        .at(
            settings.agent_path.as_str(),
            ConnmanAgent::new(AgentCore::new(AgentOwner::Connman, agent_tx.clone())),
        )
        .await?;
    conn.object_server()
        .at(
            settings.vpn_agent_path.as_str(),
            VpnAgent::new(AgentCore::new(AgentOwner::Vpn, agent_tx)),
        )
        .await?;
    tracing::info!(
        "Exported agents at {} and {}",
        settings.agent_path,
        settings.vpn_agent_path
    );

    let mut streams = EventStreams::new(cmd_rx, inbound_rx, agent_rx);

    // Presence watches for both daemons
    let dbus = zbus::fdo::DBusProxy::new(&conn).await?;
    streams.daemon_owner = Some(
        dbus.receive_name_owner_changed_with_args(&[(0, settings.bus_name.as_str())])
            .await?,
    );
    streams.vpn_owner = Some(
        dbus.receive_name_owner_changed_with_args(&[(0, settings.vpn_bus_name.as_str())])
            .await?,
    );
    let daemon_present = dbus
        .name_has_owner(BusName::try_from(settings.bus_name.as_str())?)
        .await?;
    let vpn_present = dbus
        .name_has_owner(BusName::try_from(settings.vpn_bus_name.as_str())?)
        .await?;

    let remote = DbusRemote::new(conn.clone(), inbound_tx, &settings);
    let outlets = Outlets {
        ui: presenter,
        remote,
        settings,
    };
    let mut state = BackendState::new(conn, outlets);
    state.sync_applet_visibility();

    if daemon_present {
        state
            .handle_event(LoopEvent::DaemonAppeared, &mut streams)
            .await;
    } else {
        tracing::info!("ConnMan is not running");
    }
    if vpn_present {
        state.handle_event(LoopEvent::VpnAppeared, &mut streams).await;
    } else {
        tracing::info!("ConnMan VPN is not running");
    }

    Ok((state, streams))
}
