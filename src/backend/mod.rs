//! Daemon-facing engine: mirrors ConnMan state into a [`Presenter`] tree.

pub mod connman;
pub mod error;
mod event_loop;
pub mod mirror;
pub mod prompt;
pub mod properties;
pub mod remote;
pub mod service;
pub mod settings;
pub mod technology;
pub mod types;

#[cfg(test)]
pub mod test_support;

use async_channel::Receiver;

use crate::ui::Presenter;

pub use error::{Error, Result};
pub use mirror::{Inbound, ManagerMirror};
pub use settings::Settings;
pub use types::{Command, ConnectionType, Origin, ServiceState};

/// Run the engine until [`Command::Shutdown`] or the command channel closes.
///
/// The mirror tree is built whenever a daemon appears on the system bus and
/// torn down when it vanishes; the daemons need not be running at start.
pub async fn run(
    cmd_rx: Receiver<Command>,
    presenter: Box<dyn Presenter + Send>,
    settings: Settings,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (mut state, mut streams) = event_loop::init(cmd_rx, presenter, settings).await?;

    loop {
        let event = streams.next_event().await;
        match state.handle_event(event, &mut streams).await {
            event_loop::LoopAction::Continue => {}
            event_loop::LoopAction::Break => break,
        }
    }

    tracing::info!("Backend loop terminated");
    Ok(())
}
