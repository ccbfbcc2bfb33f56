use connman_applet::backend::{self, Command, Settings};
use connman_applet::ui::{ChannelPresenter, UiEvent, UiModel};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (cmd_tx, cmd_rx) = async_channel::bounded::<Command>(32);
        let (evt_tx, evt_rx) = async_channel::unbounded::<UiEvent>();

        // Headless host: keep the element tree and log it after each burst
        tokio::spawn(async move {
            let mut model = UiModel::new();
            while let Ok(event) = evt_rx.recv().await {
                model.apply(event);
                if evt_rx.is_empty() {
                    tracing::debug!(
                        "Applet {}:\n{}",
                        if model.applet_visible() { "shown" } else { "hidden" },
                        model.render()
                    );
                }
            }
        });

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            // Use try_send to avoid blocking - if channel is full, backend will
            // shutdown anyway when the channel is dropped
            let _ = cmd_tx.try_send(Command::Shutdown);
        });

        let presenter = ChannelPresenter::new(evt_tx);
        backend::run(cmd_rx, Box::new(presenter), Settings::default()).await
    })
}
