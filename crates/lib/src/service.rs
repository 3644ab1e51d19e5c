//! Module runtime: wire config, registry, dispatcher and the MQTT bus together.

use crate::bus::MqttBus;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::responders::ResponderRegistry;
use anyhow::Result;
use std::sync::Arc;

/// Build the dispatcher described by `config` (built-in triggers plus configured ones).
pub fn build_dispatcher(config: &Config) -> Dispatcher {
    let registry = ResponderRegistry::from_config(&config.responders);
    Dispatcher::new(config.module.name.trim(), Arc::new(registry))
}

/// Run the module until SIGINT or SIGTERM.
/// The config is validated first; an unreachable broker is retried, not fatal.
pub async fn run_module(config: Config) -> Result<()> {
    config.validate()?;
    let dispatcher = build_dispatcher(&config);
    log::info!(
        "module {} starting: {} trigger(s), {} -> {}",
        dispatcher.module(),
        dispatcher.registry().phrases().count(),
        config.topics.input,
        config.topics.output
    );
    let bus = MqttBus::new(&config);
    bus.run(dispatcher, shutdown_signal()).await;
    log::info!("shutdown complete");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}
