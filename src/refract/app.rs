use crate::refract::{config, forward, logging};

pub async fn run(cli: config::CliOverrides) -> anyhow::Result<()> {
    let cfg = config::load(&cli)?;

    let logrt = logging::init(&cfg.logging)?;
    let _logrt_guard = logrt; // keep alive

    tracing::info!(
        transport = %cfg.transport,
        listen = %cfg.listen,
        upstream = %cfg.upstream,
        "refract: starting"
    );

    // The forwarder runs until it hits a fatal error; Ctrl-C is the only
    // other way out.
    tokio::select! {
        res = forward::forward(&cfg.transport, &cfg.listen, &cfg.upstream) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("refract: interrupted, shutting down");
            Ok(())
        }
    }
}
