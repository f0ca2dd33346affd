pub mod app;
pub mod config;
pub mod forward;
pub mod frame;
pub mod logging;
pub mod net;

pub async fn run(cli: config::CliOverrides) -> anyhow::Result<()> {
    app::run(cli).await
}
