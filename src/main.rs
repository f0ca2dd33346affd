mod refract;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "refract",
    version,
    about = "Refract - lightweight TCP/UDP tunnel forwarder"
)]
struct Cli {
    /// Transport to forward, "tcp" or "udp". Overrides the config file.
    #[arg(long, env = "REFRACT_TRANSPORT")]
    transport: Option<String>,

    /// Local listen address (host:port, or :PORT for all interfaces). Overrides the config file.
    #[arg(long, env = "REFRACT_LISTEN")]
    listen: Option<String>,

    /// Remote tunnel address (host:port). Overrides the config file.
    #[arg(long, env = "REFRACT_UPSTREAM")]
    upstream: Option<String>,

    /// Path to a refract config file (.toml). Optional when --transport/--listen/--upstream are given.
    #[arg(long, env = "REFRACT_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    refract::run(refract::config::CliOverrides {
        transport: cli.transport,
        listen: cli.listen,
        upstream: cli.upstream,
        config: cli.config,
    })
    .await
}
