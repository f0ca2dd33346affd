use std::{fs, path::Path, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const TRANSPORTS: [&str; 2] = ["tcp", "udp"];

/// Values supplied on the command line; each set value wins over the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub transport: Option<String>,
    pub listen: Option<String>,
    pub upstream: Option<String>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: String,
    pub listen: String,
    pub upstream: String,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub add_source: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    transport: Option<String>,
    listen: Option<String>,
    upstream: Option<String>,
    #[serde(default)]
    logging: FileLoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FileLoggingConfig {
    level: Option<String>,
    format: Option<String>,
    output: Option<String>,
    add_source: Option<bool>,
}

pub fn load(cli: &CliOverrides) -> anyhow::Result<Config> {
    let fc = match &cli.config {
        Some(path) => read_file_config(path)?,
        None => FileConfig::default(),
    };
    resolve(cli, fc)
}

fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("config: read {}", path.display()))?;
    toml::from_str(&data).with_context(|| format!("config: parse toml {}", path.display()))
}

fn resolve(cli: &CliOverrides, fc: FileConfig) -> anyhow::Result<Config> {
    let transport = cli
        .transport
        .clone()
        .or(fc.transport)
        .context("config: transport is required (--transport or config file)")?
        .trim()
        .to_ascii_lowercase();
    if !TRANSPORTS.contains(&transport.as_str()) {
        anyhow::bail!("config: unsupported transport {transport:?} (expected one of {TRANSPORTS:?})");
    }

    let listen = required_addr(cli.listen.clone().or(fc.listen), "listen")?;
    let upstream = required_addr(cli.upstream.clone().or(fc.upstream), "upstream")?;

    Ok(Config {
        transport,
        listen,
        upstream,
        logging: LoggingConfig {
            level: fc.logging.level.unwrap_or_else(|| "info".into()),
            format: fc.logging.format.unwrap_or_else(|| "text".into()),
            output: fc.logging.output.unwrap_or_else(|| "stderr".into()),
            add_source: fc.logging.add_source.unwrap_or(false),
        },
    })
}

fn required_addr(value: Option<String>, name: &str) -> anyhow::Result<String> {
    let v = value
        .with_context(|| format!("config: {name} address is required (--{name} or config file)"))?;
    let v = v.trim().to_string();
    if v.is_empty() {
        anyhow::bail!("config: {name} address is empty");
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(transport: &str, listen: &str, upstream: &str) -> CliOverrides {
        CliOverrides {
            transport: Some(transport.into()),
            listen: Some(listen.into()),
            upstream: Some(upstream.into()),
            config: None,
        }
    }

    #[test]
    fn cli_only() {
        let cfg = load(&cli("udp", ":9000", "1.2.3.4:9000")).unwrap();
        assert_eq!(cfg.transport, "udp");
        assert_eq!(cfg.listen, ":9000");
        assert_eq!(cfg.upstream, "1.2.3.4:9000");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.output, "stderr");
    }

    #[test]
    fn transport_is_case_insensitive_and_trimmed() {
        let cfg = load(&cli(" TCP ", "127.0.0.1:8000", "10.0.0.1:8000")).unwrap();
        assert_eq!(cfg.transport, "tcp");
    }

    #[test]
    fn unsupported_transport_rejected() {
        let err = load(&cli("icmp", ":1", ":2")).unwrap_err();
        assert!(err.to_string().contains("unsupported transport"));
    }

    #[test]
    fn missing_listen_rejected() {
        let err = load(&CliOverrides {
            transport: Some("tcp".into()),
            listen: None,
            upstream: Some("1.2.3.4:1".into()),
            config: None,
        })
        .unwrap_err();
        assert!(err.to_string().contains("listen"));
    }

    #[test]
    fn file_values_fill_and_cli_overrides() {
        let fc: FileConfig = toml::from_str(
            r#"
            transport = "udp"
            listen = ":9000"
            upstream = "tunnel.example.net:9000"

            [logging]
            level = "debug"
            format = "json"
            output = "discard"
            add_source = true
            "#,
        )
        .unwrap();

        let overrides = CliOverrides {
            transport: None,
            listen: Some("127.0.0.1:9999".into()),
            upstream: None,
            config: None,
        };

        let cfg = resolve(&overrides, fc).unwrap();
        assert_eq!(cfg.transport, "udp");
        assert_eq!(cfg.listen, "127.0.0.1:9999");
        assert_eq!(cfg.upstream, "tunnel.example.net:9000");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.output, "discard");
        assert!(cfg.logging.add_source);
    }
}
