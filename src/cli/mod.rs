use clap::Parser;
use std::path::PathBuf;

use crate::config::MonitorConfig;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "chain-monitor")]
#[command(about = "Live validator signing dashboard for a consumer chain", long_about = None)]
pub struct Cli {
    /// consumer chain RPC endpoint URL
    pub consumer_rpc_url: String,

    /// (optional) provider chain REST endpoint URL
    pub provider_rest_url: Option<String>,

    /// TOML file with additional settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where log output is written while the dashboard owns the terminal
    #[arg(long)]
    pub log_file: Option<String>,

    /// Blocks of history kept per validator (0 keeps everything)
    #[arg(long)]
    pub history_capacity: Option<usize>,
}

impl Cli {
    /// Settings from the config file (or defaults), overridden by the command line.
    pub fn into_config(self) -> Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::load(path)?,
            None => MonitorConfig::default(),
        };

        config.consumer_rpc_url = self.consumer_rpc_url;
        if self.provider_rest_url.is_some() {
            config.provider_rest_url = self.provider_rest_url;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(capacity) = self.history_capacity {
            config.history_capacity = capacity;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_positionals() {
        let cli = Cli::try_parse_from(["chain-monitor", "http://rpc:26657", "https://rest.provider"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.consumer_rpc_url, "http://rpc:26657");
        assert_eq!(config.provider_rest_url.as_deref(), Some("https://rest.provider"));
        assert!(config.reconciliation_enabled());
    }

    #[test]
    fn test_consumer_url_is_required() {
        assert!(Cli::try_parse_from(["chain-monitor"]).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "provider_rest_url = \"https://from-file\"\nhistory_capacity = 10\nlog_file = \"file.log\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from([
            "chain-monitor",
            "http://rpc:26657",
            "--config",
            &path,
            "--history-capacity",
            "0",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.provider_rest_url.as_deref(), Some("https://from-file"));
        assert_eq!(config.history_capacity, 0);
        assert_eq!(config.log_file, "file.log");
    }
}
