use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tc_core::config::ClipboardBackend;

/// Keep clipboards in sync over TCP.
///
/// Run one node with `--listen` and point the others at it with `--connect`.
#[derive(Debug, Clone, Parser)]
#[command(name = "tcpclipboard", version, about)]
pub struct Cli {
    /// Accept peers on this port
    #[arg(long, value_name = "PORT", conflicts_with = "connect")]
    pub listen: Option<u16>,

    /// Dial a listening peer
    #[arg(long, value_name = "HOST:PORT")]
    pub connect: Option<String>,

    /// Identity of this node (defaults to the host name)
    #[arg(long, value_name = "ID")]
    pub node_id: Option<String>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interface the listener binds to
    #[arg(long, value_name = "IP")]
    pub bind: Option<String>,

    /// Where clipboard text comes from and goes to
    #[arg(long, value_enum, value_name = "BACKEND")]
    pub clipboard: Option<ClipboardArg>,

    /// Seconds between heartbeats
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub heartbeat_secs: Option<u64>,

    /// Also write logs to this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Skip text segmentation diagnostics
    #[arg(long)]
    pub no_segment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClipboardArg {
    System,
    Memory,
    Stdio,
}

impl From<ClipboardArg> for ClipboardBackend {
    fn from(arg: ClipboardArg) -> Self {
        match arg {
            ClipboardArg::System => Self::System,
            ClipboardArg::Memory => Self::Memory,
            ClipboardArg::Stdio => Self::Stdio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_and_connect_conflict() {
        let parsed = Cli::try_parse_from(["tcpclipboard", "--listen", "7878", "--connect", "a:1"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "tcpclipboard",
            "--connect",
            "10.0.0.2:7878",
            "--node-id",
            "laptop",
            "--clipboard",
            "stdio",
            "--heartbeat-secs",
            "2",
            "--no-segment",
        ])
        .unwrap();

        assert_eq!(cli.connect.as_deref(), Some("10.0.0.2:7878"));
        assert_eq!(cli.node_id.as_deref(), Some("laptop"));
        assert_eq!(cli.clipboard, Some(ClipboardArg::Stdio));
        assert_eq!(cli.heartbeat_secs, Some(2));
        assert!(cli.no_segment);
    }

    #[test]
    fn test_zero_heartbeat_is_rejected() {
        assert!(Cli::try_parse_from(["tcpclipboard", "--heartbeat-secs", "0"]).is_err());
    }

    #[test]
    fn test_heartbeat_longer_than_a_day_is_rejected() {
        assert!(Cli::try_parse_from(["tcpclipboard", "--heartbeat-secs", "86401"]).is_err());
        assert!(Cli::try_parse_from(["tcpclipboard", "--heartbeat-secs", "86400"]).is_ok());
    }
}
