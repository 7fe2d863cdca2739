use clap::Parser;

use std::path::PathBuf;

/// A web API for client browser information.
#[derive(Debug, Default, Parser)]
#[command(name = "reflect", disable_version_flag = true)]
pub struct Args {
    /// Path to a specific TOML config file (default "./config.toml"); YAML
    /// config files from earlier releases are not read
    #[arg(long, env = "REFLECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to log file (default "/var/log/reflect.log")
    #[arg(short = 'l', long, env = "REFLECT_LOG_FILE")]
    pub log_file: Option<String>,

    /// The IP address to bind the web server to (default "0.0.0.0")
    #[arg(short = 'a', long, env = "REFLECT_WEB_ADDRESS")]
    pub web_address: Option<String>,

    /// The port to bind the web server to (default 2626)
    #[arg(short = 'p', long, env = "REFLECT_WEB_PORT")]
    pub web_port: Option<u16>,

    /// Display the version info and exit
    #[arg(long)]
    pub version: bool,

    /// Include debug statements in log output
    #[arg(short = 'D', long, hide = true)]
    pub debug: bool,
}
