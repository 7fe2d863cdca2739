use anyhow::Context;

use serde::Deserialize;

use tracing::{info, warn};

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::cli::Args;

const CONFIG_FILE_NAME: &str = "config.toml";

// YAML names read by earlier releases; only reported, never parsed.
const LEGACY_CONFIG_FILE_NAMES: [&str; 2] = ["config.yml", "config.yaml"];

pub const DEFAULT_LOG_FILE: &str = "/var/log/reflect.log";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebConfiguration {
    pub address: String,
    pub port: u16,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for WebConfiguration {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_owned(),
            port: 2626,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub log_file: String,
    pub web: WebConfiguration,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_file: DEFAULT_LOG_FILE.to_owned(),
            web: WebConfiguration::default(),
        }
    }
}

impl Configuration {
    /// Flags and environment variables win over the file.
    fn apply_overrides(&mut self, args: &Args) {
        if let Some(log_file) = &args.log_file {
            self.log_file.clone_from(log_file);
        }
        if let Some(address) = &args.web_address {
            self.web.address.clone_from(address);
        }
        if let Some(port) = args.web_port {
            self.web.port = port;
        }
    }
}

#[derive(Debug)]
pub struct LoadedConfiguration {
    pub configuration: Configuration,
    pub config_file: Option<PathBuf>,
    pub ignored_legacy_files: Vec<PathBuf>,
}

fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];

    if let Some(config_dir) = dirs::config_dir() {
        dirs.push(config_dir.join("reflect"));
    }

    dirs.push(PathBuf::from("/etc/reflect"));

    dirs
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_file())
}

async fn find_legacy_config_files(search_dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for dir in search_dirs {
        for name in LEGACY_CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if is_file(&path).await {
                found.push(path);
            }
        }
    }

    found
}

fn parse_configuration(contents: &str, path: &Path) -> anyhow::Result<Configuration> {
    toml::from_str(contents).with_context(|| format!("error parsing config file {path:?}"))
}

async fn read_configuration_file(path: &Path) -> anyhow::Result<Configuration> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("error reading config file {path:?}"))?;

    parse_configuration(&contents, path)
}

async fn find_config_file(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE_NAME);
        if is_file(&path).await {
            return Some(path);
        }
    }
    None
}

pub async fn load(args: &Args) -> anyhow::Result<LoadedConfiguration> {
    let (config_file, ignored_legacy_files) = match &args.config {
        Some(path) => (Some(path.clone()), Vec::new()),
        None => {
            let search_dirs = default_search_dirs();
            let config_file = find_config_file(&search_dirs).await;
            let ignored_legacy_files = if config_file.is_none() {
                find_legacy_config_files(&search_dirs).await
            } else {
                Vec::new()
            };
            (config_file, ignored_legacy_files)
        }
    };

    let mut configuration = match &config_file {
        Some(path) => read_configuration_file(path).await?,
        None => Configuration::default(),
    };

    configuration.apply_overrides(args);

    Ok(LoadedConfiguration {
        configuration,
        config_file,
        ignored_legacy_files,
    })
}

impl LoadedConfiguration {
    pub fn log_summary(&self) {
        match &self.config_file {
            Some(path) => info!("config: file={}", path.display()),
            None => info!("config: file=<none>"),
        }
        for path in &self.ignored_legacy_files {
            warn!(
                "ignoring YAML config file {}, only TOML ({}) is read",
                path.display(),
                CONFIG_FILE_NAME
            );
        }
        info!("configuration\n{:#?}", self.configuration);
    }
}
