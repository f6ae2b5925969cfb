use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MEDIA_DIR: &str = "/home/pi/movies";
const DEFAULT_PLAYER: &str = "omxplayer";
const DEFAULT_PLAYER_ARGS: &[&str] = &["-o", "hdmi"];
/// omxplayer is a wrapper script; the binary that actually renders is a child
/// the spawned handle cannot reach.
const DEFAULT_KILL_NAME: &str = "/usr/bin/omxplayer.bin";
const DEFAULT_DOWNLOADER: &str = "youtube-dl";
const DEFAULT_DOWNLOADER_ARGS: &[&str] = &["-o", "%(title)s.%(ext)s", "--continue"];

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub media_dir: Option<PathBuf>,
    pub localhost: Option<bool>,
    pub player: Option<String>,
    pub player_args: Option<Vec<String>>,
    pub kill_name: Option<String>,
    pub downloader: Option<String>,
    pub downloader_args: Option<Vec<String>>,
    pub web_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub media_dir: PathBuf,
    pub localhost: bool,
    pub player: String,
    pub player_args: Vec<String>,
    pub kill_name: String,
    pub downloader: String,
    pub downloader_args: Vec<String>,
    pub web_root: Option<PathBuf>,
}

impl Config {
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            media_dir: args
                .media_dir
                .clone()
                .or(file.media_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR)),
            localhost: args.localhost || file.localhost.unwrap_or(false),
            player: args
                .player
                .clone()
                .or(file.player)
                .unwrap_or_else(|| DEFAULT_PLAYER.to_string()),
            player_args: file.player_args.unwrap_or_else(|| owned(DEFAULT_PLAYER_ARGS)),
            kill_name: file.kill_name.unwrap_or_else(|| DEFAULT_KILL_NAME.to_string()),
            downloader: file.downloader.unwrap_or_else(|| DEFAULT_DOWNLOADER.to_string()),
            downloader_args: file
                .downloader_args
                .unwrap_or_else(|| owned(DEFAULT_DOWNLOADER_ARGS)),
            web_root: args.web_root.clone().or(file.web_root),
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("pimovie.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    let xdg_config = dirs::config_dir()?.join("pimovie").join("config.toml");
    xdg_config.exists().then_some(xdg_config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
