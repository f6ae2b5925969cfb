use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pimovie",
    about = "Remote control for the movie player of a Raspberry Pi: list, play, pause, seek",
    long_about = None,
    version = env!("PIMOVIE_VERSION"),
)]
pub struct Args {
    /// Directory holding the movies [default: /home/pi/movies]
    pub media_dir: Option<PathBuf>,

    /// HTTP port to listen on [default: 3000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./pimovie.toml, ~/.config/pimovie/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind to localhost only (127.0.0.1) instead of all interfaces (0.0.0.0)
    #[arg(long)]
    pub localhost: bool,

    /// Player binary to launch [default: omxplayer]
    #[arg(long, value_name = "BIN")]
    pub player: Option<String>,

    /// Directory with the web UI, served for every non-API path
    #[arg(long, value_name = "DIR")]
    pub web_root: Option<PathBuf>,
}
