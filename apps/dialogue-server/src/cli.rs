use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Local dialogue server.
///
/// Every option can also be set through its environment variable or a `.env`
/// file in the working directory.
#[derive(Debug, Parser)]
#[command(name = "dialogue-server", version)]
pub struct Cli {
    /// Auth channel to fetch the shared secret from (Unix socket path or
    /// Windows pipe name). Authentication is disabled without it.
    #[arg(long, env = "DIALOGUE_AUTH_PIPE")]
    pub auth_pipe: Option<String>,

    /// Directory holding config.json.
    #[arg(long, env = "DIALOGUE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Listener port, overrides the config file.
    #[arg(long, env = "DIALOGUE_PORT")]
    pub port: Option<u16>,

    /// Directory for dialogue-server.log.
    #[arg(long, env = "DIALOGUE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, env = "DIALOGUE_LOG_LEVEL")]
    pub log_level: Option<LevelFilter>,
}
