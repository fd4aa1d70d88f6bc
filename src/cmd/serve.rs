//! Session gate server command: `roomboard serve`.

use std::path::Path;

use anyhow::Result;

use roomboard::config::{GateConfig, RoomboardToml};

pub async fn cmd_serve(config_path: &Path, port: Option<u16>, dev: bool) -> Result<()> {
    let file = RoomboardToml::load_or_default(config_path)?;
    for warning in file.validate() {
        tracing::warn!(config = %config_path.display(), "{}", warning);
    }

    let mut config = GateConfig::resolve(&file);
    if let Some(port) = port {
        config.port = port;
    }
    config.dev_mode |= dev;

    roomboard::gate::start_server(config).await
}
