//! `sheetwise serve` — Start the HTTP gateway.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    config.require_credentials()?;

    println!("sheetwise gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Mode:      {:?}", config.pipeline.mode);
    println!("   Model:     {} ({})", config.model.model, config.model.provider);

    sheetwise_gateway::start(config).await?;

    Ok(())
}
