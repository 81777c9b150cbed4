//! `sheetwise init` — Write a default config file.

use sheetwise_config::AppConfig;
use std::path::Path;

pub fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    if path.exists() && !force {
        println!("Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("Created config at: {}", path.display());
    println!("\nNext steps:");
    println!("   1. Set GEMINI_API_KEY and GOOGLE_SHEETS_SPREADSHEET_ID (a .env file works)");
    println!("   2. Set GOOGLE_SHEETS_ACCESS_TOKEN or GOOGLE_SHEETS_API_KEY");
    println!("   3. Run: sheetwise doctor");

    Ok(())
}
