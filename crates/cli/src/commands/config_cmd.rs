//! `matric config` — Configuration management commands.

use matric_config::AppConfig;

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run `matric config init`.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config at: {}", config_path.display());
    println!();
    println!("📝 Next steps:");
    println!("   1. Export GEMINI_API_KEY, PINECONE_API_KEY, and PINECONE_INDEX_NAME");
    println!("   2. Run: matric doctor");
    println!("   3. Run: matric serve");

    Ok(())
}

/// Prints the effective configuration. Uses the `Debug` form, which redacts
/// credential values.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{config:#?}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
