use std::error::Error;

use crate::cli::CliContext;
use crate::core::config::keys::ConfigKey;
use crate::core::config::path_display;

pub fn run_set(ctx: &CliContext, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let key = ConfigKey::parse(key)?;
    let mut config = ctx.config.clone();
    config.set_value(key, value)?;
    config.save_to_path(&ctx.config_path)?;
    match key {
        ConfigKey::ApiKey => println!("✅ Set {}", key.as_str()),
        _ => println!("✅ Set {} to: {}", key.as_str(), value.trim()),
    }
    println!("   ({})", path_display(&ctx.config_path));
    Ok(())
}

pub fn run_unset(ctx: &CliContext, key: &str) -> Result<(), Box<dyn Error>> {
    let key = ConfigKey::parse(key)?;
    let mut config = ctx.config.clone();
    config.unset_value(key);
    config.save_to_path(&ctx.config_path)?;
    println!("✅ Unset {}", key.as_str());
    Ok(())
}
