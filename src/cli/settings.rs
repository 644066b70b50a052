use std::error::Error;
use std::path::Path;

use crate::core::config::{Config, ConfigKey};

/// `whispi set [key] [value]`. Without a value the effective configuration is printed.
pub fn set(key: Option<&str>, value: Option<&str>) -> Result<(), Box<dyn Error>> {
    let (Some(key), Some(value)) = (key, value.filter(|v| !v.trim().is_empty())) else {
        Config::load()?.print_all();
        return Ok(());
    };
    match set_in(&Config::get_config_path()?, key, value) {
        Ok(message) => println!("✅ {message}"),
        Err(message) => {
            eprintln!("❌ {message}");
            std::process::exit(1);
        }
    }
    Ok(())
}

pub fn unset(key: &str) -> Result<(), Box<dyn Error>> {
    match unset_in(&Config::get_config_path()?, key) {
        Ok(message) => println!("✅ {message}"),
        Err(message) => {
            eprintln!("❌ {message}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn set_in(path: &Path, key: &str, value: &str) -> Result<String, String> {
    let key: ConfigKey = key.parse()?;
    let mut config = Config::load_from_path(path).map_err(|err| err.to_string())?;
    config.set_value(key, value)?;
    config.save_to_path(path).map_err(|err| err.to_string())?;
    Ok(format!("Set {key} to: {}", value.trim()))
}

fn unset_in(path: &Path, key: &str) -> Result<String, String> {
    let key: ConfigKey = key.parse()?;
    let mut config = Config::load_from_path(path).map_err(|err| err.to_string())?;
    config.unset_value(key);
    config.save_to_path(path).map_err(|err| err.to_string())?;
    Ok(format!("Unset {key}"))
}
