//! Init and Config commands.

use std::path::Path;

use anyhow::{Result, bail};

use crate::config::{DEFAULT_CONFIG_FILE, Settings};

/// Run init command - create a starter configuration file.
pub fn run_init(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(DEFAULT_CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at: {}\nUse --force to overwrite",
            config_path.display()
        );
    }

    Settings::example().save(&config_path)?;
    println!("Created configuration file at: {}", config_path.display());
    println!("Edit repos_root, watch_path, watch_regexp and execute before running.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> Result<()> {
    println!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();

        run_init(temp.path(), false).unwrap();
        assert!(temp.path().join(DEFAULT_CONFIG_FILE).exists());

        assert!(run_init(temp.path(), false).is_err());
        assert!(run_init(temp.path(), true).is_ok());

        let loaded = Settings::load_from(temp.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(loaded.execute, "make");
    }
}
