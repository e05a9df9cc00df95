// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use hiertable_model::TableSettings;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "hiertable";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            logging: Logging::default(),
            tables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Logging {
    pub level: Option<String>,
}

/// A named table and the settings it is constructed with.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(flatten)]
    pub settings: TableSettings,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("HIERTABLE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set HIERTABLE_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and describe tables under [[tables]]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(level) = &self.logging.level
            && level.trim().is_empty()
        {
            bail!("logging.level in {} must not be blank", path.display());
        }

        let mut seen = BTreeSet::new();
        for (index, table) in self.tables.iter().enumerate() {
            let name = table.name.trim();
            if name.is_empty() {
                bail!(
                    "tables[{index}].name in {} must not be blank",
                    path.display()
                );
            }
            if !seen.insert(name) {
                bail!("table {name:?} is defined twice in {}", path.display());
            }
            if table.settings.category_column().is_none() {
                bail!(
                    "table {name:?} in {} needs a category_column",
                    path.display()
                );
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .level
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// The table called `name`, or the only table when `name` is `None`.
    pub fn table(&self, name: Option<&str>) -> Result<&TableConfig> {
        match name {
            Some(name) => self
                .tables
                .iter()
                .find(|table| table.name.trim() == name)
                .ok_or_else(|| anyhow!("no table named {name:?} in config")),
            None => match self.tables.as_slice() {
                [only] => Ok(only),
                [] => bail!("config defines no tables; add a [[tables]] entry"),
                _ => bail!("config defines several tables; pick one with --table <name>"),
            },
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# hiertable config\n# Place this file at: {}\n\nversion = 1\n\n[logging]\n# Default filter; RUST_LOG overrides it and --verbose forces debug.\nlevel = \"{}\"\n\n[[tables]]\nname = \"accounts\"\n# Optional. Skips header discovery when set.\nheaders = [\"Account\", \"Balance\", \"Notes\"]\ncategory_column = \"Account\"\n# Optional row-type filter passed to the tree scripts.\n# hierarchy_column = \"Row Type\"\n# hierarchy_list = [\"Group\", \"Account\"]\n# \"en\" (1,234.50) or \"eu\" (1.234,50)\nnumber_locale = \"en\"\n",
            path.display(),
            DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use anyhow::Result;
    use hiertable_model::NumberLocale;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.log_level(), "info");
        assert!(config.tables.is_empty());
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[logging]\nlevel = \"debug\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[[tables]]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn tables_parse_with_settings() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[logging]\nlevel = \"warn\"\n\n[[tables]]\nname = \"ledger\"\nheaders = [\"Account\", \"Balance\"]\ncategory_column = \"Account\"\nhierarchy_column = \"Row Type\"\nhierarchy_list = [\"Group\", \"Account\"]\nnumber_locale = \"eu\"\n\n[[tables]]\nname = \"budget\"\ncategory_column = \"Line\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.log_level(), "warn");

        let ledger = config.table(Some("ledger"))?;
        assert_eq!(ledger.settings.headers, ["Account", "Balance"]);
        assert_eq!(ledger.settings.category_column(), Some("Account"));
        assert_eq!(ledger.settings.hierarchy_column(), Some("Row Type"));
        assert_eq!(ledger.settings.hierarchy_list, ["Group", "Account"]);
        assert_eq!(ledger.settings.number_locale, NumberLocale::Eu);

        let budget = config.table(Some("budget"))?;
        assert!(budget.settings.headers.is_empty());
        assert_eq!(budget.settings.number_locale, NumberLocale::En);

        let error = config.table(None).expect_err("two tables need a name");
        assert!(error.to_string().contains("--table"));
        Ok(())
    }

    #[test]
    fn duplicate_table_names_are_rejected() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[[tables]]\nname = \"a\"\ncategory_column = \"x\"\n[[tables]]\nname = \" a \"\ncategory_column = \"x\"\n",
        )?;
        let error = Config::load(&path).expect_err("duplicate names should fail");
        assert!(error.to_string().contains("defined twice"));
        Ok(())
    }

    #[test]
    fn blank_table_name_is_rejected() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[[tables]]\nname = \"  \"\ncategory_column = \"x\"\n")?;
        let error = Config::load(&path).expect_err("blank name should fail");
        assert!(error.to_string().contains("must not be blank"));
        Ok(())
    }

    #[test]
    fn table_without_category_column_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[[tables]]\nname = \"a\"\n")?;
        let error = Config::load(&path).expect_err("category column is required");
        assert!(error.to_string().contains("category_column"));
        Ok(())
    }

    #[test]
    fn unknown_number_locale_is_rejected() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[[tables]]\nname = \"a\"\ncategory_column = \"x\"\nnumber_locale = \"fr\"\n",
        )?;
        let error = Config::load(&path).expect_err("unknown locale should fail");
        let message = format!("{error:#}");
        assert!(message.contains("decode config"), "unexpected {message}");
        assert!(message.contains("fr"), "unexpected {message}");
        Ok(())
    }

    #[test]
    fn single_table_is_picked_without_a_name() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[[tables]]\nname = \"only\"\ncategory_column = \"x\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.table(None)?.name, "only");
        assert!(config.table(Some("other")).is_err());
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("HIERTABLE_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("HIERTABLE_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, Config::example_config(&path))?;

        let config = Config::load(&path)?;
        let table = config.table(None)?;
        assert_eq!(table.name, "accounts");
        assert_eq!(table.settings.category_column(), Some("Account"));
        Ok(())
    }
}
