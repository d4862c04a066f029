//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::finance::RateTable;
use crate::domain::gantt::MAX_SPAN_DAYS;
use crate::domain::inbox::SortOrder;
use crate::domain::timebox::TeamRole;

/// Timebox Track configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub finance: FinanceConfig,
    pub inbox: InboxConfig,
    pub gantt: GanttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    pub currency: String,
    /// Role key → weekly rate used when the role catalog has none
    pub fallback_rates: BTreeMap<String, f64>,
    /// Role key → catalog role names to look up
    pub role_names: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    pub sort: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttConfig {
    pub default_span_days: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        let table = RateTable::default();
        let fallback_rates = TeamRole::ALL
            .into_iter()
            .filter_map(|role| Some((role.key().to_string(), table.fallback_rate(role)?)))
            .collect();
        let role_names = TeamRole::ALL
            .into_iter()
            .map(|role| (role.key().to_string(), table.candidate_names(role).to_vec()))
            .collect();
        Self {
            currency: "USD".to_string(),
            fallback_rates,
            role_names,
        }
    }
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            sort: "desc".to_string(),
        }
    }
}

impl Default for GanttConfig {
    fn default() -> Self {
        Self {
            default_span_days: crate::domain::gantt::DEFAULT_SPAN_DAYS,
        }
    }
}

impl ApiConfig {
    /// Base URL, with `TIMEBOX_API_URL` taking precedence over the file
    pub fn resolved_base_url(&self) -> String {
        env::var("TIMEBOX_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.base_url.clone())
            .trim_end_matches('/')
            .to_string()
    }
}

impl FinanceConfig {
    pub fn rate_table(&self) -> RateTable {
        RateTable::from_keys(&self.role_names, &self.fallback_rates)
    }
}

impl InboxConfig {
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse(&self.sort).unwrap_or_default()
    }
}

fn role_key(raw: &str) -> anyhow::Result<&'static str> {
    TeamRole::from_key(raw).map(|r| r.key()).ok_or_else(|| {
        anyhow!(
            "Unknown role: {}. Valid roles: {}",
            raw,
            TeamRole::ALL.map(|r| r.key()).join(", ")
        )
    })
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("TIMEBOX_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("timebox")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the session file path
    pub fn session_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("session.json"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(anyhow!("api.base_url must not be empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be positive"));
        }
        if self.finance.currency.trim().is_empty() {
            return Err(anyhow!("finance.currency must not be empty"));
        }
        for (key, rate) in &self.finance.fallback_rates {
            role_key(key)?;
            if *rate < 0.0 {
                return Err(anyhow!("Fallback rate for {} must be non-negative", key));
            }
        }
        for key in self.finance.role_names.keys() {
            role_key(key)?;
        }
        if SortOrder::parse(&self.inbox.sort).is_none() {
            return Err(anyhow!("inbox.sort must be 'asc' or 'desc'"));
        }
        if !(1..=MAX_SPAN_DAYS).contains(&self.gantt.default_span_days) {
            return Err(anyhow!(
                "gantt.default_span_days must be between 1 and {}",
                MAX_SPAN_DAYS
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        if let Some(role) = key.strip_prefix("finance.fallback_rates.") {
            let role = role_key(role)?;
            return Ok(self
                .finance
                .fallback_rates
                .get(role)
                .map(|r| r.to_string())
                .unwrap_or_else(|| "(not set)".to_string()));
        }
        if let Some(role) = key.strip_prefix("finance.role_names.") {
            let role = role_key(role)?;
            return Ok(self
                .finance
                .role_names
                .get(role)
                .map(|names| names.join(", "))
                .unwrap_or_default());
        }

        match key {
            "api.base_url" => Ok(self.api.base_url.clone()),
            "api.timeout_secs" => Ok(self.api.timeout_secs.to_string()),
            "finance.currency" => Ok(self.finance.currency.clone()),
            "inbox.sort" => Ok(self.inbox.sort.clone()),
            "gantt.default_span_days" => Ok(self.gantt.default_span_days.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `timebox config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if let Some(role) = key.strip_prefix("finance.fallback_rates.") {
            let role = role_key(role)?;
            let rate: f64 = value
                .parse()
                .with_context(|| format!("Invalid rate value: {}", value))?;
            if rate < 0.0 {
                return Err(anyhow!("Rates must be non-negative"));
            }
            self.finance.fallback_rates.insert(role.to_string(), rate);
            return Ok(());
        }
        if let Some(role) = key.strip_prefix("finance.role_names.") {
            let role = role_key(role)?;
            let names = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            self.finance.role_names.insert(role.to_string(), names);
            return Ok(());
        }

        match key {
            "api.base_url" => {
                let url = value.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(anyhow!("api.base_url must start with http:// or https://"));
                }
                self.api.base_url = url.trim_end_matches('/').to_string();
            }
            "api.timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
                if secs == 0 {
                    return Err(anyhow!("Timeout must be at least one second"));
                }
                self.api.timeout_secs = secs;
            }
            "finance.currency" => {
                let currency = value.trim().to_uppercase();
                if currency.is_empty() {
                    return Err(anyhow!("Currency must not be empty"));
                }
                self.finance.currency = currency;
            }
            "inbox.sort" => {
                let sort = SortOrder::parse(value)
                    .ok_or_else(|| anyhow!("Invalid sort order: {}. Valid options: asc, desc", value))?;
                self.inbox.sort = match sort {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                }
                .to_string();
            }
            "gantt.default_span_days" => {
                let days: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid default_span_days value: {}", value))?;
                if !(1..=MAX_SPAN_DAYS).contains(&days) {
                    return Err(anyhow!("Span must be between 1 and {} days", MAX_SPAN_DAYS));
                }
                self.gantt.default_span_days = days;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `timebox config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut keys: Vec<String> = [
            "api.base_url",
            "api.timeout_secs",
            "finance.currency",
            "inbox.sort",
            "gantt.default_span_days",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        for role in TeamRole::ALL {
            keys.push(format!("finance.fallback_rates.{}", role.key()));
            keys.push(format!("finance.role_names.{}", role.key()));
        }

        keys.into_iter()
            .map(|key| {
                let value = self.get(&key)?;
                Ok((key, value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
