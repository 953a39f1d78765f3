/*!
 * Gateway Configuration
 * Explicit configuration handle passed to every session
 *
 * Loaded from an optional JSON file (`CAPSULE_CONFIG`) and then overridden
 * by environment variables:
 * - CAPSULE_LOC: default capsule directory
 * - CAPSULE_EXTRA: extra capsules, `:`-separated, in routing order
 * - CAPSULE_COMMAND_TIMEOUT: per-command deadline in seconds, 0 disables
 * - CAPSULE_TRAVERSAL: `reject` or `strip`
 * - CAPSULE_SCAFFOLD: generate the default capsule when missing
 */

use crate::capsule::{Capsule, TenantRouter};
use crate::core::errors::ConfigError;
use crate::vfs::TraversalPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Log file written beside the default capsule unless CAPSULE_LOG_FILE says otherwise
pub const DEFAULT_LOG_FILE: &str = "capsule-gate.log";

/// Gateway-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GatewayConfig {
    pub default_capsule: PathBuf,
    pub capsules: Vec<PathBuf>,
    /// Seconds; `None` means no deadline
    #[serde(with = "timeout_secs")]
    pub command_timeout: Option<Duration>,
    pub traversal: TraversalPolicy,
    pub scaffold: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_capsule: PathBuf::from("capsule"),
            capsules: Vec::new(),
            command_timeout: Some(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS)),
            traversal: TraversalPolicy::Reject,
            scaffold: true,
        }
    }
}

impl GatewayConfig {
    pub fn new<P: Into<PathBuf>>(default_capsule: P) -> Self {
        Self {
            default_capsule: default_capsule.into(),
            ..Self::default()
        }
    }

    pub fn with_capsule<P: Into<PathBuf>>(mut self, capsule: P) -> Self {
        self.capsules.push(capsule.into());
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_traversal(mut self, policy: TraversalPolicy) -> Self {
        self.traversal = policy;
        self
    }

    /// Load from `CAPSULE_CONFIG` (if set) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os("CAPSULE_CONFIG") {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(loc) = lookup("CAPSULE_LOC").filter(|v| !v.is_empty()) {
            self.default_capsule = PathBuf::from(loc);
        }

        if let Some(extra) = lookup("CAPSULE_EXTRA") {
            self.capsules = extra
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if let Some(raw) = lookup("CAPSULE_COMMAND_TIMEOUT") {
            let secs: u64 = raw.trim().parse().map_err(|_| invalid("CAPSULE_COMMAND_TIMEOUT", &raw))?;
            self.command_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("CAPSULE_TRAVERSAL") {
            self.traversal = raw.parse().map_err(|_| invalid("CAPSULE_TRAVERSAL", &raw))?;
        }

        if let Some(raw) = lookup("CAPSULE_SCAFFOLD") {
            self.scaffold = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(invalid("CAPSULE_SCAFFOLD", &raw)),
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_capsule.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("default capsule path is empty".to_string()));
        }
        if self.capsules.iter().any(|c| c == &self.default_capsule) {
            return Err(ConfigError::Invalid(
                "default capsule is also listed as an extra capsule".to_string(),
            ));
        }
        Ok(())
    }

    /// Server-side log file, in the directory holding the default capsule
    pub fn default_log_file(&self) -> PathBuf {
        self.default_capsule
            .parent()
            .map(|dir| dir.join(DEFAULT_LOG_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    /// Tenant router for the configured capsules
    pub fn router(&self) -> TenantRouter {
        TenantRouter::new(
            Capsule::new(&self.default_capsule),
            self.capsules.iter().map(Capsule::new).collect(),
        )
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    }
}

mod timeout_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.map(|d| d.as_secs()).unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<u64>::deserialize(d)?.unwrap_or(0);
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    }
}
