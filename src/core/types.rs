/*!
 * Core Types
 * Common types shared by every stage of a gateway session
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit status reported to the transport when a session ends
pub type ExitStatus = i32;

/// Caller-supplied argument list; empty means "no command given"
pub type CommandVector = Vec<String>;

/// Reserved session exit statuses
pub mod exit {
    use super::ExitStatus;

    pub const SUCCESS: ExitStatus = 0;

    /// Command ran past its deadline and was killed
    pub const DEADLINE_EXCEEDED: ExitStatus = 124;

    /// No authorized command matched, or the matched command could not run
    pub const NOT_FOUND: ExitStatus = 127;
}

/// The only message a caller ever sees for a blocked or failed command
pub const NOT_FOUND_MESSAGE: &str = "Command not found\n";

/// Caller environment variables that may reach a command or template
pub const PASSTHROUGH_VARS: [&str; 2] = ["LANG", "TZ"];

/// Public-key fingerprint of an authenticated caller
///
/// Formatted as `<key type> <base64 key material>`. Used for group lookup and
/// auditing only; authentication happens in the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(key_type: &str, encoded_key: &str) -> Self {
        Self(format!("{} {}", key_type, encoded_key))
    }

    /// Wrap an already formatted fingerprint
    pub fn from_fingerprint<S: Into<String>>(fingerprint: S) -> Self {
        Self(fingerprint.into())
    }

    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Environment variables sent by the caller, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerEnv {
    vars: Vec<(String, String)>,
}

impl CallerEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `KEY=VALUE` entries; entries without `=` are dropped
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vars = entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .as_ref()
                    .split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
            })
            .collect();
        Self { vars }
    }

    pub fn with_var<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    /// First value sent for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Virtual-host claim: the first non-empty `HOST` sent
    pub fn host_claim(&self) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, v)| k == "HOST" && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Allow-listed variables only, last value wins
    pub fn passthrough(&self) -> Vec<(String, String)> {
        PASSTHROUGH_VARS
            .iter()
            .filter_map(|key| {
                self.vars
                    .iter()
                    .rev()
                    .find(|(k, _)| k == key)
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
