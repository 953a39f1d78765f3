/*!
 * Session Inputs
 * What the transport hands the gateway for one session
 */

use crate::core::types::{CallerEnv, CommandVector, Identity};
use anyhow::Context;
use std::path::Path;
use tracing::warn;

/// An authenticated caller's request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Login name, shown in the greeting only
    pub user: String,
    pub identity: Identity,
    pub command: CommandVector,
    pub env: CallerEnv,
}

impl SessionRequest {
    pub fn new(identity: Identity, command: CommandVector) -> Self {
        Self {
            user: "capsule".to_string(),
            identity,
            command,
            env: CallerEnv::new(),
        }
    }

    pub fn with_user<S: Into<String>>(mut self, user: S) -> Self {
        self.user = user.into();
        self
    }

    pub fn with_env(mut self, env: CallerEnv) -> Self {
        self.env = env;
        self
    }

    /// Split a raw exec request on whitespace
    pub fn split_command(raw: &str) -> CommandVector {
        raw.split_whitespace().map(str::to_string).collect()
    }
}

/// Caller identity from an OpenSSH `ExposeAuthInfo` file
///
/// The first `publickey <type> <key>` entry is the identity. No file, or a
/// file without one, yields the anonymous identity. Nothing else is trusted.
pub fn authenticated_identity(auth_info: Option<&Path>) -> Identity {
    let Some(path) = auth_info else {
        return Identity::anonymous();
    };
    match read_auth_info(path) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "No usable public key in auth info");
            Identity::anonymous()
        }
    }
}

fn read_auth_info(path: &Path) -> anyhow::Result<Identity> {
    let info = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    info.lines()
        .find_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some("publickey"), Some(key_type), Some(key)) => Some(Identity::new(key_type, key)),
                _ => None,
            }
        })
        .with_context(|| format!("no publickey entry in {}", path.display()))
}

/// Session byte streams: caller input, output and a separate error stream
pub struct SessionStreams<R, W, E> {
    pub input: R,
    pub output: W,
    pub error: E,
}

impl<R, W, E> SessionStreams<R, W, E> {
    pub fn new(input: R, output: W, error: E) -> Self {
        Self { input, output, error }
    }

    pub fn into_parts(self) -> (R, W, E) {
        (self.input, self.output, self.error)
    }
}
