/*!
 * Execution Sandbox Builder
 * Turns a matched command into a process launch or a document render
 */

use super::render::RenderEnv;
use crate::capsule::{Capsule, CapsuleStore};
use crate::core::types::{CallerEnv, Identity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Name of the template-rendering built-in
pub const RENDER_BUILTIN: &str = "tpl";

/// Fully prepared external process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Complete child environment; nothing else is inherited
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// What a matched command resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ExternalProcess(LaunchSpec),
    RenderTemplate { document: PathBuf, env: RenderEnv },
}

/// Per-session builder for the execution environment
pub struct SandboxBuilder<'a, S: CapsuleStore + ?Sized> {
    store: &'a S,
    capsule: &'a Capsule,
    identity: &'a Identity,
    host: &'a str,
    caller_env: &'a CallerEnv,
}

impl<'a, S: CapsuleStore + ?Sized> SandboxBuilder<'a, S> {
    pub fn new(
        store: &'a S,
        capsule: &'a Capsule,
        identity: &'a Identity,
        host: &'a str,
        caller_env: &'a CallerEnv,
    ) -> Self {
        Self {
            store,
            capsule,
            identity,
            host,
            caller_env,
        }
    }

    /// Decide the action for `argv`
    ///
    /// `server_env` is the gateway's own environment, the base for child
    /// processes. An empty `argv` renders the main document.
    pub fn build<I>(&self, mut argv: Vec<String>, server_env: I) -> Action
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if argv.is_empty() {
            argv.push(RENDER_BUILTIN.to_string());
        }

        if let Some(local) = self.bin_override(&argv[0]) {
            debug!(program = %argv[0], path = %local.display(), "Using capsule executable");
            argv[0] = local.to_string_lossy().into_owned();
        }

        if argv[0] == RENDER_BUILTIN {
            let document = match argv.get(1) {
                Some(doc) if argv.len() == 2 => self.capsule.content_dir().join(doc),
                _ => self.capsule.main_document(),
            };
            return Action::RenderTemplate {
                document,
                env: self.render_env(),
            };
        }

        let mut args = argv;
        let program = args.remove(0);
        Action::ExternalProcess(LaunchSpec {
            program,
            args,
            working_dir: self.capsule.content_dir(),
            env: self.process_env(server_env),
        })
    }

    /// Capsule executable shadowing `program`, if any
    fn bin_override(&self, program: &str) -> Option<PathBuf> {
        if program.is_empty() || program.contains('/') || program.starts_with('.') {
            return None;
        }
        let candidate = self.capsule.bin_dir().join(program);
        self.store.is_file(&candidate).then_some(candidate)
    }

    /// Values exposed to template documents under `.env`
    pub fn render_env(&self) -> RenderEnv {
        let mut env = RenderEnv::new();
        env.insert("HOST".to_string(), self.host.to_string());
        env.insert("IDENT".to_string(), self.identity.to_string());
        env.extend(self.caller_env.passthrough());
        env
    }

    /// Child environment
    ///
    /// Starts from the server environment, adds allow-listed caller variables,
    /// drops `TERM`, sets `HOST` and `IDENT` and puts the capsule `bin`
    /// directory first on `PATH`.
    pub fn process_env<I>(&self, server_env: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env: Vec<(String, String)> = server_env.into_iter().collect();

        for (key, value) in self.caller_env.passthrough() {
            upsert(&mut env, key, value);
        }

        env.retain(|(k, _)| k != "TERM");

        upsert(&mut env, "HOST".to_string(), self.host.to_string());
        upsert(&mut env, "IDENT".to_string(), self.identity.to_string());

        let bin = self.capsule.bin_dir().to_string_lossy().into_owned();
        let path = match env.iter().find(|(k, _)| k == "PATH") {
            Some((_, existing)) if !existing.is_empty() => format!("{}:{}", bin, existing),
            _ => bin,
        };
        upsert(&mut env, "PATH".to_string(), path);

        env
    }
}

fn upsert(env: &mut Vec<(String, String)>, key: String, value: String) {
    match env.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => env.push((key, value)),
    }
}
