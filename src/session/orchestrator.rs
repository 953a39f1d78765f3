/*!
 * Session Orchestrator
 * Routes, authorizes and executes a single caller command
 */

use super::request::{SessionRequest, SessionStreams};
use crate::capsule::{Capsule, CapsuleStore};
use crate::commands::{find_match, MatchedCommand};
use crate::config::GatewayConfig;
use crate::core::errors::{ExecError, ExecResult};
use crate::core::types::{exit, ExitStatus, NOT_FOUND_MESSAGE};
use crate::monitoring::SessionSpan;
use crate::permissions::resolve_permissions;
use crate::process::ProcessLauncher;
use crate::sandbox::{Action, RenderEnv, SandboxBuilder, TemplateDocument};
use crate::vfs::{PathBindings, PathVirtualizer};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn, Instrument};

/// Host name reported when the caller makes no virtual-host claim
pub const DEFAULT_HOST: &str = "default";

/// Per-session entry point shared by every connection
///
/// Holds no mutable state; concurrent sessions may share one gateway.
pub struct Gateway<S: CapsuleStore> {
    config: GatewayConfig,
    store: S,
    launcher: ProcessLauncher,
    server_env: Option<Vec<(String, String)>>,
}

impl<S: CapsuleStore> Gateway<S> {
    pub fn new(config: GatewayConfig, store: S) -> Self {
        let launcher = ProcessLauncher::new(config.command_timeout);
        Self {
            config,
            store,
            launcher,
            server_env: None,
        }
    }

    /// Use a fixed base environment for children instead of the process's own
    pub fn with_server_env(mut self, env: Vec<(String, String)>) -> Self {
        self.server_env = Some(env);
        self
    }

    /// Handle one session and return its exit status
    ///
    /// An empty command runs the capsule's default command when one is
    /// declared and otherwise greets the caller. Every failure past routing
    /// is reported to the caller as a generic "not found".
    pub async fn handle<R, W, E>(
        &self,
        request: &SessionRequest,
        streams: &mut SessionStreams<R, W, E>,
    ) -> ExitStatus
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let span = SessionSpan::new(request.identity.as_str());
        let status = self
            .dispatch(request, streams, &span)
            .instrument(span.span().clone())
            .await;
        span.record_exit(status);
        status
    }

    async fn dispatch<R, W, E>(
        &self,
        request: &SessionRequest,
        streams: &mut SessionStreams<R, W, E>,
        span: &SessionSpan,
    ) -> ExitStatus
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let claim = request.env.host_claim();
        let router = self.config.router();
        let capsule = router.route(&self.store, claim);
        span.record_capsule(&capsule.root().display().to_string());

        info!(command = ?request.command, "Command requested");

        let Some(matched) = self.authorize(request, capsule) else {
            if request.command.is_empty() {
                return self.greet(request, &mut streams.output).await;
            }
            warn!(command = ?request.command, "Command blocked");
            return not_found(&mut streams.output).await;
        };

        info!(argv = ?matched.argv, source = %matched.source, line = matched.line, "Executing command");

        let host = claim.unwrap_or(DEFAULT_HOST);
        let builder = SandboxBuilder::new(&self.store, capsule, &request.identity, host, &request.env);
        let action = builder.build(matched.argv, self.server_env());

        let result = match action {
            Action::RenderTemplate { document, env } => {
                self.render(&document, &env, &mut streams.output).await
            }
            Action::ExternalProcess(spec) => {
                self.launcher
                    .run(&spec, &mut streams.input, &mut streams.output, &mut streams.error)
                    .await
            }
        };

        match result {
            Ok(status) => status,
            Err(ExecError::Stream(e)) => {
                debug!(error = %e, "Session stream closed");
                exit::NOT_FOUND
            }
            Err(e) => {
                error!(error = %e, "Command failed");
                not_found(&mut streams.output).await
            }
        }
    }

    /// Match the caller's command against every permitted commands file
    pub fn authorize(&self, request: &SessionRequest, capsule: &Capsule) -> Option<MatchedCommand> {
        let permissions = resolve_permissions(&self.store, &request.identity, capsule);
        let sources = permissions.load(&self.store, capsule);
        let virtualizer = self.virtualizer(capsule);
        find_match(&sources, &request.command, &virtualizer)
    }

    /// Path virtualizer for `capsule`, honouring an optional bindings file
    pub fn virtualizer(&self, capsule: &Capsule) -> PathVirtualizer {
        let bindings = match self.store.read_lines(&capsule.bindings_file()) {
            Ok(lines) => {
                let bindings = PathBindings::parse(lines, capsule.root());
                if bindings.is_empty() {
                    warn!("Bindings file declares nothing, no paths are reachable");
                }
                bindings
            }
            Err(e) if e.is_not_found() => PathBindings::single(capsule.content_dir()),
            Err(e) => {
                warn!(error = %e, "Bindings file unreadable, no paths are reachable");
                PathBindings::from_bindings(Vec::new())
            }
        };
        PathVirtualizer::new(bindings, self.config.traversal)
    }

    async fn render<W>(&self, document: &Path, env: &RenderEnv, output: &mut W) -> ExecResult<ExitStatus>
    where
        W: AsyncWrite + Unpin,
    {
        let source = self.store.read_to_string(document)?;
        let rendered = TemplateDocument::parse(&source)?.render(env);
        output
            .write_all(rendered.as_bytes())
            .await
            .map_err(ExecError::Stream)?;
        output.flush().await.map_err(ExecError::Stream)?;
        Ok(exit::SUCCESS)
    }

    async fn greet<W>(&self, request: &SessionRequest, output: &mut W) -> ExitStatus
    where
        W: AsyncWrite + Unpin,
    {
        info!("Greeting sent");
        let env: Vec<String> = request.env.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        let greeting = format!(
            "Welcome {}\nYour public key is {}\nYour environment: [{}]\n",
            request.user,
            request.identity,
            env.join(" ")
        );
        if let Err(e) = write_flush(output, greeting.as_bytes()).await {
            debug!(error = %e, "Failed to write greeting");
        }
        exit::SUCCESS
    }

    fn server_env(&self) -> Vec<(String, String)> {
        match &self.server_env {
            Some(env) => env.clone(),
            None => std::env::vars().collect(),
        }
    }
}

async fn not_found<W: AsyncWrite + Unpin>(output: &mut W) -> ExitStatus {
    if let Err(e) = write_flush(output, NOT_FOUND_MESSAGE.as_bytes()).await {
        debug!(error = %e, "Failed to write not-found message");
    }
    exit::NOT_FOUND
}

async fn write_flush<W: AsyncWrite + Unpin>(output: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    output.write_all(bytes).await?;
    output.flush().await
}
