/*!
 * Capsule Gate - Main Entry Point
 *
 * Runs one gateway session over the process's own stdio, for use as an
 * sshd `ForceCommand`:
 * - Command vector from SSH_ORIGINAL_COMMAND
 * - Caller identity from the `publickey` line of SSH_USER_AUTH
 *   (OpenSSH `ExposeAuthInfo`), else anonymous
 * - Caller environment HOST, LANG and TZ
 */

use miette::IntoDiagnostic;
use std::path::Path;
use tracing::info;

use capsule_gate::session::authenticated_identity;
use capsule_gate::{
    init_tracing, scaffold_capsule, CallerEnv, FsCapsuleStore, Gateway, GatewayConfig, LogSink, SessionRequest,
    SessionStreams,
};

const CALLER_VARS: [&str; 3] = ["HOST", "LANG", "TZ"];

#[tokio::main]
async fn main() -> miette::Result<()> {
    let config = GatewayConfig::load()?;
    init_tracing(LogSink::from_env(config.default_log_file())).into_diagnostic()?;

    info!(
        default_capsule = %config.default_capsule.display(),
        extra_capsules = config.capsules.len(),
        "Gateway configured"
    );

    if config.scaffold && scaffold_capsule(&config.default_capsule)? {
        info!(path = %config.default_capsule.display(), "Created default capsule");
    }

    let request = session_request();
    let gateway = Gateway::new(config, FsCapsuleStore::new());
    let mut streams = SessionStreams::new(tokio::io::stdin(), tokio::io::stdout(), tokio::io::stderr());

    let status = gateway.handle(&request, &mut streams).await;
    std::process::exit(status);
}

fn session_request() -> SessionRequest {
    let command = std::env::var("SSH_ORIGINAL_COMMAND")
        .map(|raw| SessionRequest::split_command(&raw))
        .unwrap_or_default();

    let env = CALLER_VARS
        .iter()
        .filter_map(|key| std::env::var(key).ok().map(|value| (*key, value)))
        .fold(CallerEnv::new(), |env, (key, value)| env.with_var(key, value));

    let user = std::env::var("USER").unwrap_or_else(|_| "capsule".to_string());

    let auth_info = std::env::var_os("SSH_USER_AUTH");
    let identity = authenticated_identity(auth_info.as_deref().map(Path::new));

    SessionRequest::new(identity, command)
        .with_user(user)
        .with_env(env)
}
