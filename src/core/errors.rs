/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 *
 * Per-session errors (paths, capsule files, execution) are logged and mapped
 * to a generic caller-visible outcome by the session orchestrator. Only
 * configuration and bootstrap errors are fatal.
 */

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type PathResult<T> = Result<T, PathError>;
pub type CapsuleResult<T> = Result<T, CapsuleError>;
pub type ExecResult<T> = Result<T, ExecError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Rejections raised while virtualizing a caller path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path token is empty")]
    Empty,

    #[error("path contains disallowed characters: {0:?}")]
    InvalidCharacters(String),

    #[error("path escapes its root: {0:?}")]
    Traversal(String),

    #[error("no binding covers virtual path {0:?}")]
    Unbound(String),

    #[error("resolved path is not valid UTF-8: {0}")]
    NotUnicode(PathBuf),
}

/// Failures reading capsule configuration or content
#[derive(Error, Debug)]
pub enum CapsuleError {
    #[error("capsule file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CapsuleError {
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            CapsuleError::NotFound(path)
        } else {
            CapsuleError::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CapsuleError::NotFound(_))
    }
}

/// Template document parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unterminated directive at byte {0}")]
    Unterminated(usize),

    #[error("unknown directive {0:?}")]
    UnknownDirective(String),

    #[error("{{{{ end }}}} without matching {{{{ if }}}}")]
    UnexpectedEnd,

    #[error("{{{{ if }}}} without matching {{{{ end }}}}")]
    UnclosedIf,
}

/// Failures while running a matched command
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for child: {0}")]
    Wait(#[source] io::Error),

    #[error("command exceeded deadline of {0:?}")]
    Deadline(Duration),

    #[error("template document unavailable: {0}")]
    Document(#[from] CapsuleError),

    #[error("template rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("session stream error: {0}")]
    Stream(#[source] io::Error),
}

/// Invalid or unreadable gateway configuration
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    #[diagnostic(
        code(config::read_failed),
        help("Check that CAPSULE_CONFIG points at a readable JSON file.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config file {path} is not valid")]
    #[diagnostic(code(config::parse_failed), help("The config file must be a JSON object."))]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    #[diagnostic(code(config::invalid_env))]
    Env { key: String, value: String },

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(config::invalid))]
    Invalid(String),
}

/// First-run scaffolding failures; these abort startup
#[derive(Error, Debug, Diagnostic)]
pub enum BootstrapError {
    #[error("failed to create {path}")]
    #[diagnostic(
        code(bootstrap::create_failed),
        help("The gateway cannot run without a default capsule. Check directory permissions.")
    )]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Unified gateway error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum GatewayError {
    #[error("Path error: {0}")]
    #[diagnostic(code(gateway::path))]
    Path(#[from] PathError),

    #[error("Capsule error: {0}")]
    #[diagnostic(code(gateway::capsule))]
    Capsule(#[from] CapsuleError),

    #[error("Execution error: {0}")]
    #[diagnostic(code(gateway::exec))]
    Exec(#[from] ExecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Bootstrap(#[from] BootstrapError),
}
