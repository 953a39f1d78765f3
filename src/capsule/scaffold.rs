/*!
 * Capsule Scaffolding
 * Creates a default capsule with placeholder configuration on first run
 */

use super::layout::{Capsule, BIN_DIR, COMMANDS_FILE, CONTENT_DIR, GROUP_FILE, HOST_FILE, MAIN_DOCUMENT};
use crate::core::errors::BootstrapError;
use std::fs;
use std::path::Path;
use tracing::info;

pub const COMMANDS_TEMPLATE: &str = "# The following is a list of command templates that will be permitted on this server
# It is important to choose a minimal set since anyone with access to your
# server can run these without any authentication using this server.
# Note the special <path> tokens represent paths relative to the capsule content
# directory.
#
# Default command when the user doesn't provide one.
tpl
#
# Read-only commands:
#ls <path>
#tpl <path>
#cat <path>
#wc -c <path>
#scp -f <path>
#git-upload-pack <path>
";

pub const GROUP_TEMPLATE: &str = "# This is a list of public keys and additional groups
# for the key. Additional groups can give access to additional commands.
#
# <key type> <key> group1 group2 ...
# ssh-ed25519 AAAAC3NzaC1lZDI1NTE5... admin site-admin
#
# Additional commands for a group are listed in a file commands-groupname
# (eg. commands-admin and commands-site-admin from above example) with the
# same format as the commands file.
";

pub const MAIN_DOCUMENT_TEMPLATE: &str = "# {{ .env.HOST }} (This Capsule)
Welcome capsule user!

Some information we can see about yourself:

## IDENT (Public Encryption Key)
{{ .env.IDENT }}

{{ if index .env \"LANG\" }}## LANG (Preferred Language)
{{ .env.LANG }}{{ end }}
{{ if index .env \"TZ\" }}## TZ (Preferred Timezone)
{{ .env.TZ }}{{ end }}
If you are the owner of this capsule you can change this welcome page to guide
visitors to the capabilities of your capsule. This page is content/main.gmi in
your capsule directory and is evaluated by the tpl built-in command.

Uncomment \"cat <path>\" in the commands file to let visitors read text files:

=> ssh capsule@{{ .env.HOST }} cat about.gmi
";

/// Create the default capsule at `root` unless it already exists
///
/// Returns `true` when a new capsule was generated.
pub fn scaffold_capsule(root: &Path) -> Result<bool, BootstrapError> {
    if root.exists() {
        return Ok(false);
    }

    info!(path = %root.display(), "Generating default capsule");
    let capsule = Capsule::new(root);

    create_private_dir(root)?;
    write_file(&capsule.file(HOST_FILE), "")?;
    write_file(&capsule.file(COMMANDS_FILE), COMMANDS_TEMPLATE)?;
    write_file(&capsule.file(GROUP_FILE), GROUP_TEMPLATE)?;
    create_private_dir(&root.join(CONTENT_DIR))?;
    write_file(&root.join(CONTENT_DIR).join(MAIN_DOCUMENT), MAIN_DOCUMENT_TEMPLATE)?;
    create_private_dir(&root.join(BIN_DIR))?;

    Ok(true)
}

fn create_private_dir(path: &Path) -> Result<(), BootstrapError> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|source| BootstrapError::Create {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), BootstrapError> {
    fs::write(path, contents).map_err(|source| BootstrapError::Create {
        path: path.to_path_buf(),
        source,
    })
}
