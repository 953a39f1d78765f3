/*!
 * Command Template Matcher
 * First-match authorization of a caller command against template lists
 */

use super::template::{CommandTemplate, TemplateList, Token};
use crate::vfs::PathVirtualizer;
use tracing::debug;

/// A caller command that matched a template, with paths resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedCommand {
    pub argv: Vec<String>,
    /// Commands file the matching template came from
    pub source: String,
    pub line: usize,
}

impl MatchedCommand {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

/// Match a single template against the caller's tokens
///
/// Token counts must be equal. Literal tokens compare exactly; `<path>` tokens
/// are replaced with the virtualized caller token, and any rejection fails
/// the whole line.
pub fn match_template(
    template: &CommandTemplate,
    command: &[String],
    virtualizer: &PathVirtualizer,
) -> Option<Vec<String>> {
    if command.is_empty() {
        return template.is_default_command().then(|| literal_argv(template));
    }

    if template.len() != command.len() {
        return None;
    }

    template
        .tokens()
        .iter()
        .zip(command)
        .map(|(token, arg)| match token {
            Token::Literal(lit) => (lit == arg).then(|| lit.clone()),
            Token::Path => virtualizer.virtualize_arg(arg).ok(),
        })
        .collect()
}

/// Find the first matching template across sources, in order
pub fn find_match(
    sources: &[TemplateList],
    command: &[String],
    virtualizer: &PathVirtualizer,
) -> Option<MatchedCommand> {
    for list in sources {
        for template in list.templates() {
            if let Some(argv) = match_template(template, command, virtualizer) {
                debug!(source = list.source(), line = template.line(), "Template matched");
                return Some(MatchedCommand {
                    argv,
                    source: list.source().to_string(),
                    line: template.line(),
                });
            }
        }
    }
    None
}

fn literal_argv(template: &CommandTemplate) -> Vec<String> {
    template
        .tokens()
        .iter()
        .filter_map(|t| match t {
            Token::Literal(lit) => Some(lit.clone()),
            Token::Path => None,
        })
        .collect()
}
