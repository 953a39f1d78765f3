/*!
 * Template Documents
 * Renders capsule documents for the `tpl` built-in
 *
 * Supported directives:
 * - `{{ .env.KEY }}` substitutes a value, empty when unset
 * - `{{ if index .env "KEY" }} ... {{ end }}` and `{{ if .env.KEY }} ... {{ end }}`
 *   keep their body only when KEY is set and non-empty
 */

use crate::core::errors::{RenderError, RenderResult};
use std::collections::BTreeMap;

/// Values visible to a document under `.env`
pub type RenderEnv = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Var(String),
    If { key: String, body: Vec<Node> },
}

/// A parsed document, ready to render against any environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    nodes: Vec<Node>,
}

impl TemplateDocument {
    pub fn parse(source: &str) -> RenderResult<Self> {
        // Each frame is an open `if` (key) and the nodes collected so far
        let mut stack: Vec<(Option<String>, Vec<Node>)> = vec![(None, Vec::new())];
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            push_text(&mut stack, &rest[..start]);

            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or(RenderError::Unterminated(offset + start))?;
            let directive = after[..end].trim();

            if directive == "end" {
                if stack.len() == 1 {
                    return Err(RenderError::UnexpectedEnd);
                }
                if let Some((Some(key), body)) = stack.pop() {
                    current(&mut stack).push(Node::If { key, body });
                }
            } else if let Some(cond) = directive.strip_prefix("if ") {
                let key = condition_key(cond.trim())
                    .ok_or_else(|| RenderError::UnknownDirective(directive.to_string()))?;
                stack.push((Some(key.to_string()), Vec::new()));
            } else {
                let key = env_key(directive)
                    .ok_or_else(|| RenderError::UnknownDirective(directive.to_string()))?;
                current(&mut stack).push(Node::Var(key.to_string()));
            }

            offset += start + 2 + end + 2;
            rest = &after[end + 2..];
        }
        push_text(&mut stack, rest);

        if stack.len() != 1 {
            return Err(RenderError::UnclosedIf);
        }
        let nodes = stack.pop().map(|(_, nodes)| nodes).unwrap_or_default();
        Ok(Self { nodes })
    }

    pub fn render(&self, env: &RenderEnv) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, env, &mut out);
        out
    }
}

fn current(stack: &mut [(Option<String>, Vec<Node>)]) -> &mut Vec<Node> {
    // The root frame is never popped while parsing
    &mut stack[stack.len() - 1].1
}

fn push_text(stack: &mut [(Option<String>, Vec<Node>)], text: &str) {
    if !text.is_empty() {
        current(stack).push(Node::Text(text.to_string()));
    }
}

fn render_nodes(nodes: &[Node], env: &RenderEnv, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(key) => {
                if let Some(value) = env.get(key) {
                    out.push_str(value);
                }
            }
            Node::If { key, body } => {
                if env.get(key).is_some_and(|v| !v.is_empty()) {
                    render_nodes(body, env, out);
                }
            }
        }
    }
}

fn is_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `.env.KEY`
fn env_key(expr: &str) -> Option<&str> {
    expr.strip_prefix(".env.").filter(|k| is_key(k))
}

/// `index .env "KEY"` or `.env.KEY`
fn condition_key(expr: &str) -> Option<&str> {
    if let Some(key) = env_key(expr) {
        return Some(key);
    }
    let args = expr.strip_prefix("index")?.trim_start();
    let quoted = args.strip_prefix(".env")?.trim();
    quoted
        .strip_prefix('"')
        .and_then(|q| q.strip_suffix('"'))
        .filter(|k| is_key(k))
}
