/*!
 * Command Templates
 * Operator-declared command shapes, one per line of a commands file
 */

/// The only recognized placeholder
pub const PATH_PLACEHOLDER: &str = "<path>";

/// One token of a command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Must equal the caller token byte-for-byte
    Literal(String),
    /// Replaced by the virtualized caller token
    Path,
}

impl Token {
    fn parse(raw: &str) -> Self {
        if raw == PATH_PLACEHOLDER {
            Token::Path
        } else {
            Token::Literal(raw.to_string())
        }
    }
}

/// A parsed template line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    tokens: Vec<Token>,
    line: usize,
}

impl CommandTemplate {
    /// Parse one line; blank lines and `#` comments yield `None`
    pub fn parse_line(text: &str, line: usize) -> Option<Self> {
        if text.trim().is_empty() || text.starts_with('#') {
            return None;
        }
        let tokens = text.split_whitespace().map(Token::parse).collect();
        Some(Self { tokens, line })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// 1-based line number in the source file
    pub fn line(&self) -> usize {
        self.line
    }

    /// A lone literal token runs when the caller sends no command
    pub fn is_default_command(&self) -> bool {
        matches!(self.tokens.as_slice(), [Token::Literal(_)])
    }

    pub fn has_placeholders(&self) -> bool {
        self.tokens.iter().any(|t| *t == Token::Path)
    }
}

/// All templates from one commands file, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateList {
    source: String,
    templates: Vec<CommandTemplate>,
}

impl TemplateList {
    pub fn parse<I, S>(source: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let templates = lines
            .into_iter()
            .enumerate()
            .filter_map(|(i, l)| CommandTemplate::parse_line(l.as_ref(), i + 1))
            .collect();
        Self {
            source: source.into(),
            templates,
        }
    }

    /// Name of the file the templates came from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn templates(&self) -> &[CommandTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
