//! Shell-style table name patterns.
//!
//! `*` matches any run of characters except `/`, `?` matches one such
//! character, `[...]` is a character class (`[^...]` negated, `a-z` ranges)
//! and `\` escapes the next character. Patterns are compiled to anchored
//! regular expressions.

use regex::Regex;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("syntax error in pattern '{0}'")]
    Syntax(String),

    #[error("invalid pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled table name pattern.
#[derive(Debug, Clone)]
pub struct TablePattern {
    glob: String,
    regex: Regex,
}

impl TablePattern {
    pub fn new(glob: &str) -> Result<Self, PatternError> {
        let source = glob_to_regex(glob)?;
        let regex = Regex::new(&source).map_err(|source| PatternError::Regex {
            pattern: glob.to_string(),
            source,
        })?;
        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

fn glob_to_regex(glob: &str) -> Result<String, PatternError> {
    let syntax = || PatternError::Syntax(glob.to_string());
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' => {
                let escaped = chars.next().ok_or_else(syntax)?;
                out.push_str(&regex::escape(&escaped.to_string()));
            }
            '[' => {
                out.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
                let mut ranges = 0;
                loop {
                    let lo = match chars.next().ok_or_else(syntax)? {
                        ']' if ranges > 0 => break,
                        ']' => return Err(syntax()),
                        '\\' => chars.next().ok_or_else(syntax)?,
                        other => other,
                    };
                    push_class_char(&mut out, lo);
                    if chars.peek() == Some(&'-') {
                        chars.next();
                        let hi = match chars.next().ok_or_else(syntax)? {
                            ']' => return Err(syntax()),
                            '\\' => chars.next().ok_or_else(syntax)?,
                            other => other,
                        };
                        if hi < lo {
                            return Err(syntax());
                        }
                        out.push('-');
                        push_class_char(&mut out, hi);
                    }
                    ranges += 1;
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}
