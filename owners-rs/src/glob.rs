use std::fmt;

/// A glob that matches a single path component, as used by `per-file`
/// rules. Supports `*`, `?` and `[...]` character classes (`[!...]` negates).
/// Globs never contain path separators; [`FileGlob::new`] rejects them.
#[derive(Debug, Clone)]
pub struct FileGlob {
    pattern: String,
    condition: MatchCondition,
}

/// Reasons a `per-file` glob can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobError {
    Empty,
    SpansDirectories,
    Invalid(String),
}

impl fmt::Display for GlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobError::Empty => f.write_str("empty glob"),
            GlobError::SpansDirectories => {
                f.write_str("per-file globs cannot span directories or use escapes")
            }
            GlobError::Invalid(reason) => write!(f, "invalid glob: {}", reason),
        }
    }
}

impl FileGlob {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        if pattern.is_empty() {
            return Err(GlobError::Empty);
        }
        if pattern.contains(['/', '\\']) {
            return Err(GlobError::SpansDirectories);
        }
        Ok(Self {
            pattern: pattern.to_owned(),
            condition: MatchCondition::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, file_name: &str) -> bool {
        self.condition.is_match(&self.pattern, file_name)
    }
}

impl fmt::Display for FileGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl PartialEq for FileGlob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for FileGlob {}

// Most per-file globs are literals or a single leading/trailing star, which
// don't need a regex.
#[derive(Debug, Clone)]
enum MatchCondition {
    Unconditional,
    Literal,
    Prefix,
    Suffix,
    Contains,
    Regex(regex::Regex),
}

impl MatchCondition {
    fn new(glob: &str) -> Result<Self, GlobError> {
        if glob == "*" {
            return Ok(Self::Unconditional);
        }
        if glob.contains(['?', '[']) {
            return pattern_to_regex(glob).map(Self::Regex);
        }

        let mut chars = glob.chars();
        let leading_star = chars.next().map(|c| c == '*').unwrap_or(false);
        let trailing_star = chars.next_back().map(|c| c == '*').unwrap_or(false);
        let internal_wildcards = chars.any(|c| c == '*');

        Ok(match (leading_star, trailing_star, internal_wildcards) {
            (false, false, false) => Self::Literal,
            (false, true, false) => Self::Prefix,
            (true, false, false) => Self::Suffix,
            (true, true, false) => Self::Contains,
            _ => Self::Regex(pattern_to_regex(glob)?),
        })
    }

    fn is_match(&self, pattern: &str, candidate: &str) -> bool {
        match self {
            Self::Unconditional => true,
            Self::Literal => pattern == candidate,
            Self::Prefix => candidate.starts_with(pattern.trim_end_matches('*')),
            Self::Suffix => candidate.ends_with(pattern.trim_start_matches('*')),
            Self::Contains => {
                memchr::memmem::find(candidate.as_bytes(), pattern.trim_matches('*').as_bytes())
                    .is_some()
            }
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

fn pattern_to_regex(pattern: &str) -> Result<regex::Regex, GlobError> {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str(r#"\A"#);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str(r#"[^/]*"#),
            '?' => regex.push_str(r#"[^/]"#),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    if c == '[' || c == '&' || c == '~' {
                        class.push('\\');
                    }
                    class.push(c);
                }
                if !closed {
                    return Err(GlobError::Invalid(format!(
                        "unterminated character class in `{}`",
                        pattern
                    )));
                }
                regex.push('[');
                regex.push_str(&class);
                regex.push(']');
            }
            _ => {
                if regex_syntax::is_meta_character(c) {
                    regex.push('\\');
                }
                regex.push(c);
            }
        }
    }
    regex.push_str(r#"\z"#);
    regex::Regex::new(&regex).map_err(|err| GlobError::Invalid(err.to_string()))
}
