use std::{collections::BTreeSet, fs::File, io::Read, path::Path};

use crate::{glob::FileGlob, owner::Owner};

/// Parse an OWNERS file from a string, returning a `ParseResult` containing
/// the parsed directives and any errors encountered.
pub fn parse(source: &str) -> ParseResult {
    Parser::new(source).parse()
}

/// Parse an OWNERS file from a file path, reading the contents of the file
/// and returning a `ParseResult`.
pub fn parse_file(path: &Path) -> std::io::Result<ParseResult> {
    let mut file = File::open(path)?;
    let mut source = String::new();
    file.read_to_string(&mut source)?;
    Ok(parse(&source))
}

/// The result of parsing an OWNERS file. If `errors` is non-empty the
/// directive set is incomplete and must not be used to answer queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub directives: DirectiveSet,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Convert into the directive set, or the first error encountered.
    pub fn into_result(self) -> Result<DirectiveSet, ParseError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.directives),
        }
    }
}

/// Everything one OWNERS file declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    /// Owners of the whole directory.
    pub owners: BTreeSet<Owner>,
    /// `set noparent`: owners of ancestor directories don't apply here.
    pub no_parent: bool,
    /// The last non-empty `#` comment in the file.
    pub comment: Option<String>,
    /// `per-file` rules in order of first appearance, one per distinct glob.
    pub per_file: Vec<PerFileRule>,
}

impl DirectiveSet {
    fn per_file_entry(&mut self, glob: FileGlob) -> &mut PerFileRule {
        let idx = match self.per_file.iter().position(|r| r.glob == glob) {
            Some(idx) => idx,
            None => {
                self.per_file.push(PerFileRule::new(glob));
                self.per_file.len() - 1
            }
        };
        &mut self.per_file[idx]
    }
}

/// The accumulated `per-file` lines for one glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerFileRule {
    pub glob: FileGlob,
    pub owners: BTreeSet<Owner>,
    pub no_parent: bool,
}

impl PerFileRule {
    fn new(glob: FileGlob) -> Self {
        Self {
            glob,
            owners: BTreeSet::new(),
            no_parent: false,
        }
    }
}

/// An error encountered while parsing an OWNERS file. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, line: usize) -> ParseError {
        ParseError {
            message: message.into(),
            line,
        }
    }
}

const NOPARENT: &str = "set noparent";
const PER_FILE: &str = "per-file";

struct Parser<'a> {
    source: &'a str,
    directives: DirectiveSet,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            directives: DirectiveSet::default(),
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        for (idx, line) in self.source.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let result = if let Some(comment) = line.strip_prefix('#') {
                self.parse_comment(comment);
                Ok(())
            } else if line == NOPARENT {
                self.directives.no_parent = true;
                Ok(())
            } else if let Some(option) = line.strip_prefix("set ") {
                Err(ParseError::new(
                    format!("unknown option: \"{}\"", option.trim()),
                    line_no,
                ))
            } else if let Some(rule) = per_file_body(line) {
                self.parse_per_file(rule, line, line_no)
            } else {
                self.parse_owner(line, line_no)
            };

            // Any error poisons the whole file, so there's no point carrying on
            if let Err(err) = result {
                self.errors.push(err);
                break;
            }
        }

        ParseResult {
            directives: self.directives,
            errors: self.errors,
        }
    }

    fn parse_comment(&mut self, comment: &str) {
        let comment = comment.trim();
        if !comment.is_empty() {
            self.directives.comment = Some(comment.to_owned());
        }
    }

    fn parse_owner(&mut self, line: &str, line_no: usize) -> Result<(), ParseError> {
        match Owner::parse(line) {
            Some(owner) => {
                self.directives.owners.insert(owner);
                Ok(())
            }
            None => Err(ParseError::new(
                format!(
                    "line is not a \"set\" directive, \"*\", or an email address: \"{}\"",
                    line
                ),
                line_no,
            )),
        }
    }

    fn parse_per_file(&mut self, rule: &str, line: &str, line_no: usize) -> Result<(), ParseError> {
        let Some((glob, directive)) = rule.split_once('=') else {
            return Err(ParseError::new(
                format!("per-file line is missing \"=\": \"{}\"", line),
                line_no,
            ));
        };
        let (glob, directive) = (glob.trim(), directive.trim());

        let glob = FileGlob::new(glob)
            .map_err(|err| ParseError::new(format!("{}: \"{}\"", err, line), line_no))?;

        if directive == NOPARENT {
            self.directives.per_file_entry(glob).no_parent = true;
            return Ok(());
        }

        match Owner::parse(directive) {
            Some(owner) => {
                self.directives.per_file_entry(glob).owners.insert(owner);
                Ok(())
            }
            None => Err(ParseError::new(
                format!(
                    "per-file line is not a \"set\" directive, \"*\", or an email address: \"{}\"",
                    directive
                ),
                line_no,
            )),
        }
    }
}

// `per-file` must be followed by whitespace; `per-filefoo` is an (invalid)
// owner line, not a per-file rule.
fn per_file_body(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(PER_FILE)?;
    if rest.starts_with([' ', '\t']) {
        Some(rest.trim_start())
    } else {
        None
    }
}
