//! Marker-based text edits.

use std::fmt;

use regex::{Captures, Regex};
use tracing::debug;

use crate::error::{SandboxError, SandboxResult};
use crate::paths::ProjectRoot;
use crate::tools::files::{read_existing, write_creating_parents};

/// What [`TextTools::replace`] searches for.
#[derive(Debug, Clone)]
pub enum Search {
    Literal(String),
    Pattern(Regex),
}

impl Search {
    pub fn literal(text: impl Into<String>) -> Self {
        Search::Literal(text.into())
    }

    pub fn pattern(pattern: &str) -> SandboxResult<Self> {
        Regex::new(pattern)
            .map(Search::Pattern)
            .map_err(|e| SandboxError::invalid_argument("text.replace", e.to_string()))
    }

    fn count(&self, content: &str) -> usize {
        match self {
            Search::Literal(text) if text.is_empty() => 0,
            Search::Literal(text) => content.matches(text.as_str()).count(),
            Search::Pattern(regex) => regex.find_iter(content).count(),
        }
    }

    fn replace_all(&self, content: &str, replacement: &str) -> String {
        match self {
            Search::Literal(text) => content.replace(text.as_str(), replacement),
            Search::Pattern(regex) => {
                let named = regex.capture_names().flatten().next().is_some();
                regex
                    .replace_all(content, |caps: &Captures<'_>| {
                        expand_replacement(replacement, caps, content, named)
                    })
                    .into_owned()
            }
        }
    }
}

/// Expand `$$`, `$&`, `` $` ``, `$'`, `$n`, `$nn` and `$<name>` the way
/// `String.prototype.replace` does. Unresolvable references stay literal.
fn expand_replacement(template: &str, caps: &Captures<'_>, haystack: &str, named: bool) -> String {
    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let groups = caps.len() - 1;
    let group = |n: usize| caps.get(n).map_or("", |m| m.as_str());

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        rest = &rest[dollar + 1..];
        let mut chars = rest.chars();
        let consumed = match chars.next() {
            Some('$') => {
                out.push('$');
                1
            }
            Some('&') => {
                out.push_str(&haystack[whole.clone()]);
                1
            }
            Some('`') => {
                out.push_str(&haystack[..whole.start]);
                1
            }
            Some('\'') => {
                out.push_str(&haystack[whole.end..]);
                1
            }
            Some(first @ '0'..='9') => {
                let one = first.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .next()
                    .and_then(|c| c.to_digit(10))
                    .map(|second| one * 10 + second as usize);
                match two {
                    Some(n) if (1..=groups).contains(&n) => {
                        out.push_str(group(n));
                        2
                    }
                    _ if (1..=groups).contains(&one) => {
                        out.push_str(group(one));
                        1
                    }
                    _ => {
                        out.push('$');
                        0
                    }
                }
            }
            Some('<') if named => match rest.find('>') {
                Some(close) => {
                    if let Some(m) = caps.name(&rest[1..close]) {
                        out.push_str(m.as_str());
                    }
                    close + 1
                }
                None => {
                    out.push('$');
                    0
                }
            },
            _ => {
                out.push('$');
                0
            }
        };
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

impl fmt::Display for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Search::Literal(text) => f.write_str(text),
            Search::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Insert `block` on the line after the first line containing `marker`.
fn insert_after_marker(content: &str, marker: &str, block: &str) -> Option<String> {
    let start = content.find(marker)?;
    let after_marker = start + marker.len();
    let block = format!("{}\n", block.trim_end_matches('\n'));
    Some(match content[after_marker..].find('\n') {
        Some(offset) => {
            let line_end = after_marker + offset + 1;
            format!("{}{}{}", &content[..line_end], block, &content[line_end..])
        }
        None => format!("{}\n{}", content, block),
    })
}

fn append_block(content: &mut String, block: &str) {
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(block.trim_end_matches('\n'));
    content.push('\n');
}

/// `tools.text`
#[derive(Debug, Clone)]
pub struct TextTools {
    root: ProjectRoot,
}

impl TextTools {
    pub fn new(root: ProjectRoot) -> Self {
        Self { root }
    }

    /// Insert `content` after the line holding `marker`.
    pub fn insert_after(&self, file: &str, marker: &str, content: &str) -> SandboxResult<()> {
        let path = self.root.resolve(file)?;
        let current = read_existing(&path)?;
        let updated = insert_after_marker(&current, marker, content).ok_or_else(|| SandboxError::MissingMarker {
            file: path.clone(),
            marker: marker.to_string(),
        })?;
        write_creating_parents(&path, updated)?;
        debug!("Inserted after '{}' in {}", marker, self.root.display(&path));
        Ok(())
    }

    /// Replace everything between the `start` and `end` markers, keeping the
    /// markers themselves.
    pub fn replace_between(&self, file: &str, start: &str, end: &str, content: &str) -> SandboxResult<()> {
        let path = self.root.resolve(file)?;
        let current = read_existing(&path)?;
        let missing = |marker: &str| SandboxError::MissingMarker {
            file: path.clone(),
            marker: marker.to_string(),
        };

        let start_at = current.find(start).ok_or_else(|| missing(start))? + start.len();
        let end_at = current[start_at..].find(end).ok_or_else(|| missing(end))? + start_at;

        let updated = format!(
            "{}\n{}\n{}",
            &current[..start_at],
            content.trim_matches('\n'),
            &current[end_at..]
        );
        write_creating_parents(&path, updated)?;
        debug!("Replaced between markers in {}", self.root.display(&path));
        Ok(())
    }

    /// Make sure `block` is present. Inserted after `marker` when given (the
    /// marker must exist), appended otherwise. Returns whether the file changed.
    pub fn ensure_block(&self, file: &str, block: &str, marker: Option<&str>) -> SandboxResult<bool> {
        let path = self.root.resolve_entry(file, "text.ensureBlock")?;
        let current = if path.exists() {
            read_existing(&path)?
        } else {
            String::new()
        };

        if current.contains(block.trim_end_matches('\n')) {
            return Ok(false);
        }

        let updated = match marker {
            Some(marker) => insert_after_marker(&current, marker, block).ok_or_else(|| SandboxError::MissingMarker {
                file: path.clone(),
                marker: marker.to_string(),
            })?,
            None => {
                let mut updated = current;
                append_block(&mut updated, block);
                updated
            }
        };
        write_creating_parents(&path, updated)?;
        debug!("Ensured block in {}", self.root.display(&path));
        Ok(true)
    }

    /// Append lines, creating the file when missing.
    pub fn append_lines<S: AsRef<str>>(&self, file: &str, lines: &[S]) -> SandboxResult<()> {
        let path = self.root.resolve_entry(file, "text.appendLines")?;
        let mut content = if path.exists() {
            read_existing(&path)?
        } else {
            String::new()
        };
        let block: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        append_block(&mut content, &block.join("\n"));
        write_creating_parents(&path, content)?;
        Ok(())
    }

    /// Replace every match of `search`. Pattern searches expand `$1`,
    /// `$<name>`, `$&` and friends in `replacement`; literal searches insert
    /// it verbatim. A failed match is an error when
    /// `ensure_match` is set and leaves the file untouched otherwise.
    /// Returns the number of matches replaced.
    pub fn replace(&self, file: &str, search: &Search, replacement: &str, ensure_match: bool) -> SandboxResult<usize> {
        let path = self.root.resolve(file)?;
        let current = read_existing(&path)?;

        let count = search.count(&current);
        if count == 0 {
            if ensure_match {
                return Err(SandboxError::NoMatch {
                    file: path,
                    search: search.to_string(),
                });
            }
            debug!("No match for {} in {}", search, self.root.display(&path));
            return Ok(0);
        }

        write_creating_parents(&path, search.replace_all(&current, replacement))?;
        debug!("Replaced {} match(es) in {}", count, self.root.display(&path));
        Ok(count)
    }
}
