//! Glob patterns for ignore rules.
//!
//! Patterns are translated to anchored regular expressions and matched
//! against paths relative to a library's install directory, always using
//! `/` as the separator.
//!
//! | glob        | meaning                                         |
//! |-------------|-------------------------------------------------|
//! | `*`         | any run of characters except `/`                |
//! | `?`         | exactly one character except `/`                |
//! | `**/`       | zero or more leading directories                |
//! | `dir/**`    | everything below `dir`                          |
//! | `[a-z]`     | character class, `[!a-z]` negates               |
//! | `{a,b}`     | alternation, may nest                           |
//! | `\x`        | literal `x`                                     |

use regex::{Regex, RegexSet};
use thiserror::Error;

/// Error compiling a glob pattern.
#[derive(Debug, Error)]
pub enum GlobError {
    #[error("unclosed `{{` in glob pattern `{pattern}`")]
    UnclosedBrace { pattern: String },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Translate a glob pattern into an anchored regex source string.
///
/// Wildcards never match a leading `.` of a path segment unless the
/// pattern spells the dot out, so `*` skips `.htaccess` and `docs/**`
/// skips `docs/.nojekyll`.
pub fn glob_to_regex(pattern: &str) -> Result<String, GlobError> {
    let trimmed = pattern
        .strip_prefix("./")
        .or_else(|| pattern.strip_prefix('/'))
        .unwrap_or(pattern);
    let chars: Vec<char> = trimmed.chars().collect();

    let mut regex = String::with_capacity(trimmed.len() * 2 + 2);
    regex.push('^');

    // Guard state at each open `{`, restored after every `,`.
    let mut braces: Vec<bool> = Vec::new();
    let mut segment_start = true;
    // The next path character must not be a leading dot.
    let mut guard = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match c {
            '\\' => {
                // Trailing backslash matches itself.
                let literal = chars.get(i + 1).copied().unwrap_or('\\');
                push_literal(&mut regex, literal);
                i += 2;
                segment_start = false;
                guard = false;
                continue;
            }
            '*' if segment_start && chars.get(i + 1) == Some(&'*') => match chars.get(i + 2) {
                Some('/') => {
                    regex.push_str("(?:[^/.][^/]*/)*");
                    i += 3;
                    // Still at the start of a segment.
                    continue;
                }
                None => {
                    regex.push_str("[^/.][^/]*(?:/[^/.][^/]*)*");
                    i += 2;
                    continue;
                }
                Some(_) => push_star(&mut regex, &mut guard, chars.get(i + 1)),
            },
            '*' => push_star(&mut regex, &mut guard, chars.get(i + 1)),
            '?' => {
                regex.push_str(if guard { "[^/.]" } else { "[^/]" });
                guard = false;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    let mut class = String::new();
                    push_class(&mut class, &chars[i + 1..end]);
                    if guard {
                        regex.push('[');
                        regex.push_str(&class);
                        regex.push_str("&&[^/.]]");
                    } else {
                        regex.push_str(&class);
                    }
                    i = end + 1;
                    segment_start = false;
                    guard = false;
                    continue;
                }
                None => {
                    push_literal(&mut regex, '[');
                    guard = false;
                }
            },
            '{' => {
                braces.push(guard);
                regex.push_str("(?:");
            }
            '}' if !braces.is_empty() => {
                braces.pop();
                regex.push(')');
                guard = false;
            }
            ',' if !braces.is_empty() => {
                regex.push('|');
                guard = braces.last().copied().unwrap_or(false);
            }
            '/' => {
                push_literal(&mut regex, '/');
                guard = true;
            }
            other => {
                push_literal(&mut regex, other);
                guard = false;
            }
        }

        segment_start = c == '/';
        i += 1;
    }

    if !braces.is_empty() {
        return Err(GlobError::UnclosedBrace {
            pattern: pattern.to_string(),
        });
    }

    regex.push('$');
    Ok(regex)
}

/// Compile a single glob into a path predicate.
pub fn glob_to_matcher(pattern: &str) -> Result<impl Fn(&str) -> bool, GlobError> {
    let source = glob_to_regex(pattern)?;
    let regex = Regex::new(&source).map_err(|e| GlobError::Regex {
        pattern: pattern.to_string(),
        source: e,
    })?;
    Ok(move |path: &str| regex.is_match(path))
}

/// A set of globs matched with OR semantics.
#[derive(Debug, Clone)]
pub struct GlobSet {
    patterns: Vec<String>,
    set: RegexSet,
}

impl GlobSet {
    /// Compile a list of glob patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, GlobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        let sources = patterns
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<Vec<_>, _>>()?;

        let set = RegexSet::new(&sources).map_err(|e| {
            // Report the first pattern that fails on its own.
            let culprit = patterns
                .iter()
                .zip(&sources)
                .find(|(_, src)| Regex::new(src).is_err())
                .map(|(p, _)| p.clone())
                .unwrap_or_else(|| patterns.join(", "));
            GlobError::Regex {
                pattern: culprit,
                source: e,
            }
        })?;

        Ok(GlobSet { patterns, set })
    }

    /// Check whether any pattern matches a `/`-separated relative path.
    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    /// The original glob patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Emit a `*`, keeping it off a leading dot while `guard` is set.
fn push_star(regex: &mut String, guard: &mut bool, next: Option<&char>) {
    if !*guard {
        regex.push_str("[^/]*");
        return;
    }
    *guard = false;
    // An empty match is only safe when a plain character follows.
    let plain_next = next.is_some_and(|n| !matches!(n, '.' | '*' | '?' | '[' | '{' | '}' | ',' | '\\' | '/'));
    if plain_next {
        regex.push_str("(?:[^/.][^/]*)?");
    } else {
        regex.push_str("[^/.][^/]*");
    }
}

fn push_literal(regex: &mut String, c: char) {
    let mut buf = [0u8; 4];
    regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Find the index of the `]` closing the class opened at `start`.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!') | Some('^')) {
        i += 1;
    }
    // A `]` right after the opening bracket is literal.
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        if chars[i] == ']' {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn push_class(regex: &mut String, body: &[char]) {
    regex.push('[');
    let mut rest = body;
    if let Some((first, tail)) = body.split_first() {
        if *first == '!' || *first == '^' {
            regex.push('^');
            rest = tail;
        }
    }
    for &c in rest {
        match c {
            '\\' | '[' | ']' | '&' | '~' => {
                regex.push('\\');
                regex.push(c);
            }
            _ => regex.push(c),
        }
    }
    regex.push(']');
}
