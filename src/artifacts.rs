//! Locating build outputs with glob-style patterns.
//!
//! Patterns are matched one path component at a time. A component may be a
//! literal name, a wildcard (`*`, `?`, `[...]`) confined to that component, or
//! `**`, which stands for zero or more nested directories. Directories that
//! can't be read contribute no matches.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Searches an ordered list of patterns and yields the matches of the first
/// pattern that matches anything.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    patterns: Vec<String>,
}

impl ArtifactLocator {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-scan the filesystem. Matches from different patterns are never
    /// merged; an empty result means no pattern matched.
    pub fn locate(&self) -> Vec<PathBuf> {
        for pattern in &self.patterns {
            let matches = expand(pattern);
            tracing::debug!(%pattern, count = matches.len(), "evaluated artifact pattern");
            if !matches.is_empty() {
                return matches;
            }
        }
        Vec::new()
    }
}

/// Print the artifacts found for `patterns` and return them.
pub fn report_artifacts<W: Write>(patterns: &[String], out: &mut W) -> io::Result<Vec<PathBuf>> {
    let artifacts = ArtifactLocator::new(patterns.iter().cloned()).locate();

    if artifacts.is_empty() {
        writeln!(out, "\nNo artifacts found")?;
    } else {
        writeln!(out, "\nFound artifacts:")?;
        for artifact in &artifacts {
            writeln!(out, "📦 {}", artifact.display())?;
        }
    }

    Ok(artifacts)
}

fn expand(pattern: &str) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::new()];

    for component in Path::new(pattern).components() {
        candidates = match component {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if part == "**" {
                    expand_recursive(&candidates)
                } else if has_wildcard(&part) {
                    expand_wildcard(&candidates, &part)
                } else {
                    candidates
                        .into_iter()
                        .map(|dir| dir.join(&*part))
                        .filter(|path| path.exists())
                        .collect()
                }
            }
            // root, prefix, `.` and `..` are taken as-is
            other => candidates
                .into_iter()
                .map(|dir| dir.join(other.as_os_str()))
                .collect(),
        };

        if candidates.is_empty() {
            break;
        }
    }

    candidates.retain(|path| !path.as_os_str().is_empty() && path.exists());
    candidates.sort();
    candidates.dedup();
    candidates
}

/// Directory to list for a candidate; the empty path means the current one.
fn listing_dir(dir: &Path) -> &Path {
    if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    }
}

fn expand_wildcard(candidates: &[PathBuf], part: &str) -> Vec<PathBuf> {
    let pattern = Wildcard::parse(part);
    let mut matched = Vec::new();

    for dir in candidates {
        let listing = listing_dir(dir);
        if !listing.is_dir() {
            continue;
        }

        let entries = match fs::read_dir(listing) {
            Ok(entries) => entries,
            Err(err) => {
                skip_unreadable(listing, &err);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skip_unreadable(listing, &err);
                    continue;
                }
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_hidden(&name) && !part.starts_with('.') {
                continue;
            }
            if pattern.matches(&name) {
                matched.push(dir.join(entry.file_name()));
            }
        }
    }

    matched
}

fn expand_recursive(candidates: &[PathBuf]) -> Vec<PathBuf> {
    let mut matched = Vec::new();

    for dir in candidates {
        let root = listing_dir(dir);
        if !root.is_dir() {
            continue;
        }

        // `**` also matches zero directories
        matched.push(dir.clone());

        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    skip_unreadable(&path, &io::Error::from(err));
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                matched.push(dir.join(relative));
            }
        }
    }

    matched
}

fn skip_unreadable(path: &Path, err: &io::Error) {
    tracing::debug!(path = %path.display(), error = %err, "skipping unreadable directory");
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn has_wildcard(part: &str) -> bool {
    part.contains(['*', '?', '['])
}

#[derive(Debug)]
enum Token {
    /// `*`, any run of characters
    Any,
    /// `?`
    One,
    Class(CharClass),
    Literal(char),
}

impl Token {
    fn matches_char(&self, c: char) -> bool {
        match self {
            Token::Any => false,
            Token::One => true,
            Token::Class(class) => class.matches(c),
            Token::Literal(literal) => *literal == c,
        }
    }
}

/// A single-component wildcard pattern.
#[derive(Debug)]
struct Wildcard {
    tokens: Vec<Token>,
}

impl Wildcard {
    fn parse(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens: Vec<Token> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let token = match chars[i] {
                '*' => {
                    i += 1;
                    if matches!(tokens.last(), Some(Token::Any)) {
                        continue;
                    }
                    Token::Any
                }
                '?' => {
                    i += 1;
                    Token::One
                }
                '[' => match CharClass::parse(&chars[i + 1..]) {
                    Some((class, consumed)) => {
                        i += 1 + consumed;
                        Token::Class(class)
                    }
                    // unterminated class, `[` is literal
                    None => {
                        i += 1;
                        Token::Literal('[')
                    }
                },
                c => {
                    i += 1;
                    Token::Literal(c)
                }
            };
            tokens.push(token);
        }

        Self { tokens }
    }

    /// Every token but `*` consumes exactly one character, so remembering
    /// the last `*` is enough to backtrack.
    fn matches(&self, name: &str) -> bool {
        let name: Vec<char> = name.chars().collect();
        let (mut t, mut n) = (0, 0);
        let mut last_star: Option<(usize, usize)> = None;

        while n < name.len() {
            match self.tokens.get(t) {
                Some(Token::Any) => {
                    last_star = Some((t, n));
                    t += 1;
                    continue;
                }
                Some(token) if token.matches_char(name[n]) => {
                    t += 1;
                    n += 1;
                    continue;
                }
                _ => {}
            }

            match last_star {
                Some((star, resume)) => {
                    t = star + 1;
                    n = resume + 1;
                    last_star = Some((star, resume + 1));
                }
                None => return false,
            }
        }

        self.tokens[t..].iter().all(|token| matches!(token, Token::Any))
    }
}

#[derive(Debug)]
struct CharClass {
    negated: bool,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    /// Parse the body of a `[...]` class, starting right after the `[`.
    /// Returns the class and how many characters it used, closing `]`
    /// included. A `]` directly after `[` (or `[!`) is a literal member.
    fn parse(pattern: &[char]) -> Option<(Self, usize)> {
        let negated = pattern.first() == Some(&'!');
        let body = &pattern[usize::from(negated)..];
        let close = body.iter().skip(1).position(|&c| c == ']')? + 1;

        let members = &body[..close];
        let mut ranges = Vec::new();
        let mut i = 0;
        while i < members.len() {
            if i + 2 < members.len() && members[i + 1] == '-' {
                ranges.push((members[i], members[i + 2]));
                i += 3;
            } else {
                ranges.push((members[i], members[i]));
                i += 1;
            }
        }

        let consumed = usize::from(negated) + close + 1;
        Some((Self { negated, ranges }, consumed))
    }

    fn matches(&self, c: char) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != self.negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn wildcard_match(pattern: &str, name: &str) -> bool {
        Wildcard::parse(pattern).matches(name)
    }

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"apk").unwrap();
        path
    }

    /// Lays out a typical Gradle outputs tree and returns its apk directory.
    fn gradle_outputs(root: &Path) -> PathBuf {
        touch(root, "apk/debug/app-debug.apk");
        touch(root, "apk/release/app-release.apk");
        touch(root, "apk/flavors/deep/other.apk");
        touch(root, "apk/debug/output-metadata.json");
        root.join("apk")
    }

    fn pattern(dir: &Path, tail: &str) -> String {
        format!("{}/{}", dir.display(), tail)
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*.apk", "app-debug.apk"));
        assert!(wildcard_match("app-*.apk", "app-release.apk"));
        assert!(!wildcard_match("app-*.apk", "other.apk"));
        assert!(wildcard_match("app-?.apk", "app-1.apk"));
        assert!(!wildcard_match("app-?.apk", "app-12.apk"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(!wildcard_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn test_many_stars_do_not_backtrack_exponentially() {
        let name = "a".repeat(64);
        assert!(!wildcard_match("*a*a*a*a*a*a*a*a*a*a*a*a*b", &name));
        assert!(wildcard_match("*a*a*a*a*a*a*a*a*a*a*a*a*", &name));
        assert!(wildcard_match("**.apk", "app.apk"));
    }

    #[test]
    fn test_character_classes() {
        assert!(wildcard_match("v[0-9].apk", "v7.apk"));
        assert!(!wildcard_match("v[0-9].apk", "vx.apk"));
        assert!(wildcard_match("v[!0-9].apk", "vx.apk"));
        assert!(wildcard_match("[]x]", "]"));
        assert!(wildcard_match("a[b", "a[b"));
        assert!(wildcard_match("[a-]", "-"));
    }

    #[test]
    fn test_exact_path_pattern() {
        let dir = TempDir::new().unwrap();
        let apk_dir = gradle_outputs(dir.path());

        let found = ArtifactLocator::new([pattern(&apk_dir, "debug/app-debug.apk")])
            .locate();
        assert_eq!(found, vec![apk_dir.join("debug/app-debug.apk")]);
    }

    #[test]
    fn test_single_level_wildcard_pattern() {
        let dir = TempDir::new().unwrap();
        let apk_dir = gradle_outputs(dir.path());

        let found = ArtifactLocator::new([pattern(&apk_dir, "*/app-*.apk")])
            .locate();
        assert_eq!(
            found,
            vec![
                apk_dir.join("debug/app-debug.apk"),
                apk_dir.join("release/app-release.apk"),
            ]
        );
    }

    #[test]
    fn test_recursive_pattern_reaches_nested_and_top_level() {
        let dir = TempDir::new().unwrap();
        let apk_dir = gradle_outputs(dir.path());
        touch(dir.path(), "apk/top.apk");

        let found = ArtifactLocator::new([pattern(&apk_dir, "**/*.apk")])
            .locate();
        assert_eq!(
            found,
            vec![
                apk_dir.join("debug/app-debug.apk"),
                apk_dir.join("flavors/deep/other.apk"),
                apk_dir.join("release/app-release.apk"),
                apk_dir.join("top.apk"),
            ]
        );
    }

    #[test]
    fn test_only_middle_pattern_matches() {
        let dir = TempDir::new().unwrap();
        let apk_dir = gradle_outputs(dir.path());

        let patterns = [
            pattern(&apk_dir, "missing/app-debug.apk"),
            pattern(&apk_dir, "release/*.apk"),
            pattern(&apk_dir, "**/*.aab"),
        ];
        let found = ArtifactLocator::new(patterns).locate();
        assert_eq!(found, vec![apk_dir.join("release/app-release.apk")]);
    }

    #[test]
    fn test_first_matching_pattern_wins_without_merging() {
        let dir = TempDir::new().unwrap();
        let apk_dir = gradle_outputs(dir.path());

        let patterns = [
            pattern(&apk_dir, "nothing/*.apk"),
            pattern(&apk_dir, "*/app-*.apk"),
            pattern(&apk_dir, "**/*.apk"),
        ];
        let found = ArtifactLocator::new(patterns).locate();
        assert_eq!(found.len(), 2);
        assert!(!found.contains(&apk_dir.join("flavors/deep/other.apk")));
    }

    #[test]
    fn test_hidden_entries_need_explicit_dot() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "out/.cache/stale.apk");
        touch(dir.path(), "out/.hidden.apk");

        let out = dir.path().join("out");
        let any = ArtifactLocator::new([pattern(&out, "**/*.apk")]).locate();
        assert!(any.is_empty());

        let dotted = ArtifactLocator::new([pattern(&out, ".*.apk")]).locate();
        assert_eq!(dotted, vec![out.join(".hidden.apk")]);
    }

    #[test]
    fn test_locate_rescans_each_call() {
        let dir = TempDir::new().unwrap();
        let locator = ArtifactLocator::new([pattern(dir.path(), "**/*.apk")]);
        assert!(locator.locate().is_empty());

        let apk = touch(dir.path(), "apk/debug/app-debug.apk");
        assert_eq!(locator.locate(), vec![apk]);
    }

    #[test]
    fn test_report_lists_matches() {
        let dir = TempDir::new().unwrap();
        let apk_dir = gradle_outputs(dir.path());

        let mut out = Vec::new();
        let found = report_artifacts(&[pattern(&apk_dir, "debug/*.apk")], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(found.len(), 1);
        assert!(text.contains("Found artifacts:"));
        assert!(text.contains(&format!("📦 {}", found[0].display())));
    }

    #[test]
    fn test_report_without_matches() {
        let dir = TempDir::new().unwrap();

        let mut out = Vec::new();
        let found = report_artifacts(&[pattern(dir.path(), "*.apk")], &mut out).unwrap();

        assert!(found.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("No artifacts found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_yields_no_matches() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(locked.join("debug")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let patterns = [
            pattern(&locked, "*/*.apk"),
            pattern(&locked, "**/*.apk"),
        ];
        let found = ArtifactLocator::new(patterns).locate();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(found.is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_proc_entries_that_deny_listing_are_skipped() {
        let mut out = Vec::new();
        let found = report_artifacts(&["/proc/1/*/*.apk".to_string()], &mut out).unwrap();

        assert!(found.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("No artifacts found"));
    }
}
