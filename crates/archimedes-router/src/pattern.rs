//! Path pattern parsing and matching.
//!
//! Patterns are split into `/`-separated segments, each compiled to a
//! [`PatternElement`]:
//!
//! | Syntax | Matches |
//! |--------|---------|
//! | `users` | the literal segment |
//! | `user?`, `*.png` | one segment, `?` = one char, `*` = any run of chars |
//! | `**` | zero or more segments |
//! | `{id}` | one segment, captured as `id` |
//! | `{*path}` | the remaining segments, captured as `path` (last only) |
//!
//! Matching backtracks over `**`, so it can appear anywhere in a pattern.

use crate::variables::UriVariables;
use archimedes_core::{RoutingError, RoutingResult};
use std::borrow::Cow;
use std::fmt;

static DEFAULT_PARSER: PathPatternParser = PathPatternParser::new();

/// Parser turning pattern strings into [`PathPattern`]s.
///
/// # Example
///
/// ```rust
/// use archimedes_router::PathPatternParser;
///
/// let parser = PathPatternParser::default_instance();
/// let pattern = parser.parse("/orgs/{org}/repos/*").unwrap();
///
/// let variables = pattern.match_and_extract("/orgs/acme/repos/web").unwrap();
/// assert_eq!(variables.get("org"), Some("acme"));
/// assert!(!pattern.matches("/orgs/acme/teams/web"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPatternParser {
    case_sensitive: bool,
    match_optional_trailing_separator: bool,
}

impl Default for PathPatternParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PathPatternParser {
    /// Creates a case-sensitive parser that requires exact trailing separators.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            case_sensitive: true,
            match_optional_trailing_separator: false,
        }
    }

    /// Returns the shared parser with default options.
    #[must_use]
    pub fn default_instance() -> &'static Self {
        &DEFAULT_PARSER
    }

    /// Sets whether literal segments compare case-sensitively.
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Sets whether a pattern without a trailing `/` also matches paths with one.
    #[must_use]
    pub fn with_optional_trailing_separator(mut self, enabled: bool) -> Self {
        self.match_optional_trailing_separator = enabled;
        self
    }

    /// Returns whether literal segments compare case-sensitively.
    #[must_use]
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns whether trailing separators are optional.
    #[must_use]
    pub fn matches_optional_trailing_separator(&self) -> bool {
        self.match_optional_trailing_separator
    }

    /// Expands `pattern` to the form it is matched in.
    ///
    /// A non-empty pattern that does not start with `/` gets one prepended.
    ///
    /// ```rust
    /// use archimedes_router::PathPatternParser;
    ///
    /// let parser = PathPatternParser::default_instance();
    /// assert_eq!(parser.init_full_path_pattern("api/**"), "/api/**");
    /// assert_eq!(parser.init_full_path_pattern("/api/**"), "/api/**");
    /// assert_eq!(parser.init_full_path_pattern(""), "");
    /// ```
    #[must_use]
    pub fn init_full_path_pattern(&self, pattern: &str) -> String {
        if pattern.is_empty() || pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{pattern}")
        }
    }

    /// Parses a pattern string.
    ///
    /// The pattern is taken as given; callers that accept relative patterns
    /// expand them with [`init_full_path_pattern`](Self::init_full_path_pattern) first.
    pub fn parse(&self, pattern: &str) -> RoutingResult<PathPattern> {
        let leading_separator = pattern.starts_with('/');
        let body = pattern.strip_prefix('/').unwrap_or(pattern);
        let trailing_separator = body.ends_with('/');

        let segments: Vec<&str> = body.split('/').filter(|s| !s.is_empty()).collect();
        let mut elements = Vec::with_capacity(segments.len());
        let mut names: Vec<String> = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            let element = self.parse_segment(pattern, segment)?;
            if let Some(name) = element.variable_name() {
                if names.iter().any(|seen| seen == name) {
                    return Err(RoutingError::invalid_pattern(
                        pattern,
                        format!("variable '{name}' is captured more than once"),
                    ));
                }
                names.push(name.to_string());
            }
            if matches!(element, PatternElement::CaptureRest(_)) && index + 1 != segments.len() {
                return Err(RoutingError::invalid_pattern(
                    pattern,
                    "a '{*name}' capture must be the last segment",
                ));
            }
            elements.push(element);
        }

        Ok(PathPattern {
            source: pattern.to_string(),
            elements,
            leading_separator,
            trailing_separator,
            case_sensitive: self.case_sensitive,
            match_optional_trailing_separator: self.match_optional_trailing_separator,
        })
    }

    fn parse_segment(&self, pattern: &str, segment: &str) -> RoutingResult<PatternElement> {
        if segment == "**" {
            return Ok(PatternElement::MultiSegment);
        }

        if let Some(inner) = segment.strip_prefix('{') {
            let Some(inner) = inner.strip_suffix('}') else {
                return Err(RoutingError::invalid_pattern(pattern, "unclosed variable"));
            };
            if inner.contains(['{', '}']) {
                return Err(RoutingError::invalid_pattern(pattern, "nested braces"));
            }
            let (rest, name) = match inner.strip_prefix('*') {
                Some(name) => (true, name),
                None => (false, inner),
            };
            if name.is_empty() {
                return Err(RoutingError::invalid_pattern(pattern, "empty variable name"));
            }
            return Ok(if rest {
                PatternElement::CaptureRest(name.to_string())
            } else {
                PatternElement::Capture(name.to_string())
            });
        }

        if segment.contains(['{', '}']) {
            return Err(RoutingError::invalid_pattern(
                pattern,
                "variables must span a whole segment",
            ));
        }

        let text = self.fold(segment).into_owned();
        if segment.contains(['*', '?']) {
            Ok(PatternElement::Glob(text))
        } else {
            Ok(PatternElement::Literal(text))
        }
    }

    fn fold<'a>(&self, text: &'a str) -> Cow<'a, str> {
        fold_case(self.case_sensitive, text)
    }
}

fn fold_case(case_sensitive: bool, text: &str) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.to_lowercase())
    }
}

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    /// Exact segment text.
    Literal(String),
    /// Segment with `?` / `*` wildcards.
    Glob(String),
    /// `{name}`: one captured segment.
    Capture(String),
    /// `{*name}`: all remaining segments, captured.
    CaptureRest(String),
    /// `**`: zero or more segments.
    MultiSegment,
}

impl PatternElement {
    fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Capture(name) | Self::CaptureRest(name) => Some(name),
            _ => None,
        }
    }
}

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    elements: Vec<PatternElement>,
    leading_separator: bool,
    trailing_separator: bool,
    case_sensitive: bool,
    match_optional_trailing_separator: bool,
}

impl PathPattern {
    /// Returns the pattern text this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the compiled segments.
    #[must_use]
    pub fn elements(&self) -> &[PatternElement] {
        &self.elements
    }

    /// Returns true if the pattern matches `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.match_and_extract(path).is_some()
    }

    /// Matches `path`, returning the captured URI variables on success.
    #[must_use]
    pub fn match_and_extract(&self, path: &str) -> Option<UriVariables> {
        if path.starts_with('/') != self.leading_separator {
            return None;
        }
        let body = path.strip_prefix('/').unwrap_or(path);

        if !self.ends_open() {
            let trailing = body.ends_with('/');
            let separator_ok = trailing == self.trailing_separator
                || (trailing && self.match_optional_trailing_separator);
            if !separator_ok {
                return None;
            }
        }

        let segments: Vec<&str> = body.split('/').filter(|s| !s.is_empty()).collect();
        let mut state = MatchState {
            segments: &segments,
            variables: UriVariables::new(),
            failed: vec![false; (self.elements.len() + 1) * (segments.len() + 1)],
        };
        if self.match_from(0, 0, &mut state) {
            Some(state.variables)
        } else {
            None
        }
    }

    /// Patterns ending in `**` or `{*name}` accept any trailing separator.
    fn ends_open(&self) -> bool {
        matches!(
            self.elements.last(),
            Some(PatternElement::MultiSegment | PatternElement::CaptureRest(_))
        )
    }

    /// Captures never constrain later elements, so a failed
    /// `(element, segment)` state fails again on every revisit.
    fn match_from(&self, element: usize, segment: usize, state: &mut MatchState<'_>) -> bool {
        let visited = element * (state.segments.len() + 1) + segment;
        if state.failed[visited] {
            return false;
        }
        let matched = self.match_element(element, segment, state);
        if !matched {
            state.failed[visited] = true;
        }
        matched
    }

    fn match_element(&self, element: usize, segment: usize, state: &mut MatchState<'_>) -> bool {
        let segments = state.segments;
        let Some(current) = self.elements.get(element) else {
            return segment == segments.len();
        };

        match current {
            PatternElement::MultiSegment => {
                for next in segment..=segments.len() {
                    let mark = state.variables.mark();
                    if self.match_from(element + 1, next, state) {
                        return true;
                    }
                    state.variables.rewind(mark);
                }
                false
            }
            PatternElement::CaptureRest(name) => {
                let rest = &segments[segment..];
                let value = if rest.is_empty() {
                    String::new()
                } else {
                    format!("/{}", rest.join("/"))
                };
                state.variables.capture(name.as_str(), value);
                true
            }
            _ if segment == segments.len() => false,
            PatternElement::Literal(text) => {
                fold_case(self.case_sensitive, segments[segment]) == text.as_str()
                    && self.match_from(element + 1, segment + 1, state)
            }
            PatternElement::Glob(glob) => {
                glob_matches(glob, &fold_case(self.case_sensitive, segments[segment]))
                    && self.match_from(element + 1, segment + 1, state)
            }
            PatternElement::Capture(name) => {
                let mark = state.variables.mark();
                state.variables.capture(name.as_str(), segments[segment]);
                if self.match_from(element + 1, segment + 1, state) {
                    true
                } else {
                    state.variables.rewind(mark);
                    false
                }
            }
        }
    }
}

/// Backtracking state for one match attempt.
struct MatchState<'a> {
    segments: &'a [&'a str],
    variables: UriVariables,
    failed: Vec<bool>,
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Single-segment wildcard match: `?` is one char, `*` any run of chars.
fn glob_matches(glob: &str, text: &str) -> bool {
    let glob: Vec<char> = glob.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut g, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while t < text.len() {
        if g < glob.len() && (glob[g] == '?' || glob[g] == text[t]) {
            g += 1;
            t += 1;
        } else if g < glob.len() && glob[g] == '*' {
            star = Some(g);
            resume = t;
            g += 1;
        } else if let Some(s) = star {
            g = s + 1;
            resume += 1;
            t = resume;
        } else {
            return false;
        }
    }

    glob[g..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(pattern: &str) -> PathPattern {
        PathPatternParser::default_instance().parse(pattern).unwrap()
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = parse("/api/users");
        assert!(pattern.matches("/api/users"));
        assert!(!pattern.matches("/api/users/7"));
        assert!(!pattern.matches("/api"));
        assert!(!pattern.matches("/API/users"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = parse("/");
        assert!(pattern.matches("/"));
        assert!(!pattern.matches("/a"));
        assert!(!pattern.matches(""));
    }

    #[test]
    fn test_single_segment_wildcards() {
        let pattern = parse("/files/*.png");
        assert!(pattern.matches("/files/logo.png"));
        assert!(pattern.matches("/files/.png"));
        assert!(!pattern.matches("/files/logo.jpg"));
        assert!(!pattern.matches("/files/a/logo.png"));

        let pattern = parse("/v?/status");
        assert!(pattern.matches("/v1/status"));
        assert!(!pattern.matches("/v10/status"));
    }

    #[test]
    fn test_star_does_not_match_missing_segment() {
        let pattern = parse("/api/users/*");
        assert!(pattern.matches("/api/users/5"));
        assert!(!pattern.matches("/api/users"));
    }

    #[test]
    fn test_multi_segment_wildcard() {
        let pattern = parse("/api/**");
        assert!(pattern.matches("/api"));
        assert!(pattern.matches("/api/users/5"));
        assert!(pattern.matches("/api/users/5/"));
        assert!(!pattern.matches("/other"));

        let everything = parse("/**");
        assert!(everything.matches("/"));
        assert!(everything.matches("/any/depth/at/all"));
    }

    #[test]
    fn test_multi_segment_in_the_middle_backtracks() {
        let pattern = parse("/static/**/{file}");
        let variables = pattern.match_and_extract("/static/a/b/site.css").unwrap();
        assert_eq!(variables.get("file"), Some("site.css"));
        assert!(pattern.matches("/static/site.css"));
        assert!(!pattern.matches("/static"));

        let pattern = parse("/**/admin/*");
        assert!(pattern.matches("/admin/users"));
        assert!(pattern.matches("/tenant/7/admin/users"));
        assert!(!pattern.matches("/tenant/7/admin"));
    }

    #[test]
    fn test_repeated_multi_segment_wildcards_do_not_backtrack_exponentially() {
        let pattern = parse("/**/a/**/a/**/a/**/a/**/z");
        let long = "/a".repeat(200);

        let started = std::time::Instant::now();
        assert!(!pattern.matches(&long));
        assert!(pattern.matches(&format!("{long}/z")));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        let pattern = parse("/**/{id}/**/end");
        let variables = pattern.match_and_extract("/x/y/end/end").unwrap();
        assert_eq!(variables.get("id"), Some("x"));
        assert_eq!(variables.len(), 1);
    }

    #[test]
    fn test_captures() {
        let pattern = parse("/orgs/{org}/users/{id}");
        let variables = pattern.match_and_extract("/orgs/acme/users/42").unwrap();

        assert_eq!(variables.get("org"), Some("acme"));
        assert_eq!(variables.get("id"), Some("42"));
        assert_eq!(variables.len(), 2);
    }

    #[test]
    fn test_capture_rest() {
        let pattern = parse("/resources/{*path}");

        let variables = pattern.match_and_extract("/resources/images/logo.png").unwrap();
        assert_eq!(variables.get("path"), Some("/images/logo.png"));

        let variables = pattern.match_and_extract("/resources").unwrap();
        assert_eq!(variables.get("path"), Some(""));
    }

    #[test]
    fn test_trailing_separator() {
        let strict = parse("/users");
        assert!(!strict.matches("/users/"));

        let lenient = PathPatternParser::new()
            .with_optional_trailing_separator(true)
            .parse("/users")
            .unwrap();
        assert!(lenient.matches("/users/"));
        assert!(lenient.matches("/users"));

        let explicit = parse("/users/");
        assert!(explicit.matches("/users/"));
        assert!(!explicit.matches("/users"));
    }

    #[test]
    fn test_case_insensitive_parser() {
        let parser = PathPatternParser::new().with_case_sensitive(false);
        let pattern = parser.parse("/API/{name}/*.JSON").unwrap();

        let variables = pattern.match_and_extract("/api/Widgets/list.json").unwrap();
        assert_eq!(variables.get("name"), Some("Widgets"));
        assert!(!parser.is_case_sensitive());
    }

    #[test]
    fn test_relative_pattern_needs_expansion() {
        let parser = PathPatternParser::default_instance();
        let relative = parser.parse("api/users").unwrap();
        assert!(!relative.matches("/api/users"));

        let expanded = parser.parse(&parser.init_full_path_pattern("api/users")).unwrap();
        assert!(expanded.matches("/api/users"));
    }

    #[test]
    fn test_invalid_patterns() {
        let parser = PathPatternParser::default_instance();
        let invalid = [
            "/users/{id",
            "/users/{}",
            "/users/{*}",
            "/users/{{id}}",
            "/users/id}",
            "/users/{id}.json",
            "/files/{*path}/meta",
            "/a/{id}/b/{id}",
        ];

        for pattern in invalid {
            let error = parser.parse(pattern).unwrap_err();
            assert!(
                matches!(error, RoutingError::InvalidPattern { .. }),
                "expected {pattern} to be rejected, got {error:?}"
            );
        }
    }

    #[test]
    fn test_display_is_source_text() {
        assert_eq!(parse("/a/{b}/**").to_string(), "/a/{b}/**");
    }

    #[test]
    fn test_glob_matches() {
        assert!(glob_matches("*", ""));
        assert!(glob_matches("a*c", "abbbc"));
        assert!(glob_matches("a*b*c", "aXbYc"));
        assert!(!glob_matches("a*c", "abd"));
        assert!(glob_matches("??", "ab"));
        assert!(!glob_matches("??", "abc"));
    }

    proptest! {
        #[test]
        fn prop_full_path_pattern_is_rooted_and_idempotent(pattern in "[a-z/*{}]{0,24}") {
            let parser = PathPatternParser::default_instance();
            let full = parser.init_full_path_pattern(&pattern);

            prop_assert!(full.is_empty() || full.starts_with('/'));
            prop_assert_eq!(parser.init_full_path_pattern(&full), full.clone());
            prop_assert!(full.ends_with(pattern.as_str()));
        }

        #[test]
        fn prop_literal_pattern_matches_itself(segments in prop::collection::vec("[a-z0-9]{1,8}", 1..6)) {
            let path = format!("/{}", segments.join("/"));
            let pattern = PathPatternParser::default_instance().parse(&path).unwrap();

            prop_assert!(pattern.matches(&path));
            prop_assert!(pattern.match_and_extract(&path).unwrap().is_empty());
        }
    }
}
