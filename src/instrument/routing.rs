//! Route template resolution
//!
//! Maps a concrete request path back to the route template it was served
//! by, so metrics are labeled with `/items/{item_id}` instead of
//! `/items/42`. This keeps the label set bounded: unmatched paths resolve
//! to `None` and the caller substitutes a sentinel, never the raw path.

/// Handler label used when no registered template matches the path.
pub const UNMATCHED_HANDLER: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A parsed route template: ordered path segments, literal or parameterized.
///
/// Both `{name}` and `:name` parameter syntax are accepted. The label
/// emitted on a match is always the registered template string verbatim.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a template string.
    pub fn parse(template: &str) -> Self {
        let segments = split_path(template)
            .into_iter()
            .map(|seg| {
                let is_param = seg.starts_with(':')
                    || (seg.starts_with('{') && seg.ends_with('}') && seg.len() > 1);
                if is_param {
                    Segment::Param
                } else {
                    Segment::Literal(seg.to_string())
                }
            })
            .collect();
        Self {
            template: template.to_string(),
            segments,
        }
    }

    /// The template string as registered.
    pub fn template(&self) -> &str {
        &self.template
    }

    fn matches(&self, segs: &[&str]) -> bool {
        self.segments.len() == segs.len() && self.matches_head(segs)
    }

    fn matches_prefix(&self, segs: &[&str]) -> bool {
        segs.len() >= self.segments.len() && self.matches_head(segs)
    }

    fn matches_head(&self, segs: &[&str]) -> bool {
        self.segments.iter().zip(segs).all(|(pat, seg)| match pat {
            Segment::Literal(lit) => lit == seg,
            // A parameter consumes exactly one non-empty segment
            Segment::Param => !seg.is_empty(),
        })
    }

    fn leading_literals(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    fn is_all_literal(&self) -> bool {
        self.leading_literals() == self.segments.len()
    }
}

#[derive(Debug, Clone)]
enum RouteEntry {
    Route(RoutePattern),
    Mount(RoutePattern, RouteTable),
}

/// The registered route patterns the resolver matches against.
///
/// Patterns are flat routes or nested mount groups, mirroring how the
/// application's router is laid out.
///
/// # Example
///
/// ```ignore
/// use parapet::instrument::RouteTable;
///
/// let routes = RouteTable::new()
///     .route("/")
///     .route("/items/{item_id}")
///     .mount("/api", RouteTable::new().route("/users/{id}"));
///
/// assert_eq!(routes.resolve("/items/42").as_deref(), Some("/items/{item_id}"));
/// assert_eq!(routes.resolve("/api/users/7").as_deref(), Some("/api/users/{id}"));
/// assert_eq!(routes.resolve("/nope"), None);
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
    redirect_slashes: bool,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            redirect_slashes: true,
        }
    }
}

struct Candidate {
    template: String,
    leading_literals: usize,
    order: usize,
}

impl RouteTable {
    /// Create an empty table with trailing-slash redirection enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route template.
    pub fn route(mut self, template: &str) -> Self {
        self.routes
            .push(RouteEntry::Route(RoutePattern::parse(template)));
        self
    }

    /// Register a nested mount group under a prefix template.
    pub fn mount(mut self, prefix: &str, routes: RouteTable) -> Self {
        self.routes
            .push(RouteEntry::Mount(RoutePattern::parse(prefix), routes));
        self
    }

    /// Enable or disable trailing-slash redirect matching.
    pub fn redirect_slashes(mut self, enabled: bool) -> Self {
        self.redirect_slashes = enabled;
        self
    }

    /// Resolve a request path to its route template.
    ///
    /// Among full matches the most specific wins: the pattern with the
    /// longest run of leading literal segments, ties broken by
    /// registration order. When nothing matches and trailing-slash
    /// redirection is on, the path is retried with a single slash added
    /// or removed; a hit is relabeled with the slash adjusted back toward
    /// the request path, keeping redirected traffic distinct from direct
    /// template hits.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if let Some(template) = self.resolve_exact(path) {
            return Some(template);
        }

        if self.redirect_slashes && path != "/" {
            if let Some(stripped) = path.strip_suffix('/') {
                if let Some(template) = self.resolve_exact(stripped) {
                    return Some(format!("{template}/"));
                }
            } else if let Some(template) = self.resolve_exact(&format!("{path}/")) {
                let relabeled = template.strip_suffix('/').unwrap_or(&template);
                return Some(relabeled.to_string());
            }
        }

        None
    }

    fn resolve_exact(&self, path: &str) -> Option<String> {
        let segs = split_path(path);
        let mut candidates = Vec::new();
        self.collect_matches(&segs, "", 0, true, &mut candidates);

        candidates.sort_by(|a, b| {
            b.leading_literals
                .cmp(&a.leading_literals)
                .then(a.order.cmp(&b.order))
        });
        candidates.into_iter().next().map(|c| c.template)
    }

    fn collect_matches(
        &self,
        segs: &[&str],
        base_template: &str,
        base_literals: usize,
        base_all_literal: bool,
        out: &mut Vec<Candidate>,
    ) {
        for entry in &self.routes {
            match entry {
                RouteEntry::Route(pattern) => {
                    if pattern.matches(segs) {
                        let leading_literals = if base_all_literal {
                            base_literals + pattern.leading_literals()
                        } else {
                            base_literals
                        };
                        out.push(Candidate {
                            template: format!("{base_template}{}", pattern.template),
                            leading_literals,
                            order: out.len(),
                        });
                    }
                }
                RouteEntry::Mount(prefix, child) => {
                    // A mount whose child fails contributes no candidate;
                    // later entries are still considered.
                    if prefix.matches_prefix(segs) {
                        let rest = &segs[prefix.segments.len()..];
                        let literals = if base_all_literal {
                            base_literals + prefix.leading_literals()
                        } else {
                            base_literals
                        };
                        child.collect_matches(
                            rest,
                            &format!("{base_template}{}", prefix.template),
                            literals,
                            base_all_literal && prefix.is_all_literal(),
                            out,
                        );
                    }
                }
            }
        }
    }
}

/// Split a path or template into segments.
///
/// The leading slash is dropped; a trailing slash yields a trailing empty
/// segment, so `/items` and `/items/` stay distinct.
fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_route() {
        let routes = RouteTable::new().route("/");
        assert_eq!(routes.resolve("/").as_deref(), Some("/"));
    }

    #[test]
    fn test_literal_match() {
        let routes = RouteTable::new().route("/health").route("/items");
        assert_eq!(routes.resolve("/health").as_deref(), Some("/health"));
        assert_eq!(routes.resolve("/items").as_deref(), Some("/items"));
    }

    #[test]
    fn test_template_match_returns_template() {
        let routes = RouteTable::new().route("/items/{item_id}");
        assert_eq!(
            routes.resolve("/items/1").as_deref(),
            Some("/items/{item_id}")
        );
        assert_eq!(
            routes.resolve("/items/42").as_deref(),
            Some("/items/{item_id}")
        );
        assert_eq!(
            routes.resolve("/items/deadbeef").as_deref(),
            Some("/items/{item_id}")
        );
    }

    #[test]
    fn test_colon_param_syntax() {
        let routes = RouteTable::new().route("/tasks/:id");
        assert_eq!(routes.resolve("/tasks/9").as_deref(), Some("/tasks/:id"));
    }

    #[test]
    fn test_param_requires_nonempty_segment() {
        let routes = RouteTable::new().redirect_slashes(false).route("/items/{id}");
        assert_eq!(routes.resolve("/items/"), None);
    }

    #[test]
    fn test_most_specific_match_wins() {
        // Registered first, but the later literal route is more specific.
        let routes = RouteTable::new()
            .route("/items/{item_id}")
            .route("/items/special");
        assert_eq!(
            routes.resolve("/items/special").as_deref(),
            Some("/items/special")
        );
        assert_eq!(
            routes.resolve("/items/7").as_deref(),
            Some("/items/{item_id}")
        );
    }

    #[test]
    fn test_tie_broken_by_registration_order() {
        let routes = RouteTable::new()
            .route("/items/{item_id}")
            .route("/items/{other}");
        assert_eq!(
            routes.resolve("/items/7").as_deref(),
            Some("/items/{item_id}")
        );
    }

    #[test]
    fn test_mount_concatenates_templates() {
        let routes = RouteTable::new().mount(
            "/api",
            RouteTable::new().route("/users/{id}").route("/health"),
        );
        assert_eq!(
            routes.resolve("/api/users/7").as_deref(),
            Some("/api/users/{id}")
        );
        assert_eq!(routes.resolve("/api/health").as_deref(), Some("/api/health"));
    }

    #[test]
    fn test_nested_mounts() {
        let routes = RouteTable::new().mount(
            "/api",
            RouteTable::new().mount("/v1", RouteTable::new().route("/users/{id}")),
        );
        assert_eq!(
            routes.resolve("/api/v1/users/3").as_deref(),
            Some("/api/v1/users/{id}")
        );
        assert_eq!(routes.resolve("/api/v1/users"), None);
    }

    #[test]
    fn test_mount_child_failure_does_not_stop_the_scan() {
        let routes = RouteTable::new()
            .mount("/api", RouteTable::new().route("/users/{id}"))
            .route("/api/status");
        assert_eq!(routes.resolve("/api/status").as_deref(), Some("/api/status"));
    }

    #[test]
    fn test_trailing_slash_redirect_relabels() {
        let routes = RouteTable::new().route("/items").route("/docs/");
        // Path has the slash, template does not: label gains the slash.
        assert_eq!(routes.resolve("/items/").as_deref(), Some("/items/"));
        // Path lacks the slash, template has it: label loses the slash.
        assert_eq!(routes.resolve("/docs").as_deref(), Some("/docs"));
    }

    #[test]
    fn test_redirect_slashes_disabled() {
        let routes = RouteTable::new().redirect_slashes(false).route("/items");
        assert_eq!(routes.resolve("/items/"), None);
    }

    #[test]
    fn test_unmatched_path() {
        let routes = RouteTable::new().route("/").route("/items/{item_id}");
        assert_eq!(routes.resolve("/404-missing"), None);
        assert_eq!(routes.resolve("/items/1/extra"), None);
    }
}
