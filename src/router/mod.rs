//! Route table for the console's views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every view the console can show is a [`RouteRecord`] carrying static
//! [`RouteMeta`]. The [`guard::RouteGuard`] reads the metadata of the matched
//! chain before each navigation and the [`navigator::Navigator`] commits the
//! result.
//!
//! DESIGN
//! ======
//! Records may nest. A child's path is relative to its parent and `:name`
//! segments capture parameters. Matching ignores the query string, the
//! fragment, and empty segments (so trailing slashes do not matter). A path
//! that matches nothing resolves with an empty chain, which carries no
//! requirements.

pub mod guard;
pub mod navigator;


use std::collections::BTreeMap;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const HOME_NAME: &str = "Dashboard";
pub const LOGIN_NAME: &str = "Login";

// =============================================================================
// TYPES
// =============================================================================

/// Access requirements attached to a route record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

impl RouteMeta {
    pub const PUBLIC: Self = Self { requires_auth: false, requires_admin: false };
    pub const AUTH: Self = Self { requires_auth: true, requires_admin: false };
    pub const ADMIN: Self = Self { requires_auth: true, requires_admin: true };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub meta: RouteMeta,
    pub children: Vec<RouteRecord>,
}

impl RouteRecord {
    #[must_use]
    pub fn new(path: &'static str, name: &'static str, meta: RouteMeta) -> Self {
        Self { path, name: Some(name), meta, children: Vec::new() }
    }

    /// A record that only groups children.
    #[must_use]
    pub fn group(path: &'static str, meta: RouteMeta, children: Vec<RouteRecord>) -> Self {
        Self { path, name: None, meta, children }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<RouteRecord>) -> Self {
        self.children = children;
        self
    }
}

/// One record of a matched chain, root first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchedRecord {
    pub name: Option<&'static str>,
    pub meta: RouteMeta,
}

/// A path resolved against the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Normalized path (no query, no trailing slash).
    pub path: String,
    /// Name of the deepest matched record.
    pub name: Option<&'static str>,
    pub matched: Vec<MatchedRecord>,
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    #[must_use]
    pub fn is_found(&self) -> bool {
        !self.matched.is_empty()
    }

    /// True if any record in the chain requires a session.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.matched.iter().any(|record| record.meta.requires_auth)
    }

    /// True if any record in the chain requires a staff user.
    #[must_use]
    pub fn requires_admin(&self) -> bool {
        self.matched.iter().any(|record| record.meta.requires_admin)
    }

    #[must_use]
    pub fn is_login(&self) -> bool {
        self.name == Some(LOGIN_NAME)
    }
}

// =============================================================================
// TABLE
// =============================================================================

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        Self { routes }
    }

    /// The console's views.
    #[must_use]
    pub fn admin_console() -> Self {
        Self::new(vec![
            RouteRecord::new(HOME_PATH, HOME_NAME, RouteMeta::AUTH),
            RouteRecord::new("/prompts", "PromptManager", RouteMeta::AUTH),
            RouteRecord::new("/knowledge", "KnowledgeBase", RouteMeta::AUTH),
            RouteRecord::new("/api", "ApiTest", RouteMeta::AUTH),
            RouteRecord::new("/services", "ServiceManager", RouteMeta::AUTH),
            RouteRecord::new("/models", "ModelConfigManager", RouteMeta::AUTH),
            RouteRecord::new("/users", "UserManager", RouteMeta::ADMIN),
            RouteRecord::new("/api-keys", "ApiKeyManager", RouteMeta::ADMIN),
            RouteRecord::new(LOGIN_PATH, LOGIN_NAME, RouteMeta::PUBLIC),
        ])
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Match `path`; the first record (depth first, in table order) wins.
    #[must_use]
    pub fn resolve(&self, path: &str) -> ResolvedRoute {
        let segments = split_segments(strip_query(path));
        let normalized = format!("/{}", segments.join("/"));
        let found = self
            .routes
            .iter()
            .find_map(|record| match_record(record, &segments));
        let (matched, params) = found.map_or_else(|| (Vec::new(), BTreeMap::new()), |m| (m.chain, m.params));
        let name = matched.last().and_then(|record| record.name);
        ResolvedRoute { path: normalized, name, matched, params }
    }

    /// Full path of the record called `name`, if it has no parameters.
    #[must_use]
    pub fn path_for(&self, name: &str) -> Option<String> {
        self.routes
            .iter()
            .find_map(|record| path_for_record(record, name, &[]))
    }
}

// =============================================================================
// MATCHING
// =============================================================================

struct RouteMatch {
    chain: Vec<MatchedRecord>,
    params: BTreeMap<String, String>,
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn match_record(record: &RouteRecord, segments: &[&str]) -> Option<RouteMatch> {
    let own = split_segments(record.path);
    if own.len() > segments.len() {
        return None;
    }
    let mut params = BTreeMap::new();
    for (pattern, actual) in own.iter().zip(segments) {
        if let Some(param) = pattern.strip_prefix(':') {
            params.insert(param.to_owned(), (*actual).to_owned());
        } else if pattern != actual {
            return None;
        }
    }
    let rest = &segments[own.len()..];
    let this = MatchedRecord { name: record.name, meta: record.meta };

    for child in &record.children {
        if let Some(mut child_match) = match_record(child, rest) {
            child_match.chain.insert(0, this);
            child_match.params.extend(params);
            return Some(child_match);
        }
    }
    // Unnamed groups are only reachable through a child.
    (rest.is_empty() && record.name.is_some()).then(|| RouteMatch { chain: vec![this], params })
}

fn path_for_record(record: &RouteRecord, name: &str, prefix: &[&'static str]) -> Option<String> {
    let mut segments = prefix.to_vec();
    segments.extend(split_segments(record.path));
    if segments.iter().any(|segment| segment.starts_with(':')) {
        return None;
    }
    if record.name == Some(name) {
        return Some(format!("/{}", segments.join("/")));
    }
    record
        .children
        .iter()
        .find_map(|child| path_for_record(child, name, &segments))
}
