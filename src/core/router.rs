//! Prefix route table.
//!
//! Routes are kept ordered by descending prefix length so the first match found is
//! always the most specific one. Prefixes of equal length keep registration order.
//! The table is built once at startup and only read afterwards.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Route prefix '{0}' must start with '/'")]
    InvalidPrefix(String),

    #[error("Route prefix '{0}' is already registered")]
    Duplicate(String),
}

/// A (path-prefix, handler) binding.
#[derive(Debug, Clone)]
pub struct Route<H> {
    prefix: String,
    handler: H,
}

impl<H> Route<H> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Part of `path` that follows this route's prefix.
    pub fn strip<'a>(&self, path: &'a str) -> &'a str {
        path.strip_prefix(self.prefix.as_str()).unwrap_or(path)
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `prefix`.
    ///
    /// The first registration of a prefix wins; later ones are rejected.
    pub fn register(&mut self, prefix: impl Into<String>, handler: H) -> Result<(), RouteError> {
        let prefix = prefix.into();
        if !prefix.starts_with('/') {
            return Err(RouteError::InvalidPrefix(prefix));
        }
        if self.routes.iter().any(|route| route.prefix == prefix) {
            return Err(RouteError::Duplicate(prefix));
        }

        // Insert after every route that is at least as long to keep ties in registration order
        let position = self
            .routes
            .iter()
            .position(|route| route.prefix.len() < prefix.len())
            .unwrap_or(self.routes.len());
        self.routes.insert(position, Route { prefix, handler });
        Ok(())
    }

    /// Longest-prefix lookup for an incoming request path.
    pub fn find(&self, path: &str) -> Option<&Route<H>> {
        self.routes
            .iter()
            .find(|route| prefix_matches(&route.prefix, path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A prefix matches a path on a segment boundary: `/api` matches `/api` and `/api/x`
/// but not `/apix`. A prefix ending in `/` matches everything below it.
pub fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
