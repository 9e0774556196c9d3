//! Guarded navigation over the route table.

#[cfg(test)]
#[path = "navigator_test.rs"]
mod navigator_test;

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::guard::{GuardDecision, RouteGuard};
use super::{HOME_PATH, LOGIN_PATH, RouteTable};
use crate::state::auth::InitOutcome;

/// Redirect hops allowed for one navigation.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no route matches {0:?}")]
    UnknownRoute(String),

    #[error("navigation to {0:?} kept redirecting")]
    RedirectLoop(String),
}

/// A committed navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub name: Option<&'static str>,
    pub params: BTreeMap<String, String>,
    /// The originally requested path, when the guard redirected.
    pub redirected_from: Option<String>,
}

impl Location {
    #[must_use]
    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }
}

pub struct Navigator {
    table: RouteTable,
    guard: RouteGuard,
    current: RwLock<Option<Location>>,
}

impl Navigator {
    #[must_use]
    pub fn new(table: RouteTable, guard: RouteGuard) -> Self {
        Self { table, guard, current: RwLock::new(None) }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    #[must_use]
    pub fn current(&self) -> Option<Location> {
        self.current.read().clone()
    }

    /// Navigate to `path`, following guard redirects, and commit the result.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::UnknownRoute`] if the final target matches
    /// nothing, or [`NavigationError::RedirectLoop`] after too many redirects.
    /// The current location is unchanged on error.
    pub fn push(&self, path: &str) -> Result<Location, NavigationError> {
        let mut target = self.table.resolve(path);
        let mut redirected_from = None;

        for _ in 0..=MAX_REDIRECTS {
            let next = match self.guard.before_each(&target) {
                GuardDecision::Proceed => {
                    if !target.is_found() {
                        return Err(NavigationError::UnknownRoute(target.path));
                    }
                    let location = Location {
                        path: target.path,
                        name: target.name,
                        params: target.params,
                        redirected_from,
                    };
                    tracing::debug!(path = %location.path, from = ?location.redirected_from, "navigated");
                    *self.current.write() = Some(location.clone());
                    return Ok(location);
                }
                GuardDecision::RedirectHome => HOME_PATH,
                GuardDecision::RedirectLogin => LOGIN_PATH,
            };
            redirected_from.get_or_insert_with(|| path.to_owned());
            target = self.table.resolve(next);
        }

        tracing::warn!(%path, "redirect limit reached");
        Err(NavigationError::RedirectLoop(path.to_owned()))
    }

    /// Navigate to the route called `name`.
    ///
    /// # Errors
    ///
    /// See [`Navigator::push`]; an unknown name is [`NavigationError::UnknownRoute`].
    pub fn push_named(&self, name: &str) -> Result<Location, NavigationError> {
        let path = self
            .table
            .path_for(name)
            .ok_or_else(|| NavigationError::UnknownRoute(name.to_owned()))?;
        self.push(&path)
    }

    /// Wait for any session verification the last navigation started.
    pub async fn settle(&self) -> Option<InitOutcome> {
        self.guard.settle().await
    }
}
