//! In-memory session state.
//!
//! A [`Session`] lives for the lifetime of the process: it is created empty at
//! startup and torn down on logout. Tokens are never written to disk.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use futures::future::{BoxFuture, Shared};
use mediabox_core::ClientError;

/// A CSRF fetch shared by every caller that needs the token while it runs.
pub(crate) type CsrfFetch = Shared<BoxFuture<'static, Result<Option<String>, ClientError>>>;

/// A token refresh shared by every request that was rejected with 401 while it runs.
pub(crate) type RefreshFetch = Shared<BoxFuture<'static, Result<(), ClientError>>>;

/// Outcome of asking the session for a CSRF token.
pub(crate) enum CsrfLookup {
    Cached(String),
    Pending(CsrfFetch),
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct Session {
    access_token: Mutex<Option<String>>,
    csrf_token: Mutex<Option<String>>,
    /// At most one outstanding CSRF fetch, tagged with its generation.
    csrf_in_flight: Mutex<Option<(u64, CsrfFetch)>>,
    csrf_generation: AtomicU64,
    /// At most one outstanding token refresh, tagged with its generation.
    refresh_in_flight: Mutex<Option<(u64, RefreshFetch)>>,
    refresh_generation: AtomicU64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_access_token", &self.has_access_token())
            .field("has_csrf_token", &self.csrf_token().is_some())
            .field("csrf_fetch_in_flight", &self.csrf_fetch_in_flight())
            .field("refresh_in_flight", &self.refresh_in_flight())
            .finish()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(&self) -> Option<String> {
        lock(&self.access_token).clone()
    }

    /// Store a bearer token; an empty string clears it.
    pub fn set_access_token(&self, token: Option<String>) {
        *lock(&self.access_token) = token.filter(|t| !t.is_empty());
    }

    pub fn has_access_token(&self) -> bool {
        lock(&self.access_token).is_some()
    }

    pub fn csrf_token(&self) -> Option<String> {
        lock(&self.csrf_token).clone()
    }

    pub fn set_csrf_token(&self, token: Option<String>) {
        *lock(&self.csrf_token) = token.filter(|t| !t.is_empty());
    }

    pub fn csrf_fetch_in_flight(&self) -> bool {
        lock(&self.csrf_in_flight).is_some()
    }

    pub fn refresh_in_flight(&self) -> bool {
        lock(&self.refresh_in_flight).is_some()
    }

    /// End of the authenticated lifetime: forget the bearer token.
    ///
    /// The CSRF token is bound to the browser-style cookie session rather than
    /// the user, so it is kept.
    pub fn teardown(&self) {
        self.set_access_token(None);
    }

    /// Join the running CSRF fetch, return the cached token, or start a fetch.
    ///
    /// With `force` the cached token is ignored, but a fetch that is already
    /// running is still joined rather than duplicated.
    pub(crate) fn csrf_token_or_fetch(
        &self,
        force: bool,
        start: impl FnOnce(u64) -> CsrfFetch,
    ) -> CsrfLookup {
        let mut in_flight = lock(&self.csrf_in_flight);
        if let Some((_, fetch)) = in_flight.as_ref() {
            return CsrfLookup::Pending(fetch.clone());
        }
        if !force {
            if let Some(token) = self.csrf_token() {
                return CsrfLookup::Cached(token);
            }
        }

        let generation = self.csrf_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let fetch = start(generation);
        *in_flight = Some((generation, fetch.clone()));
        CsrfLookup::Pending(fetch)
    }

    /// Clear the in-flight marker if it still belongs to `generation`.
    pub(crate) fn finish_csrf_fetch(&self, generation: u64) {
        let mut in_flight = lock(&self.csrf_in_flight);
        if matches!(in_flight.as_ref(), Some((current, _)) if *current == generation) {
            *in_flight = None;
        }
    }

    /// Join the running token refresh, or start one.
    pub(crate) fn refresh_or_join(&self, start: impl FnOnce(u64) -> RefreshFetch) -> RefreshFetch {
        let mut in_flight = lock(&self.refresh_in_flight);
        if let Some((_, refresh)) = in_flight.as_ref() {
            return refresh.clone();
        }

        let generation = self.refresh_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let refresh = start(generation);
        *in_flight = Some((generation, refresh.clone()));
        refresh
    }

    pub(crate) fn finish_refresh(&self, generation: u64) {
        let mut in_flight = lock(&self.refresh_in_flight);
        if matches!(in_flight.as_ref(), Some((current, _)) if *current == generation) {
            *in_flight = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ready_fetch(token: &str) -> CsrfFetch {
        let token = token.to_string();
        async move { Ok(Some(token)) }.boxed().shared()
    }

    #[test]
    fn test_empty_token_clears() {
        let session = Session::new();
        session.set_access_token(Some("abc".to_string()));
        assert!(session.has_access_token());
        session.set_access_token(Some(String::new()));
        assert!(!session.has_access_token());
    }

    #[test]
    fn test_teardown_keeps_csrf_token() {
        let session = Session::new();
        session.set_access_token(Some("abc".to_string()));
        session.set_csrf_token(Some("csrf".to_string()));
        session.teardown();
        assert_eq!(session.access_token(), None);
        assert_eq!(session.csrf_token().as_deref(), Some("csrf"));
    }

    #[test]
    fn test_cached_token_short_circuits_unless_forced() {
        let session = Session::new();
        session.set_csrf_token(Some("cached".to_string()));

        let cached = session.csrf_token_or_fetch(false, |_| panic!("must not start a fetch"));
        assert!(matches!(cached, CsrfLookup::Cached(ref t) if t == "cached"));

        let forced = session.csrf_token_or_fetch(true, |_| ready_fetch("fresh"));
        assert!(matches!(forced, CsrfLookup::Pending(_)));
        assert!(session.csrf_fetch_in_flight());
    }

    #[test]
    fn test_in_flight_fetch_is_joined() {
        let session = Session::new();
        let mut started = 0;
        let first = session.csrf_token_or_fetch(false, |_| {
            started += 1;
            ready_fetch("t")
        });
        let second = session.csrf_token_or_fetch(true, |_| {
            started += 1;
            ready_fetch("other")
        });
        assert!(matches!(first, CsrfLookup::Pending(_)));
        assert!(matches!(second, CsrfLookup::Pending(_)));
        assert_eq!(started, 1);
    }

    #[test]
    fn test_finish_only_clears_matching_generation() {
        let session = Session::new();
        let mut generation = 0;
        let _ = session.csrf_token_or_fetch(false, |g| {
            generation = g;
            ready_fetch("t")
        });
        session.finish_csrf_fetch(generation + 1);
        assert!(session.csrf_fetch_in_flight());
        session.finish_csrf_fetch(generation);
        assert!(!session.csrf_fetch_in_flight());
    }

    #[test]
    fn test_running_refresh_is_joined() {
        let session = Session::new();
        let mut started = Vec::new();
        let _ = session.refresh_or_join(|g| {
            started.push(g);
            async { Ok(()) }.boxed().shared()
        });
        let _ = session.refresh_or_join(|g| {
            started.push(g);
            async { Ok(()) }.boxed().shared()
        });
        assert_eq!(started.len(), 1);
        assert!(session.refresh_in_flight());

        session.finish_refresh(started[0]);
        assert!(!session.refresh_in_flight());
        let _ = session.refresh_or_join(|g| {
            started.push(g);
            async { Ok(()) }.boxed().shared()
        });
        assert_eq!(started.len(), 2);
        assert!(started[1] > started[0]);
    }
}
