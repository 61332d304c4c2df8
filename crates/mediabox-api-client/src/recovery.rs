//! Per-request bookkeeping for the 401/403 recovery paths.
//!
//! Each original request gets one [`Attempt`]. A recovery path may fire at
//! most once for it, so a server that keeps rejecting cannot cause a loop.

use mediabox_core::constants::endpoints;

use crate::http::ApiRequest;

/// Which recovery to run before replaying a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// 401: refresh the access token, then replay.
    Auth,
    /// 403: fetch a fresh CSRF token, then replay.
    Csrf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attempt {
    auth_retried: bool,
    csrf_retried: bool,
}

impl Attempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recovery to run for a response with `status`, if any is still available.
    pub fn recovery_for(&self, request: &ApiRequest, status: u16) -> Option<Recovery> {
        match status {
            401 if !self.auth_retried && !is_unauthenticated_endpoint(request.endpoint()) => {
                Some(Recovery::Auth)
            }
            403 if !self.csrf_retried => Some(Recovery::Csrf),
            _ => None,
        }
    }

    pub fn record(&mut self, recovery: Recovery) {
        match recovery {
            Recovery::Auth => self.auth_retried = true,
            Recovery::Csrf => self.csrf_retried = true,
        }
    }

    pub fn auth_retried(&self) -> bool {
        self.auth_retried
    }

    pub fn csrf_retried(&self) -> bool {
        self.csrf_retried
    }
}

/// Login, signup and refresh: a 401 from these is the answer, not an expired token.
/// Matched by exact path so unrelated endpoints sharing a prefix still recover.
pub fn is_unauthenticated_endpoint(path: &str) -> bool {
    endpoints::UNAUTHENTICATED.contains(&path)
}
