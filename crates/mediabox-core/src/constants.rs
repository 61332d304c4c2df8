//! Backend contract constants: endpoint paths, status codes, limits.

use std::time::Duration;

/// Backend endpoint paths, relative to the configured base API URL.
pub mod endpoints {
    pub const GET_ALL_MEDIA: &str = "/media/all/page";
    pub const GET_USER_MEDIA: &str = "/media/user/all";
    pub const UPLOAD_VIDEO: &str = "/media/upload/video";
    pub const UPLOAD_IMAGE: &str = "/media/upload/image";
    /// Prefix; the video UUID is appended.
    pub const GET_VIDEO_STATUS: &str = "/media/video/get-status/";
    pub const LOGIN: &str = "/auth/login";
    pub const REFRESH: &str = "/auth/refresh";
    pub const SIGNUP: &str = "/auth/signup";
    pub const LOGOUT: &str = "/auth/logout";
    pub const LOGOUT_OAUTH: &str = "/auth/oauth/logout";
    pub const ME: &str = "/auth/me";
    /// Prefix; the provider name is appended.
    pub const OAUTH_LOGIN: &str = "/auth/oauth/";

    /// Endpoints whose 401 responses are final: they never trigger a token refresh.
    pub const UNAUTHENTICATED: [&str; 3] = [LOGIN, REFRESH, SIGNUP];
}

pub const CSRF_HEADER_NAME: &str = "X-CSRF-Token";
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Statuses treated as "upload accepted".
pub const SUCCESS_STATUS_CODES: [u16; 5] = [200, 201, 202, 204, 206];

pub fn is_success_status(status: u16) -> bool {
    SUCCESS_STATUS_CODES.contains(&status)
}

pub const MAX_IMAGE_SIZE_BYTES: u64 = 2 * 1024 * 1024;
pub const MAX_VIDEO_SIZE_BYTES: u64 = 500 * 1024 * 1024;

pub const POLL_MAX_ATTEMPTS: u32 = 30;
pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Hosts whose `/embed/` URLs are video players rather than plain images.
pub const MEDIA_DELIVERY_HOSTNAMES: [&str; 1] = ["iframe.mediadelivery.net"];
pub const MEDIA_DELIVERY_EMBED_SEGMENT: &str = "/embed/";

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";
