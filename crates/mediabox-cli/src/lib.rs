use anyhow::Context;
use mediabox_api_client::PollState;
use serde::Serialize;

pub const IDENTIFIER_ENV: &str = "MEDIABOX_IDENTIFIER";
pub const PASSWORD_ENV: &str = "MEDIABOX_PASSWORD";

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Login credentials for commands that need an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

/// Credentials from flags, falling back to `MEDIABOX_IDENTIFIER` / `MEDIABOX_PASSWORD`.
///
/// Returns `None` when neither source provides an identifier.
pub fn resolve_credentials(
    identifier: Option<String>,
    password: Option<String>,
) -> anyhow::Result<Option<Credentials>> {
    resolve_credentials_with(identifier, password, |key| std::env::var(key).ok())
}

pub fn resolve_credentials_with(
    identifier: Option<String>,
    password: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Option<Credentials>> {
    let Some(identifier) = identifier.or_else(|| lookup(IDENTIFIER_ENV)) else {
        return Ok(None);
    };
    let password = password
        .or_else(|| lookup(PASSWORD_ENV))
        .with_context(|| format!("Missing password: pass --password or set {}", PASSWORD_ENV))?;

    Ok(Some(Credentials {
        identifier,
        password,
    }))
}

/// One-line progress text for a poll state.
pub fn describe_poll_state(state: &PollState) -> String {
    match state {
        PollState::Idle => "idle".to_string(),
        PollState::Polling {
            video_uuid,
            attempt,
            status,
        } => match status {
            Some(status) => format!("{}: {} (check {})", video_uuid, status, attempt),
            None => format!("{}: waiting for first status check", video_uuid),
        },
        PollState::Finished { video_uuid, .. } => format!("{}: processing finished", video_uuid),
        PollState::ProcessingFailed { video_uuid, status } => {
            format!("{}: processing failed ({})", video_uuid, status)
        }
        PollState::TimedOut {
            video_uuid,
            attempts,
            ..
        } => format!(
            "{}: still processing after {} checks, giving up",
            video_uuid, attempts
        ),
        PollState::CheckFailed { video_uuid, error } => {
            format!("{}: status check failed: {}", video_uuid, error)
        }
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
