//! User agent selection.
//!
//! Pinterest serves its embedded state only to desktop browsers, so every
//! built-in agent is a desktop one.

/// Sent when no user agent is configured.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Desktop agents rotated through by `impersonate`.
pub const DESKTOP_USER_AGENTS: &[&str] = &[
    USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0",
];

/// Config value selecting a rotated desktop agent.
pub const IMPERSONATE: &str = "impersonate";

/// Desktop agent for a seed; wraps around the list.
pub fn desktop_user_agent(seed: u64) -> &'static str {
    DESKTOP_USER_AGENTS[(seed % DESKTOP_USER_AGENTS.len() as u64) as usize]
}

/// Resolve the configured agent. Blank values fall back to [`USER_AGENT`].
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(IMPERSONATE) => {
            let seed = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos() as u64)
                .unwrap_or(0);
            desktop_user_agent(seed).to_string()
        }
        Some(custom) => custom.to_string(),
    }
}
