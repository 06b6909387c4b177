//! Network collaborators.

mod http_client;

pub use http_client::{
    cookie_value, desktop_user_agent, resolve_user_agent, FetchError, HttpClient, HttpResponse,
    Timeouts, DESKTOP_USER_AGENTS, IMPERSONATE, USER_AGENT,
};
