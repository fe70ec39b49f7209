//! Identity checks for chat requests.
//!
//! A requester is validated when the `username` cookie they present, paired
//! with the IP address the connection came from, was registered earlier.
//! Anything else (no cookie, an unparsable cookie header, an unknown pair)
//! is treated as unauthenticated.

use std::net::SocketAddr;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::OffsetDateTime;
use tracing::debug;
use webchat_shared::constants::{DEFAULT_USERNAME, IDENTITY_COOKIE, IDENTITY_COOKIE_DAYS};
use webchat_shared::Client;

use crate::state::ChatState;

/// Address a client is registered under. The source port changes between
/// connections, so only the IP is kept.
pub fn peer_address(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

/// Value of the identity cookie, if the request carried one.
pub fn credential(jar: &CookieJar) -> Option<&str> {
    jar.get(IDENTITY_COOKIE).map(|c| c.value())
}

/// Display name to register: the submitted one, or the placeholder when it
/// is missing or blank.
pub fn resolve_username(submitted: Option<&str>) -> String {
    match submitted.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_USERNAME.to_string(),
    }
}

#[derive(Clone)]
pub struct SessionGate {
    state: ChatState,
}

impl SessionGate {
    pub fn new(state: ChatState) -> Self {
        Self { state }
    }

    /// Fails closed: no credential means not validated.
    pub async fn validate(&self, credential: Option<&str>, address: &str) -> bool {
        let Some(name) = credential else {
            return false;
        };
        let found = self.state.find_client(address, name).await;
        if !found {
            debug!(name = %name, address = %address, "Unrecognized identity");
        }
        found
    }

    pub async fn validate_jar(&self, jar: &CookieJar, address: &str) -> bool {
        self.validate(credential(jar), address).await
    }

    /// Record `name` under `address` and return the identity cookie to set.
    /// Callers check [`validate`](Self::validate) first; this always adds a
    /// new registry entry.
    pub async fn register(&self, name: String, address: String) -> Cookie<'static> {
        let cookie = identity_cookie(name.clone());
        self.state.add_client(Client::new(name, address)).await;
        cookie
    }
}

fn identity_cookie(name: String) -> Cookie<'static> {
    let expires = OffsetDateTime::now_utc() + time::Duration::days(IDENTITY_COOKIE_DAYS);
    Cookie::build((IDENTITY_COOKIE, name))
        .path("/")
        .expires(expires)
        .build()
}
