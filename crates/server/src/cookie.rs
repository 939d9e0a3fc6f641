//! Cookie-backed sessions.
//!
//! A [`CookieSession`] is built from the request's `Cookie` headers, mutated through the
//! [`SessionStore`] interface and turned back into `Set-Cookie` headers on the response.

use crate::state::ServerState;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, header, request::Parts},
    response::{IntoResponseParts, ResponseParts},
};
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    convert::Infallible,
    sync::Arc,
};
use wallet_sync::{SessionStore, SyncConfig};

/// Attributes attached to every cookie the server writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    pub secure: bool,
    pub max_age_secs: Option<u64>,
}

impl From<&SyncConfig> for CookieAttributes {
    fn from(config: &SyncConfig) -> Self {
        Self { secure: config.cookie_secure, max_age_secs: config.cookie_max_age_secs }
    }
}

/// The cookies of one request plus the changes made while handling it.
#[derive(Clone, Debug, Default)]
pub struct CookieSession {
    cookies: HashMap<String, String>,
    /// Pending changes by cookie name; `None` deletes the cookie.
    changes: BTreeMap<String, Option<String>>,
    attributes: CookieAttributes,
}

impl CookieSession {
    pub fn new(attributes: CookieAttributes) -> Self {
        Self { attributes, ..Default::default() }
    }

    /// Parses every `Cookie` header in `headers`. The first occurrence of a name wins.
    pub fn from_headers(headers: &HeaderMap, attributes: CookieAttributes) -> Self {
        let mut cookies = HashMap::new();
        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(parse_pair);
        for (name, value) in pairs {
            cookies.entry(name).or_insert(value);
        }
        Self { cookies, changes: BTreeMap::new(), attributes }
    }

    /// Whether handling the request changed any cookie.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The `Set-Cookie` header values for the pending changes, ordered by cookie name.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|(name, value)| self.set_cookie(name, value.as_deref()))
            .collect()
    }

    fn set_cookie(&self, name: &str, value: Option<&str>) -> String {
        let mut cookie = match value {
            Some(value) => format!("{name}={}", urlencoding::encode(value)),
            None => format!("{name}="),
        };
        cookie.push_str("; Path=/; HttpOnly; SameSite=Lax");
        if self.attributes.secure {
            cookie.push_str("; Secure");
        }
        match (value, self.attributes.max_age_secs) {
            (None, _) => cookie.push_str("; Max-Age=0"),
            (Some(_), Some(max_age)) => cookie.push_str(&format!("; Max-Age={max_age}")),
            (Some(_), None) => {}
        }
        cookie
    }
}

fn parse_pair(pair: &str) -> Option<(String, String)> {
    let (name, value) = pair.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value);
    let value =
        urlencoding::decode(value).map(Cow::into_owned).unwrap_or_else(|_| value.to_string());
    Some((name.to_string(), value))
}

impl SessionStore for CookieSession {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.changes.insert(name.to_string(), Some(value.clone()));
        self.cookies.insert(name.to_string(), value);
    }

    fn remove(&mut self, name: &str) {
        self.changes.insert(name.to_string(), None);
        self.cookies.remove(name);
    }
}

impl FromRequestParts<Arc<ServerState>> for CookieSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, state.cookie_attributes()))
    }
}

impl IntoResponseParts for CookieSession {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.set_cookie_headers() {
            // Names come from config and values are percent-encoded, so this only skips
            // cookies with a malformed configured name.
            match HeaderValue::try_from(cookie) {
                Ok(value) => {
                    res.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(err) => warn!(%err, "dropping invalid Set-Cookie header"),
            }
        }
        Ok(res)
    }
}
