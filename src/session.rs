use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Bootstrap-style category of a flash message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Info,
    Warning,
    Danger,
}

/// One-shot message shown on the next rendered page
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

/// The file most recently uploaded in a session
#[derive(Clone, Debug, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
struct Session {
    upload: Option<Upload>,
    flashes: Vec<Flash>,
    expires_at: SystemTime,
}

impl Session {
    fn new() -> Self {
        Session {
            upload: None,
            flashes: Vec::new(),
            expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
        }
    }
}

/// Server side session data keyed by the `session` cookie
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the session for a request, starting a new one if needed
    ///
    /// # Arguments
    /// * `jar` - Cookie jar of the incoming request
    ///
    /// # Returns
    /// * `(CookieJar, String)` - The jar to send back (with a fresh cookie
    ///   when a session was created) and the session id
    pub fn resolve(&self, jar: CookieJar) -> (CookieJar, String) {
        let mut sessions = self.sessions.write().unwrap();
        let now = SystemTime::now();
        sessions.retain(|_, s| s.expires_at > now);

        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            if sessions.contains_key(cookie.value()) {
                let id = cookie.value().to_string();
                return (jar, id);
            }
        }

        let id = Uuid::new_v4().to_string();
        sessions.insert(id.clone(), Session::new());
        tracing::debug!(session = %id, "started session");

        let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
            .path("/")
            .http_only(true);
        (jar.add(cookie), id)
    }

    pub fn upload(&self, id: &str) -> Option<Upload> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(id).and_then(|s| s.upload.clone())
    }

    pub fn set_upload(&self, id: &str, upload: Upload) {
        self.with_session(id, |s| s.upload = Some(upload));
    }

    pub fn clear_upload(&self, id: &str) {
        self.with_session(id, |s| s.upload = None);
    }

    /// Queue a message for the next page render
    pub fn flash(&self, id: &str, category: Category, message: impl Into<String>) {
        let message = message.into();
        self.with_session(id, |s| s.flashes.push(Flash { category, message }));
    }

    /// Remove and return all queued messages
    pub fn take_flashes(&self, id: &str) -> Vec<Flash> {
        let mut sessions = self.sessions.write().unwrap();
        sessions
            .get_mut(id)
            .map(|s| std::mem::take(&mut s.flashes))
            .unwrap_or_default()
    }

    fn with_session(&self, id: &str, f: impl FnOnce(&mut Session)) {
        let mut sessions = self.sessions.write().unwrap();
        f(sessions.entry(id.to_string()).or_insert_with(Session::new));
    }
}
