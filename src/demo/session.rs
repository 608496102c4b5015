use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "talksense_session";

/// Number of analyses remembered per session.
pub const HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub text: String,
    pub label: String,
    pub confidence: f32,
}

/// What the styled demo renders alongside the top prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    pub show_chart: bool,
    pub show_top3: bool,
    pub show_history: bool,
    pub show_emoji: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_chart: true,
            show_top3: true,
            show_history: true,
            show_emoji: true,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Session {
    history: VecDeque<HistoryEntry>,
    pub options: DisplayOptions,
}

impl Session {
    /// Most recent first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.history.push_front(entry);
        self.history.truncate(HISTORY_LIMIT);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Sessions kept before the least recently used one is dropped.
pub const MAX_SESSIONS: usize = 1024;

#[derive(Debug)]
struct Slot {
    session: Session,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    slots: HashMap<String, Slot>,
    clock: u64,
}

impl Sessions {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.slots.remove(&id);
            tracing::debug!(session = %id, "evicted least recently used session");
        }
    }
}

/// In-memory sessions keyed by the value of [`SESSION_COOKIE`].
///
/// A session only exists once a visitor has written to it. The store holds at
/// most `capacity` sessions and evicts the least recently used one to make room.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<Sessions>,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the request's session id, or a newly minted one when the cookie
    /// is missing or unknown. The flag is true for a minted id, which is not
    /// stored until [`SessionStore::with_session`] writes to it.
    pub fn resolve(&self, headers: &HeaderMap) -> (String, bool) {
        if let Some(id) = session_id(headers) {
            if self.lock().slots.contains_key(&id) {
                return (id, false);
            }
        }
        (new_session_id(), true)
    }

    /// Runs `f` against the stored session, or against a blank one when `id`
    /// is not stored. Never creates a session.
    pub fn view<T>(&self, id: &str, f: impl FnOnce(&Session) -> T) -> T {
        let mut sessions = self.lock();
        let now = sessions.tick();
        match sessions.slots.get_mut(id) {
            Some(slot) => {
                slot.last_used = now;
                f(&slot.session)
            }
            None => f(&Session::default()),
        }
    }

    /// Runs `f` against the session, creating it if needed.
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = self.lock();
        let now = sessions.tick();
        if !sessions.slots.contains_key(id) {
            while sessions.slots.len() >= self.capacity {
                sessions.evict_oldest();
            }
            tracing::debug!(session = %id, "started session");
        }
        let slot = sessions.slots.entry(id.to_string()).or_insert_with(|| Slot {
            session: Session::default(),
            last_used: now,
        });
        slot.last_used = now;
        f(&mut slot.session)
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sessions> {
        // A panic while holding the lock cannot leave a session half-written.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `Set-Cookie` value for a session id.
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn new_session_id() -> String {
    format!("{:032x}", rand::rng().random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            text: format!("text {n}"),
            label: "happy".into(),
            confidence: 0.5,
        }
    }

    #[test]
    fn history_keeps_last_five_newest_first() {
        let mut session = Session::default();
        for n in 0..7 {
            session.record(entry(n));
        }
        let texts: Vec<_> = session.history().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["text 6", "text 5", "text 4", "text 3", "text 2"]);

        session.clear_history();
        assert_eq!(session.history().count(), 0);
    }

    fn cookie(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {SESSION_COOKIE}={id}");
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        headers
    }

    #[test]
    fn known_cookie_reuses_session() {
        let store = SessionStore::new();
        let (id, fresh) = store.resolve(&HeaderMap::new());
        assert!(fresh);
        store.with_session(&id, |session| session.record(entry(0)));

        assert_eq!(store.resolve(&cookie(&id)), (id, false));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_cookie_gets_new_session() {
        let store = SessionStore::new();
        let (id, fresh) = store.resolve(&cookie("forged"));
        assert!(fresh);
        assert_ne!(id, "forged");
    }

    #[test]
    fn reading_never_creates_a_session() {
        let store = SessionStore::new();
        for _ in 0..20 {
            let (id, _) = store.resolve(&HeaderMap::new());
            let shown = store.view(&id, |session| session.history().count());
            assert_eq!(shown, 0);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn least_recently_used_session_is_evicted() {
        let store = SessionStore::with_capacity(2);
        store.with_session("a", |session| session.record(entry(1)));
        store.with_session("b", |session| session.record(entry(2)));
        // Touch "a" so "b" becomes the oldest.
        store.view("a", |_| ());
        store.with_session("c", |session| session.record(entry(3)));

        assert_eq!(store.len(), 2);
        assert!(!store.resolve(&cookie("a")).1);
        assert!(store.resolve(&cookie("b")).1);
        assert!(!store.resolve(&cookie("c")).1);
    }
}
