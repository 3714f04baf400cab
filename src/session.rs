use chrono::{DateTime, Local, TimeZone, Utc};

use crate::research::ResearchResponse;

pub const NEW_SESSION_TITLE: &str = "New Research";
pub const SAMPLE_SESSION_ID: &str = "sample-session-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub parsed_response: Option<ResearchResponse>,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), None)
    }

    pub fn agent(parsed: ResearchResponse) -> Self {
        Self::new(Role::Agent, String::new(), Some(parsed))
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content.into(), None)
    }

    fn new(role: Role, content: String, parsed_response: Option<ResearchResponse>) -> Self {
        ChatMessage {
            id: generate_id(),
            role,
            content,
            parsed_response,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: i64,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        Session {
            id: generate_id(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now_millis(),
        }
    }

    pub fn first_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.role == Role::User)
    }

    fn has_user_message(&self) -> bool {
        self.first_user_message().is_some()
    }

    /// Canned session backing the sample data toggle.
    pub fn sample() -> Self {
        let created_at = now_millis() - 3_600_000;
        let query = "Latest advances in RAG architectures";
        Session {
            id: SAMPLE_SESSION_ID.to_string(),
            title: query.to_string(),
            messages: vec![
                ChatMessage {
                    id: "sample-user-1".to_string(),
                    role: Role::User,
                    content: query.to_string(),
                    parsed_response: None,
                    timestamp: created_at,
                },
                ChatMessage {
                    id: "sample-agent-1".to_string(),
                    role: Role::Agent,
                    content: String::new(),
                    parsed_response: Some(ResearchResponse::sample()),
                    timestamp: created_at + 10_000,
                },
            ],
            created_at,
        }
    }
}

/// In-memory list of sessions, newest first, plus the active pointer.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active_id: Option<String>,
    title_max_chars: usize,
}

impl SessionStore {
    pub fn new(title_max_chars: usize) -> Self {
        SessionStore {
            sessions: Vec::new(),
            active_id: None,
            title_max_chars,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Session> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    /// Prepend a session and make it active. Returns its id.
    pub fn create(&mut self, title: impl Into<String>) -> String {
        let session = Session::new(title);
        let id = session.id.clone();
        self.insert(session);
        id
    }

    pub fn insert(&mut self, session: Session) {
        self.active_id = Some(session.id.clone());
        self.sessions.insert(0, session);
    }

    /// Active session id, creating one titled after `first_text` if needed.
    pub fn ensure_active(&mut self, first_text: &str) -> String {
        if let Some(id) = self.active_id.clone() {
            return id;
        }
        let title = truncate_text(first_text, self.title_max_chars);
        self.create(title)
    }

    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_some() {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_active(&mut self) {
        self.active_id = None;
    }

    /// Remove a session. The active pointer only moves if it pointed here.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.sessions.len() != before
    }

    /// Append to a session. A session that no longer exists is a no-op.
    ///
    /// The first user message also names the session.
    pub fn append(&mut self, session_id: &str, mut message: ChatMessage) -> bool {
        let title_max_chars = self.title_max_chars;
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return false;
        };

        if let Some(last) = session.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }

        if message.role == Role::User && !session.has_user_message() {
            session.title = truncate_text(&message.content, title_max_chars);
        }

        session.messages.push(message);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Cut to `max_chars` characters and mark the cut with `...`.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Relative label for the sidebar: `Just now`, `5m ago`, `3h ago`, `Oct 4`.
pub fn format_timestamp(ts_millis: i64, now_millis: i64) -> String {
    let diff_mins = (now_millis - ts_millis).div_euclid(60_000);
    if diff_mins < 1 {
        return "Just now".to_string();
    }
    if diff_mins < 60 {
        return format!("{}m ago", diff_mins);
    }
    let diff_hours = diff_mins / 60;
    if diff_hours < 24 {
        return format!("{}h ago", diff_hours);
    }
    match Utc.timestamp_millis_opt(ts_millis).single() {
        Some(utc) => {
            let local: DateTime<Local> = utc.with_timezone(&Local);
            local.format("%b %-d").to_string()
        }
        None => String::new(),
    }
}
