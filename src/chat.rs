use crate::agent::AgentEnvelope;
use crate::config::Config;
use crate::normalize::normalize;
use crate::progress::{ActivityLog, Kind};
use crate::session::{ChatMessage, Session, SessionStore, NEW_SESSION_TITLE, SAMPLE_SESSION_ID};

pub const SERVICE_FAILURE_FALLBACK: &str = "Research failed. Please try again.";
pub const UNEXPECTED_FAILURE_FALLBACK: &str = "An unexpected error occurred.";

/// What came back from the agent call. Transport errors arrive as text so the
/// outcome can travel through UI messages.
pub type Outcome = Result<AgentEnvelope, String>;

/// A query that has been committed to a session and still needs its answer.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub session_id: String,
    pub query: String,
    pub agent_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Sending { session_id: String },
}

/// Owns the sessions and drives `idle -> sending -> idle`.
pub struct ChatState {
    store: SessionStore,
    input: String,
    phase: Phase,
    last_failed: Option<String>,
    active_agent_id: Option<String>,
    manager_agent_id: String,
    sample_data: bool,
    activity: ActivityLog,
}

impl ChatState {
    pub fn new(config: &Config) -> Self {
        let mut state = ChatState {
            store: SessionStore::new(config.ui.title_max_chars),
            input: String::new(),
            phase: Phase::Idle,
            last_failed: None,
            active_agent_id: None,
            manager_agent_id: config.agent.manager_agent_id.clone(),
            sample_data: false,
            activity: ActivityLog::new(),
        };
        if config.ui.sample_data {
            state.set_sample_data(true);
        }
        state
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.store.active()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: String) {
        self.input = value;
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Sending { .. })
    }

    pub fn can_send(&self) -> bool {
        !self.is_busy() && !self.input.trim().is_empty()
    }

    pub fn last_failed(&self) -> Option<&str> {
        self.last_failed.as_deref()
    }

    pub fn active_agent_id(&self) -> Option<&str> {
        self.active_agent_id.as_deref()
    }

    pub fn sample_data(&self) -> bool {
        self.sample_data
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn submit_input(&mut self) -> Option<PendingRequest> {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// First phase of a send: commit the user message and go busy.
    ///
    /// Blank text or a request already in flight makes this a no-op.
    pub fn submit(&mut self, text: &str) -> Option<PendingRequest> {
        let query = text.trim();
        if query.is_empty() || self.is_busy() {
            return None;
        }

        self.last_failed = None;

        let session_id = self.store.ensure_active(text);
        self.store.append(&session_id, ChatMessage::user(query));
        self.input.clear();

        self.phase = Phase::Sending {
            session_id: session_id.clone(),
        };
        self.active_agent_id = Some(self.manager_agent_id.clone());
        self.activity.log_with(Kind::Request, format!("Query sent: {}", query));

        Some(PendingRequest {
            session_id,
            query: query.to_string(),
            agent_id: self.manager_agent_id.clone(),
        })
    }

    /// Second phase: record the outcome and go idle again.
    pub fn resolve(&mut self, request: PendingRequest, outcome: Outcome) {
        self.active_agent_id = None;

        let message = match outcome {
            Ok(envelope) if envelope.success => {
                let parsed = normalize(&envelope);
                self.activity.log_with(
                    Kind::Response,
                    format!(
                        "Result received: {} web findings, {} papers",
                        parsed.web_findings.len(),
                        parsed.academic_papers.len()
                    ),
                );
                ChatMessage::agent(parsed)
            }
            Ok(envelope) => {
                let reason = envelope
                    .error
                    .or_else(|| envelope.response.and_then(|r| r.message))
                    .unwrap_or_else(|| SERVICE_FAILURE_FALLBACK.to_string());
                self.activity.log_with(Kind::Failure, format!("Agent reported failure: {}", reason));
                self.last_failed = Some(request.query.clone());
                ChatMessage::error(reason)
            }
            Err(e) => {
                let reason = if e.trim().is_empty() {
                    UNEXPECTED_FAILURE_FALLBACK.to_string()
                } else {
                    e
                };
                self.activity.log_with(Kind::Failure, format!("Request failed: {}", reason));
                self.last_failed = Some(request.query.clone());
                ChatMessage::error(reason)
            }
        };

        if !self.store.append(&request.session_id, message) {
            tracing::warn!(
                "[Chat] session {} was deleted before its answer arrived; dropping it",
                request.session_id
            );
        }

        self.phase = Phase::Idle;
    }

    /// Resend the last failed query. Earlier error messages stay where they are.
    pub fn retry(&mut self) -> Option<PendingRequest> {
        let text = self.last_failed.clone()?;
        self.submit(&text)
    }

    pub fn new_session(&mut self) {
        self.store.create(NEW_SESSION_TITLE);
        self.input.clear();
        self.last_failed = None;
        self.sync_sample_data();
    }

    pub fn select_session(&mut self, id: &str) -> bool {
        self.store.select(id)
    }

    pub fn delete_session(&mut self, id: &str) -> bool {
        let removed = self.store.delete(id);
        if removed {
            self.activity.log(format!("Session {} deleted", id));
            self.sync_sample_data();
        }
        removed
    }

    pub fn set_sample_data(&mut self, on: bool) {
        self.sample_data = on;
        self.sync_sample_data();
    }

    /// Runs whenever the flag or the session list changes. On with no
    /// sessions seeds the sample session; off removes it again once it is the
    /// only one left.
    fn sync_sample_data(&mut self) {
        if self.sample_data && self.store.is_empty() {
            self.store.insert(Session::sample());
        }

        if !self.sample_data && self.store.len() == 1 && self.store.sessions()[0].id == SAMPLE_SESSION_ID {
            self.store.delete(SAMPLE_SESSION_ID);
            self.store.clear_active();
        }
    }

    pub fn toggle_sample_data(&mut self) {
        self.set_sample_data(!self.sample_data);
    }
}
