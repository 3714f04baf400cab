use std::collections::VecDeque;

const MAX_LOG_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Info,
    Request,
    Response,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub text: String,
    pub kind: Kind,
}

/// Bounded pipeline activity shown under the agent list in the sidebar.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<Entry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        ActivityLog {
            entries: VecDeque::with_capacity(MAX_LOG_LINES),
        }
    }

    pub fn log<T: Into<String>>(&mut self, line: T) {
        self.log_with(Kind::Info, line);
    }

    pub fn log_with<T: Into<String>>(&mut self, kind: Kind, line: T) {
        let text = line.into();
        match kind {
            Kind::Failure => tracing::warn!("[Pipeline] {}", text),
            _ => tracing::info!("[Pipeline] {}", text),
        }
        if self.entries.len() >= MAX_LOG_LINES {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry { text, kind });
    }

    pub fn recent(&self, n: usize) -> Vec<Entry> {
        let len = self.entries.len();
        let take = n.min(len);
        self.entries.iter().skip(len - take).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = ActivityLog::new();
        log.log("one");
        log.log_with(Kind::Request, "two");
        log.log_with(Kind::Failure, "three");

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "two");
        assert_eq!(recent[0].kind, Kind::Request);
        assert_eq!(recent[1].text, "three");
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn test_bounded() {
        let mut log = ActivityLog::new();
        for i in 0..(MAX_LOG_LINES + 5) {
            log.log(format!("line {}", i));
        }
        assert_eq!(log.recent(usize::MAX).len(), MAX_LOG_LINES);
        assert_eq!(log.recent(1)[0].text, format!("line {}", MAX_LOG_LINES + 4));
        assert_eq!(log.recent(MAX_LOG_LINES)[0].text, "line 5");
        assert!(ActivityLog::new().recent(5).is_empty());
    }
}
