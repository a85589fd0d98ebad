use crate::types::constants::event_names;

/// Type-safe server event kinds.
///
/// The wire carries an open-ended string; known kinds decode to their own
/// variant and anything else is preserved as [`EventKind::Custom`] so new
/// server events keep flowing to listeners without a client upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Synthetic connectivity event emitted locally on open/close
    Connection,

    /// Scan task progress updates
    ScanProgress,

    /// System notifications
    Notification,

    /// Any other server-defined event
    Custom(String),
}

impl EventKind {
    /// Parse a wire event name into an EventKind
    pub fn parse(s: &str) -> Self {
        match s {
            event_names::CONNECTION => Self::Connection,
            event_names::SCAN_PROGRESS => Self::ScanProgress,
            event_names::NOTIFICATION => Self::Notification,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Wire name of the event kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connection => event_names::CONNECTION,
            Self::ScanProgress => event_names::SCAN_PROGRESS,
            Self::Notification => event_names::NOTIFICATION,
            Self::Custom(s) => s,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parse() {
        assert_eq!(EventKind::parse("connection"), EventKind::Connection);
        assert_eq!(EventKind::parse("scan_progress"), EventKind::ScanProgress);
        assert_eq!(EventKind::parse("notification"), EventKind::Notification);
        assert_eq!(
            EventKind::parse("asset_discovered"),
            EventKind::Custom("asset_discovered".to_string())
        );
    }

    #[test]
    fn test_event_kind_round_trip() {
        let kinds = vec![
            EventKind::Connection,
            EventKind::ScanProgress,
            EventKind::Notification,
            EventKind::Custom("vuln_verified".to_string()),
        ];

        for kind in kinds {
            let s = kind.as_str().to_string();
            assert_eq!(EventKind::parse(&s), kind);
        }
    }
}
