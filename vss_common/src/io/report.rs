//! Accumulated configuration problems.

use core::fmt;
use serde::Serialize;

/// Category of a configuration problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    /// A required section is absent.
    MissingSection,
    /// A required field inside a section is absent.
    MissingField,
    /// A field holds a value of the wrong type.
    InvalidField,
    /// A section that no entity owns.
    UnknownSection,
    /// The hardware revision tag is not recognized.
    UnknownRevision,
    /// A pin has no channel on the configured revision.
    UnmappedPin,
    /// Two entities resolve to the same channel.
    DuplicateChannel,
    /// The I/O driver refused to configure a channel.
    IoSetup,
    /// The notification transport cannot be built.
    Notification,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingSection => "missing section",
            Self::MissingField => "missing field",
            Self::InvalidField => "invalid field",
            Self::UnknownSection => "unknown section",
            Self::UnknownRevision => "unknown revision",
            Self::UnmappedPin => "unmapped pin",
            Self::DuplicateChannel => "duplicate channel",
            Self::IoSetup => "I/O setup",
            Self::Notification => "notification",
        };
        f.write_str(s)
    }
}

/// One problem attributed to one configured entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    /// Entity the problem belongs to (`relay.A`, `shutdown.turbo`, `error_led`…).
    pub entity: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.entity, self.kind, self.message)
    }
}

/// Every configuration problem found at startup.
///
/// A non-empty report means the process must not arm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    issues: Vec<ConfigIssue>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem.
    pub fn push(&mut self, entity: impl Into<String>, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(ConfigIssue {
            entity: entity.into(),
            kind,
            message: message.into(),
        });
    }

    /// Append every problem of `other`.
    pub fn merge(&mut self, other: ErrorReport) {
        self.issues.extend(other.issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.issues.iter()
    }

    /// Whether any problem of `kind` was recorded.
    pub fn contains(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}
