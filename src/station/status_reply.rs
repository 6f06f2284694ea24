use crate::types::RobotState;
use std::fmt;

/// A robot controller's answer to the `status` request.
///
/// The controller replies with `<STATUS_TOKEN> <PICKED_COUNT>` padded into a
/// fixed buffer. There is no length prefix or terminator, so anything after
/// the first two whitespace-separated fields is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReply {
    Report { status: String, items_picked: u32 },
    Malformed { raw: String, reason: &'static str },
}

impl StatusReply {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        let mut fields = text.split_whitespace();

        let Some(status) = fields.next() else {
            return Self::malformed(text, "empty reply");
        };
        let Some(count) = fields.next() else {
            return Self::malformed(text, "missing picked count");
        };
        let Ok(items_picked) = count.trim_end_matches('\0').parse::<u32>() else {
            return Self::malformed(text, "picked count is not a number");
        };

        Self::Report {
            status: status.to_string(),
            items_picked,
        }
    }

    fn malformed(text: &str, reason: &'static str) -> Self {
        Self::Malformed {
            raw: text.to_string(),
            reason,
        }
    }

    /// Status token and count to report, falling back to `PC_ERROR` and
    /// `last_picked` for a malformed reply.
    #[must_use]
    pub fn report_or(&self, last_picked: u32) -> (&str, u32) {
        match self {
            Self::Report {
                status,
                items_picked,
            } => (status.as_str(), *items_picked),
            Self::Malformed { .. } => (RobotState::Error.as_str(), last_picked),
        }
    }

    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

impl fmt::Display for StatusReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report {
                status,
                items_picked,
            } => write!(f, "{status} ({items_picked} picked)"),
            Self::Malformed { raw, reason } => write!(f, "malformed reply {raw:?}: {reason}"),
        }
    }
}
