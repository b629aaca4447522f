use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle phase of an [`EngineSession`](crate::EngineSession).
///
/// `Idle → AwaitingBind → AwaitingHandshake → Live → Stopping → Idle`, with
/// `Errored` entered when the bind or the proxy start fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingBind,
    AwaitingHandshake,
    Live,
    Stopping,
    Errored,
}

impl SessionPhase {
    /// True while a listen attempt owns the session.
    pub fn is_starting(self) -> bool {
        matches!(self, Self::AwaitingBind | Self::AwaitingHandshake)
    }
}

impl Display for SessionPhase {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingBind => "awaiting bind",
            Self::AwaitingHandshake => "awaiting handshake",
            Self::Live => "live",
            Self::Stopping => "stopping",
            Self::Errored => "errored",
        };
        formatter.write_str(name)
    }
}
