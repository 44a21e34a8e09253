/// Where the controller is in the send/stream cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Ready to accept a new message.
    #[default]
    Idle,

    /// The user message is out and the response headers are pending.
    Sending,

    /// The assistant placeholder exists and body chunks are arriving.
    Streaming,

    /// The exchange finished; reported once per send, after which the
    /// controller rests in `Idle`.
    Settled,
}

impl Phase {
    /// Returns true if input should be disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Sending | Phase::Streaming)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Sending => write!(f, "sending"),
            Phase::Streaming => write!(f, "streaming"),
            Phase::Settled => write!(f, "settled"),
        }
    }
}

/// Observable flags published to the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Status {
    /// Current phase.
    pub phase: Phase,

    /// True from a send until the first chunk or a terminal failure.
    pub loading: bool,

    /// True for the whole request lifecycle.
    pub streaming: bool,
}

impl Status {
    /// The resting status.
    pub const IDLE: Status = Status {
        phase: Phase::Idle,
        loading: false,
        streaming: false,
    };
}
