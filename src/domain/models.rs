use crate::domain::color::Rgb;
use std::fmt;

/// Player identifier, equal to the registration index.
pub type PlayerId = usize;

/// One accelerometer reading in g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionSample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Message shown on a player's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    #[default]
    RegisterDevice,
    Connecting,
    Connected,
    Congrats,
    Boo,
}

impl PlayerStatus {
    /// Resting message for a connection state.
    pub fn for_connection(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Disconnected => Self::RegisterDevice,
            ConnectionStatus::Connecting => Self::Connecting,
            ConnectionStatus::Connected => Self::Connected,
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RegisterDevice => "Register device",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected!",
            Self::Congrats => "Congrats!",
            Self::Boo => "Boooo!",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub points: i64,
    pub color: Rgb,
    pub connection: ConnectionStatus,
    pub status: PlayerStatus,
}

/// Read-only state handed to the display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: RoundPhase,
    pub target: Option<Rgb>,
    pub seconds_remaining: u32,
    pub players: Vec<PlayerView>,
    /// Outcome of the last finished round; `Some(None)` when nobody matched.
    pub last_winner: Option<Option<PlayerId>>,
}

/// User-triggered controls routed into the game service.
#[derive(Debug, Clone)]
pub enum GameCommand {
    StartRound,
    Connect(PlayerId),
    AddPlayer(String),
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Session(SessionSnapshot),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
