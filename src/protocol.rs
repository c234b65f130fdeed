//! Line protocol for the session driver.
//!
//! One JSON object per line in each direction. Inbound lines are commands;
//! outbound lines are observations or errors. Lock records share the same
//! encoding and go to the optional event log.
//!
//! Inbound:
//!
//! ```text
//! {"ticks": 3, "intents": ["moveLeft", "rotateCw"]}
//! {"type": "newGame"}
//! ```

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::core::{AdvanceReport, GameSnapshot, Step};
use crate::types::{
    Intent, LockEvent, PieceKind, Rotation, BOARD_HEIGHT, BOARD_WIDTH, MAX_INTENTS_PER_ADVANCE,
};

// ============== Inbound ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandType {
    #[default]
    Advance,
    NewGame,
}

impl<'de> Deserialize<'de> for CommandType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("advance") {
            Ok(Self::Advance)
        } else if s.eq_ignore_ascii_case("newGame") {
            Ok(Self::NewGame)
        } else {
            Err(serde::de::Error::custom("unknown command type"))
        }
    }
}

/// Intents of one command, in the order they are applied
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntentList(pub ArrayVec<Intent, MAX_INTENTS_PER_ADVANCE>);

impl IntentList {
    pub fn as_slice(&self) -> &[Intent] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for IntentList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = IntentList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of intent names")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<Intent, MAX_INTENTS_PER_ADVANCE>::new();
                while let Some(name) = seq.next_element::<String>()? {
                    let intent = Intent::from_str(&name).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown intent: {}", name))
                    })?;
                    out.try_push(intent)
                        .map_err(|_| serde::de::Error::custom("too many intents"))?;
                }
                Ok(IntentList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

/// Raw inbound line
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    #[serde(default)]
    pub ticks: Option<u32>,
    #[serde(default)]
    pub intents: IntentList,
}

/// A validated command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Advance { ticks: u32, intents: IntentList },
    NewGame,
}

/// Ticks applied when a command leaves `ticks` out
pub const DEFAULT_TICKS: u32 = 1;

/// Parse one inbound line.
pub fn parse_command(line: &str) -> Result<Command, ErrorMessage> {
    let msg: CommandMessage = serde_json::from_str(line).map_err(|e| {
        let code = if e.is_syntax() || e.is_eof() {
            ErrorCode::InvalidJson
        } else {
            ErrorCode::InvalidCommand
        };
        create_error(code, &e.to_string())
    })?;

    match msg.msg_type {
        CommandType::Advance => Ok(Command::Advance {
            ticks: msg.ticks.unwrap_or(DEFAULT_TICKS),
            intents: msg.intents,
        }),
        CommandType::NewGame => {
            if msg.ticks.is_some() || !msg.intents.0.is_empty() {
                return Err(create_error(
                    ErrorCode::InvalidCommand,
                    "newGame takes no ticks or intents",
                ));
            }
            Ok(Command::NewGame)
        }
    }
}

// ============== Outbound ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidCommand,
}

/// Reply to a line that could not be used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub code: ErrorCode,
    pub message: String,
}

pub fn create_error(code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        code,
        message: message.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepLower {
    Running,
    GameOver,
    Quit,
}

impl From<Step> for StepLower {
    fn from(value: Step) -> Self {
        match value {
            Step::Running => Self::Running,
            Step::GameOver => Self::GameOver,
            Step::Quit => Self::Quit,
        }
    }
}

/// State after one command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub step: StepLower,
    pub episode_id: u32,
    pub pieces_spawned: u32,
    pub board: BoardSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<ActivePieceSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghost_y: Option<i8>,
    pub next: PieceKindLower,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event: Option<LastEvent>,
    pub applied: AppliedCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    pub cells: [[u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivePieceSnapshot {
    pub kind: PieceKindLower,
    pub rotation: RotationLower,
    pub x: i8,
    pub y: i8,
    pub cells: [[i8; 2]; 4],
}

/// What the engine did with the command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCounts {
    pub intents: u32,
    pub rejected: u32,
    /// Intents past the per-command limit, not applied
    pub dropped: u32,
    pub gravity_steps: u32,
    pub locks: u32,
    pub lines_cleared: u32,
}

impl From<&AdvanceReport> for AppliedCounts {
    fn from(value: &AdvanceReport) -> Self {
        Self {
            intents: value.intents_applied,
            rejected: value.intents_rejected,
            dropped: value.intents_dropped,
            gravity_steps: value.gravity_steps,
            locks: value.locks,
            lines_cleared: value.lines_cleared,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKindLower {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl From<PieceKind> for PieceKindLower {
    fn from(value: PieceKind) -> Self {
        match value {
            PieceKind::I => Self::I,
            PieceKind::O => Self::O,
            PieceKind::T => Self::T,
            PieceKind::S => Self::S,
            PieceKind::Z => Self::Z,
            PieceKind::J => Self::J,
            PieceKind::L => Self::L,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationLower {
    North,
    East,
    South,
    West,
}

impl From<Rotation> for RotationLower {
    fn from(value: Rotation) -> Self {
        match value {
            Rotation::North => Self::North,
            Rotation::East => Self::East,
            Rotation::South => Self::South,
            Rotation::West => Self::West,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastEvent {
    pub kind: PieceKindLower,
    pub lines_cleared: u32,
    pub score_awarded: u32,
    pub level: u32,
}

impl From<LockEvent> for LastEvent {
    fn from(value: LockEvent) -> Self {
        Self {
            kind: value.kind.into(),
            lines_cleared: value.lines_cleared,
            score_awarded: value.score_awarded,
            level: value.level,
        }
    }
}

pub fn build_observation(
    snap: &GameSnapshot,
    seq: u64,
    report: Option<&AdvanceReport>,
) -> ObservationMessage {
    let step = match report {
        Some(r) => r.step.into(),
        None if snap.game_over => StepLower::GameOver,
        None => StepLower::Running,
    };

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        step,
        episode_id: snap.episode_id,
        pieces_spawned: snap.pieces_spawned,
        board: BoardSnapshot {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            cells: snap.board,
        },
        active: snap.active.map(|a| ActivePieceSnapshot {
            kind: a.kind.into(),
            rotation: a.rotation.into(),
            x: a.x,
            y: a.y,
            cells: a.cells.map(|(x, y)| [x, y]),
        }),
        ghost_y: snap.ghost_y,
        next: snap.next.into(),
        score: snap.score,
        level: snap.level,
        lines: snap.lines,
        game_over: snap.game_over,
        last_event: snap.last_event.map(LastEvent::from),
        applied: report.map(AppliedCounts::from).unwrap_or_default(),
    }
}

// ============== Event log ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockRecordType {
    #[serde(rename = "lock")]
    Lock,
}

/// One line of the event log, written after a command that locked a piece
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    #[serde(rename = "type")]
    pub msg_type: LockRecordType,
    pub seq: u64,
    pub episode_id: u32,
    pub kind: PieceKindLower,
    pub lines_cleared: u32,
    pub score_awarded: u32,
    /// Locks performed by the command; only the last one is described above
    pub locks: u32,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
}

pub fn build_lock_record(
    event: LockEvent,
    snap: &GameSnapshot,
    seq: u64,
    locks: u32,
) -> LockRecord {
    LockRecord {
        msg_type: LockRecordType::Lock,
        seq,
        episode_id: snap.episode_id,
        kind: event.kind.into(),
        lines_cleared: event.lines_cleared,
        score_awarded: event.score_awarded,
        locks,
        score: snap.score,
        level: snap.level,
        lines: snap.lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixedSequence, GameState};

    #[test]
    fn test_parse_advance() {
        let cmd = parse_command(r#"{"ticks":3,"intents":["moveLeft","rotateCw","hardDrop"]}"#)
            .unwrap();
        match cmd {
            Command::Advance { ticks, intents } => {
                assert_eq!(ticks, 3);
                assert_eq!(
                    intents.as_slice(),
                    &[Intent::MoveLeft, Intent::RotateCw, Intent::HardDrop]
                );
            }
            _ => panic!("Expected Advance"),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let cmd = parse_command("{}").unwrap();
        assert_eq!(
            cmd,
            Command::Advance {
                ticks: DEFAULT_TICKS,
                intents: IntentList::default()
            }
        );

        let cmd = parse_command(r#"{"type":"advance","intents":["QUIT"]}"#).unwrap();
        match cmd {
            Command::Advance { ticks, intents } => {
                assert_eq!(ticks, 1);
                assert_eq!(intents.as_slice(), &[Intent::Quit]);
            }
            _ => panic!("Expected Advance"),
        }
    }

    #[test]
    fn test_parse_new_game() {
        assert_eq!(parse_command(r#"{"type":"newGame"}"#).unwrap(), Command::NewGame);

        let err = parse_command(r#"{"type":"newGame","ticks":4}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCommand);
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_command("{not json").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidJson);
        assert_eq!(err.msg_type, ErrorType::Error);

        let err = parse_command(r#"{"intents":["hold"]}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCommand);
        assert!(err.message.contains("unknown intent"));

        let err = parse_command(r#"{"ticks":-1}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCommand);

        let err = parse_command(r#"{"type":"pause"}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCommand);

        let err = parse_command(r#"{"tick":1}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCommand);
    }

    #[test]
    fn test_parse_escaped_names() {
        let cmd = parse_command(r#"{"type":"new\u0047ame"}"#).unwrap();
        assert_eq!(cmd, Command::NewGame);

        let cmd = parse_command(r#"{"intents":["move\u004Ceft","hard\u0044rop"]}"#).unwrap();
        match cmd {
            Command::Advance { intents, .. } => {
                assert_eq!(intents.as_slice(), &[Intent::MoveLeft, Intent::HardDrop]);
            }
            _ => panic!("Expected Advance"),
        }
    }

    #[test]
    fn test_parse_rejects_oversized_batch() {
        let names = vec!["\"moveLeft\""; MAX_INTENTS_PER_ADVANCE + 1].join(",");
        let line = format!(r#"{{"intents":[{}]}}"#, names);
        let err = parse_command(&line).unwrap_err();
        assert!(err.message.contains("too many intents"));
    }

    #[test]
    fn test_error_serializes_with_snake_case_code() {
        let err = create_error(ErrorCode::InvalidJson, "bad");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "invalid_json");
        assert_eq!(json["message"], "bad");
    }

    #[test]
    fn test_observation_shape() {
        let pieces = FixedSequence::new(vec![PieceKind::T, PieceKind::I]);
        let state = GameState::with_source(Box::new(pieces), 0);
        let obs = build_observation(&state.snapshot(), 7, None);
        let json = serde_json::to_value(&obs).unwrap();

        assert_eq!(json["type"], "observation");
        assert_eq!(json["seq"], 7);
        assert_eq!(json["step"], "running");
        assert_eq!(json["board"]["cells"].as_array().unwrap().len(), 20);
        assert_eq!(json["board"]["cells"][0].as_array().unwrap().len(), 10);
        assert_eq!(json["active"]["kind"], "t");
        assert_eq!(json["active"]["rotation"], "north");
        assert_eq!(json["active"]["cells"].as_array().unwrap().len(), 4);
        assert_eq!(json["next"], "i");
        assert_eq!(json["game_over"], false);
        assert!(json.get("last_event").is_none());
    }

    #[test]
    fn test_observation_counts_dropped_intents() {
        let mut state = GameState::new(5);
        let intents = vec![Intent::RotateCw; MAX_INTENTS_PER_ADVANCE + 8];
        let report = state.advance(0, &intents);

        let obs = build_observation(&state.snapshot(), 1, Some(&report));
        assert_eq!(obs.applied.dropped, 8);
        assert_eq!(
            obs.applied.intents + obs.applied.rejected,
            MAX_INTENTS_PER_ADVANCE as u32
        );
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["applied"]["dropped"], 8);
    }

    #[test]
    fn test_lock_record_from_event() {
        let mut state = GameState::with_source(Box::new(FixedSequence::repeat(PieceKind::O)), 0);
        let report = state.advance(0, &[Intent::HardDrop]);
        let snap = state.snapshot();
        let event = snap.last_event.unwrap();

        let rec = build_lock_record(event, &snap, 3, report.locks);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "lock");
        assert_eq!(json["kind"], "o");
        assert_eq!(json["locks"], 1);
        assert_eq!(json["lines_cleared"], 0);
        assert_eq!(json["score"], 0);
    }
}
