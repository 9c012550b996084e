// Type definitions for the Scouts bridge

use serde::{Deserialize, Serialize};
use std::fmt;
use wasm_bindgen::prelude::*;

use crate::engine::EngineError;
use crate::invoke::Fault;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failures crossing the host/record boundary
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum MarshalError {
    #[error("cannot encode record: {0}")]
    Encode(String),

    #[error("cannot decode host value: {0}")]
    Decode(String),

    #[error("host value has no JSON representation")]
    Unrepresentable,
}

/// Failures turning a move payload into a [`Move`](crate::engine::Move)
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("unknown move type in {input:?}")]
    UnknownMoveType { input: String },

    #[error("cannot decode move {token:?}: {reason}")]
    Malformed { token: String, reason: String },

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

/// Error types for bridge operations
#[derive(Debug, thiserror::Error, Clone)]
pub enum BridgeError {
    #[error("expected {expected} argument(s), got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("invalid player: {0}")]
    InvalidPlayer(String),

    #[error("game not initialized, call resetGame first")]
    NotInitialized,

    #[error("cannot unmarshal move: {0}")]
    Decode(#[from] DecodeError),

    #[error("cannot apply move: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Fault(#[from] Fault),

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}

impl BridgeError {
    /// Error kind reported to the host as the JS `Error.name`
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Arity { .. } => "ArityError",
            BridgeError::InvalidPlayer(_) => "ValidationError",
            BridgeError::NotInitialized => "NotInitializedError",
            BridgeError::Decode(_) => "DecodeError",
            BridgeError::Engine(_) => "EngineError",
            BridgeError::Fault(_) => "InternalFault",
            BridgeError::Marshal(_) => "MarshalError",
        }
    }
}

/// A failed host call, tagged with the verb that failed
#[derive(Debug, thiserror::Error, Clone)]
#[error("{verb}: {kind}")]
pub struct CallError {
    pub verb: Verb,
    #[source]
    pub kind: BridgeError,
}

impl CallError {
    pub fn new(verb: Verb, kind: impl Into<BridgeError>) -> Self {
        CallError {
            verb,
            kind: kind.into(),
        }
    }
}

// Convert call errors to JS Error objects for the WASM boundary
impl From<CallError> for JsValue {
    fn from(err: CallError) -> Self {
        let js_err = js_sys::Error::new(&err.to_string());
        js_err.set_name(err.kind.kind());
        js_err.into()
    }
}

/// The protocol verbs exposed on the host namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    ResetGame,
    BoardPieces,
    PastTurns,
    CurrentTurn,
    MakeMove,
    PossibleMoves,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::ResetGame,
        Verb::BoardPieces,
        Verb::PastTurns,
        Verb::CurrentTurn,
        Verb::MakeMove,
        Verb::PossibleMoves,
    ];

    /// Name of the callable on the host namespace
    pub fn js_name(self) -> &'static str {
        match self {
            Verb::ResetGame => "resetGame",
            Verb::BoardPieces => "boardPieces",
            Verb::PastTurns => "pastTurns",
            Verb::CurrentTurn => "currentTurn",
            Verb::MakeMove => "makeMove",
            Verb::PossibleMoves => "possibleMoves",
        }
    }

    /// Exact number of arguments the verb accepts
    pub fn arity(self) -> usize {
        match self {
            Verb::ResetGame | Verb::BoardPieces | Verb::PastTurns | Verb::CurrentTurn => 0,
            Verb::PossibleMoves => 1,
            Verb::MakeMove => 2,
        }
    }

    /// Whether the verb needs an active session
    pub fn requires_session(self) -> bool {
        !matches!(self, Verb::ResetGame)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.js_name())
    }
}

/// One of the two players. Serialized as `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// Validate an untyped host value as a player identifier
    pub fn from_json(value: &serde_json::Value) -> Result<Player> {
        value
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(|n| Player::try_from(n).ok())
            .ok_or_else(|| BridgeError::InvalidPlayer(value.to_string()))
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> u8 {
        match player {
            Player::A => 1,
            Player::B => 2,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::A),
            2 => Ok(Player::B),
            other => Err(format!("player must be 1 or 2, got {}", other)),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Board coordinate, origin top left. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    pub fn x(self) -> i32 {
        self.0
    }

    pub fn y(self) -> i32 {
        self.1
    }

    /// Shifted point, clamped at the `i32` range
    pub fn offset(self, dx: i32, dy: i32) -> Point {
        Point(self.0.saturating_add(dx), self.1.saturating_add(dy))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

impl std::str::FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("point {:?} is not of the form x,y", s))?;
        let x = x
            .trim()
            .parse()
            .map_err(|e| format!("bad x in point {:?}: {}", s, e))?;
        let y = y
            .trim()
            .parse()
            .map_err(|e| format!("bad y in point {:?}: {}", s, e))?;
        Ok(Point(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_domain() {
        assert_eq!(Player::from_json(&json!(1)).unwrap(), Player::A);
        assert_eq!(Player::from_json(&json!(2)).unwrap(), Player::B);

        for bad in [json!(0), json!(3), json!(-1), json!(1.5), json!("1"), json!(null)] {
            let err = Player::from_json(&bad).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidPlayer(_)), "{:?} accepted", bad);
        }
    }

    #[test]
    fn test_player_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Player::B).unwrap(), "2");
        assert!(serde_json::from_str::<Player>("7").is_err());
    }

    #[test]
    fn test_point_text_and_json_forms() {
        let p: Point = "3,4".parse().unwrap();
        assert_eq!(p, Point(3, 4));
        assert_eq!(p.to_string(), "3,4");
        assert_eq!(serde_json::to_string(&p).unwrap(), "[3,4]");
        assert!("3;4".parse::<Point>().is_err());
        assert!("a,4".parse::<Point>().is_err());
    }

    #[test]
    fn test_point_offset_saturates() {
        assert_eq!(Point(i32::MAX, 0).offset(1, 1), Point(i32::MAX, 1));
        assert_eq!(Point(0, i32::MIN).offset(-2, -2), Point(-2, i32::MIN));
    }

    #[test]
    fn test_verb_arity_table() {
        assert_eq!(Verb::MakeMove.arity(), 2);
        assert_eq!(Verb::PossibleMoves.arity(), 1);
        assert!(!Verb::ResetGame.requires_session());
        assert!(Verb::ALL.iter().filter(|v| v.requires_session()).count() == 5);
    }

    #[test]
    fn test_call_error_message_names_verb() {
        let err = CallError::new(Verb::MakeMove, BridgeError::Arity { expected: 2, actual: 1 });
        assert_eq!(err.to_string(), "makeMove: expected 2 argument(s), got 1");
        assert_eq!(err.kind.kind(), "ArityError");
    }
}
