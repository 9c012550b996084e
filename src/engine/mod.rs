// Engine interface consumed by the bridge
//
// The bridge never decides legality. It hands typed moves to a `GameSession`
// and forwards whatever records the session reports.

use serde::{Deserialize, Serialize};

use crate::types::{Player, Point};

mod moves;
pub mod reference;

pub use moves::{BoulderMove, DashMove, JumpMove, Move, MoveType, PlaceScoutMove, SkipMove};

/// Rejections reported by the rules engine
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("it is not player {0}'s turn")]
    NotYourTurn(Player),

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },
}

impl EngineError {
    pub fn illegal(mv: &Move, reason: impl Into<String>) -> Self {
        EngineError::IllegalMove {
            mv: mv.to_string(),
            reason: reason.into(),
        }
    }
}

/// A piece on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Piece {
    Scout {
        player: Player,
        position: Point,
        returning: bool,
    },
    Boulder {
        player: Player,
        position: [Point; 4],
    },
}

/// A finished turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastTurn {
    pub player: Player,
    pub moves: Vec<Move>,
}

/// The turn in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTurn {
    pub player: Player,
    pub moves: Vec<Move>,
    pub plays: u32,
}

/// Legal moves for a player
///
/// `moves` never contains boulder moves; boulder placement is reported only
/// through `can_place_boulder`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PossibleMoves {
    pub moves: Vec<Move>,
    pub can_place_boulder: bool,
}

/// One live game
pub trait GameSession {
    /// Validate and apply `mv` for `player`. On error the session must be
    /// unchanged.
    fn apply_move(&mut self, player: Player, mv: &Move) -> Result<(), EngineError>;

    fn possible_moves(&self, player: Player) -> PossibleMoves;

    fn board(&self) -> Vec<Piece>;

    fn past_turns(&self) -> Vec<PastTurn>;

    fn current_turn(&self) -> CurrentTurn;
}

/// Factory for fresh sessions
pub trait Engine {
    type Session: GameSession + Clone;

    fn new_session(&self) -> Self::Session;
}
