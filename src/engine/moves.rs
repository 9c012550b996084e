// Move commands and their compact text encoding
//
// Text forms:
//   boulder x,y
//   dash x,y x,y
//   jump x,y x,y
//   place_scout x,y
//   skip

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Point;

/// Discriminant of a [`Move`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    Boulder,
    Dash,
    Jump,
    PlaceScout,
    Skip,
}

impl MoveType {
    pub const ALL: [MoveType; 5] = [
        MoveType::Boulder,
        MoveType::Dash,
        MoveType::Jump,
        MoveType::PlaceScout,
        MoveType::Skip,
    ];

    /// Literal tag used in both wire forms
    pub fn tag(self) -> &'static str {
        match self {
            MoveType::Boulder => "boulder",
            MoveType::Dash => "dash",
            MoveType::Jump => "jump",
            MoveType::PlaceScout => "place_scout",
            MoveType::Skip => "skip",
        }
    }

    pub fn from_tag(tag: &str) -> Option<MoveType> {
        MoveType::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Place a 2x2 boulder whose top-left cell is `position`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoulderMove {
    pub position: Point,
}

/// Step a scout to an adjacent cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashMove {
    pub from: Point,
    pub to: Point,
}

/// Hop a scout over an adjacent piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JumpMove {
    pub from: Point,
    pub to: Point,
}

/// Put a new scout on the player's home row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaceScoutMove {
    pub position: Point,
}

/// End the turn without acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkipMove {}

/// A single game action
///
/// Serialized in the structured form `{ "type": <tag>, "move": { ... } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "move", rename_all = "snake_case")]
pub enum Move {
    Boulder(BoulderMove),
    Dash(DashMove),
    Jump(JumpMove),
    PlaceScout(PlaceScoutMove),
    Skip(SkipMove),
}

impl Move {
    pub fn move_type(&self) -> MoveType {
        match self {
            Move::Boulder(_) => MoveType::Boulder,
            Move::Dash(_) => MoveType::Dash,
            Move::Jump(_) => MoveType::Jump,
            Move::PlaceScout(_) => MoveType::PlaceScout,
            Move::Skip(_) => MoveType::Skip,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Boulder(m) => write!(f, "boulder {}", m.position),
            Move::Dash(m) => write!(f, "dash {} {}", m.from, m.to),
            Move::Jump(m) => write!(f, "jump {} {}", m.from, m.to),
            Move::PlaceScout(m) => write!(f, "place_scout {}", m.position),
            Move::Skip(_) => f.write_str("skip"),
        }
    }
}

/// Split `args` into exactly `N` space separated points
fn points<const N: usize>(args: &str) -> Result<[Point; N], String> {
    let fields: Vec<&str> = args.split_whitespace().collect();
    if fields.len() != N {
        return Err(format!("expected {} point(s), got {}", N, fields.len()));
    }
    let mut out = [Point(0, 0); N];
    for (slot, field) in out.iter_mut().zip(fields) {
        *slot = field.parse()?;
    }
    Ok(out)
}

impl FromStr for BoulderMove {
    type Err = String;

    fn from_str(args: &str) -> Result<Self, Self::Err> {
        let [position] = points(args)?;
        Ok(BoulderMove { position })
    }
}

impl FromStr for DashMove {
    type Err = String;

    fn from_str(args: &str) -> Result<Self, Self::Err> {
        let [from, to] = points(args)?;
        Ok(DashMove { from, to })
    }
}

impl FromStr for JumpMove {
    type Err = String;

    fn from_str(args: &str) -> Result<Self, Self::Err> {
        let [from, to] = points(args)?;
        Ok(JumpMove { from, to })
    }
}

impl FromStr for PlaceScoutMove {
    type Err = String;

    fn from_str(args: &str) -> Result<Self, Self::Err> {
        let [position] = points(args)?;
        Ok(PlaceScoutMove { position })
    }
}
