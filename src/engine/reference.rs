// Reference engine shipped with the bridge
//
// A small rule set that lets the WASM module run on its own. A full
// Scouts engine plugs in through the same `Engine` trait.
//
// Rules:
// - 8x10 board. Player 1 starts on row 9, player 2 on row 0.
// - A turn is up to PLAYS_PER_TURN moves; `skip` ends it early.
// - place_scout: empty cell on the player's home row, at most MAX_SCOUTS.
// - dash: own scout to an adjacent empty cell (8 directions).
// - jump: own scout over an adjacent piece to the empty cell beyond it.
// - boulder: once per game, a 2x2 block on empty cells.
// - A scout that reaches the opponent's home row is marked returning.

use crate::engine::{
    BoulderMove, CurrentTurn, DashMove, Engine, EngineError, GameSession, JumpMove, Move, PastTurn, Piece,
    PlaceScoutMove, PossibleMoves, SkipMove,
};
use crate::types::{Player, Point};

pub const WIDTH: i32 = 8;
pub const HEIGHT: i32 = 10;
pub const MAX_SCOUTS: usize = 5;
pub const PLAYS_PER_TURN: u32 = 3;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Engine handing out [`ReferenceSession`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine;

impl Engine for ReferenceEngine {
    type Session = ReferenceSession;

    fn new_session(&self) -> ReferenceSession {
        ReferenceSession::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Scout {
    player: Player,
    position: Point,
    returning: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Boulder {
    player: Player,
    corner: Point,
}

impl Boulder {
    fn cells(&self) -> [Point; 4] {
        boulder_cells(self.corner)
    }
}

fn boulder_cells(corner: Point) -> [Point; 4] {
    [
        corner,
        corner.offset(1, 0),
        corner.offset(0, 1),
        corner.offset(1, 1),
    ]
}

fn in_bounds(p: Point) -> bool {
    (0..WIDTH).contains(&p.x()) && (0..HEIGHT).contains(&p.y())
}

/// Cells named by `mv`
fn move_cells(mv: &Move) -> Vec<Point> {
    match *mv {
        Move::Boulder(BoulderMove { position }) | Move::PlaceScout(PlaceScoutMove { position }) => {
            vec![position]
        }
        Move::Dash(DashMove { from, to }) | Move::Jump(JumpMove { from, to }) => vec![from, to],
        Move::Skip(_) => Vec::new(),
    }
}

fn home_row(player: Player) -> i32 {
    match player {
        Player::A => HEIGHT - 1,
        Player::B => 0,
    }
}

/// Game state for the reference rules
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSession {
    scouts: Vec<Scout>,
    boulders: Vec<Boulder>,
    past: Vec<PastTurn>,
    current: CurrentTurn,
}

impl ReferenceSession {
    pub fn new() -> Self {
        ReferenceSession {
            scouts: Vec::new(),
            boulders: Vec::new(),
            past: Vec::new(),
            current: CurrentTurn {
                player: Player::A,
                moves: Vec::new(),
                plays: 0,
            },
        }
    }

    fn occupied(&self, p: Point) -> bool {
        self.scouts.iter().any(|s| s.position == p)
            || self.boulders.iter().any(|b| b.cells().contains(&p))
    }

    fn free(&self, p: Point) -> bool {
        in_bounds(p) && !self.occupied(p)
    }

    fn scout_index(&self, player: Player, at: Point) -> Option<usize> {
        self.scouts
            .iter()
            .position(|s| s.player == player && s.position == at)
    }

    fn scout_count(&self, player: Player) -> usize {
        self.scouts.iter().filter(|s| s.player == player).count()
    }

    fn has_boulder(&self, player: Player) -> bool {
        self.boulders.iter().any(|b| b.player == player)
    }

    fn boulder_fits(&self, corner: Point) -> bool {
        boulder_cells(corner).iter().all(|&c| self.free(c))
    }

    fn check(&self, player: Player, mv: &Move) -> Result<(), EngineError> {
        // coordinates below are only compared and subtracted once on the board
        if !move_cells(mv).into_iter().all(in_bounds) {
            return Err(EngineError::illegal(
                mv,
                format!("{} leaves the board", mv.move_type()),
            ));
        }

        match mv {
            Move::Skip(_) => Ok(()),
            Move::PlaceScout(m) => {
                if m.position.y() != home_row(player) {
                    return Err(EngineError::illegal(mv, "scouts are placed on the home row"));
                }
                if !self.free(m.position) {
                    return Err(EngineError::illegal(mv, "cell is not free"));
                }
                if self.scout_count(player) >= MAX_SCOUTS {
                    return Err(EngineError::illegal(mv, "no scouts left to place"));
                }
                Ok(())
            }
            Move::Dash(m) => {
                self.scout_index(player, m.from)
                    .ok_or_else(|| EngineError::illegal(mv, "no own scout at origin"))?;
                let (dx, dy) = (m.to.x() - m.from.x(), m.to.y() - m.from.y());
                if dx.abs() > 1 || dy.abs() > 1 || (dx, dy) == (0, 0) {
                    return Err(EngineError::illegal(mv, "dash moves one cell"));
                }
                if !self.free(m.to) {
                    return Err(EngineError::illegal(mv, "target is not free"));
                }
                Ok(())
            }
            Move::Jump(m) => {
                self.scout_index(player, m.from)
                    .ok_or_else(|| EngineError::illegal(mv, "no own scout at origin"))?;
                let (dx, dy) = (m.to.x() - m.from.x(), m.to.y() - m.from.y());
                let straight = (dx.abs() == 2 || dx == 0) && (dy.abs() == 2 || dy == 0);
                if !straight || (dx, dy) == (0, 0) {
                    return Err(EngineError::illegal(mv, "jump moves two cells in a line"));
                }
                if !self.occupied(m.from.offset(dx / 2, dy / 2)) {
                    return Err(EngineError::illegal(mv, "nothing to jump over"));
                }
                if !self.free(m.to) {
                    return Err(EngineError::illegal(mv, "target is not free"));
                }
                Ok(())
            }
            Move::Boulder(m) => {
                if self.has_boulder(player) {
                    return Err(EngineError::illegal(mv, "boulder already placed"));
                }
                if !self.boulder_fits(m.position) {
                    return Err(EngineError::illegal(mv, "boulder does not fit"));
                }
                Ok(())
            }
        }
    }

    fn relocate(&mut self, player: Player, from: Point, to: Point) {
        if let Some(i) = self.scout_index(player, from) {
            let scout = &mut self.scouts[i];
            scout.position = to;
            if to.y() == home_row(player.opponent()) {
                scout.returning = true;
            }
        }
    }

    fn end_turn(&mut self) {
        let next = CurrentTurn {
            player: self.current.player.opponent(),
            moves: Vec::new(),
            plays: 0,
        };
        let done = std::mem::replace(&mut self.current, next);
        self.past.push(PastTurn {
            player: done.player,
            moves: done.moves,
        });
    }
}

impl Default for ReferenceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession for ReferenceSession {
    fn apply_move(&mut self, player: Player, mv: &Move) -> Result<(), EngineError> {
        if player != self.current.player {
            return Err(EngineError::NotYourTurn(player));
        }
        self.check(player, mv)?;

        match *mv {
            Move::Skip(_) => {}
            Move::PlaceScout(m) => self.scouts.push(Scout {
                player,
                position: m.position,
                returning: false,
            }),
            Move::Dash(m) => self.relocate(player, m.from, m.to),
            Move::Jump(m) => self.relocate(player, m.from, m.to),
            Move::Boulder(m) => self.boulders.push(Boulder {
                player,
                corner: m.position,
            }),
        }

        self.current.moves.push(*mv);
        self.current.plays += 1;
        if matches!(mv, Move::Skip(_)) || self.current.plays >= PLAYS_PER_TURN {
            self.end_turn();
        }
        Ok(())
    }

    fn possible_moves(&self, player: Player) -> PossibleMoves {
        if player != self.current.player {
            return PossibleMoves::default();
        }

        let mut moves = Vec::new();

        if self.scout_count(player) < MAX_SCOUTS {
            let row = home_row(player);
            moves.extend(
                (0..WIDTH)
                    .map(|x| Point(x, row))
                    .filter(|&p| self.free(p))
                    .map(|position| Move::PlaceScout(PlaceScoutMove { position })),
            );
        }

        for scout in self.scouts.iter().filter(|s| s.player == player) {
            let from = scout.position;
            for (dx, dy) in DIRECTIONS {
                let step = from.offset(dx, dy);
                if self.free(step) {
                    moves.push(Move::Dash(DashMove { from, to: step }));
                } else if in_bounds(step) {
                    let to = from.offset(2 * dx, 2 * dy);
                    if self.free(to) {
                        moves.push(Move::Jump(JumpMove { from, to }));
                    }
                }
            }
        }

        moves.push(Move::Skip(SkipMove {}));

        let can_place_boulder = !self.has_boulder(player)
            && (0..HEIGHT - 1)
                .flat_map(|y| (0..WIDTH - 1).map(move |x| Point(x, y)))
                .any(|corner| self.boulder_fits(corner));

        PossibleMoves {
            moves,
            can_place_boulder,
        }
    }

    fn board(&self) -> Vec<Piece> {
        let scouts = self.scouts.iter().map(|s| Piece::Scout {
            player: s.player,
            position: s.position,
            returning: s.returning,
        });
        let boulders = self.boulders.iter().map(|b| Piece::Boulder {
            player: b.player,
            position: b.cells(),
        });
        scouts.chain(boulders).collect()
    }

    fn past_turns(&self) -> Vec<PastTurn> {
        self.past.clone()
    }

    fn current_turn(&self) -> CurrentTurn {
        self.current.clone()
    }
}
