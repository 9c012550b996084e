// Session dispatcher for the Scouts bridge
//
// Owns the single live session and runs every protocol verb against it.
// Contract per call, in order: exact arity, active session (except reset),
// valid player, then delegation to the engine.

use serde::Serialize;
use uuid::Uuid;

use crate::codec::{decode_move, MoveProtocol, WireMove};
use crate::engine::{CurrentTurn, Engine, GameSession, Move, PastTurn, Piece, PossibleMoves};
use crate::host::{self, HostValue};
use crate::types::{BridgeError, CallError, Player, Result, Verb};

/// The live session plus the id it is logged under
#[derive(Debug, Clone)]
pub struct SessionHandle<S> {
    pub id: Uuid,
    pub session: S,
}

// Outbound records with moves in the dispatcher's wire form

#[derive(Serialize)]
struct PastTurnReply<'a> {
    player: Player,
    moves: Vec<WireMove<'a>>,
}

#[derive(Serialize)]
struct CurrentTurnReply<'a> {
    player: Player,
    moves: Vec<WireMove<'a>>,
    plays: u32,
}

#[derive(Serialize)]
struct PossibleMovesReply<'a> {
    moves: Vec<WireMove<'a>>,
    can_place_boulder: bool,
}

/// Dispatches protocol verbs against one game session
///
/// The session starts uninitialized. `reset` creates it and every later
/// `reset` replaces it wholesale.
pub struct Dispatcher<E: Engine> {
    engine: E,
    protocol: MoveProtocol,
    session: Option<SessionHandle<E::Session>>,
}

impl<E: Engine> Dispatcher<E> {
    pub fn new(engine: E, protocol: MoveProtocol) -> Self {
        Dispatcher {
            engine,
            protocol,
            session: None,
        }
    }

    pub fn protocol(&self) -> MoveProtocol {
        self.protocol
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|handle| handle.id)
    }

    fn active(&self) -> Result<&SessionHandle<E::Session>> {
        self.session.as_ref().ok_or(BridgeError::NotInitialized)
    }

    /// Discard the current session and start a new game
    pub fn reset(&mut self) {
        let handle = SessionHandle {
            id: Uuid::new_v4(),
            session: self.engine.new_session(),
        };
        if let Some(old) = self.session.replace(handle) {
            log::debug!("discarded session {}", old.id);
        }
        log::info!("started session {}", self.session_id().unwrap_or_default());
    }

    pub fn board_pieces(&self) -> Result<Vec<Piece>> {
        Ok(self.active()?.session.board())
    }

    pub fn past_turns(&self) -> Result<Vec<PastTurn>> {
        Ok(self.active()?.session.past_turns())
    }

    pub fn current_turn(&self) -> Result<CurrentTurn> {
        Ok(self.active()?.session.current_turn())
    }

    pub fn possible_moves(&self, player: Player) -> Result<PossibleMoves> {
        Ok(self.active()?.session.possible_moves(player))
    }

    /// Apply `mv` for `player`
    ///
    /// The engine works on a staged copy that replaces the session only if
    /// the move is accepted.
    pub fn make_move(&mut self, player: Player, mv: &Move) -> Result<()> {
        let handle = self.session.as_mut().ok_or(BridgeError::NotInitialized)?;

        let mut staged = handle.session.clone();
        staged.apply_move(player, mv)?;
        handle.session = staged;

        log::debug!("session {}: player {} played {}", handle.id, player, mv);
        Ok(())
    }

    /// Run `verb` with raw host arguments
    ///
    /// This is the single operation core behind both calling conventions.
    pub fn call<H: HostValue>(&mut self, verb: Verb, args: &[H]) -> std::result::Result<H, CallError> {
        self.dispatch(verb, args).map_err(|kind| {
            log::warn!("{} failed: {}", verb, kind);
            CallError::new(verb, kind)
        })
    }

    fn dispatch<H: HostValue>(&mut self, verb: Verb, args: &[H]) -> Result<H> {
        if args.len() != verb.arity() {
            return Err(BridgeError::Arity {
                expected: verb.arity(),
                actual: args.len(),
            });
        }
        if verb.requires_session() && !self.is_active() {
            return Err(BridgeError::NotInitialized);
        }

        let reply = match verb {
            Verb::ResetGame => {
                self.reset();
                host::encode(&())?
            }
            Verb::BoardPieces => host::encode(&self.board_pieces()?)?,
            Verb::PastTurns => {
                let turns = self.past_turns()?;
                let reply: Vec<PastTurnReply<'_>> = turns
                    .iter()
                    .map(|turn| PastTurnReply {
                        player: turn.player,
                        moves: self.protocol().wire(&turn.moves),
                    })
                    .collect();
                host::encode(&reply)?
            }
            Verb::CurrentTurn => {
                let turn = self.current_turn()?;
                host::encode(&CurrentTurnReply {
                    player: turn.player,
                    moves: self.protocol().wire(&turn.moves),
                    plays: turn.plays,
                })?
            }
            Verb::MakeMove => {
                let player = player_arg(&args[0])?;
                let mv = decode_move(&args[1], self.protocol)?;
                self.make_move(player, &mv)?;
                host::encode(&())?
            }
            Verb::PossibleMoves => {
                let player = player_arg(&args[0])?;
                let possible = self.possible_moves(player)?;
                host::encode(&PossibleMovesReply {
                    moves: self.protocol().wire(&possible.moves),
                    can_place_boulder: possible.can_place_boulder,
                })?
            }
        };
        Ok(reply)
    }
}

fn player_arg<H: HostValue>(value: &H) -> Result<Player> {
    match host::decode::<serde_json::Value, H>(value) {
        Ok(raw) => Player::from_json(&raw),
        Err(e) => Err(BridgeError::InvalidPlayer(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reference::ReferenceEngine;
    use crate::engine::{EngineError, SkipMove};
    use crate::invoke;
    use serde_json::{json, Value};

    fn text_dispatcher() -> Dispatcher<ReferenceEngine> {
        Dispatcher::new(ReferenceEngine, MoveProtocol::Text)
    }

    fn started() -> Dispatcher<ReferenceEngine> {
        let mut dispatcher = text_dispatcher();
        dispatcher.call::<Value>(Verb::ResetGame, &[]).unwrap();
        dispatcher
    }

    #[test]
    fn test_verbs_before_reset_are_not_initialized() {
        let mut dispatcher = text_dispatcher();
        let calls: [(Verb, Vec<Value>); 5] = [
            (Verb::BoardPieces, vec![]),
            (Verb::PastTurns, vec![]),
            (Verb::CurrentTurn, vec![]),
            (Verb::MakeMove, vec![json!(1), json!("skip")]),
            (Verb::PossibleMoves, vec![json!(1)]),
        ];

        for (verb, args) in calls {
            let err = dispatcher.call(verb, args.as_slice()).unwrap_err();
            assert_eq!(err.verb, verb);
            assert!(matches!(err.kind, BridgeError::NotInitialized), "{}", err);
        }
        assert!(!dispatcher.is_active());
    }

    #[test]
    fn test_wrong_arity_names_counts() {
        let mut dispatcher = started();

        let err = dispatcher.call(Verb::MakeMove, &[json!(1)]).unwrap_err();
        assert!(matches!(err.kind, BridgeError::Arity { expected: 2, actual: 1 }));
        assert!(err.to_string().contains("expected 2"));

        let err = dispatcher.call(Verb::ResetGame, &[json!(true)]).unwrap_err();
        assert!(matches!(err.kind, BridgeError::Arity { expected: 0, actual: 1 }));

        let err = dispatcher.call::<Value>(Verb::PossibleMoves, &[]).unwrap_err();
        assert!(matches!(err.kind, BridgeError::Arity { expected: 1, actual: 0 }));
    }

    #[test]
    fn test_arity_is_checked_before_initialization() {
        let mut dispatcher = text_dispatcher();
        let err = dispatcher.call::<Value>(Verb::MakeMove, &[]).unwrap_err();
        assert!(matches!(err.kind, BridgeError::Arity { .. }));
    }

    #[test]
    fn test_invalid_player_leaves_session_untouched() {
        let mut dispatcher = started();
        let before = dispatcher.current_turn().unwrap();

        for bad in [json!(0), json!(3), json!("one"), json!(null)] {
            let err = dispatcher.call(Verb::MakeMove, &[bad, json!("skip")]).unwrap_err();
            assert!(matches!(err.kind, BridgeError::InvalidPlayer(_)), "{}", err);
        }
        let err = dispatcher.call(Verb::PossibleMoves, &[json!(9)]).unwrap_err();
        assert_eq!(err.kind.kind(), "ValidationError");

        assert_eq!(dispatcher.current_turn().unwrap(), before);
        assert!(dispatcher.past_turns().unwrap().is_empty());
    }

    #[test]
    fn test_possible_moves_after_reset() {
        let mut dispatcher = started();
        let reply = dispatcher.call(Verb::PossibleMoves, &[json!(1)]).unwrap();

        assert_eq!(reply["moves"][0], json!("place_scout 0,9"));
        assert!(reply["moves"].as_array().unwrap().contains(&json!("skip")));
        assert!(reply["can_place_boulder"].as_bool().unwrap());
    }

    #[test]
    fn test_replies_feed_back_into_make_move() {
        for protocol in [MoveProtocol::Text, MoveProtocol::Structured] {
            let mut dispatcher = Dispatcher::new(ReferenceEngine, protocol);
            assert_eq!(dispatcher.protocol(), protocol);
            dispatcher.call::<Value>(Verb::ResetGame, &[]).unwrap();

            let possible = dispatcher.call(Verb::PossibleMoves, &[json!(1)]).unwrap();
            let first = possible["moves"][0].clone();
            dispatcher.call(Verb::MakeMove, &[json!(1), first.clone()]).unwrap();

            let current = dispatcher.call::<Value>(Verb::CurrentTurn, &[]).unwrap();
            assert_eq!(current["moves"], json!([first]), "{:?}", protocol);
        }
    }

    #[test]
    fn test_skip_advances_turn() {
        let mut dispatcher = started();
        let reply = dispatcher.call(Verb::MakeMove, &[json!(1), json!("skip")]).unwrap();
        assert_eq!(reply, Value::Null);

        let current = dispatcher.call::<Value>(Verb::CurrentTurn, &[]).unwrap();
        assert_eq!(current, json!({ "player": 2, "moves": [], "plays": 0 }));

        let past = dispatcher.call::<Value>(Verb::PastTurns, &[]).unwrap();
        assert_eq!(past, json!([{ "player": 1, "moves": ["skip"] }]));
    }

    #[test]
    fn test_unknown_tag_reports_raw_token() {
        let mut dispatcher = started();
        let err = dispatcher
            .call(Verb::MakeMove, &[json!(1), json!("UnknownTag:garbage")])
            .unwrap_err();

        assert_eq!(err.kind.kind(), "DecodeError");
        assert!(err.to_string().contains("UnknownTag:garbage"));
        assert!(err.to_string().starts_with("makeMove: "));
    }

    #[test]
    fn test_structured_protocol_moves() {
        let mut dispatcher = Dispatcher::new(ReferenceEngine, MoveProtocol::Structured);
        dispatcher.call::<Value>(Verb::ResetGame, &[]).unwrap();

        let place = json!({ "type": "place_scout", "move": { "position": [2, 9] } });
        dispatcher.call(Verb::MakeMove, &[json!(1), place]).unwrap();

        let board = dispatcher.call::<Value>(Verb::BoardPieces, &[]).unwrap();
        assert_eq!(
            board,
            json!([{ "kind": "scout", "player": 1, "position": [2, 9], "returning": false }])
        );

        let current = dispatcher.call::<Value>(Verb::CurrentTurn, &[]).unwrap();
        assert_eq!(
            current["moves"],
            json!([{ "type": "place_scout", "move": { "position": [2, 9] } }])
        );

        // text payloads are not accepted under the structured protocol
        let err = dispatcher.call(Verb::MakeMove, &[json!(1), json!("skip")]).unwrap_err();
        assert_eq!(err.kind.kind(), "DecodeError");
    }

    #[test]
    fn test_extreme_coordinates_are_engine_errors() {
        let mut dispatcher = Dispatcher::new(ReferenceEngine, MoveProtocol::Structured);
        dispatcher.call::<Value>(Verb::ResetGame, &[]).unwrap();

        let boulder = json!({ "type": "boulder", "move": { "position": [2147483647, 0] } });
        let (value, error) = invoke::tuple(Verb::MakeMove, || {
            dispatcher.call(Verb::MakeMove, &[json!(1), boulder])
        });
        assert!(value.is_none());
        assert_eq!(error.unwrap().kind.kind(), "EngineError");

        let mut dispatcher = started();
        dispatcher.call(Verb::MakeMove, &[json!(1), json!("place_scout 1,9")]).unwrap();
        let (_, error) = invoke::tuple(Verb::MakeMove, || {
            dispatcher.call(Verb::MakeMove, &[json!(1), json!("dash 1,9 -2147483648,9")])
        });
        assert_eq!(error.unwrap().kind.kind(), "EngineError");
        assert_eq!(dispatcher.current_turn().unwrap().plays, 1);
    }

    #[test]
    fn test_engine_rejection_is_engine_error() {
        let mut dispatcher = started();
        let before = dispatcher.current_turn().unwrap();

        let err = dispatcher.call(Verb::MakeMove, &[json!(2), json!("skip")]).unwrap_err();
        assert!(matches!(err.kind, BridgeError::Engine(EngineError::NotYourTurn(Player::B))));

        let err = dispatcher
            .call(Verb::MakeMove, &[json!(1), json!("place_scout 0,0")])
            .unwrap_err();
        assert_eq!(err.kind.kind(), "EngineError");
        assert_eq!(dispatcher.current_turn().unwrap(), before);
    }

    #[test]
    fn test_second_reset_clears_history() {
        let mut dispatcher = started();
        let first = dispatcher.session_id();
        dispatcher.call(Verb::MakeMove, &[json!(1), json!("skip")]).unwrap();
        dispatcher.call(Verb::MakeMove, &[json!(2), json!("skip")]).unwrap();
        assert_eq!(dispatcher.past_turns().unwrap().len(), 2);

        dispatcher.call::<Value>(Verb::ResetGame, &[]).unwrap();
        assert!(dispatcher.past_turns().unwrap().is_empty());
        assert_eq!(dispatcher.current_turn().unwrap().player, Player::A);
        assert_ne!(dispatcher.session_id(), first);
    }

    /// Session that mutates itself before rejecting every move
    #[derive(Debug, Clone, Default)]
    struct SloppySession {
        moves: Vec<Move>,
    }

    impl GameSession for SloppySession {
        fn apply_move(&mut self, _: Player, mv: &Move) -> std::result::Result<(), EngineError> {
            self.moves.push(*mv);
            Err(EngineError::illegal(mv, "always rejected"))
        }

        fn possible_moves(&self, _: Player) -> PossibleMoves {
            PossibleMoves::default()
        }

        fn board(&self) -> Vec<Piece> {
            // index past the end to emulate an engine bug
            vec![Vec::<Piece>::new()[self.moves.len()].clone()]
        }

        fn past_turns(&self) -> Vec<PastTurn> {
            Vec::new()
        }

        fn current_turn(&self) -> CurrentTurn {
            CurrentTurn {
                player: Player::A,
                moves: self.moves.clone(),
                plays: self.moves.len() as u32,
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct SloppyEngine;

    impl Engine for SloppyEngine {
        type Session = SloppySession;

        fn new_session(&self) -> SloppySession {
            SloppySession::default()
        }
    }

    #[test]
    fn test_rejected_move_is_not_committed() {
        let mut dispatcher = Dispatcher::new(SloppyEngine, MoveProtocol::Text);
        dispatcher.reset();

        let skip = Move::Skip(SkipMove {});
        assert!(matches!(
            dispatcher.make_move(Player::A, &skip),
            Err(BridgeError::Engine(_))
        ));
        assert!(dispatcher.current_turn().unwrap().moves.is_empty());
    }

    #[test]
    fn test_engine_panic_is_contained() {
        let mut dispatcher = Dispatcher::new(SloppyEngine, MoveProtocol::Text);
        dispatcher.reset();

        let (value, error) = invoke::tuple(Verb::BoardPieces, || {
            dispatcher.call::<Value>(Verb::BoardPieces, &[])
        });
        assert!(value.is_none());
        let error = error.unwrap();
        assert!(matches!(error.kind, BridgeError::Fault(_)));
        assert!(error.to_string().contains("index out of bounds"));

        // the dispatcher keeps serving calls afterwards
        let current = invoke::settle(Verb::CurrentTurn, || {
            dispatcher.call::<Value>(Verb::CurrentTurn, &[])
        })
        .unwrap();
        assert_eq!(current["plays"], json!(0));
    }
}
