// Scouts Bridge - Rust/WASM Implementation
// Copyright 2025 Scouts Bridge Contributors
// Licensed under the Apache License, Version 2.0

//! # Scouts Bridge (Rust/WASM)
//!
//! Exposes a Scouts game engine to JavaScript as a namespace of callables
//! (`resetGame`, `boardPieces`, `pastTurns`, `currentTurn`, `makeMove`,
//! `possibleMoves`).
//!
//! ## Architecture
//!
//! - **Host**: JSON round trip between host values and typed records
//! - **Codec**: move payloads (structured objects or text tokens) to [`Move`]
//! - **Invoke**: promise and tuple calling conventions, panic containment
//! - **Dispatcher**: the single game session and the per-verb contract
//! - **Engine**: the rules interface, plus a small reference engine
//!
//! ## Calling conventions
//!
//! ```js
//! // promise (default), published as `Scouts`
//! await Scouts.makeMove(1, { type: "skip" });
//!
//! // tuple, published as `__Scouts`
//! const [pieces, err] = __Scouts.boardPieces();
//! ```
//!
//! ## Panics
//!
//! A panic inside a call becomes an `InternalFault` error when the module is
//! built with unwinding. Plain `wasm32-unknown-unknown` builds abort instead:
//! the failing call still rejects (or fills the error slot) with the
//! `RuntimeError`, and every later call on that namespace fails with
//! `InternalFault` until `install` is called again.

use wasm_bindgen::prelude::*;

// Module declarations
mod codec;
mod config;
mod dispatcher;
pub mod engine;
mod host;
mod invoke;
mod logging;
mod namespace;
mod types;

// Re-exports
pub use codec::{decode_move, encode_move, MoveProtocol};
pub use config::{BridgeConfig, Convention};
pub use dispatcher::{Dispatcher, SessionHandle};
pub use engine::{Engine, EngineError, GameSession, Move, MoveType};
pub use host::{decode, encode, HostValue};
pub use invoke::{contain, settle, tuple, Fault};
pub use types::{BridgeError, CallError, DecodeError, MarshalError, Player, Point, Result, Verb};

use engine::reference::ReferenceEngine;

// WASM initialization
#[wasm_bindgen(start)]
pub fn init() {
    invoke::install_fault_hook();

    let config = BridgeConfig::default();
    logging::init(config.level_filter());
    if let Err(err) = namespace::install(ReferenceEngine, &config) {
        log::error!("cannot install {}: {:?}", config.namespace(), err);
    }
}

/// Install (or reinstall) the namespace with the given options
///
/// Each install starts from an uninitialized session. Passing `undefined`
/// uses the defaults.
#[wasm_bindgen]
pub fn install(config: JsValue) -> std::result::Result<(), JsValue> {
    let config: BridgeConfig = if config.is_undefined() || config.is_null() {
        BridgeConfig::default()
    } else {
        host::decode(&config).map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))?
    };
    install_with(ReferenceEngine, &config)
}

/// Install the namespace over a caller-supplied engine
pub fn install_with<E: Engine + 'static>(
    engine: E,
    config: &BridgeConfig,
) -> std::result::Result<(), JsValue> {
    invoke::install_fault_hook();
    logging::init(config.level_filter());
    namespace::install(engine, config).map(|_| ())
}

// Version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
