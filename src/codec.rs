// Move payload decoding
//
// Two payload generations exist. The structured form is canonical; the text
// form is kept for hosts built against the older string encoding. Which one is
// in use comes from `MoveProtocol`, never from sniffing the payload.

use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};

use crate::engine::{BoulderMove, DashMove, JumpMove, Move, MoveType, PlaceScoutMove, SkipMove};
use crate::host::{self, HostValue};
use crate::types::{DecodeError, MarshalError};

/// Wire form of move payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveProtocol {
    /// `{ "type": "dash", "move": { "from": [1, 2], "to": [1, 3] } }`
    #[default]
    Structured,
    /// `"dash 1,2 1,3"`
    Text,
}

impl MoveProtocol {
    /// View `moves` in this wire form, for outbound records
    pub fn wire(self, moves: &[Move]) -> Vec<WireMove<'_>> {
        moves.iter().map(|mv| WireMove { mv, protocol: self }).collect()
    }
}

/// A move that serializes in the wire form of `protocol`
///
/// Moves read back from the bridge use the same form `makeMove` accepts.
#[derive(Debug, Clone, Copy)]
pub struct WireMove<'a> {
    pub mv: &'a Move,
    pub protocol: MoveProtocol,
}

impl Serialize for WireMove<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.protocol {
            MoveProtocol::Structured => self.mv.serialize(serializer),
            MoveProtocol::Text => serializer.collect_str(self.mv),
        }
    }
}

#[derive(Deserialize)]
struct MoveHeader {
    #[serde(rename = "type")]
    move_type: String,
    #[serde(default, rename = "move")]
    payload: serde_json::Value,
}

type TextDecoder = fn(&str) -> Result<Move, String>;

/// Text tags, most specific first so no tag can shadow a longer one
const TEXT_DECODERS: [(MoveType, TextDecoder); 5] = [
    (MoveType::PlaceScout, text_place_scout),
    (MoveType::Boulder, text_boulder),
    (MoveType::Dash, text_dash),
    (MoveType::Jump, text_jump),
    (MoveType::Skip, text_skip),
];

fn text_place_scout(args: &str) -> Result<Move, String> {
    args.parse().map(Move::PlaceScout)
}

fn text_boulder(args: &str) -> Result<Move, String> {
    args.parse().map(Move::Boulder)
}

fn text_dash(args: &str) -> Result<Move, String> {
    args.parse().map(Move::Dash)
}

fn text_jump(args: &str) -> Result<Move, String> {
    args.parse().map(Move::Jump)
}

// skip carries no payload, trailing text is ignored
fn text_skip(_: &str) -> Result<Move, String> {
    Ok(Move::Skip(SkipMove {}))
}

/// Decode a host move payload into a [`Move`]
pub fn decode_move<H: HostValue>(payload: &H, protocol: MoveProtocol) -> Result<Move, DecodeError> {
    match protocol {
        MoveProtocol::Structured => decode_structured(&payload.stringify()?),
        MoveProtocol::Text => decode_text(&host::decode::<String, H>(payload)?),
    }
}

/// Encode a [`Move`] in the given wire form
pub fn encode_move<H: HostValue>(mv: &Move, protocol: MoveProtocol) -> Result<H, MarshalError> {
    host::encode(&WireMove { mv, protocol })
}

/// Decode `{ "type": ..., "move": ... }` JSON text
pub fn decode_structured(json: &str) -> Result<Move, DecodeError> {
    let header: MoveHeader = serde_json::from_str(json)
        .map_err(|e| MarshalError::Decode(format!("{} in {}", e, json)))?;

    let move_type = MoveType::from_tag(&header.move_type).ok_or_else(|| {
        DecodeError::UnknownMoveType {
            input: json.to_string(),
        }
    })?;

    let malformed = |e: serde_json::Error| DecodeError::Malformed {
        token: json.to_string(),
        reason: e.to_string(),
    };

    let decoded = match move_type {
        MoveType::Boulder => payload::<BoulderMove>(header.payload).map(Move::Boulder),
        MoveType::Dash => payload::<DashMove>(header.payload).map(Move::Dash),
        MoveType::Jump => payload::<JumpMove>(header.payload).map(Move::Jump),
        MoveType::PlaceScout => payload::<PlaceScoutMove>(header.payload).map(Move::PlaceScout),
        MoveType::Skip => Ok(Move::Skip(SkipMove {})),
    };
    decoded.map_err(malformed)
}

fn payload<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

/// Decode a text token such as `"jump 2,3 2,5"`
pub fn decode_text(token: &str) -> Result<Move, DecodeError> {
    for (move_type, decoder) in TEXT_DECODERS {
        let Some(rest) = token.strip_prefix(move_type.tag()) else {
            continue;
        };
        // the tag must be followed by the delimiter or end the token
        let args = match rest.strip_prefix(' ') {
            Some(args) => args,
            None if rest.is_empty() => rest,
            None => continue,
        };
        return decoder(args).map_err(|reason| DecodeError::Malformed {
            token: token.to_string(),
            reason,
        });
    }

    Err(DecodeError::UnknownMoveType {
        input: token.to_string(),
    })
}
