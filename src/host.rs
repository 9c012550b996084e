// Object marshaling between host values and typed records
//
// Host values and Rust records share no structural mapping, so every value
// crosses the boundary as JSON text: stringify on the way in, parse on the
// way out.

use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::types::MarshalError;

/// An opaque value owned by the host runtime
///
/// The bridge never inspects a host value directly. All structural access
/// happens after [`decode`] has turned it into a concrete Rust type.
pub trait HostValue: Sized {
    /// Render the value as JSON text
    fn stringify(&self) -> Result<String, MarshalError>;

    /// Build a host value from JSON text
    fn parse(text: &str) -> Result<Self, MarshalError>;
}

impl HostValue for JsValue {
    fn stringify(&self) -> Result<String, MarshalError> {
        let text = js_sys::JSON::stringify(self)
            .map_err(|e| MarshalError::Decode(describe_js(&e)))?;
        // JSON.stringify yields undefined for undefined, functions and symbols
        text.as_string().ok_or(MarshalError::Unrepresentable)
    }

    fn parse(text: &str) -> Result<Self, MarshalError> {
        js_sys::JSON::parse(text).map_err(|e| MarshalError::Encode(describe_js(&e)))
    }
}

/// Native host used by tests and non-WASM embedders
impl HostValue for serde_json::Value {
    fn stringify(&self) -> Result<String, MarshalError> {
        serde_json::to_string(self).map_err(|e| MarshalError::Decode(e.to_string()))
    }

    fn parse(text: &str) -> Result<Self, MarshalError> {
        serde_json::from_str(text).map_err(|e| MarshalError::Encode(e.to_string()))
    }
}

/// Serialize a record and hand it to the host as a native value
pub fn encode<H: HostValue, T: Serialize + ?Sized>(record: &T) -> Result<H, MarshalError> {
    let text = serde_json::to_string(record).map_err(|e| MarshalError::Encode(e.to_string()))?;
    H::parse(&text)
}

/// Read a host value into a typed record
pub fn decode<T: DeserializeOwned, H: HostValue>(value: &H) -> Result<T, MarshalError> {
    let text = value.stringify()?;
    serde_json::from_str(&text).map_err(|e| MarshalError::Decode(e.to_string()))
}

fn describe_js(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
