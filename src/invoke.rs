// Invocation bridge: calling conventions and panic containment
//
// Every host call goes through `contain`, so a panic anywhere below the
// boundary is reported as a failed call instead of tearing down the module.
// Two adapters sit on top of the same core:
//
// - promise: settles a Promise exactly once, to a value or an error.
// - tuple:   returns `[value, error]`.
//
// The JS wrappers installed by `namespace` defer promise work to its own
// microtask and catch whatever escapes a call. On wasm32 builds without
// unwinding a panic traps instead of reaching `catch_unwind`; the wrappers turn
// that trap into a rejection or an error slot.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use wasm_bindgen::prelude::*;

use crate::types::{CallError, Verb};

/// A panic caught at the boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub message: String,
    pub location: Option<String>,
    pub backtrace: String,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic occurred: {}", self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        write!(f, "\nstack: {}", self.backtrace)
    }
}

impl std::error::Error for Fault {}

struct FaultSite {
    location: Option<String>,
    backtrace: String,
}

thread_local! {
    static LAST_SITE: RefCell<Option<FaultSite>> = const { RefCell::new(None) };
}

impl Fault {
    /// Reported once a trapped call left the dispatcher unusable
    pub fn interrupted() -> Fault {
        Fault {
            message: "an earlier call aborted mid-operation, reinstall the namespace".to_string(),
            location: None,
            backtrace: "unavailable".to_string(),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Fault {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        let site = LAST_SITE.with(|slot| slot.borrow_mut().take());
        let (location, backtrace) = match site {
            Some(site) => (site.location, site.backtrace),
            None => (None, "unavailable".to_string()),
        };

        Fault {
            message,
            location,
            backtrace,
        }
    }
}

/// Install the panic hook that records where a panic happened
///
/// Chains to `console_error_panic_hook` in the browser and to the previous
/// hook elsewhere. Safe to call repeatedly.
pub fn install_fault_hook() {
    static HOOK: Once = Once::new();

    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let site = FaultSite {
                location: info.location().map(|l| l.to_string()),
                backtrace: Backtrace::force_capture().to_string(),
            };
            LAST_SITE.with(|slot| *slot.borrow_mut() = Some(site));

            if cfg!(target_arch = "wasm32") {
                console_error_panic_hook::hook(info);
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `op`, turning a panic into a [`Fault`]
pub fn contain<R>(op: impl FnOnce() -> R) -> Result<R, Fault> {
    install_fault_hook();
    panic::catch_unwind(AssertUnwindSafe(op)).map_err(Fault::from_panic)
}

fn finish<T>(verb: Verb, outcome: Result<Result<T, CallError>, Fault>) -> Result<T, CallError> {
    match outcome {
        Ok(result) => result,
        Err(fault) => {
            log::error!("{}: {}", verb, fault);
            Err(CallError::new(verb, fault))
        }
    }
}

/// Promise-convention core: resolves once, to a value or an error
pub fn settle<T, F>(verb: Verb, op: F) -> Result<T, CallError>
where
    F: FnOnce() -> Result<T, CallError>,
{
    let outcome = finish(verb, contain(op));
    match &outcome {
        Ok(_) => log::debug!("{}: promise resolved", verb),
        Err(err) => log::debug!("{}: promise rejected: {}", verb, err),
    }
    outcome
}

/// Tuple-convention core: exactly one side is `Some`
pub fn tuple<T, F>(verb: Verb, op: F) -> (Option<T>, Option<CallError>)
where
    F: FnOnce() -> Result<T, CallError>,
{
    match finish(verb, contain(op)) {
        Ok(value) => (Some(value), None),
        Err(err) => {
            log::debug!("{}: returning error: {}", verb, err);
            (None, Some(err))
        }
    }
}

/// Run `op` and wrap its outcome as an already settled JS Promise
pub fn promise<F>(verb: Verb, op: F) -> js_sys::Promise
where
    F: FnOnce() -> Result<JsValue, CallError>,
{
    match settle(verb, op) {
        Ok(value) => js_sys::Promise::resolve(&value),
        Err(err) => js_sys::Promise::reject(&JsValue::from(err)),
    }
}

/// Wrap `op` as a JS `[value, error]` pair
pub fn tuple_array<F>(verb: Verb, op: F) -> js_sys::Array
where
    F: FnOnce() -> Result<JsValue, CallError>,
{
    let (value, error) = tuple(verb, op);
    js_sys::Array::of2(
        &value.unwrap_or(JsValue::UNDEFINED),
        &error.map(JsValue::from).unwrap_or(JsValue::UNDEFINED),
    )
}
