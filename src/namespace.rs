// Host namespace: the global object of callables JavaScript sees
//
// JavaScript usage (promise convention):
// ```js
// await Scouts.resetGame();
// await Scouts.makeMove(1, { type: "place_scout", move: { position: [0, 9] } });
// const { moves } = await Scouts.possibleMoves(2);
// ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::config::{BridgeConfig, Convention};
use crate::dispatcher::Dispatcher;
use crate::engine::Engine;
use crate::invoke::{self, Fault};
use crate::types::{CallError, Verb};

type Shared<E> = Rc<RefCell<Dispatcher<E>>>;

// Both wrappers spread the arguments so the dispatcher sees the real count.
// Anything thrown out of `handler`, a wasm trap included, lands in the
// rejection or the error slot.
const PROMISE_WRAPPER: &str = "return function (...args) { \
    return new Promise((resolve, reject) => queueMicrotask(() => { \
        try { handler(args).then(resolve, reject); } catch (e) { reject(e); } \
    })); \
};";

const TUPLE_WRAPPER: &str = "return function (...args) { \
    try { return handler(args); } catch (e) { return [undefined, e]; } \
};";

/// Build the namespace for `engine` and publish it on the global object
///
/// Every callable shares one dispatcher and follows `config.convention`.
pub fn install<E: Engine + 'static>(engine: E, config: &BridgeConfig) -> Result<Object, JsValue> {
    let dispatcher: Shared<E> = Rc::new(RefCell::new(Dispatcher::new(engine, config.protocol)));

    let namespace = Object::new();
    for verb in Verb::ALL {
        let callable = callable(verb, config.convention, Rc::clone(&dispatcher))?;
        Reflect::set(&namespace, &JsValue::from_str(verb.js_name()), &callable)?;
    }

    Reflect::set(
        &js_sys::global(),
        &JsValue::from_str(config.namespace()),
        &namespace,
    )?;

    log::info!(
        "installed {} ({:?} convention, {:?} moves)",
        config.namespace(),
        config.convention,
        config.protocol
    );
    Ok(namespace)
}

fn callable<E: Engine + 'static>(
    verb: Verb,
    convention: Convention,
    dispatcher: Shared<E>,
) -> Result<Function, JsValue> {
    let handler: Box<dyn FnMut(Array) -> JsValue> = match convention {
        Convention::Promise => Box::new(move |args: Array| {
            let args = args.to_vec();
            invoke::promise(verb, || run(&dispatcher, verb, args.as_slice())).into()
        }),
        Convention::Tuple => Box::new(move |args: Array| {
            let args = args.to_vec();
            invoke::tuple_array(verb, || run(&dispatcher, verb, args.as_slice())).into()
        }),
    };

    let wrapper = match convention {
        Convention::Promise => PROMISE_WRAPPER,
        Convention::Tuple => TUPLE_WRAPPER,
    };
    variadic(wrapper, Closure::wrap(handler))
}

/// A trap skips the `RefMut` drop, so a held borrow means an earlier call died
fn run<E: Engine>(dispatcher: &Shared<E>, verb: Verb, args: &[JsValue]) -> Result<JsValue, CallError> {
    match dispatcher.try_borrow_mut() {
        Ok(mut dispatcher) => dispatcher.call(verb, args),
        Err(_) => Err(CallError::new(verb, Fault::interrupted())),
    }
}

/// Expose `handler` through the JS `wrapper` body
fn variadic(wrapper: &str, handler: Closure<dyn FnMut(Array) -> JsValue>) -> Result<Function, JsValue> {
    let spread = Function::new_with_args("handler", wrapper);
    let callable = spread.call1(&JsValue::NULL, &handler.into_js_value())?;
    Ok(callable.unchecked_into())
}
