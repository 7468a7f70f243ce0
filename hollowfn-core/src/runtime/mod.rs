//! Runtime layer: the public invocation surface.
//!
//! The runtime owns the spec registry and composes the engine components in
//! order for each call: compile -> cache check -> dispatch with retry ->
//! decode -> validate -> cache store -> return. Every failure path terminates
//! in a returned `InvocationResult`; nothing raises past this boundary.

pub mod engine;

pub use engine::{HollowRuntime, HollowRuntimeBuilder};
