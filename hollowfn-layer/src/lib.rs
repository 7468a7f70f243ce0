//! # hollowfn layers
//!
//! Built-in provider layers for hollowfn.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: logs every provider dispatch with timing information
//!
//! ## Usage
//!
//! ```ignore
//! use hollowfn_core::HollowRuntime;
//! use hollowfn_layer::LoggingLayer;
//!
//! let runtime = HollowRuntime::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .finish();
//! ```

pub mod logging;

// Re-exports
pub use logging::LoggingLayer;
