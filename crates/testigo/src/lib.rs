//! Testigo: Call-Recording Test Doubles with Awaitable Synchronization
//!
//! Testigo (Spanish: "witness") provides the recording half of
//! hand-written fakes: a generic double that observes a fixed
//! vocabulary of named methods, keeps per-method call ledgers, and lets
//! a test `await` the next call to a method before asserting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    TESTIGO Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌──────────────┐    ┌────────────────┐      │
//! │   │ Component  │    │ Concrete     │    │ CallRecorder   │      │
//! │   │ under test │───►│ fake backend │───►│ + Response     │      │
//! │   │            │    │ (composes)   │    │   Script       │      │
//! │   └────────────┘    └──────────────┘    └───────┬────────┘      │
//! │                                                 │ when_called   │
//! │   ┌────────────┐                                ▼               │
//! │   │ Test body  │◄───────────────────── CallWaiter (await) ──────│
//! │   └────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The dominant synchronization pattern: the test drives an action that
//! asynchronously invokes a backend method, then awaits
//! [`CallRecorder::when_called`] to know the action has propagated
//! before asserting on the result.
//!
//! ```
//! use futures::FutureExt;
//! use testigo::CallRecorder;
//!
//! let recorder: CallRecorder<String> =
//!     CallRecorder::with_methods(["set_language"]).unwrap();
//!
//! // The fake's stub method records; the UI action triggers it.
//! let fake_side = recorder.clone();
//! let waiter = recorder.when_called("set_language").unwrap();
//! fake_side.record_call("set_language", "eo".to_string()).unwrap();
//!
//! let args = waiter.now_or_never().unwrap().unwrap();
//! assert_eq!(args, "eo");
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Method vocabulary validation
pub mod vocabulary;

/// The method-recording double and its awaitable call futures
pub mod recorder;

/// Scripted (canned) return values for fake backends
pub mod script;

/// Manually-resolved single-use futures
pub mod resolver;

/// Scoped dependency replacement with teardown-on-drop
pub mod inject;

mod result;

pub use inject::ScopedOverride;
pub use recorder::{CallRecorder, CallWaiter, MethodActivity};
pub use resolver::{deferred, Deferred, Resolver};
pub use result::{TestigoError, TestigoResult};
pub use script::ResponseScript;
pub use vocabulary::MethodVocabulary;
