//! Method-recording test double.
//!
//! [`CallRecorder`] stands in for a real backend interface during
//! tests: it records invocations of a fixed vocabulary of named
//! methods, exposes per-method invocation counts and captured
//! arguments, and lets a test `await` the next call to a method before
//! asserting. A wrapping fake typically calls [`CallRecorder::record_call`]
//! from each stub method and then returns a scripted value or a
//! deferred future.
//!
//! The recorder clones shallowly; the fake under test and the test body
//! hold clones of the same ledger. All state lives behind a single
//! `RefCell`, matching the single-threaded cooperative execution model
//! of the components these doubles serve.

use crate::result::{TestigoError, TestigoResult};
use crate::vocabulary::MethodVocabulary;
use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

// =============================================================================
// LEDGER
// =============================================================================

/// Per-method call ledger.
///
/// Invariant: `waiters` is non-empty only when `claimed == captured.len()`.
/// A pending waiter implies there is no unclaimed call to hand it.
struct Ledger<A> {
    /// Every recorded call's arguments, in call order
    captured: Vec<A>,
    /// Number of captured calls already delivered to a waiter
    claimed: usize,
    /// Outstanding waiters, strict FIFO
    waiters: VecDeque<oneshot::Sender<A>>,
}

impl<A> Default for Ledger<A> {
    fn default() -> Self {
        Self {
            captured: Vec::new(),
            claimed: 0,
            waiters: VecDeque::new(),
        }
    }
}

struct Inner<A> {
    vocabulary: MethodVocabulary,
    ledgers: HashMap<String, Ledger<A>>,
}

impl<A> Inner<A> {
    fn ledger_mut(&mut self, name: &str) -> TestigoResult<&mut Ledger<A>> {
        self.vocabulary.require(name)?;
        Ok(self.ledgers.entry(name.to_string()).or_default())
    }
}

// =============================================================================
// METHOD ACTIVITY
// =============================================================================

/// Per-method snapshot of recorder state, for reports and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodActivity {
    /// Method name
    pub method: String,
    /// Calls recorded so far
    pub calls: usize,
    /// Waiters still pending
    pub pending_waiters: usize,
}

// =============================================================================
// CALL WAITER
// =============================================================================

/// Single-resolution future returned by [`CallRecorder::when_called`].
///
/// Resolves with the arguments of the call it was paired with, in the
/// same event-loop turn as the matching `record_call`. Yields
/// [`TestigoError::WaiterDiscarded`] only if the recorder was reset,
/// disposed, or dropped while the waiter was still pending.
#[must_use = "a CallWaiter does nothing until awaited"]
pub struct CallWaiter<A> {
    method: String,
    rx: oneshot::Receiver<A>,
}

impl<A> CallWaiter<A> {
    /// Method this waiter is registered for.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl<A> std::fmt::Debug for CallWaiter<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallWaiter")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl<A> Future for CallWaiter<A> {
    type Output = TestigoResult<A>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(args)) => Poll::Ready(Ok(args)),
            Poll::Ready(Err(oneshot::Canceled)) => {
                Poll::Ready(Err(TestigoError::WaiterDiscarded {
                    method: this.method.clone(),
                }))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

// =============================================================================
// CALL RECORDER
// =============================================================================

/// Recording test double for a fixed vocabulary of named methods.
///
/// Generic over the argument payload `A`, one payload type per faked
/// backend: typically an enum of per-method argument shapes, or
/// `serde_json::Value` for loosely-shaped fakes.
///
/// # Example
///
/// ```
/// use testigo::CallRecorder;
///
/// let recorder: CallRecorder<Vec<i32>> =
///     CallRecorder::with_methods(["save", "load"]).unwrap();
///
/// recorder.record_call("save", vec![1, 2]).unwrap();
/// assert_eq!(recorder.call_count("save").unwrap(), 1);
/// assert_eq!(recorder.calls("save").unwrap(), vec![vec![1, 2]]);
/// ```
pub struct CallRecorder<A> {
    inner: Rc<RefCell<Inner<A>>>,
}

impl<A> Clone for CallRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A> std::fmt::Debug for CallRecorder<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CallRecorder")
            .field("methods", &inner.vocabulary.len())
            .field(
                "total_calls",
                &inner
                    .ledgers
                    .values()
                    .map(|l| l.captured.len())
                    .sum::<usize>(),
            )
            .finish()
    }
}

impl<A: Clone> CallRecorder<A> {
    /// Create a recorder over a validated vocabulary.
    #[must_use]
    pub fn new(vocabulary: MethodVocabulary) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                vocabulary,
                ledgers: HashMap::new(),
            })),
        }
    }

    /// Create a recorder directly from a method-name list.
    ///
    /// # Errors
    ///
    /// Fails like [`MethodVocabulary::new`] on an empty or duplicated
    /// list.
    pub fn with_methods<I, S>(names: I) -> TestigoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::new(MethodVocabulary::new(names)?))
    }

    /// Record one invocation of `name` with `args`.
    ///
    /// Appends the arguments to the method's ledger and, if a waiter is
    /// pending, resolves the oldest one with a clone of the arguments.
    /// Both happen under one borrow: a waiter paired with the Kth call
    /// observes exactly the Kth call's arguments.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn record_call(&self, name: &str, args: A) -> TestigoResult<()> {
        let mut inner = self.inner.borrow_mut();
        let ledger = inner.ledger_mut(name)?;

        if let Some(tx) = ledger.waiters.pop_front() {
            // The FIFO slot is consumed even if the waiter's future was
            // dropped; send failure is ignored.
            ledger.claimed += 1;
            let _ = tx.send(args.clone());
            tracing::trace!(method = name, "resolved pending waiter");
        }
        ledger.captured.push(args);
        tracing::trace!(method = name, count = ledger.captured.len(), "call recorded");
        Ok(())
    }

    /// Wait for the next not-yet-claimed call to `name`.
    ///
    /// If an unclaimed call has already been recorded, the returned
    /// future is already resolved with that call's arguments and the
    /// call is marked claimed. Otherwise a waiter is registered and the
    /// future resolves the next time `record_call(name, ..)` fires.
    /// Waiters pair with calls strictly FIFO per method name.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn when_called(&self, name: &str) -> TestigoResult<CallWaiter<A>> {
        let mut inner = self.inner.borrow_mut();
        let ledger = inner.ledger_mut(name)?;
        let (tx, rx) = oneshot::channel();

        if ledger.claimed < ledger.captured.len() {
            debug_assert!(ledger.waiters.is_empty());
            let args = ledger.captured[ledger.claimed].clone();
            ledger.claimed += 1;
            let _ = tx.send(args);
            tracing::trace!(method = name, "waiter satisfied immediately");
        } else {
            ledger.waiters.push_back(tx);
            tracing::trace!(method = name, "waiter registered");
        }

        Ok(CallWaiter {
            method: name.to_string(),
            rx,
        })
    }

    /// Number of calls recorded for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn call_count(&self, name: &str) -> TestigoResult<usize> {
        let inner = self.inner.borrow();
        inner.vocabulary.require(name)?;
        Ok(inner.ledgers.get(name).map_or(0, |l| l.captured.len()))
    }

    /// Captured arguments for `name`, in call order.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn calls(&self, name: &str) -> TestigoResult<Vec<A>> {
        let inner = self.inner.borrow();
        inner.vocabulary.require(name)?;
        Ok(inner
            .ledgers
            .get(name)
            .map_or_else(Vec::new, |l| l.captured.clone()))
    }

    /// Arguments of the most recent call to `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn last_call(&self, name: &str) -> TestigoResult<Option<A>> {
        let inner = self.inner.borrow();
        inner.vocabulary.require(name)?;
        Ok(inner
            .ledgers
            .get(name)
            .and_then(|l| l.captured.last().cloned()))
    }

    /// Number of waiters still pending for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn pending_waiter_count(&self, name: &str) -> TestigoResult<usize> {
        let inner = self.inner.borrow();
        inner.vocabulary.require(name)?;
        Ok(inner.ledgers.get(name).map_or(0, |l| l.waiters.len()))
    }

    /// Forget all calls and pending waiters for `name`.
    ///
    /// Discarded waiters resolve to [`TestigoError::WaiterDiscarded`]
    /// so a test awaiting one fails instead of hanging. Tests use this
    /// to forget calls made during setup before asserting on the action
    /// under test.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn reset_method(&self, name: &str) -> TestigoResult<()> {
        let mut inner = self.inner.borrow_mut();
        let ledger = inner.ledger_mut(name)?;
        *ledger = Ledger::default();
        tracing::debug!(method = name, "ledger reset");
        Ok(())
    }

    /// Forget all calls and pending waiters for every declared method.
    pub fn reset(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.ledgers.clear();
        tracing::debug!("recorder reset");
    }

    /// Reject every outstanding waiter, leaving the call ledger intact.
    ///
    /// Returns the number of waiters discarded. Each resolves to
    /// [`TestigoError::WaiterDiscarded`].
    pub fn dispose(&self) -> usize {
        let mut inner = self.inner.borrow_mut();
        let mut discarded = 0;
        for ledger in inner.ledgers.values_mut() {
            discarded += ledger.waiters.len();
            ledger.waiters.clear();
        }
        tracing::debug!(discarded, "recorder disposed");
        discarded
    }

    /// Total calls recorded across all methods.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.inner
            .borrow()
            .ledgers
            .values()
            .map(|l| l.captured.len())
            .sum()
    }

    /// Declared method names, in declaration order.
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .vocabulary
            .names()
            .map(String::from)
            .collect()
    }

    /// Per-method activity snapshot, in vocabulary order.
    #[must_use]
    pub fn activity(&self) -> Vec<MethodActivity> {
        let inner = self.inner.borrow();
        inner
            .vocabulary
            .names()
            .map(|name| {
                let ledger = inner.ledgers.get(name);
                MethodActivity {
                    method: name.to_string(),
                    calls: ledger.map_or(0, |l| l.captured.len()),
                    pending_waiters: ledger.map_or(0, |l| l.waiters.len()),
                }
            })
            .collect()
    }

    /// Activity snapshot rendered as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::Json`] if serialization fails.
    pub fn activity_json(&self) -> TestigoResult<String> {
        Ok(serde_json::to_string_pretty(&self.activity())?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn recorder() -> CallRecorder<Vec<i32>> {
        CallRecorder::with_methods(["save", "load"]).unwrap()
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    mod construction_tests {
        use super::*;

        #[test]
        fn test_counts_start_at_zero() {
            let rec = recorder();
            assert_eq!(rec.call_count("save").unwrap(), 0);
            assert_eq!(rec.call_count("load").unwrap(), 0);
            assert_eq!(rec.total_calls(), 0);
        }

        #[test]
        fn test_empty_vocabulary_rejected() {
            let result = CallRecorder::<()>::with_methods(Vec::<String>::new());
            assert!(matches!(result, Err(TestigoError::EmptyVocabulary)));
        }

        #[test]
        fn test_duplicate_vocabulary_rejected() {
            let result = CallRecorder::<()>::with_methods(["a", "a"]);
            assert!(matches!(
                result,
                Err(TestigoError::DuplicateMethod { name }) if name == "a"
            ));
        }

        #[test]
        fn test_method_names_in_declaration_order() {
            let rec = recorder();
            assert_eq!(rec.method_names(), vec!["save", "load"]);
        }
    }

    // =========================================================================
    // Recording Tests
    // =========================================================================

    mod recording_tests {
        use super::*;

        #[test]
        fn test_record_and_observe_in_order() {
            let rec = recorder();
            rec.record_call("save", vec![1, 2]).unwrap();
            rec.record_call("save", vec![3]).unwrap();
            rec.record_call("load", vec![9]).unwrap();

            assert_eq!(rec.call_count("save").unwrap(), 2);
            assert_eq!(rec.call_count("load").unwrap(), 1);
            assert_eq!(rec.calls("save").unwrap(), vec![vec![1, 2], vec![3]]);
            assert_eq!(rec.last_call("save").unwrap(), Some(vec![3]));
            assert_eq!(rec.total_calls(), 3);
        }

        #[test]
        fn test_unknown_method_rejected_everywhere() {
            let rec = recorder();
            assert!(matches!(
                rec.record_call("nope", vec![]),
                Err(TestigoError::UnknownMethod { name }) if name == "nope"
            ));
            assert!(rec.when_called("nope").is_err());
            assert!(rec.call_count("nope").is_err());
            assert!(rec.calls("nope").is_err());
            assert!(rec.last_call("nope").is_err());
            assert!(rec.reset_method("nope").is_err());

            // Idempotent: repeated misuse fails identically
            assert!(rec.call_count("nope").is_err());
        }

        #[test]
        fn test_clones_share_one_ledger() {
            let rec = recorder();
            let fake_side = rec.clone();
            fake_side.record_call("save", vec![7]).unwrap();
            assert_eq!(rec.call_count("save").unwrap(), 1);
        }
    }

    // =========================================================================
    // Waiter Tests
    // =========================================================================

    mod waiter_tests {
        use super::*;

        #[test]
        fn test_waiter_resolves_on_next_call() {
            let rec = recorder();
            let mut waiter = rec.when_called("save").unwrap();
            assert!((&mut waiter).now_or_never().is_none());

            rec.record_call("save", vec![1]).unwrap();
            let args = waiter.now_or_never().unwrap().unwrap();
            assert_eq!(args, vec![1]);
        }

        #[test]
        fn test_waiter_ignores_other_methods() {
            let rec = recorder();
            let mut waiter = rec.when_called("save").unwrap();

            rec.record_call("load", vec![5]).unwrap();
            assert!((&mut waiter).now_or_never().is_none());

            rec.record_call("save", vec![6]).unwrap();
            assert_eq!(waiter.now_or_never().unwrap().unwrap(), vec![6]);
        }

        #[test]
        fn test_fifo_pairing_of_two_waiters() {
            let rec = recorder();
            let first = rec.when_called("save").unwrap();
            let second = rec.when_called("save").unwrap();

            rec.record_call("save", vec![1]).unwrap();
            rec.record_call("save", vec![2]).unwrap();

            assert_eq!(first.now_or_never().unwrap().unwrap(), vec![1]);
            assert_eq!(second.now_or_never().unwrap().unwrap(), vec![2]);
        }

        #[test]
        fn test_unclaimed_call_resolves_immediately_then_suspends() {
            let rec = recorder();
            rec.record_call("save", vec![1, 2]).unwrap();
            assert_eq!(rec.call_count("save").unwrap(), 1);
            assert_eq!(rec.calls("save").unwrap(), vec![vec![1, 2]]);

            // First waiter claims the already-recorded call
            let waiter = rec.when_called("save").unwrap();
            assert_eq!(waiter.now_or_never().unwrap().unwrap(), vec![1, 2]);

            // Second waiter must suspend until the next call
            let mut waiter = rec.when_called("save").unwrap();
            assert!((&mut waiter).now_or_never().is_none());
            rec.record_call("save", vec![3, 4]).unwrap();
            assert_eq!(waiter.now_or_never().unwrap().unwrap(), vec![3, 4]);
        }

        #[test]
        fn test_dropped_waiter_still_consumes_its_slot() {
            let rec = recorder();
            let abandoned = rec.when_called("save").unwrap();
            drop(abandoned);
            let survivor = rec.when_called("save").unwrap();

            rec.record_call("save", vec![1]).unwrap();
            rec.record_call("save", vec![2]).unwrap();

            // The dropped waiter consumed the first call's slot
            assert_eq!(survivor.now_or_never().unwrap().unwrap(), vec![2]);
        }

        #[test]
        fn test_waiter_method_accessor() {
            let rec = recorder();
            let waiter = rec.when_called("save").unwrap();
            assert_eq!(waiter.method(), "save");
        }
    }

    // =========================================================================
    // Reset / Dispose Tests
    // =========================================================================

    mod reset_tests {
        use super::*;

        #[test]
        fn test_reset_method_zeroes_ledger() {
            let rec = recorder();
            rec.record_call("save", vec![1]).unwrap();
            rec.record_call("load", vec![2]).unwrap();

            rec.reset_method("save").unwrap();
            assert_eq!(rec.call_count("save").unwrap(), 0);
            assert!(rec.calls("save").unwrap().is_empty());
            // Other methods untouched
            assert_eq!(rec.call_count("load").unwrap(), 1);
        }

        #[test]
        fn test_reset_all_methods() {
            let rec = recorder();
            rec.record_call("save", vec![1]).unwrap();
            rec.record_call("load", vec![2]).unwrap();

            rec.reset();
            assert_eq!(rec.call_count("save").unwrap(), 0);
            assert_eq!(rec.call_count("load").unwrap(), 0);
        }

        #[test]
        fn test_reset_without_prior_calls_is_fine() {
            let rec = CallRecorder::<Vec<i32>>::with_methods(["x"]).unwrap();
            rec.reset_method("x").unwrap();
            assert_eq!(rec.call_count("x").unwrap(), 0);
        }

        #[test]
        fn test_reset_discards_pending_waiter_loudly() {
            let rec = recorder();
            let waiter = rec.when_called("save").unwrap();
            rec.reset_method("save").unwrap();

            match waiter.now_or_never().unwrap() {
                Err(TestigoError::WaiterDiscarded { method }) => assert_eq!(method, "save"),
                other => panic!("expected WaiterDiscarded, got {other:?}"),
            }
        }

        #[test]
        fn test_fresh_waiter_after_reset_pairs_with_first_new_call() {
            let rec = recorder();
            let stale = rec.when_called("save").unwrap();
            rec.reset();

            let fresh = rec.when_called("save").unwrap();
            rec.record_call("save", vec![42]).unwrap();

            assert!(stale.now_or_never().unwrap().is_err());
            assert_eq!(fresh.now_or_never().unwrap().unwrap(), vec![42]);
        }

        #[test]
        fn test_reset_does_not_affect_resolved_waiters() {
            let rec = recorder();
            let waiter = rec.when_called("save").unwrap();
            rec.record_call("save", vec![1]).unwrap();
            rec.reset();
            // Already resolved before the reset
            assert_eq!(waiter.now_or_never().unwrap().unwrap(), vec![1]);
        }

        #[test]
        fn test_dispose_rejects_all_waiters_keeps_ledger() {
            let rec = recorder();
            rec.record_call("save", vec![1]).unwrap();
            // Claim the recorded call so both waiters below are pending
            let _ = rec.when_called("save").unwrap();
            let pending_a = rec.when_called("save").unwrap();
            let pending_b = rec.when_called("load").unwrap();

            assert_eq!(rec.dispose(), 2);
            assert!(pending_a.now_or_never().unwrap().is_err());
            assert!(pending_b.now_or_never().unwrap().is_err());
            // Ledger stays readable
            assert_eq!(rec.call_count("save").unwrap(), 1);
        }

        #[test]
        fn test_dropping_recorder_fails_pending_waiter() {
            let rec = recorder();
            let waiter = rec.when_called("save").unwrap();
            drop(rec);
            assert!(matches!(
                waiter.now_or_never().unwrap(),
                Err(TestigoError::WaiterDiscarded { .. })
            ));
        }
    }

    // =========================================================================
    // Activity Tests
    // =========================================================================

    mod activity_tests {
        use super::*;

        #[test]
        fn test_activity_in_vocabulary_order() {
            let rec = recorder();
            rec.record_call("load", vec![1]).unwrap();
            let _pending = rec.when_called("save").unwrap();

            let activity = rec.activity();
            assert_eq!(
                activity,
                vec![
                    MethodActivity {
                        method: "save".to_string(),
                        calls: 0,
                        pending_waiters: 1,
                    },
                    MethodActivity {
                        method: "load".to_string(),
                        calls: 1,
                        pending_waiters: 0,
                    },
                ]
            );
        }

        #[test]
        fn test_activity_json_round_trip() {
            let rec = recorder();
            rec.record_call("save", vec![1]).unwrap();

            let json = rec.activity_json().unwrap();
            let parsed: Vec<MethodActivity> = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, rec.activity());
        }

        #[test]
        fn test_pending_waiter_count() {
            let rec = recorder();
            assert_eq!(rec.pending_waiter_count("save").unwrap(), 0);
            let _w = rec.when_called("save").unwrap();
            assert_eq!(rec.pending_waiter_count("save").unwrap(), 1);
        }
    }
}
