//! Manually-resolved single-use futures.
//!
//! A fake stub records its call, stashes the [`Resolver`] for the test
//! to pick up, and hands the [`Deferred`] to the component under test.
//! The test then controls exactly when the "backend" answers.

use crate::result::{TestigoError, TestigoResult};
use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Create a linked resolver/future pair.
///
/// # Example
///
/// ```
/// use futures::FutureExt;
/// use testigo::deferred;
///
/// let (resolver, mut value) = deferred::<u32>();
/// assert!((&mut value).now_or_never().is_none());
///
/// resolver.resolve(42);
/// assert_eq!(value.now_or_never().unwrap().unwrap(), 42);
/// ```
#[must_use]
pub fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Deferred { rx })
}

/// Resolution handle for a [`Deferred`] value.
///
/// Dropping the resolver unresolved completes the deferred side with
/// [`TestigoError::ResolverDropped`], so a component waiting on an
/// answer the test forgot to give fails loudly.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Resolver<T> {
    /// Complete the linked [`Deferred`] with `value`.
    ///
    /// Consumes the resolver; a deferred value resolves at most once.
    /// If the deferred side was already dropped the value is discarded.
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Whether the deferred side is still waiting.
    #[must_use]
    pub fn is_awaited(&self) -> bool {
        !self.tx.is_canceled()
    }
}

/// Future side of a [`deferred`] pair.
#[must_use = "a Deferred does nothing until awaited"]
#[derive(Debug)]
pub struct Deferred<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Deferred<T> {
    type Output = TestigoResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().rx).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(Ok(value)),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(TestigoError::ResolverDropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}
