//! Scripted return values for fake backends.
//!
//! A concrete fake composes a [`ResponseScript`] next to its
//! `CallRecorder`: the recorder captures what the component under test
//! asked for, the script supplies what the fake answers with. Queued
//! one-shot responses are consumed before the sticky per-method
//! response.

use crate::result::{TestigoError, TestigoResult};
use crate::vocabulary::MethodVocabulary;
use std::collections::{HashMap, VecDeque};

/// Canned responses for a fixed vocabulary of methods.
///
/// # Example
///
/// ```
/// use testigo::{MethodVocabulary, ResponseScript};
///
/// let vocab = MethodVocabulary::new(["load"]).unwrap();
/// let mut script: ResponseScript<Vec<String>> = ResponseScript::new(vocab);
///
/// script.set_response("load", vec!["alice".to_string()]).unwrap();
/// assert_eq!(script.response_for("load").unwrap(), vec!["alice".to_string()]);
/// // Sticky responses repeat
/// assert_eq!(script.response_for("load").unwrap(), vec!["alice".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseScript<R> {
    vocabulary: MethodVocabulary,
    sticky: HashMap<String, R>,
    queued: HashMap<String, VecDeque<R>>,
}

impl<R: Clone> ResponseScript<R> {
    /// Create an empty script over a validated vocabulary.
    #[must_use]
    pub fn new(vocabulary: MethodVocabulary) -> Self {
        Self {
            vocabulary,
            sticky: HashMap::new(),
            queued: HashMap::new(),
        }
    }

    /// Set the sticky response for `name`, replacing any previous one.
    ///
    /// The value is cloned out on every [`response_for`](Self::response_for)
    /// once the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn set_response(&mut self, name: &str, value: R) -> TestigoResult<()> {
        self.vocabulary.require(name)?;
        self.sticky.insert(name.to_string(), value);
        Ok(())
    }

    /// Queue a one-shot response for `name`.
    ///
    /// Queued responses are consumed FIFO, before the sticky response.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn enqueue_response(&mut self, name: &str, value: R) -> TestigoResult<()> {
        self.vocabulary.require(name)?;
        self.queued
            .entry(name.to_string())
            .or_default()
            .push_back(value);
        Ok(())
    }

    /// Take the next response for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name
    /// and [`TestigoError::MissingResponse`] when neither a queued nor
    /// a sticky response is configured.
    pub fn response_for(&mut self, name: &str) -> TestigoResult<R> {
        self.vocabulary.require(name)?;
        if let Some(queue) = self.queued.get_mut(name) {
            if let Some(value) = queue.pop_front() {
                return Ok(value);
            }
        }
        self.sticky
            .get(name)
            .cloned()
            .ok_or_else(|| TestigoError::MissingResponse {
                method: name.to_string(),
            })
    }

    /// Whether any response (queued or sticky) remains for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn has_response(&self, name: &str) -> TestigoResult<bool> {
        self.vocabulary.require(name)?;
        let queued = self.queued.get(name).is_some_and(|q| !q.is_empty());
        Ok(queued || self.sticky.contains_key(name))
    }

    /// Remove all responses for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TestigoError::UnknownMethod`] for an undeclared name.
    pub fn clear_method(&mut self, name: &str) -> TestigoResult<()> {
        self.vocabulary.require(name)?;
        self.sticky.remove(name);
        self.queued.remove(name);
        Ok(())
    }

    /// Remove all responses for every method.
    pub fn clear(&mut self) {
        self.sticky.clear();
        self.queued.clear();
    }
}
