//! Classify unit-of-work failures against the caller's stop/continue lists.

use std::borrow::Cow;
use std::collections::BTreeSet;

/// Errors that expose a stable key for exact-match classification.
///
/// Keys are compared for equality only; no substring or pattern matching.
pub trait Classify {
    fn classification_key(&self) -> Cow<'_, str>;
}

impl Classify for String {
    fn classification_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl Classify for &str {
    fn classification_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}

impl Classify for std::io::Error {
    fn classification_key(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl Classify for anyhow::Error {
    fn classification_key(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// What the executor should do with a failure, before the budget is considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Listed in `stop_on`: propagate now.
    Stop,
    /// Listed in `continue_on` only: warn and give up quietly.
    Continue,
    /// Not listed: retry while budget remains.
    Transient,
}

/// Caller-supplied classification keys. Empty sets are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationLists {
    pub stop_on: BTreeSet<String>,
    pub continue_on: BTreeSet<String>,
}

impl ClassificationLists {
    pub fn new<S, C>(stop_on: S, continue_on: C) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            stop_on: stop_on.into_iter().map(Into::into).collect(),
            continue_on: continue_on.into_iter().map(Into::into).collect(),
        }
    }

    /// Stop takes precedence over continue.
    pub fn classify(&self, key: &str) -> ErrorClass {
        if self.stop_on.contains(key) {
            ErrorClass::Stop
        } else if self.continue_on.contains(key) {
            ErrorClass::Continue
        } else {
            ErrorClass::Transient
        }
    }
}
