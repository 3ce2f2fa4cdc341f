//! Query string assembly shared by the alert definition operations.

use std::fmt::Display;

use url::Url;

/// Ordered list of query parameters to attach to a request URL
///
/// Optional values are only recorded when present and non-empty, so an
/// unset filter never shows up as `name=` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a parameter if `value` is `Some` and renders to a non-empty string
    pub(crate) fn optional<V: Display>(mut self, name: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.pairs.push((name, value));
            }
        }
        self
    }

    /// Add a parameter unconditionally
    pub(crate) fn required<V: Display>(mut self, name: &'static str, value: V) -> Self {
        self.pairs.push((name, value.to_string()));
        self
    }

    /// Add one parameter per value, in order
    pub(crate) fn repeated<I>(mut self, name: &'static str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.pairs
            .extend(values.into_iter().map(|value| (name, value.to_string())));
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Append the collected parameters to `url`
    ///
    /// Leaves the URL untouched when there is nothing to add.
    pub(crate) fn apply(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        url.query_pairs_mut()
            .extend_pairs(self.pairs.iter().map(|(name, value)| (*name, value.as_str())));
    }
}
