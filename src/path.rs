//! Property chain representation for locating values in an object graph.
//!
//! This module provides [`PropertyChain`], the ordered path of property names
//! that identifies where a validation run currently is (e.g. `Customer.Address.Line1`).

use std::fmt::{self, Display};

/// Separator used when joining chain segments.
pub const SEPARATOR: char = '.';

/// An ordered path of property-name segments.
///
/// Chains only ever grow. Contexts that descend into a nested object copy the
/// parent's chain first and extend the copy, so siblings never observe each
/// other's segments.
///
/// # Example
///
/// ```rust
/// use inquest::PropertyChain;
///
/// let chain = PropertyChain::new()
///     .append("Orders")
///     .append("Customer");
///
/// assert_eq!(chain.to_string(), "Orders.Customer");
/// assert_eq!(chain.build_property_name("Name"), "Orders.Customer.Name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyChain {
    segments: Vec<String>,
}

impl PropertyChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an independent copy of an existing chain.
    pub fn from_chain(parent: &PropertyChain) -> Self {
        Self {
            segments: parent.segments.clone(),
        }
    }

    /// Creates a chain from the given segments, in order.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a segment in place.
    ///
    /// Only used on a chain the caller owns outright, such as the freshly
    /// copied chain of a derived context.
    pub fn add(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Appends every segment of `other` in place.
    pub fn add_chain(&mut self, other: &PropertyChain) {
        self.segments.extend(other.segments.iter().cloned());
    }

    /// Returns a new chain with a segment appended.
    ///
    /// This method does not modify the original chain; it returns a new one.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Decorates the last segment with a collection index, e.g. `Lines` becomes `Lines[2]`.
    ///
    /// On an empty chain the bare indexer becomes the first segment.
    pub fn add_indexer(&mut self, index: usize) {
        match self.segments.last_mut() {
            Some(last) => last.push_str(&format!("[{}]", index)),
            None => self.segments.push(format!("[{}]", index)),
        }
    }

    /// Builds the full property path for `name` relative to this chain.
    pub fn build_property_name(&self, name: &str) -> String {
        if self.segments.is_empty() {
            return name.to_string();
        }
        let mut path = self.to_string();
        path.push(SEPARATOR);
        path.push_str(name);
        path
    }

    /// Returns true if `parent` is a strict prefix of this chain.
    pub fn is_child_chain_of(&self, parent: &PropertyChain) -> bool {
        parent.segments.len() < self.segments.len()
            && self.segments[..parent.segments.len()] == parent.segments[..]
    }

    /// Returns the number of segments in this chain.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this chain has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns the chain without its last segment, or None if empty.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last segment, or None if empty.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl Display for PropertyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
