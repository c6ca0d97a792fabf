//! Failures raised by endpoints, and the type ancestry used to find their error pages.
//!
//! A `FailureType` is a name plus an optional parent. Registering an error page for a parent type
//! covers every type below it, unless a closer type has its own page.
//!
//! ```
//! use errorpage::FailureType;
//!
//! let runtime = FailureType::root("RuntimeException");
//! let illegal_arg = runtime.child("IllegalArgumentException");
//! let number_format = illegal_arg.child("NumberFormatException");
//!
//! let lineage: Vec<&str> = number_format.lineage().collect();
//! assert_eq!(lineage, ["NumberFormatException", "IllegalArgumentException", "RuntimeException"]);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Identifier of a kind of failure, with its chain of supertypes.
///
/// Cheap to clone, the chain is shared.
#[derive(Clone)]
pub struct FailureType {
    inner: Arc<TypeNode>,
}

struct TypeNode {
    name: Cow<'static, str>,
    parent: Option<FailureType>,
}

impl FailureType {
    /// A type with no registered supertype. The universal base is implied and is never part of
    /// the lineage.
    pub fn root(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            inner: Arc::new(TypeNode {
                name: name.into(),
                parent: None,
            }),
        }
    }

    /// A direct subtype of `self`.
    pub fn child(&self, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            inner: Arc::new(TypeNode {
                name: name.into(),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Type for a rust error type, identified by `std::any::type_name`.
    pub fn of<E: ?Sized>() -> Self {
        Self::root(std::any::type_name::<E>())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&FailureType> {
        self.inner.parent.as_ref()
    }

    /// The type's own name, then each supertype name, nearest first.
    pub fn lineage(&self) -> Lineage<'_> {
        Lineage { next: Some(self) }
    }

    /// True if `self` is `name` or has it as an ancestor.
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage().any(|n| n == name)
    }
}

impl PartialEq for FailureType {
    fn eq(&self, other: &Self) -> bool {
        self.lineage().eq(other.lineage())
    }
}

impl Eq for FailureType {}

impl fmt::Debug for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lineage()).finish()
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Iterator over a type's ancestry, see `FailureType::lineage`
pub struct Lineage<'a> {
    next: Option<&'a FailureType>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current.name())
    }
}

/// An uncaught failure from an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    kind: FailureType,
    message: String,
}

impl Failure {
    pub fn new(kind: FailureType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Wrap any error. Its type is named after the rust type, with no supertypes.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::new(FailureType::of::<E>(), error.to_string())
    }

    pub fn kind(&self) -> &FailureType {
        &self.kind
    }

    /// Identifier of the concrete type
    pub fn type_name(&self) -> &str {
        self.kind.name()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for Failure {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lineage_nearest_first() {
        let base = FailureType::root("Base");
        let mid = base.child("Mid");
        let leaf = mid.child("Leaf");

        assert_eq!(leaf.lineage().collect::<Vec<_>>(), ["Leaf", "Mid", "Base"]);
        assert_eq!(base.lineage().collect::<Vec<_>>(), ["Base"]);
        assert!(leaf.is_a("Base"));
        assert!(!base.is_a("Leaf"));
    }

    #[test]
    fn test_failure_display() {
        let kind = FailureType::root("IoFailure");
        assert_eq!(Failure::new(kind.clone(), "disk full").to_string(), "IoFailure: disk full");
        assert_eq!(Failure::new(kind, "").to_string(), "IoFailure");
    }

    #[test]
    fn test_failure_from_error() {
        let err = "one".parse::<usize>().unwrap_err();
        let failure = Failure::from_error(&err);
        assert!(failure.type_name().ends_with("ParseIntError"));
        assert_eq!(failure.message(), err.to_string());
    }
}
