use std::fmt;
use std::sync::Arc;

/// Stable identity of a component instance's position in the tree.
///
/// Hook state and dynamic-binding lookups are keyed by this value, so two
/// renders of the same logical instance must derive the same key. Keys are
/// path-shaped: `$root/Counter:0/Text:1`.
#[derive(Clone, Hash, PartialEq, Eq)]
pub struct GlobalKey(Arc<str>);

impl GlobalKey {
    pub fn root() -> Self {
        Self(Arc::from("$root"))
    }

    /// Derive the key for a child at `index` under this key.
    pub fn child(&self, name: &str, index: usize) -> Self {
        Self(Arc::from(format!("{}/{name}:{index}", self.0)))
    }

    /// Whether `other` identifies this node or one of its descendants.
    ///
    /// Relies on the `/`-separated path shape; `a/Text:1` is not an ancestor
    /// of `a/Text:10`.
    pub fn contains(&self, other: &GlobalKey) -> bool {
        let prefix = &*self.0;
        let candidate = &*other.0;
        if !candidate.starts_with(prefix) {
            return false;
        }
        candidate.len() == prefix.len() || candidate.as_bytes()[prefix.len()] == b'/'
    }
}

impl fmt::Display for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for GlobalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalKey({})", self.0)
    }
}
