use std::borrow::Cow;

use crate::error::{Error, Result};

/// Supplies the 8-bit node ID stamped into every ID of a generator.
///
/// The generator resolves its identity exactly once, at construction, and
/// never calls the resolver again. IDs are only unique across generators
/// whose identities differ: this crate has no way to verify that, so handing
/// out distinct node IDs is the caller's job.
///
/// Any `Fn() -> Result<u8>` closure is a resolver, which is handy for
/// identities derived from hardware, a hostname or a lease:
///
/// ```
/// use nodeflake::{Generator, ManualClock, Result};
///
/// let generator = Generator::builder()
///     .clock(ManualClock::new(1))
///     .node_identity(|| -> Result<u8> { Ok(7) })
///     .build()
///     .unwrap();
/// assert_eq!(generator.node_id(), 7);
/// ```
pub trait NodeIdentity {
    /// Resolves the node ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeIdentity`] if no ID can be determined.
    fn resolve(&self) -> Result<u8>;
}

impl<F> NodeIdentity for F
where
    F: Fn() -> Result<u8>,
{
    fn resolve(&self) -> Result<u8> {
        self()
    }
}

/// A node identity known up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FixedNode(pub u8);

impl Default for FixedNode {
    fn default() -> Self {
        Self(1)
    }
}

impl NodeIdentity for FixedNode {
    fn resolve(&self) -> Result<u8> {
        Ok(self.0)
    }
}

/// A node identity read from an environment variable holding a decimal
/// number in `0..=255`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvNode {
    var: Cow<'static, str>,
}

impl EnvNode {
    /// Reads the node ID from `var`.
    pub fn new(var: impl Into<Cow<'static, str>>) -> Self {
        Self { var: var.into() }
    }

    /// The variable this identity is read from.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl NodeIdentity for EnvNode {
    fn resolve(&self) -> Result<u8> {
        let raw = std::env::var(self.var.as_ref()).map_err(|e| Error::NodeIdentity {
            reason: format!("`{}`: {e}", self.var),
        })?;
        raw.trim().parse::<u8>().map_err(|e| Error::NodeIdentity {
            reason: format!("`{}` = {raw:?} is not a node ID in 0..=255: {e}", self.var),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_node_resolves_to_its_value() {
        assert_eq!(FixedNode(128).resolve().unwrap(), 128);
        assert_eq!(FixedNode::default().resolve().unwrap(), 1);
    }

    #[test]
    fn closures_are_resolvers() {
        let ok = || -> Result<u8> { Ok(9) };
        assert_eq!(ok.resolve().unwrap(), 9);

        let failing = || -> Result<u8> {
            Err(Error::NodeIdentity {
                reason: "no lease".into(),
            })
        };
        assert!(failing.resolve().unwrap_err().is_construction());
    }

    #[test]
    fn env_node_reads_and_validates() {
        // Cargo exports the package metadata to test binaries.
        let minor: u8 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
        assert_eq!(EnvNode::new("CARGO_PKG_VERSION_MINOR").resolve().unwrap(), minor);

        let err = EnvNode::new("CARGO_PKG_NAME").resolve().unwrap_err();
        assert!(matches!(err, Error::NodeIdentity { .. }));

        let err = EnvNode::new("NODEFLAKE_SURELY_UNSET_NODE_VAR")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::NodeIdentity { .. }));
    }
}
