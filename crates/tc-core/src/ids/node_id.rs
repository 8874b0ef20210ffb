use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Stable identity of one node in the sync topology.
///
/// Node ids double as the tie-break key of the conflict policy, so the
/// ordering is plain lexicographic byte order of the underlying string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(String);

impl_id!(NodeId);

impl NodeId {
    /// Random node id, used when no host name is available.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_orders_lexicographically() {
        let a = NodeId::from("alpha");
        let b = NodeId::from("beta");
        assert!(b > a);
        assert!(NodeId::from("a") > NodeId::default());
    }

    #[test]
    fn test_random_node_ids_differ() {
        assert_ne!(NodeId::random(), NodeId::random());
    }
}
