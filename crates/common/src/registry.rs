use std::collections::HashMap;

use parking_lot::RwLock;

use crate::record::{NodeRecord, NodeStatus};

/// Static table of known storage nodes.
///
/// Populated once at startup; there is no heartbeat or deregistration,
///  so a node's status only says it was configured.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<String, NodeRecord>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry with every address marked active.
    pub fn with_nodes<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for address in addresses {
            registry.register_node(address);
        }
        registry
    }

    /// Insert or overwrite `address` with status active.
    pub fn register_node(&self, address: impl Into<String>) {
        let address = address.into();
        tracing::info!(%address, "registered storage node");
        self.nodes.write().insert(
            address.clone(),
            NodeRecord {
                address,
                status: NodeStatus::Active,
            },
        );
    }

    pub fn get(&self, address: &str) -> Option<NodeRecord> {
        self.nodes.read().get(address).cloned()
    }

    /// Snapshot of all nodes, sorted by address.
    pub fn list_nodes(&self) -> Vec<NodeRecord> {
        let mut nodes: Vec<NodeRecord> = self.nodes.read().values().cloned().collect();
        nodes.sort_by(|a, b| a.address.cmp(&b.address));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_list() {
        let registry = NodeRegistry::with_nodes(["http://localhost:8002", "http://localhost:8001"]);

        let nodes = registry.list_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].address, "http://localhost:8001");
        assert!(nodes.iter().all(|n| n.status == NodeStatus::Active));
    }

    #[test]
    fn test_register_overwrites() {
        let registry = NodeRegistry::new();
        registry.register_node("n1");
        registry.register_node("n1");

        assert_eq!(registry.list_nodes().len(), 1);
        assert_eq!(registry.get("n1").unwrap().status, NodeStatus::Active);
        assert!(registry.get("n2").is_none());
    }
}
