// Copyright @yucwang 2021

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique default ID for a scene node.
pub fn generate_node_id(type_name: &str) -> String {
    let seq = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}", type_name, seq)
}

/// Anything the scene loader can name and report on.
pub trait ComputationNode {
    fn id(&self) -> &str;

    // One-line description used by scene summaries.
    fn to_string(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::generate_node_id;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_node_id("sphere");
        let b = generate_node_id("sphere");
        assert!(a.starts_with("sphere_"));
        assert_ne!(a, b);
    }
}
