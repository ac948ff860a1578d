//! Tree command implementation.

use super::{manager, CHILD_COMPONENT, ROOT_COMPONENT};
use entislee_core::{
    ComponentId, CoreResult, EntityId, EntityLifecycleManager, ParentLink, ServiceId,
    StatsSnapshot, TransactionContext,
};
use serde::Serialize;

/// A node of the printed tree.
#[derive(Debug, Serialize)]
pub struct TreeNode {
    /// Entity ID.
    pub id: String,
    /// Slot the entity occupies in its parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    /// Child nodes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

/// Tree command result.
#[derive(Debug, Serialize)]
pub struct TreeResult {
    /// The tree as read back through the manager.
    pub tree: TreeNode,
    /// Entities stored once the tree was committed.
    pub stored: usize,
    /// Entities stored once the removal was committed, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_after_remove: Option<usize>,
    /// Manager counters.
    pub stats: StatsSnapshot,
}

/// Runs the tree command.
pub fn run(
    depth: usize,
    fanout: usize,
    remove: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (manager, store) = manager();
    let service = ServiceId::new("Svc1");

    let root_id = manager.transaction(|txn| {
        let root = manager.create_root(txn, &ComponentId::new(ROOT_COMPONENT), &service, "tree")?;

        let mut level = vec![root.clone()];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(level.len() * fanout);
            for parent in &level {
                for _ in 0..fanout {
                    next.push(manager.create_child(
                        txn,
                        &ComponentId::new(CHILD_COMPONENT),
                        &service,
                        &ParentLink::of(parent, "child"),
                        "tree",
                    )?);
                }
            }
            level = next;
        }
        Ok(root.id().clone())
    })?;
    let stored = store.len();

    let tree = manager.transaction(|txn| {
        let tree = read_tree(&manager, txn, &root_id, None)?;
        if remove {
            manager.remove_by_id(txn, &root_id, false)?;
        }
        Ok(tree)
    })?;
    let stored_after_remove = remove.then(|| store.len());

    let result = TreeResult {
        tree,
        stored,
        stored_after_remove,
        stats: manager.stats().snapshot(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_node(&result.tree, 0);
            println!();
            println!("Stored entities: {}", result.stored);
            if let Some(after) = result.stored_after_remove {
                println!("After removal:   {}", after);
                println!("Cascaded:        {}", result.stats.cascaded_removals);
            }
        }
    }

    Ok(())
}

fn read_tree(
    manager: &EntityLifecycleManager,
    txn: &mut TransactionContext,
    id: &EntityId,
    relation: Option<String>,
) -> CoreResult<TreeNode> {
    let children = manager
        .children(txn, id)?
        .iter()
        .map(|child| {
            read_tree(
                manager,
                txn,
                child.id(),
                child.parent_relation().map(str::to_owned),
            )
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(TreeNode {
        id: id.to_string(),
        relation,
        children,
    })
}

fn print_node(node: &TreeNode, indent: usize) {
    match &node.relation {
        Some(relation) => println!("{:indent$}{} [{}]", "", node.id, relation, indent = indent * 2),
        None => println!("{:indent$}{}", "", node.id, indent = indent * 2),
    }
    for child in &node.children {
        print_node(child, indent + 1);
    }
}
