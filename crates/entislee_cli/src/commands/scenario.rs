//! Scenario command implementation.

use super::{manager, CHILD_COMPONENT, ROOT_COMPONENT};
use entislee_core::{ComponentId, ParentLink, ServiceId, StatsSnapshot};
use serde::Serialize;
use std::sync::Arc;

/// One observed step of the scenario.
#[derive(Debug, Serialize)]
pub struct Step {
    /// What was done.
    pub action: &'static str,
    /// Entity the step concerned.
    pub entity: String,
    /// What was observed.
    pub outcome: String,
}

/// Scenario result.
#[derive(Debug, Serialize)]
pub struct ScenarioResult {
    /// Steps in order.
    pub steps: Vec<Step>,
    /// Manager counters after the scenario.
    pub stats: StatsSnapshot,
}

/// Runs the scenario command.
pub fn run(
    service: &str,
    convergence: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (manager, _store) = manager();
    let service = ServiceId::new(service);
    let mut steps = Vec::new();

    let mut txn = manager.begin()?;

    let root = manager.create_root(
        &mut txn,
        &ComponentId::new(ROOT_COMPONENT),
        &service,
        convergence,
    )?;
    steps.push(Step {
        action: "create_root",
        entity: root.id().to_string(),
        outcome: format!("root_id={}", root.root_id()),
    });

    let child = manager.create_child(
        &mut txn,
        &ComponentId::new(CHILD_COMPONENT),
        &service,
        &ParentLink::of(&root, "childSlot"),
        convergence,
    )?;
    steps.push(Step {
        action: "create_child",
        entity: child.id().to_string(),
        outcome: format!(
            "parent_id={} root_id={}",
            root.id(),
            child.root_id()
        ),
    });

    let again = manager.get(&mut txn, root.id())?;
    steps.push(Step {
        action: "get",
        entity: root.id().to_string(),
        outcome: format!("same_instance={}", Arc::ptr_eq(&root, &again)),
    });

    manager.remove(&mut txn, &root, false)?;
    steps.push(Step {
        action: "remove",
        entity: root.id().to_string(),
        outcome: format!("child_removed={}", child.is_removed()),
    });

    let outcome = match manager.get(&mut txn, root.id()) {
        Ok(_) => "found".to_string(),
        Err(e) => e.to_string(),
    };
    steps.push(Step {
        action: "get",
        entity: root.id().to_string(),
        outcome,
    });

    manager.commit(&mut txn)?;

    let result = ScenarioResult {
        steps,
        stats: manager.stats().snapshot(),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &ScenarioResult) {
    println!("Scenario");
    println!("========");
    for (i, step) in result.steps.iter().enumerate() {
        println!("{:>2}. {:<13} {}", i + 1, step.action, step.entity);
        println!("    {}", step.outcome);
    }
    println!();
    println!("Roots created:     {}", result.stats.roots_created);
    println!("Children created:  {}", result.stats.children_created);
    println!("Cache hits:        {}", result.stats.cache_hits);
    println!("Removals:          {}", result.stats.removals);
    println!("Cascaded removals: {}", result.stats.cascaded_removals);
}
