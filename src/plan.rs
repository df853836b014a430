//! Generic plan modification shared by all resources.
//!
//! After a resource had the chance to adjust the proposed state, the planned
//! state is completed from the prior state (computed attributes marked
//! `use_state_for_unknown` keep their value) and diffed against it. A change
//! to a `force_new` attribute turns the update into a replacement. Set
//! attributes compare without regard to order or duplicates.

use serde_json::{Map, Value};

use crate::schema::{AttributeType, Schema};
use crate::types::{AttributeChange, PlanResult};

/// Build the plan result for `planned` against `prior`.
pub fn plan_changes(schema: &Schema, prior: Option<&Value>, mut planned: Value) -> PlanResult {
    let empty = Map::new();
    let prior_obj = prior.and_then(Value::as_object).unwrap_or(&empty);

    if let (Some(planned_obj), Some(_)) = (planned.as_object_mut(), prior) {
        for (name, attr) in &schema.attributes {
            let unknown = planned_obj.get(name).map_or(true, Value::is_null);
            if attr.flags.computed && attr.use_state_for_unknown && unknown {
                if let Some(previous) = prior_obj.get(name).filter(|v| !v.is_null()) {
                    planned_obj.insert(name.clone(), previous.clone());
                }
            }
        }
    }

    let planned_obj = planned.as_object().unwrap_or(&empty);
    let mut names: Vec<&String> = schema.attributes.keys().collect();
    names.sort();

    let mut changes = Vec::new();
    let mut requires_replace = false;
    let mut keep_prior = Vec::new();
    for name in names {
        let attr = &schema.attributes[name];
        let before = prior_obj.get(name).filter(|v| !v.is_null());
        let after = planned_obj.get(name).filter(|v| !v.is_null());
        // Computed-only values left unknown in the plan are filled in by apply.
        if after.is_none() && attr.flags.computed && !attr.flags.optional && !attr.flags.required {
            continue;
        }
        let change = match (before, after) {
            (None, None) => continue,
            (Some(b), Some(a)) if b == a => continue,
            (Some(b), Some(a)) if matches!(attr.attr_type, AttributeType::Set(_)) && same_set(b, a) => {
                keep_prior.push((name.clone(), b.clone()));
                continue;
            },
            (None, Some(a)) => AttributeChange::added(name.clone(), a.clone()),
            (Some(b), None) => AttributeChange::removed(name.clone(), b.clone()),
            (Some(b), Some(a)) => AttributeChange::modified(name.clone(), b.clone(), a.clone()),
        };
        if prior.is_some() && attr.force_new {
            requires_replace = true;
        }
        changes.push(change);
    }

    if let Some(planned_obj) = planned.as_object_mut() {
        planned_obj.extend(keep_prior);
    }
    PlanResult::with_changes(planned, changes, requires_replace)
}

fn same_set(left: &Value, right: &Value) -> bool {
    fn members(value: &Value) -> Option<Vec<String>> {
        let mut items: Vec<String> = value.as_array()?.iter().map(Value::to_string).collect();
        items.sort_unstable();
        items.dedup();
        Some(items)
    }
    match (members(left), members(right)) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

/// Build the plan result for destroying a resource.
pub fn plan_destroy(prior: &Value) -> PlanResult {
    let changes = prior
        .as_object()
        .map(|obj| {
            let mut names: Vec<&String> = obj.keys().collect();
            names.sort();
            names
                .into_iter()
                .filter(|name| !obj[*name].is_null())
                .map(|name| AttributeChange::removed(name.clone(), obj[name].clone()))
                .collect()
        })
        .unwrap_or_default();
    PlanResult::with_changes(Value::Null, changes, false)
}
