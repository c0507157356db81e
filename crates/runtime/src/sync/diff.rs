//! Field-by-field comparison of JSON documents.

use std::collections::BTreeSet;

use battle_core::SerializedGameState;
use serde_json::Value;

use super::hash::canonical_value;

/// Paths at which `local` and `remote` differ, in document order.
///
/// Object members are joined with `.`, array elements with `[i]`, e.g.
/// `units[0].hp`. A member or element present on one side only is reported
/// at its own path. Differing root scalars are reported as `$`.
pub fn diff_values(local: &Value, remote: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    walk(local, remote, "", &mut paths);
    paths
}

/// Differing paths between two states, ignoring client-local fields.
pub fn diff_states(
    local: &SerializedGameState,
    remote: &SerializedGameState,
) -> serde_json::Result<Vec<String>> {
    Ok(diff_values(
        &canonical_value(local)?,
        &canonical_value(remote)?,
    ))
}

fn walk(local: &Value, remote: &Value, path: &str, out: &mut Vec<String>) {
    match (local, remote) {
        (Value::Object(left), Value::Object(right)) => {
            let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
            for key in keys {
                let child = member_path(path, key);
                match (left.get(key), right.get(key)) {
                    (Some(a), Some(b)) => walk(a, b, &child, out),
                    _ => out.push(child),
                }
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            for index in 0..left.len().max(right.len()) {
                let child = format!("{path}[{index}]");
                match (left.get(index), right.get(index)) {
                    (Some(a), Some(b)) => walk(a, b, &child, out),
                    _ => out.push(child),
                }
            }
        }
        (a, b) if a == b => {}
        _ => out.push(if path.is_empty() {
            "$".to_owned()
        } else {
            path.to_owned()
        }),
    }
}

fn member_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reference() -> Value {
        json!({
            "gameTick": 300,
            "units": [
                { "id": 1, "hp": 40.0, "resources": [{ "kind": "mana", "current": 20.0 }] },
                { "id": 2, "hp": 12.5, "resources": [] }
            ],
            "waitingForOrders": null
        })
    }

    #[test]
    fn identical_documents_have_no_diff() {
        assert!(diff_values(&reference(), &reference()).is_empty());
    }

    #[test]
    fn single_mutation_reports_exactly_its_path() {
        let mut local = reference();
        local["units"][0]["hp"] = json!(39.0);
        assert_eq!(diff_values(&local, &reference()), vec!["units[0].hp"]);
    }

    #[test]
    fn nested_array_indices_are_part_of_the_path() {
        let mut local = reference();
        local["units"][0]["resources"][0]["current"] = json!(0.0);
        assert_eq!(
            diff_values(&local, &reference()),
            vec!["units[0].resources[0].current"]
        );
    }

    #[test]
    fn length_and_type_changes_are_reported_where_they_occur() {
        let mut local = reference();
        local["units"].as_array_mut().unwrap().pop();
        local["waitingForOrders"] = json!({ "unitId": 1, "ownerId": "alice" });
        assert_eq!(
            diff_values(&local, &reference()),
            vec!["units[1]", "waitingForOrders"]
        );
    }

    #[test]
    fn differing_scalars_at_root() {
        assert_eq!(diff_values(&json!(1), &json!(2)), vec!["$"]);
    }
}
