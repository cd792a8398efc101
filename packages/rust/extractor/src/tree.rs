//! Template component tree representation and the question walk.
//!
//! A guide template is an arbitrarily nested document of layout containers,
//! questions, option labels, and static text. The classification rule is a
//! single pattern match on [`ComponentNode`]: a node is a *question* iff it
//! carries both its own `name` and `label`. Option sub-components copy the
//! parent's contextual label without a `name` of their own, which is what
//! keeps them out of the result set.

use std::collections::BTreeMap;

use serde_json::Value;

// ---------------------------------------------------------------------------
// ComponentNode
// ---------------------------------------------------------------------------

/// One node of a template component tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentNode {
    /// An object component with optional identity fields and child components.
    Object {
        name: Option<String>,
        label: Option<String>,
        children: Vec<ComponentNode>,
    },
    /// An ordered collection of child components.
    Array(Vec<ComponentNode>),
    /// A scalar with no structure of its own.
    Leaf,
}

impl From<&Value> for ComponentNode {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                // Both field spellings occur in the wild; capitalized wins.
                let name = field_string(map, "Name").or_else(|| field_string(map, "name"));
                let label = field_string(map, "Label").or_else(|| field_string(map, "label"));
                let children = map.values().map(ComponentNode::from).collect();
                ComponentNode::Object {
                    name,
                    label,
                    children,
                }
            }
            Value::Array(items) => {
                ComponentNode::Array(items.iter().map(ComponentNode::from).collect())
            }
            _ => ComponentNode::Leaf,
        }
    }
}

/// Read a non-empty string field from an object, or None.
fn field_string(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

// ---------------------------------------------------------------------------
// Question walk
// ---------------------------------------------------------------------------

/// Recursively collect `(name, label)` pairs for every question node.
///
/// A question node's children are still walked: conditional sub-fields nest
/// questions inside questions, and both levels are emitted. Label overrides
/// replace the template-derived label by question name before emission.
pub fn extract_question_pairs(
    node: &ComponentNode,
    overrides: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    walk(node, overrides, &mut pairs);
    pairs
}

fn walk(
    node: &ComponentNode,
    overrides: &BTreeMap<String, String>,
    pairs: &mut Vec<(String, String)>,
) {
    match node {
        ComponentNode::Object {
            name,
            label,
            children,
        } => {
            if let (Some(name), Some(label)) = (name, label) {
                let label = overrides.get(name).unwrap_or(label);
                pairs.push((name.clone(), label.clone()));
            }
            for child in children {
                walk(child, overrides, pairs);
            }
        }
        ComponentNode::Array(items) => {
            for item in items {
                walk(item, overrides, pairs);
            }
        }
        ComponentNode::Leaf => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn pairs_of(tree: serde_json::Value) -> Vec<(String, String)> {
        extract_question_pairs(&ComponentNode::from(&tree), &no_overrides())
    }

    #[test]
    fn emits_nodes_with_both_name_and_label() {
        let pairs = pairs_of(serde_json::json!({
            "Name": "Q1",
            "Label": "Did you agree?"
        }));
        assert_eq!(pairs, vec![("Q1".to_string(), "Did you agree?".to_string())]);
    }

    #[test]
    fn skips_label_only_option_nodes() {
        // Options copy the parent's label but have no identity of their own
        let pairs = pairs_of(serde_json::json!({
            "Name": "Q1",
            "Label": "Pick one",
            "Options": [
                { "Label": "Yes" },
                { "Label": "No" }
            ]
        }));
        assert_eq!(pairs, vec![("Q1".to_string(), "Pick one".to_string())]);
    }

    #[test]
    fn skips_name_only_containers() {
        let pairs = pairs_of(serde_json::json!({
            "Name": "Section1",
            "Body": [
                { "Name": "Q1", "Label": "First question" }
            ]
        }));
        assert_eq!(
            pairs,
            vec![("Q1".to_string(), "First question".to_string())]
        );
    }

    #[test]
    fn walks_heterogeneous_nesting() {
        let pairs = pairs_of(serde_json::json!({
            "Head": { "Title": "Welcome" },
            "Body": [
                {
                    "Type": "Section",
                    "Content": {
                        "Items": [
                            { "Name": "Q1", "Label": "First" },
                            { "name": "Q2", "label": "Second" }
                        ]
                    }
                }
            ]
        }));
        assert_eq!(
            pairs,
            vec![
                ("Q1".to_string(), "First".to_string()),
                ("Q2".to_string(), "Second".to_string())
            ]
        );
    }

    #[test]
    fn question_nodes_are_not_pruned_early() {
        // A question whose children are themselves questions emits both
        let pairs = pairs_of(serde_json::json!({
            "Name": "Q1",
            "Label": "Outer",
            "Conditional": { "Name": "Q1_Detail", "Label": "Inner" }
        }));
        assert!(pairs.contains(&("Q1".to_string(), "Outer".to_string())));
        assert!(pairs.contains(&("Q1_Detail".to_string(), "Inner".to_string())));
    }

    #[test]
    fn overrides_replace_template_label() {
        let overrides = BTreeMap::from([("Q4".to_string(), "Custom".to_string())]);
        let tree = serde_json::json!([
            { "Name": "Q4", "Label": "Original" },
            { "Name": "Q5", "Label": "Untouched" }
        ]);
        let pairs = extract_question_pairs(&ComponentNode::from(&tree), &overrides);
        assert_eq!(
            pairs,
            vec![
                ("Q4".to_string(), "Custom".to_string()),
                ("Q5".to_string(), "Untouched".to_string())
            ]
        );
    }

    #[test]
    fn empty_strings_do_not_classify() {
        let pairs = pairs_of(serde_json::json!({ "Name": "", "Label": "Text" }));
        assert!(pairs.is_empty());
    }

    #[test]
    fn non_string_identity_fields_do_not_classify() {
        let pairs = pairs_of(serde_json::json!({ "Name": 7, "Label": "Text" }));
        assert!(pairs.is_empty());
    }

    #[test]
    fn scalars_produce_nothing() {
        assert!(pairs_of(serde_json::json!("just text")).is_empty());
        assert!(pairs_of(serde_json::json!(null)).is_empty());
        assert!(pairs_of(serde_json::json!(42)).is_empty());
    }
}
