use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::principal::Principal;

/// Per-instance, per-action verdict returned by the decision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Allow,
    Deny,
}

/// One authorization question: a principal, a resource kind with the
/// instances being acted on, and the actions to check for each of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub principal: Principal,
    pub resource: ResourceCheck,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCheck {
    pub kind: String,
    pub instances: HashMap<String, InstanceAttrs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceAttrs {
    #[serde(default)]
    pub attr: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub results: HashMap<String, HashMap<String, Verdict>>,
}

impl CheckRequest {
    /// Builds the single-instance, single-action request shape the gateway
    /// sends. The instance key must be the same value later passed to
    /// [`CheckResponse::is_authorized`].
    pub fn single(
        principal: Principal,
        kind: &str,
        instance_id: &str,
        attr: Map<String, Value>,
        action: &str,
    ) -> Self {
        let mut instances = HashMap::with_capacity(1);
        instances.insert(instance_id.to_string(), InstanceAttrs { attr });
        Self {
            principal,
            resource: ResourceCheck {
                kind: kind.to_string(),
                instances,
            },
            actions: vec![action.to_string()],
        }
    }
}

impl CheckResponse {
    /// Returns true only for an explicit ALLOW verdict. A missing instance
    /// or action entry reads as denied.
    pub fn is_authorized(&self, instance_id: &str, action: &str) -> bool {
        matches!(
            self.results
                .get(instance_id)
                .and_then(|verdicts| verdicts.get(action)),
            Some(Verdict::Allow)
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let mut attr = Map::new();
        attr.insert("id".to_string(), json!("7"));

        let principal = Principal::new("demoUser", vec!["admin".to_string()]);
        let req = CheckRequest::single(principal, "posts", "7", attr, "delete");

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "principal": {"id": "demoUser", "roles": ["admin"], "attr": {}},
                "resource": {"kind": "posts", "instances": {"7": {"attr": {"id": "7"}}}},
                "actions": ["delete"],
            })
        );
    }

    #[test]
    fn test_is_authorized() {
        let resp: CheckResponse = serde_json::from_value(json!({
            "results": {"7": {"delete": "ALLOW", "edit": "DENY"}}
        }))
        .unwrap();

        assert!(resp.is_authorized("7", "delete"));
        assert!(!resp.is_authorized("7", "edit"));
        assert!(!resp.is_authorized("7", "show"));
        assert!(!resp.is_authorized("8", "delete"));
    }

    #[test]
    fn test_empty_response() {
        let resp: CheckResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!resp.is_authorized("7", "delete"));
    }
}
