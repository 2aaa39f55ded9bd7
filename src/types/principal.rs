use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The identity on whose behalf an authorization question is asked.
///
/// Always constructed explicitly by the caller; the gateway never reads
/// session state or other ambient identity sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Open attribute map for attribute-based policy conditions. The
    /// decision service accepts arbitrary JSON values here.
    #[serde(default)]
    pub attr: Map<String, Value>,
}

impl Principal {
    pub fn new<S: ToString>(id: S, roles: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            roles,
            attr: Map::new(),
        }
    }
}
