use serde::{Deserialize, Serialize};

pub const STATUS_SERVING: &str = "serving";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
