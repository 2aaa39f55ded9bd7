use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::client::RequestError;
use crate::types::check::{CheckRequest, CheckResponse};
use crate::types::principal::Principal;

/// Instance key used when the action targets a record that does not exist
/// yet, such as a create check or a list over no particular instance.
///
/// Assumes the backing store never issues "new" as a real identifier. If
/// it does, a check against that record and a creation check become
/// indistinguishable, and callers must remap their identifiers.
pub const CREATION_SENTINEL: &str = "new";

/// The decision service as seen by the gateway: one request in, one
/// verdict map out. Implemented by [`crate::client::Client`] for the real
/// service and by scripted mocks in tests.
#[async_trait]
pub trait DecisionService: Send + Sync {
    async fn check(&self, req: &CheckRequest) -> Result<CheckResponse, RequestError>;
}

/// Programming errors in the caller, surfaced before any request is
/// issued. These are the only failures [`AccessGateway::can_perform`]
/// ever returns; everything service-side collapses into a denial.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContractError {
    #[error("resource kind cannot be empty")]
    EmptyResourceKind,

    #[error("action cannot be empty")]
    EmptyAction,
}

/// Translates application-level authorization questions into decision
/// service requests and reduces the answers to a boolean suitable for
/// gating an action.
///
/// The gateway is stateless: every question costs exactly one request,
/// nothing is cached, and concurrent questions are independent.
pub struct AccessGateway<S: DecisionService> {
    service: S,
}

impl<S: DecisionService> AccessGateway<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Answers "may `principal` perform `action` on this `resource_kind`
    /// record". Fail-closed: a transport failure, timeout, non-success
    /// status or missing verdict all produce `Ok(false)`, never an error.
    ///
    /// # Arguments
    /// * `principal` - the acting identity, built by the caller
    /// * `resource_kind` - resource type name, must be non-empty
    /// * `action` - action name, must be non-empty, otherwise opaque
    /// * `record` - attributes of the record acted on; `None` for create
    ///   and list checks
    ///
    /// # Returns
    /// * `Ok(true)` only for an explicit ALLOW verdict
    /// * `Err` only for an empty `resource_kind` or `action`, raised
    ///   before any request is sent
    pub async fn can_perform(
        &self,
        principal: &Principal,
        resource_kind: &str,
        action: &str,
        record: Option<&Map<String, Value>>,
    ) -> Result<bool, ContractError> {
        if resource_kind.is_empty() {
            return Err(ContractError::EmptyResourceKind);
        }
        if action.is_empty() {
            return Err(ContractError::EmptyAction);
        }

        // The same derived id keys the outgoing instance map and the
        // verdict lookup below. Deriving it once is what keeps the two
        // from drifting apart.
        let instance_id = instance_id_of(record);
        let attr = record.cloned().unwrap_or_default();
        let req = CheckRequest::single(principal.clone(), resource_kind, &instance_id, attr, action);

        let resp = match self.service.check(&req).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!("Decision request for '{action}' on '{resource_kind}/{instance_id}' failed, denying: {err:#}");
                return Ok(false);
            }
        };

        let allow = resp.is_authorized(&instance_id, action);
        debug!("Decision for '{action}' on '{resource_kind}/{instance_id}': allow={allow}");
        Ok(allow)
    }
}

/// Derives the instance key for a record: its `id` field when present and
/// non-empty, the creation sentinel otherwise. Numeric identifiers are
/// carried as their decimal form.
fn instance_id_of(record: Option<&Map<String, Value>>) -> String {
    match record.and_then(|record| record.get("id")) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => CREATION_SENTINEL.to_string(),
    }
}
