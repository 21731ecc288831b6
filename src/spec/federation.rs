//! Federation settings: cluster defaults and per-role peer topologies.
//!
//! JSON shape:
//! {
//!   "name": "federation-a",
//!   "k8s_settings": {
//!     "global_job_spec":     { "apiVersion": "fedlearner.k8s.io/v1alpha1", "kind": "FLApp", ... },
//!     "global_replica_spec": { "template": { "spec": { "containers": { "env": [ ... ] } } } },
//!     "leader_peer_spec":    { "Follower": { "peerURL": "...", "authority": "..." } },
//!     "follower_peer_spec":  { "Leader":   { "peerURL": "...", "authority": "..." } }
//!   }
//! }
//!
//! Raw input is lenient; `validate_and_build` rejects anything the assembler
//! cannot build a complete spec from.

use crate::diagnostics;
use crate::error::{Error, Result};
use crate::spec::Role;

use serde::Deserialize;
use serde_json::Value;

/// Raw federation shape as the collaborator hands it over.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFederation {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub k8s_settings: Option<K8sSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct K8sSettings {
    #[serde(default)]
    pub global_job_spec: Value,

    #[serde(default)]
    pub global_replica_spec: Value,

    #[serde(default)]
    pub leader_peer_spec: Value,

    #[serde(default)]
    pub follower_peer_spec: Value,
}

/// Validated federation settings. Both global specs are JSON objects and both
/// peer topologies are present.
#[derive(Debug, Clone)]
pub struct FederationConfig {
    pub name: Option<String>,
    pub global_job_spec: Value,
    pub global_replica_spec: Value,
    pub leader_peer_spec: Value,
    pub follower_peer_spec: Value,
}

impl RawFederation {
    pub fn validate_and_build(&self) -> Result<FederationConfig> {
        let label = self.name.as_deref().unwrap_or("<unnamed>");
        let Some(settings) = &self.k8s_settings else {
            return Err(configuration(format!(
                "federation {} has no k8s_settings",
                label
            )));
        };

        for (field, value) in [
            ("global_job_spec", &settings.global_job_spec),
            ("global_replica_spec", &settings.global_replica_spec),
        ] {
            if !value.is_object() {
                return Err(configuration(format!(
                    "federation {}: k8s_settings.{} must be an object, found {}",
                    label,
                    field,
                    kind_of(value)
                )));
            }
        }

        for (field, value) in [
            ("leader_peer_spec", &settings.leader_peer_spec),
            ("follower_peer_spec", &settings.follower_peer_spec),
        ] {
            if value.is_null() {
                return Err(configuration(format!(
                    "federation {}: k8s_settings.{} is missing",
                    label, field
                )));
            }
        }

        Ok(FederationConfig {
            name: self.name.clone(),
            global_job_spec: settings.global_job_spec.clone(),
            global_replica_spec: settings.global_replica_spec.clone(),
            leader_peer_spec: settings.leader_peer_spec.clone(),
            follower_peer_spec: settings.follower_peer_spec.clone(),
        })
    }
}

impl FederationConfig {
    /// Topology the party holding `role` connects with.
    pub fn peer_spec(&self, role: Role) -> &Value {
        match role {
            Role::Leader => &self.leader_peer_spec,
            Role::Follower => &self.follower_peer_spec,
        }
    }
}

fn configuration(msg: String) -> Error {
    Error::Configuration(diagnostics::error_message(msg))
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(v: Value) -> RawFederation {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn builds_complete_settings() {
        let fed = raw(json!({
            "name": "fed",
            "k8s_settings": {
                "global_job_spec": { "kind": "FLApp" },
                "global_replica_spec": {},
                "leader_peer_spec": { "Follower": { "peerURL": "f:443" } },
                "follower_peer_spec": { "Leader": { "peerURL": "l:443" } },
            }
        }))
        .validate_and_build()
        .unwrap();

        assert_eq!(
            fed.peer_spec(Role::Leader),
            &json!({ "Follower": { "peerURL": "f:443" } })
        );
        assert_eq!(
            fed.peer_spec(Role::Follower),
            &json!({ "Leader": { "peerURL": "l:443" } })
        );
    }

    #[test]
    fn missing_settings_is_a_configuration_error() {
        let err = raw(json!({ "name": "fed" })).validate_and_build().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("no k8s_settings"));
    }

    #[test]
    fn non_object_defaults_are_rejected() {
        let err = raw(json!({
            "k8s_settings": {
                "global_job_spec": [],
                "global_replica_spec": {},
                "leader_peer_spec": {},
                "follower_peer_spec": {},
            }
        }))
        .validate_and_build()
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("global_job_spec must be an object, found an array"));
    }

    #[test]
    fn missing_topology_is_rejected() {
        let err = raw(json!({
            "k8s_settings": {
                "global_job_spec": {},
                "global_replica_spec": {},
                "leader_peer_spec": {},
            }
        }))
        .validate_and_build()
        .unwrap_err();
        assert!(err.to_string().contains("follower_peer_spec is missing"));
    }
}
