//! Trust gate for job params received from the peer.
//!
//! A remote job is admitted only when re-extracting its server params yields
//! exactly the document the peer declared. Dropping the excess silently would
//! let the running job differ from what the peer believes it submitted, so any
//! divergence is a hard `TrustViolation`.
//!
//! Comparison is order-sensitive for arrays and key-set-sensitive for objects
//! (key order within an object does not matter).

use crate::error::{Error, Result};
use crate::extract::extract;
use crate::spec::{Job, PolicyTable, Ticket};

use serde_json::Value;
use tracing::{info, warn};

/// Admit or reject `job.server_params`. Ticket business rules live in
/// [`crate::ticket`]; the tickets here only label the decision in logs.
pub fn validate_remote_job(
    job: &Job,
    local_ticket: &Ticket,
    remote_ticket: &Ticket,
    policy: &PolicyTable,
) -> Result<()> {
    let declared = &job.server_params;
    let permitted = extract(declared, &job.job_type, policy);

    if let Some(pointer) = first_divergence(declared, &permitted) {
        warn!(
            job = %job.name,
            job_type = %job.job_type,
            local_ticket = %local_ticket.name,
            remote_ticket = %remote_ticket.name,
            pointer = %pointer,
            "rejecting remote job: declared params exceed permitted params"
        );
        return Err(Error::TrustViolation {
            job: job.name.clone(),
            pointer,
        });
    }

    info!(
        job = %job.name,
        job_type = %job.job_type,
        local_role = %local_ticket.role,
        remote_role = %remote_ticket.role,
        "remote job admitted"
    );
    Ok(())
}

/// JSON pointer of the first place `declared` and `permitted` differ, or
/// `None` when they are structurally equal. The root is reported as `/`.
pub fn first_divergence(declared: &Value, permitted: &Value) -> Option<String> {
    let mut path = Vec::new();
    if !diverges(declared, permitted, &mut path) {
        return None;
    }
    if path.is_empty() {
        return Some("/".to_string());
    }
    Some(path.iter().map(|seg| format!("/{}", escape(seg))).collect())
}

/// On divergence, leaves the offending location in `path`.
fn diverges(a: &Value, b: &Value, path: &mut Vec<String>) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            for (key, av) in x {
                path.push(key.clone());
                match y.get(key) {
                    None => return true,
                    Some(bv) if diverges(av, bv, path) => return true,
                    Some(_) => {}
                }
                path.pop();
            }
            if let Some(key) = y.keys().find(|k| !x.contains_key(*k)) {
                path.push(key.clone());
                return true;
            }
            false
        }
        (Value::Array(x), Value::Array(y)) => {
            for (i, (av, bv)) in x.iter().zip(y.iter()).enumerate() {
                path.push(i.to_string());
                if diverges(av, bv, path) {
                    return true;
                }
                path.pop();
            }
            if x.len() != y.len() {
                path.push(x.len().min(y.len()).to_string());
                return true;
            }
            false
        }
        _ => a != b,
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{JobType, Role};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ticket(name: &str, role: Role) -> Ticket {
        Ticket {
            name: name.to_string(),
            job_type: JobType::TreeModel,
            role,
            sdk_version: None,
            expire_time: None,
            public_params: Value::Null,
            private_params: Value::Null,
        }
    }

    fn job(server_params: Value) -> Job {
        Job {
            name: "job-1".to_string(),
            job_type: JobType::TreeModel,
            client_params: Value::Null,
            server_params,
        }
    }

    fn check(server_params: Value) -> Result<()> {
        validate_remote_job(
            &job(server_params),
            &ticket("local", Role::Follower),
            &ticket("remote", Role::Leader),
            &PolicyTable::builtin(),
        )
    }

    #[test]
    fn rejects_non_whitelisted_env() {
        let err = check(json!({ "spec": { "flReplicaSpecs": { "g1": {
            "template": { "spec": { "containers": { "env": [
                { "name": "SECRET_ENV", "value": "x" },
            ] } } }
        } } } }))
        .unwrap_err();

        assert!(err.is_trust_violation());
        match err {
            Error::TrustViolation { job, pointer } => {
                assert_eq!(job, "job-1");
                assert_eq!(pointer, "/spec/flReplicaSpecs/g1/template/spec/containers/env/0");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn admits_exactly_permitted_params() {
        check(json!({ "spec": { "flReplicaSpecs": { "worker": {
            "replicas": 4,
            "template": { "spec": { "containers": {
                "resources": { "limits": { "cpu": "2" } },
                "env": [{ "name": "MAX_DEPTH", "value": "6" }],
            } } }
        } } } }))
        .unwrap();
    }

    #[test]
    fn null_params_are_rejected_but_empty_object_is_admitted() {
        check(Value::Null).unwrap_err();
        check(json!({})).unwrap();
    }

    #[test]
    fn extra_fields_are_rejected_not_stripped() {
        let err = check(json!({ "spec": {
            "flReplicaSpecs": {},
            "cleanPodPolicy": "All",
        } }))
        .unwrap_err();
        assert!(matches!(err, Error::TrustViolation { ref pointer, .. } if pointer == "/spec/cleanPodPolicy"));
    }

    #[test]
    fn divergence_pointers() {
        assert_eq!(first_divergence(&json!({ "a": 1 }), &json!({ "a": 1 })), None);
        assert_eq!(first_divergence(&json!(1), &json!({})), Some("/".to_string()));
        assert_eq!(
            first_divergence(&json!({ "a/b": { "c~": 1 } }), &json!({ "a/b": { "c~": 2 } })),
            Some("/a~1b/c~0".to_string())
        );
        assert_eq!(
            first_divergence(&json!({ "l": [1, 2] }), &json!({ "l": [1] })),
            Some("/l/1".to_string())
        );
        assert_eq!(
            first_divergence(&json!({}), &json!({ "extra": true })),
            Some("/extra".to_string())
        );
    }

    #[test]
    fn list_order_matters_but_key_order_does_not() {
        assert!(first_divergence(&json!([1, 2]), &json!([2, 1])).is_some());
        assert_eq!(
            first_divergence(&json!({ "a": 1, "b": 2 }), &json!({ "b": 2, "a": 1 })),
            None
        );
    }
}
