//! Parameter extraction: project untrusted job params onto what the job type
//! is allowed to set.
//!
//! Only this shape is walked:
//! {
//!   "spec": {
//!     "flReplicaSpecs": {
//!       "<group>": {
//!         "replicas": <any>,
//!         "template": { "spec": { "containers": {
//!           "resources": <any, copied opaquely>,
//!           "env": [ { "name": "<whitelisted>", "value": "<string>" }, ... ]
//!         } } }
//!       }
//!     }
//!   }
//! }
//!
//! Anything off that path is dropped. Missing or ill-typed sections contribute
//! nothing; extraction never fails. Values are copied, never rewritten, so the
//! output is always a subset of the input.

use crate::diagnostics;
use crate::spec::{JobType, PolicyTable};

use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

pub fn extract(raw: &Value, job_type: &JobType, policy: &PolicyTable) -> Value {
    let permitted = policy.permitted(job_type);

    let Some(groups) = raw
        .get("spec")
        .and_then(|spec| spec.get("flReplicaSpecs"))
        .and_then(Value::as_object)
    else {
        return Value::Object(Map::new());
    };

    let mut out_groups = Map::new();
    for (group, src) in groups {
        out_groups.insert(group.clone(), extract_group(group, src, job_type, permitted));
    }

    json!({ "spec": { "flReplicaSpecs": out_groups } })
}

fn extract_group(
    group: &str,
    src: &Value,
    job_type: &JobType,
    permitted: &BTreeSet<String>,
) -> Value {
    let mut out = Map::new();

    if let Some(replicas) = present(src.get("replicas")) {
        out.insert("replicas".to_string(), replicas.clone());
    }

    let containers = src
        .get("template")
        .and_then(|t| t.get("spec"))
        .and_then(|s| present(s.get("containers")));

    if let Some(containers) = containers {
        let mut out_containers = Map::new();

        if let Some(resources) = present(containers.get("resources")) {
            out_containers.insert("resources".to_string(), resources.clone());
        }

        if let Some(env) = containers.get("env").and_then(Value::as_array) {
            let kept = filter_env(group, env, job_type, permitted);
            out_containers.insert("env".to_string(), Value::Array(kept));
        }

        out.insert(
            "template".to_string(),
            json!({ "spec": { "containers": out_containers } }),
        );
    }

    Value::Object(out)
}

fn filter_env(
    group: &str,
    env: &[Value],
    job_type: &JobType,
    permitted: &BTreeSet<String>,
) -> Vec<Value> {
    let mut kept = Vec::new();
    for entry in env {
        match classify(entry, permitted) {
            Ok((name, value)) => kept.push(json!({ "name": name, "value": value })),
            Err(reason) => diagnostics::warn(format!(
                "dropping env entry {} from replica group `{}`: {}",
                describe_entry(entry),
                group,
                reason.describe(job_type)
            )),
        }
    }
    kept
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    NotAnObject,
    NameNotString,
    NotPermitted,
    ValueNotString,
}

impl DropReason {
    fn describe(self, job_type: &JobType) -> String {
        match self {
            DropReason::NotAnObject => "entry is not an object".to_string(),
            DropReason::NameNotString => "name is not a string".to_string(),
            DropReason::NotPermitted => format!("not permitted for job type {}", job_type),
            DropReason::ValueNotString => "value is not a string".to_string(),
        }
    }
}

/// Name and value of an entry that may be kept.
fn classify<'v>(
    entry: &'v Value,
    permitted: &BTreeSet<String>,
) -> Result<(&'v str, &'v str), DropReason> {
    let fields = entry.as_object().ok_or(DropReason::NotAnObject)?;
    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .ok_or(DropReason::NameNotString)?;
    if !permitted.contains(name) {
        return Err(DropReason::NotPermitted);
    }
    let value = fields
        .get("value")
        .and_then(Value::as_str)
        .ok_or(DropReason::ValueNotString)?;
    Ok((name, value))
}

/// `null` counts as absent.
fn present(v: Option<&Value>) -> Option<&Value> {
    v.filter(|v| !v.is_null())
}

fn describe_entry(entry: &Value) -> String {
    match entry.get("name").and_then(Value::as_str) {
        Some(name) => format!("`{}`", name),
        None => "<unnamed>".to_string(),
    }
}
