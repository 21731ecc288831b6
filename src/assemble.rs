//! Spec assembly: compose the FLApp document from its layers.
//!
//! Layer order (later wins on scalars, lists concatenate):
//! 1) federation `global_job_spec`
//! 2) identity: metadata.name, spec.role, spec.cleanPodPolicy, spec.peerSpecs
//! 3) ticket `public_params`
//! 4) ticket `private_params` (owner only)
//! 5) per replica group: `global_replica_spec` + injected ROLE / APPLICATION_ID
//!    env, underneath whatever the group already holds
//! 6) job params: raw `client_params` for the owner, filtered `server_params`
//!    when building on behalf of the peer
//!
//! The result carries ROLE and APPLICATION_ID in every replica group; a build
//! that cannot guarantee that fails instead of returning a partial spec.

use crate::diagnostics;
use crate::error::{Error, Result};
use crate::extract::extract;
use crate::merge::{apply_layer, merge};
use crate::spec::federation::kind_of;
use crate::spec::{FederationConfig, Job, Perspective, PolicyTable, Ticket};

use serde_json::{Map, Value, json};
use tracing::debug;

pub const ROLE_ENV: &str = "ROLE";
pub const APPLICATION_ID_ENV: &str = "APPLICATION_ID";
pub const CLEAN_POD_POLICY: &str = "None";

/// Where a layer of the assembled spec came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    Defaults,
    Identity,
    ContractPublic,
    ContractPrivate,
    ReplicaBase,
    JobParams,
}

impl LayerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerSource::Defaults => "defaults",
            LayerSource::Identity => "identity",
            LayerSource::ContractPublic => "contract-public",
            LayerSource::ContractPrivate => "contract-private",
            LayerSource::ReplicaBase => "replica-base",
            LayerSource::JobParams => "job-params",
        }
    }
}

/// A finished job spec. Only readable; callers that need to hand the document
/// on take ownership with `into_document`.
#[derive(Debug, Clone)]
pub struct AssembledSpec {
    document: Value,
    layers: Vec<LayerSource>,
}

impl AssembledSpec {
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Layers that contributed, in application order.
    pub fn layers(&self) -> &[LayerSource] {
        &self.layers
    }

    pub fn into_document(self) -> Value {
        self.document
    }
}

/// Build the spec for the local party's own job.
pub fn build_owner_spec(
    federation: &FederationConfig,
    job: &Job,
    ticket: &Ticket,
    policy: &PolicyTable,
) -> Result<AssembledSpec> {
    build_spec(federation, job, ticket, Perspective::Owner, policy)
}

/// Build the spec for a job whose parameters came from the peer.
pub fn build_peer_spec(
    federation: &FederationConfig,
    job: &Job,
    ticket: &Ticket,
    policy: &PolicyTable,
) -> Result<AssembledSpec> {
    build_spec(federation, job, ticket, Perspective::PeerValidation, policy)
}

pub fn build_spec(
    federation: &FederationConfig,
    job: &Job,
    ticket: &Ticket,
    perspective: Perspective,
    policy: &PolicyTable,
) -> Result<AssembledSpec> {
    let mut builder = Builder {
        doc: Value::Object(Map::new()),
        layers: Vec::new(),
        job: &job.name,
    };

    // 1) + 2) cluster defaults and identity.
    builder.apply(LayerSource::Defaults, &federation.global_job_spec);
    let identity = json!({
        "metadata": { "name": job.name },
        "spec": {
            "role": ticket.role.as_str(),
            "cleanPodPolicy": CLEAN_POD_POLICY,
            "peerSpecs": federation.peer_spec(ticket.role),
        },
    });
    builder.apply(LayerSource::Identity, &identity);

    // 3) + 4) contract terms.
    builder.apply(
        LayerSource::ContractPublic,
        object_or_null(&ticket.public_params, "ticket public_params")?,
    );
    if perspective == Perspective::Owner {
        builder.apply(
            LayerSource::ContractPrivate,
            object_or_null(&ticket.private_params, "ticket private_params")?,
        );
    }

    let job_params = match perspective {
        Perspective::Owner => object_or_null(&job.client_params, "job client_params")?.clone(),
        Perspective::PeerValidation => extract(&job.server_params, &job.job_type, policy),
    };

    // 5) replica base under every group, including groups first named by the
    //    job params.
    let base = merge(
        &federation.global_replica_spec,
        &json!({ "template": { "spec": { "containers": { "env": identity_env(job, ticket) } } } }),
    );
    builder.inject_replica_base(&base, &job_params)?;

    // 6) job params.
    builder.apply(LayerSource::JobParams, &job_params);

    verify_identity_env(&builder.doc, job, ticket)?;

    debug!(
        job = %job.name,
        perspective = ?perspective,
        layers = builder.layers.len(),
        "job spec assembled"
    );

    Ok(AssembledSpec {
        document: builder.doc,
        layers: builder.layers,
    })
}

struct Builder<'a> {
    doc: Value,
    layers: Vec<LayerSource>,
    job: &'a str,
}

impl Builder<'_> {
    fn apply(&mut self, source: LayerSource, layer: &Value) {
        if layer.is_null() {
            debug!(job = %self.job, layer = source.as_str(), "layer absent");
            return;
        }
        self.doc = apply_layer(&self.doc, layer);
        self.layers.push(source);
        debug!(job = %self.job, layer = source.as_str(), "layer applied");
    }

    fn inject_replica_base(&mut self, base: &Value, job_params: &Value) -> Result<()> {
        let spec = self
            .doc
            .get_mut("spec")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| configuration("spec is not an object after contract terms".into()))?;

        let slot = spec
            .entry("flReplicaSpecs")
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        let groups = match slot {
            Value::Object(m) => m,
            other => {
                return Err(configuration(format!(
                    "spec.flReplicaSpecs must be an object, found {}",
                    kind_of(other)
                )));
            }
        };

        if let Some(extra) = job_params
            .get("spec")
            .and_then(|s| s.get("flReplicaSpecs"))
            .and_then(Value::as_object)
        {
            for key in extra.keys() {
                if !groups.contains_key(key) {
                    groups.insert(key.clone(), Value::Null);
                }
            }
        }

        for (name, group) in groups.iter_mut() {
            if !(group.is_object() || group.is_null()) {
                return Err(configuration(format!(
                    "replica group `{}` must be an object, found {}",
                    name,
                    kind_of(group)
                )));
            }
            *group = apply_layer(base, group);
        }

        if !groups.is_empty() {
            self.layers.push(LayerSource::ReplicaBase);
        }
        Ok(())
    }
}

fn identity_env(job: &Job, ticket: &Ticket) -> Vec<Value> {
    vec![
        json!({ "name": ROLE_ENV, "value": ticket.role.as_str() }),
        json!({ "name": APPLICATION_ID_ENV, "value": job.name }),
    ]
}

fn object_or_null<'v>(value: &'v Value, what: &str) -> Result<&'v Value> {
    if value.is_object() || value.is_null() {
        Ok(value)
    } else {
        Err(configuration(format!(
            "{} must be an object, found {}",
            what,
            kind_of(value)
        )))
    }
}

/// After the job params were applied, `spec.flReplicaSpecs` must still be an
/// object and every replica group must still carry the injected identity
/// entries.
fn verify_identity_env(doc: &Value, job: &Job, ticket: &Ticket) -> Result<()> {
    let expected = identity_env(job, ticket);

    let spec = match doc.get("spec") {
        Some(Value::Object(spec)) => spec,
        other => {
            return Err(configuration(format!(
                "job params replaced spec with {}",
                other.map_or("nothing", kind_of)
            )));
        }
    };
    let groups = match spec.get("flReplicaSpecs") {
        Some(Value::Object(groups)) => groups,
        other => {
            return Err(configuration(format!(
                "job params replaced spec.flReplicaSpecs with {}",
                other.map_or("nothing", kind_of)
            )));
        }
    };

    for (name, group) in groups {
        let env = group
            .get("template")
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.get("env"))
            .and_then(Value::as_array);
        let intact = env.is_some_and(|env| expected.iter().all(|e| env.contains(e)));
        if !intact {
            return Err(configuration(format!(
                "replica group `{}` lost the injected {} / {} env entries",
                name, ROLE_ENV, APPLICATION_ID_ENV
            )));
        }
    }
    Ok(())
}

fn configuration(msg: String) -> Error {
    Error::Configuration(diagnostics::error_message(msg))
}
