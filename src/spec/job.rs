//! Job and ticket descriptors.
//!
//! JSON shape of a job:
//! {
//!   "name": "job-1",
//!   "job_type": "tree_model",
//!   "client_params": { "spec": { "flReplicaSpecs": { ... } } },   // local, trusted
//!   "server_params": { "spec": { "flReplicaSpecs": { ... } } }    // from peer, untrusted
//! }
//!
//! JSON shape of a ticket:
//! {
//!   "name": "ticket-1",
//!   "job_type": "tree_model",
//!   "role": "leader",
//!   "sdk_version": "v1.2",
//!   "expire_time": "2026-12-31T00:00:00Z",
//!   "public_params": { ... },
//!   "private_params": { ... }
//! }

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;

/// Kind of federated job. Unknown strings are kept rather than rejected: the
/// policy table grants them nothing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobType {
    DataJoin,
    PsiDataJoin,
    TreeModel,
    NnModel,
    Unknown(String),
}

impl JobType {
    pub const KNOWN: [JobType; 4] = [
        JobType::DataJoin,
        JobType::PsiDataJoin,
        JobType::TreeModel,
        JobType::NnModel,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            JobType::DataJoin => "data_join",
            JobType::PsiDataJoin => "psi_data_join",
            JobType::TreeModel => "tree_model",
            JobType::NnModel => "nn_model",
            JobType::Unknown(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JobType::Unknown(_))
    }
}

impl From<String> for JobType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "data_join" => JobType::DataJoin,
            "psi_data_join" => JobType::PsiDataJoin,
            "tree_model" => JobType::TreeModel,
            "nn_model" => JobType::NnModel,
            _ => JobType::Unknown(s),
        }
    }
}

impl From<&str> for JobType {
    fn from(s: &str) -> Self {
        JobType::from(s.to_string())
    }
}

impl From<JobType> for String {
    fn from(t: JobType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Follower => "follower",
        }
    }

    /// The role the other party must hold.
    pub fn counterpart(self) -> Role {
        match self {
            Role::Leader => Role::Follower,
            Role::Follower => Role::Leader,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whose parameters a build trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    /// Local party building its own job: raw client params, private terms included.
    Owner,
    /// Building on behalf of the remote party: server params are filtered and
    /// private terms are left out.
    PeerValidation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub name: String,

    pub job_type: JobType,

    #[serde(default)]
    pub client_params: Value,

    #[serde(default)]
    pub server_params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub name: String,

    pub job_type: JobType,

    pub role: Role,

    /// Docker image tag of the training SDK.
    #[serde(default)]
    pub sdk_version: Option<String>,

    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expire_time: Option<OffsetDateTime>,

    #[serde(default)]
    pub public_params: Value,

    #[serde(default)]
    pub private_params: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn job_type_round_trips_known_and_unknown_names() {
        for t in JobType::KNOWN {
            let v = serde_json::to_value(&t).unwrap();
            assert_eq!(serde_json::from_value::<JobType>(v).unwrap(), t);
        }
        let t: JobType = serde_json::from_value(json!("gbdt_v2")).unwrap();
        assert_eq!(t, JobType::Unknown("gbdt_v2".to_string()));
        assert!(!t.is_known());
        assert_eq!(serde_json::to_value(&t).unwrap(), json!("gbdt_v2"));
    }

    #[test]
    fn ticket_defaults_optional_fields() {
        let t: Ticket = serde_json::from_value(json!({
            "job_type": "nn_model",
            "role": "follower",
        }))
        .unwrap();
        assert_eq!(t.role, Role::Follower);
        assert_eq!(t.job_type, JobType::NnModel);
        assert!(t.expire_time.is_none());
        assert!(t.public_params.is_null());
        assert!(t.private_params.is_null());
    }

    #[test]
    fn ticket_parses_rfc3339_expiry() {
        let t: Ticket = serde_json::from_value(json!({
            "name": "t",
            "job_type": "tree_model",
            "role": "leader",
            "expire_time": "2026-01-02T03:04:05Z",
        }))
        .unwrap();
        assert_eq!(t.expire_time.unwrap().unix_timestamp(), 1_767_323_045);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let r = serde_json::from_value::<Ticket>(json!({
            "job_type": "tree_model",
            "role": "observer",
        }));
        assert!(r.is_err());
    }

    #[test]
    fn counterpart_roles() {
        assert_eq!(Role::Leader.counterpart(), Role::Follower);
        assert_eq!(Role::Follower.counterpart(), Role::Leader);
    }
}
