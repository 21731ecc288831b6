//! Env whitelist per job type.
//!
//! File shape (JSON or YAML):
//! {
//!   "tree_model": ["VERBOSITY", "LEARNING_RATE"],
//!   "nn_model": ["MODEL_NAME"]
//! }
//!
//! Job types missing from the file permit nothing. Keys must name a known job
//! type and every entry must be a valid environment variable name. The table
//! is built once and passed by reference; it is never mutated afterwards.

use crate::error::{Error, Result};
use crate::spec::JobType;
use crate::spec::load::load_document;

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const ENV_NAME_RE: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

static NOTHING: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PolicyTable {
    envs: BTreeMap<JobType, BTreeSet<String>>,
}

impl PolicyTable {
    /// Whitelist shipped with the web console deployment.
    pub fn builtin() -> Self {
        let mut envs = BTreeMap::new();
        envs.insert(JobType::DataJoin, BTreeSet::new());
        envs.insert(JobType::PsiDataJoin, BTreeSet::new());
        envs.insert(
            JobType::TreeModel,
            [
                "VERBOSITY",
                "LEARNING_RATE",
                "MAX_ITERS",
                "MAX_DEPTH",
                "L2_REGULARIZATION",
                "MAX_BINS",
                "NUM_PARALELL",
                "VERIFY_EXAMPLE_IDS",
                "USE_STREAMING",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        );
        envs.insert(
            JobType::NnModel,
            ["MODEL_NAME"].into_iter().map(str::to_string).collect(),
        );
        PolicyTable { envs }
    }

    /// Build a table from `(job type, env names)` pairs, validating both.
    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Vec<S>)>,
        S: Into<String>,
    {
        let re = Regex::new(ENV_NAME_RE).map_err(|e| Error::Policy(e.to_string()))?;

        let mut envs: BTreeMap<JobType, BTreeSet<String>> = BTreeMap::new();
        for (key, names) in entries {
            let job_type = JobType::from(key);
            if !job_type.is_known() {
                return Err(Error::Policy(format!(
                    "unknown job type `{}`",
                    job_type
                )));
            }

            let mut set = BTreeSet::new();
            for name in names {
                let name = name.into();
                if !re.is_match(&name) {
                    return Err(Error::Policy(format!(
                        "job type `{}` lists invalid env name {:?}",
                        job_type, name
                    )));
                }
                set.insert(name);
            }
            envs.insert(job_type, set);
        }

        Ok(PolicyTable { envs })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw: BTreeMap<String, Vec<String>> = load_document(path)?;
        Self::from_entries(raw)
    }

    /// Permitted env names; empty for unknown or unlisted job types.
    pub fn permitted(&self, job_type: &JobType) -> &BTreeSet<String> {
        self.envs.get(job_type).unwrap_or(&NOTHING)
    }

    pub fn permits(&self, job_type: &JobType, name: &str) -> bool {
        self.permitted(job_type).contains(name)
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_table_matches_deployment() {
        let p = PolicyTable::builtin();
        assert!(p.permits(&JobType::TreeModel, "MAX_DEPTH"));
        assert!(!p.permits(&JobType::TreeModel, "SECRET_ENV"));
        assert!(p.permits(&JobType::NnModel, "MODEL_NAME"));
        assert!(p.permitted(&JobType::DataJoin).is_empty());
        assert!(p.permitted(&JobType::PsiDataJoin).is_empty());
        assert_eq!(p.permitted(&JobType::TreeModel).len(), 9);
    }

    #[test]
    fn unknown_job_type_permits_nothing() {
        let p = PolicyTable::builtin();
        let t = JobType::from("custom_job");
        assert!(p.permitted(&t).is_empty());
        assert!(!p.permits(&t, "MODEL_NAME"));
    }

    #[test]
    fn from_entries_rejects_bad_names_and_unknown_types() {
        let err = PolicyTable::from_entries([(
            "nn_model".to_string(),
            vec!["MODEL NAME"],
        )])
        .unwrap_err();
        assert!(err.to_string().contains("invalid env name"));

        let err =
            PolicyTable::from_entries([("gbdt".to_string(), vec!["X"])]).unwrap_err();
        assert!(err.to_string().contains("unknown job type `gbdt`"));
    }

    #[test]
    fn unlisted_known_types_permit_nothing() {
        let p = PolicyTable::from_entries([("nn_model".to_string(), vec!["BATCH_SIZE"])]).unwrap();
        assert!(p.permits(&JobType::NnModel, "BATCH_SIZE"));
        assert!(!p.permits(&JobType::NnModel, "MODEL_NAME"));
        assert!(p.permitted(&JobType::TreeModel).is_empty());
    }

    #[test]
    fn serializes_as_plain_map() {
        let p = PolicyTable::from_entries([("nn_model".to_string(), vec!["B", "A"])]).unwrap();
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            serde_json::json!({ "nn_model": ["A", "B"] })
        );
    }
}
