//! Spec layer: input document schemas + validated in-memory structures.
//!
//! This module is intentionally separate from extraction, merging and
//! assembly. It owns:
//! - job / ticket descriptors handed over by the persistence collaborator
//! - federation settings (defaults + peer topologies)
//! - the env whitelist policy table
//! - loading any of the above from JSON or YAML files

pub mod federation;
pub mod job;
pub mod load;
pub mod policy;

pub use federation::{FederationConfig, K8sSettings, RawFederation};
pub use job::{Job, JobType, Perspective, Role, Ticket};
pub use load::load_document;
pub use policy::PolicyTable;
