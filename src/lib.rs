//! Build and validate FLApp job specs for two-party federated jobs.
//!
//! Pipeline: untrusted peer params are projected through the env whitelist
//! (`extract`), the trust gate checks the peer declared nothing beyond that
//! projection (`gate`), and the assembler deep-merges defaults, topology,
//! contract terms and job params into the final document (`assemble`).

pub mod assemble;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod gate;
pub mod merge;
pub mod render;
pub mod spec;
pub mod ticket;

pub use assemble::{AssembledSpec, LayerSource, build_owner_spec, build_peer_spec, build_spec};
pub use error::{Error, Result};
pub use extract::extract;
pub use gate::validate_remote_job;
pub use merge::{merge, merge_all};
pub use spec::{FederationConfig, Job, JobType, Perspective, PolicyTable, Role, Ticket};
