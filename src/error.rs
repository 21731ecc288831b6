//! Error taxonomy for the job spec pipeline.
//!
//! Callers must be able to tell a misconfigured federation apart from a peer
//! that tried to inject parameters it was not entitled to, so each lives in
//! its own variant.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("trust violation for job `{job}`: declared server params diverge from permitted params at {pointer}")]
    TrustViolation { job: String, pointer: String },

    #[error("ticket `{ticket}` rejected: {reason}")]
    Ticket { ticket: String, reason: String },

    #[error("invalid policy table: {0}")]
    Policy(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid yaml in {path}: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl Error {
    pub fn is_trust_violation(&self) -> bool {
        matches!(self, Error::TrustViolation { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
