//! Ticket business rules checked before a job is built or admitted.
//!
//! These are separate from the trust gate: a ticket problem is a contract
//! mismatch, not an attempt to inject parameters.

use crate::error::{Error, Result};
use crate::spec::{Job, Ticket};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// The ticket must cover the job's type and must not have expired at `now`.
pub fn validate_ticket(ticket: &Ticket, job: &Job, now: OffsetDateTime) -> Result<()> {
    if ticket.job_type != job.job_type {
        return Err(rejected(
            ticket,
            format!(
                "issued for job type {} but job `{}` is {}",
                ticket.job_type, job.name, job.job_type
            ),
        ));
    }

    if let Some(expire) = ticket.expire_time {
        if expire <= now {
            let when = expire
                .format(&Rfc3339)
                .unwrap_or_else(|_| expire.unix_timestamp().to_string());
            return Err(rejected(ticket, format!("expired at {}", when)));
        }
    }

    Ok(())
}

/// Both sides of a federation must hold opposite roles for the same job type.
pub fn validate_ticket_pair(local: &Ticket, remote: &Ticket) -> Result<()> {
    if remote.role != local.role.counterpart() {
        return Err(rejected(
            local,
            format!(
                "local role {} needs a {} peer, remote ticket `{}` is {}",
                local.role,
                local.role.counterpart(),
                remote.name,
                remote.role
            ),
        ));
    }

    if local.job_type != remote.job_type {
        return Err(rejected(
            local,
            format!(
                "job type {} does not match remote ticket `{}` ({})",
                local.job_type, remote.name, remote.job_type
            ),
        ));
    }

    Ok(())
}

fn rejected(ticket: &Ticket, reason: String) -> Error {
    Error::Ticket {
        ticket: ticket.name.clone(),
        reason,
    }
}
