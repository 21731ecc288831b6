use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use jobspec::render::{OutputFormat, render_document};
use jobspec::spec::{RawFederation, load_document};
use jobspec::{Job, Perspective, PolicyTable, Ticket, diagnostics, gate, ticket};

pub type Result<T> = anyhow::Result<T>;

/// Exit status for a peer that declared parameters it may not set.
const EXIT_TRUST_VIOLATION: u8 = 2;

#[derive(Parser)]
#[command(name = "fl-jobspec")]
#[command(about = "Federated job spec builder", long_about = None)]
struct Cli {
    /// Env whitelist file (JSON or YAML). Defaults to the built-in table.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the job spec (validates tickets and peer params while running).
    Build {
        #[arg(long)]
        federation: PathBuf,

        #[arg(long)]
        ticket: PathBuf,

        #[arg(long)]
        job: PathBuf,

        #[arg(long, value_enum, default_value_t = PerspectiveArg::Owner)]
        perspective: PerspectiveArg,

        /// Peer's ticket; required for peer builds so its params can be gated.
        #[arg(long, required_if_eq("perspective", "peer"))]
        remote_ticket: Option<PathBuf>,

        /// Instant used for ticket expiry (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<String>,

        #[arg(long, value_enum, default_value_t = FormatArg::Yaml)]
        format: FormatArg,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Print the permitted subset of a job's server params.
    Extract {
        #[arg(long)]
        job: PathBuf,

        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,
    },

    /// Check a peer's job against local policy and both tickets.
    Validate {
        #[arg(long)]
        job: PathBuf,

        #[arg(long)]
        local_ticket: PathBuf,

        #[arg(long)]
        remote_ticket: PathBuf,

        #[arg(long)]
        now: Option<String>,
    },

    /// Print the effective env whitelist.
    Policy {
        #[arg(long, value_enum, default_value_t = FormatArg::Yaml)]
        format: FormatArg,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PerspectiveArg {
    Owner,
    Peer,
}

impl From<PerspectiveArg> for Perspective {
    fn from(p: PerspectiveArg) -> Self {
        match p {
            PerspectiveArg::Owner => Perspective::Owner,
            PerspectiveArg::Peer => Perspective::PeerValidation,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    diagnostics::init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let trust_violation = err
                .downcast_ref::<jobspec::Error>()
                .is_some_and(jobspec::Error::is_trust_violation);
            if trust_violation {
                ExitCode::from(EXIT_TRUST_VIOLATION)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // The table is loaded once and only borrowed from here on.
    let policy = match &cli.policy {
        Some(path) => PolicyTable::load(path)
            .with_context(|| format!("load policy table {}", path.display()))?,
        None => PolicyTable::builtin(),
    };

    match cli.cmd {
        Commands::Build {
            federation,
            ticket: ticket_path,
            job,
            perspective,
            remote_ticket,
            now,
            format,
            out,
        } => {
            // 1) Load + validate inputs.
            let raw_federation: RawFederation = load(&federation)?;
            let federation = raw_federation.validate_and_build()?;
            let local: Ticket = load(&ticket_path)?;
            let job: Job = load(&job)?;
            let now = parse_now(now.as_deref())?;

            ticket::validate_ticket(&local, &job, now)?;

            // 2) Peer params must pass the gate before anything is built from them.
            let perspective = Perspective::from(perspective);
            if perspective == Perspective::PeerValidation {
                let remote_path = remote_ticket.context("peer builds need --remote-ticket")?;
                let remote: Ticket = load(&remote_path)?;
                ticket::validate_ticket_pair(&local, &remote)?;
                gate::validate_remote_job(&job, &local, &remote, &policy)?;
            }

            // 3) Assemble + render.
            let spec = jobspec::build_spec(&federation, &job, &local, perspective, &policy)?;
            let rendered = render_document(spec.document(), format.into())?;
            write_output(out.as_deref(), &rendered)?;
        }
        Commands::Extract { job, format } => {
            let job: Job = load(&job)?;
            let permitted = jobspec::extract(&job.server_params, &job.job_type, &policy);
            print!("{}", render_document(&permitted, format.into())?);
        }
        Commands::Validate {
            job,
            local_ticket,
            remote_ticket,
            now,
        } => {
            let job: Job = load(&job)?;
            let local: Ticket = load(&local_ticket)?;
            let remote: Ticket = load(&remote_ticket)?;
            let now = parse_now(now.as_deref())?;

            ticket::validate_ticket(&local, &job, now)?;
            ticket::validate_ticket_pair(&local, &remote)?;
            gate::validate_remote_job(&job, &local, &remote, &policy)?;
            println!("job {} admitted", job.name);
        }
        Commands::Policy { format } => {
            print!("{}", render_document(&policy, format.into())?);
        }
    }

    Ok(())
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    Ok(load_document(path)?)
}

fn parse_now(now: Option<&str>) -> Result<OffsetDateTime> {
    match now {
        Some(s) => OffsetDateTime::parse(s, &Rfc3339)
            .with_context(|| format!("--now is not an RFC 3339 timestamp: {}", s)),
        None => Ok(OffsetDateTime::now_utc()),
    }
}

fn write_output(out: Option<&Path>, rendered: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
