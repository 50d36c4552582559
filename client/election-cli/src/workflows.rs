//! Subcommands run against a bound election session.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use election_client::{ActionOutcome, ElectionSession, ViewState};
use ethers_core::types::Address;
use tracing::info;

/// What to do with the election.
#[derive(Debug, Clone, PartialEq, Eq, clap::Subcommand)]
pub enum Workflows {
    /// Render the election once and print it
    Show,
    /// Print the election again after every contract event until Ctrl-C
    Watch,
    /// Vote for a candidate
    Vote {
        /// Id of the candidate, as shown by `show`
        candidate_id: u64,
    },
    /// Register an account as a voter
    RegisterVoter {
        /// The voter's address
        #[arg(value_parser = parse_address)]
        address: Address,
    },
    /// Remove a candidate from the election
    RemoveCandidate {
        /// Id of the candidate, as shown by `show`
        candidate_id: u64,
    },
    /// Close the election
    EndElection,
    /// Clear every vote and voter
    ResetElection,
    /// Print the active candidates as JSON
    Candidates,
}

fn parse_address(value: &str) -> Result<Address, String> {
    value
        .parse()
        .map_err(|e| format!("invalid address `{value}`: {e}"))
}

impl Workflows {
    /// Runs the workflow, writing what it shows to `out`.
    pub async fn run(
        self,
        session: &Arc<ElectionSession>,
        out: &mut impl Write,
    ) -> Result<(), anyhow::Error> {
        session.render().await;
        let outcome = match self {
            Workflows::Show => {
                write!(out, "{}", session.view())?;
                return Ok(());
            }
            Workflows::Watch => {
                let ctrl_c = async {
                    let _ = tokio::signal::ctrl_c().await;
                };
                return watch_until(session, out, ctrl_c).await;
            }
            Workflows::Candidates => {
                let view = session.view();
                writeln!(out, "{}", serde_json::to_string_pretty(&view.results)?)?;
                return Ok(());
            }
            Workflows::Vote { candidate_id } => session.cast_vote(candidate_id).await,
            Workflows::RegisterVoter { address } => session.register_voter(address).await,
            Workflows::RemoveCandidate { candidate_id } => {
                session.remove_candidate(candidate_id).await
            }
            Workflows::EndElection => session.end_election().await,
            Workflows::ResetElection => session.reset_election().await,
        };

        writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
        write!(out, "{}", session.view())?;
        match outcome {
            ActionOutcome::Confirmed(_) => Ok(()),
            ActionOutcome::Ignored => anyhow::bail!("Another transaction is still pending"),
            ActionOutcome::Rejected(reason) => anyhow::bail!("Transaction rejected: {reason}"),
        }
    }
}

/// Subscribes to contract events and prints every settled view until `shutdown` resolves.
///
/// A view is settled once the loader is hidden; intermediate states of a render are skipped.
pub async fn watch_until(
    session: &Arc<ElectionSession>,
    out: &mut impl Write,
    shutdown: impl Future<Output = ()>,
) -> Result<(), anyhow::Error> {
    let _subscriptions = session.listen_for_events().await;
    let mut views = session.watch_view();
    let mut printed: Option<ViewState> = None;
    tokio::pin!(shutdown);

    loop {
        let view = views.borrow_and_update().clone();
        if !view.loader_visible && printed.as_ref() != Some(&view) {
            write!(out, "{view}")?;
            writeln!(out)?;
            out.flush()?;
            printed = Some(view);
        }

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Stopped watching the election");
                break;
            }
        }
    }
    Ok(())
}
