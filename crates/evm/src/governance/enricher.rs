use alloy::{primitives::U256, rpc::types::Log, sol_types::SolEvent};
use generic_listener::{ChainEvent, EnrichError};

use super::{
    GovernanceEventData, GovernanceEventKind, ProposalCanceled, ProposalCreated, ProposalExecuted,
    ProposalQueued, VoteCast,
};

fn decode<T: SolEvent>(log: &Log, event: &'static str) -> Result<T, EnrichError> {
    Ok(log
        .log_decode::<T>()
        .map_err(|e| EnrichError::Decode {
            event,
            source: Box::new(e),
        })?
        .inner
        .data)
}

fn to_u64(value: U256, field: &'static str) -> Result<u64, EnrichError> {
    u64::try_from(value).map_err(|_| EnrichError::NumberOverflow {
        field,
        value: value.to_string(),
    })
}

/// Builds the canonical record for one recognized governance log. Exhaustive
/// over [`GovernanceEventKind`] with no wildcard arm; proposals carry
/// everything in the log itself, so this stage needs no chain reads.
pub fn enrich(
    kind: GovernanceEventKind,
    log: &Log,
) -> Result<ChainEvent<GovernanceEventData>, EnrichError> {
    let block_number = log
        .block_number
        .ok_or(EnrichError::MissingField("blockNumber"))?;

    let event = match kind {
        GovernanceEventKind::ProposalCreated => {
            let data: ProposalCreated = decode(log, "ProposalCreated")?;
            let proposer = data.proposer.to_string();
            ChainEvent::new(
                block_number,
                GovernanceEventData::ProposalCreated {
                    id: to_u64(data.id, "id")?,
                    proposer: proposer.clone(),
                    start_block: to_u64(data.startBlock, "startBlock")?,
                    end_block: to_u64(data.endBlock, "endBlock")?,
                    description: Some(data.description.clone()),
                },
            )
            .excluding(vec![proposer])
        }

        GovernanceEventKind::VoteCast => {
            let data: VoteCast = decode(log, "VoteCast")?;
            let voter = data.voter.to_string();
            ChainEvent::new(
                block_number,
                GovernanceEventData::VoteCast {
                    id: to_u64(data.proposalId, "proposalId")?,
                    voter: voter.clone(),
                    support: data.support,
                    votes: data.votes,
                },
            )
            .excluding(vec![voter])
        }

        GovernanceEventKind::ProposalQueued => {
            let data: ProposalQueued = decode(log, "ProposalQueued")?;
            ChainEvent::new(
                block_number,
                GovernanceEventData::ProposalQueued {
                    id: to_u64(data.id, "id")?,
                    eta: to_u64(data.eta, "eta")?,
                },
            )
        }

        GovernanceEventKind::ProposalExecuted => {
            let data: ProposalExecuted = decode(log, "ProposalExecuted")?;
            ChainEvent::new(
                block_number,
                GovernanceEventData::ProposalExecuted {
                    id: to_u64(data.id, "id")?,
                },
            )
        }

        GovernanceEventKind::ProposalCanceled => {
            let data: ProposalCanceled = decode(log, "ProposalCanceled")?;
            ChainEvent::new(
                block_number,
                GovernanceEventData::ProposalCanceled {
                    id: to_u64(data.id, "id")?,
                },
            )
        }
    };

    Ok(event)
}
