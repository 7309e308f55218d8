use common::config::EnricherSettings;
use generic_listener::{with_timeout, ChainEvent, EnrichError};
use serde_json::Value;

use crate::{
    api::SubstrateApi,
    kinds::{SubstrateEventData, SubstrateEventKind},
    types::{RawEvent, RawExtrinsic},
};

/// The raw material one canonical event is built from: a pallet event or,
/// for call-derived kinds, the extrinsic itself.
pub enum RawEntry<'a> {
    Event(&'a RawEvent),
    Extrinsic(&'a RawExtrinsic),
}

impl<'a> RawEntry<'a> {
    fn event(&self, kind: &'static str) -> Result<&'a RawEvent, EnrichError> {
        match self {
            RawEntry::Event(event) => Ok(event),
            RawEntry::Extrinsic(_) => Err(EnrichError::UnexpectedShape(kind)),
        }
    }

    fn extrinsic(&self, kind: &'static str) -> Result<&'a RawExtrinsic, EnrichError> {
        match self {
            RawEntry::Extrinsic(extrinsic) => Ok(extrinsic),
            RawEntry::Event(_) => Err(EnrichError::UnexpectedShape(kind)),
        }
    }
}

fn field<'a>(data: &'a Value, key: &'static str) -> Result<&'a Value, EnrichError> {
    data.get(key).ok_or(EnrichError::MissingField(key))
}

fn string(data: &Value, key: &'static str) -> Result<String, EnrichError> {
    field(data, key)?
        .as_str()
        .map(str::to_string)
        .ok_or(EnrichError::MissingField(key))
}

fn index(data: &Value, key: &'static str) -> Result<u64, EnrichError> {
    field(data, key)?
        .as_u64()
        .ok_or(EnrichError::MissingField(key))
}

// Balances arrive either as JSON numbers or as decimal strings, depending on
// magnitude.
fn balance(data: &Value, key: &'static str) -> Result<u128, EnrichError> {
    let value = field(data, key)?;
    if let Some(n) = value.as_u64() {
        return Ok(n as u128);
    }
    value
        .as_str()
        .and_then(|s| s.parse::<u128>().ok())
        .ok_or(EnrichError::MissingField(key))
}

/// Builds the fully-populated canonical record for one recognized event.
///
/// This is the one place mid-pipeline network I/O is allowed: several kinds
/// read auxiliary chain state to fill fields the raw event does not carry.
/// The match is exhaustive over [`SubstrateEventKind`] with no wildcard arm,
/// so the parser and this function cannot drift apart without a compile
/// error.
pub async fn enrich(
    api: &dyn SubstrateApi,
    block_number: u64,
    kind: SubstrateEventKind,
    raw: RawEntry<'_>,
    settings: &EnricherSettings,
) -> Result<ChainEvent<SubstrateEventData>, EnrichError> {
    let event = match kind {
        SubstrateEventKind::BalanceTransfer => {
            let data = &raw.event("balance-transfer")?.data;
            let sender = string(data, "from")?;
            let dest = string(data, "to")?;
            let value = balance(data, "value")?;
            let event = ChainEvent::new(
                block_number,
                SubstrateEventData::BalanceTransfer {
                    sender: sender.clone(),
                    dest: dest.clone(),
                    value,
                },
            );
            // broadcast large transfers to every watcher except the sender;
            // keep small ones between the two parties
            if value >= settings.transfer_broadcast_threshold {
                event.excluding(vec![sender])
            } else {
                event.including(vec![sender, dest])
            }
        }

        SubstrateEventKind::Bonded => {
            let data = &raw.event("bonded")?.data;
            let stash = string(data, "stash")?;
            let amount = balance(data, "amount")?;
            let controller = with_timeout(api.bonded_controller(&stash))
                .await?
                .unwrap_or_else(|| stash.clone());
            ChainEvent::new(
                block_number,
                SubstrateEventData::Bonded {
                    stash: stash.clone(),
                    controller,
                    amount,
                },
            )
            .including(vec![stash])
        }

        SubstrateEventKind::Unbonded => {
            let data = &raw.event("unbonded")?.data;
            let stash = string(data, "stash")?;
            let amount = balance(data, "amount")?;
            let controller = with_timeout(api.bonded_controller(&stash))
                .await?
                .unwrap_or_else(|| stash.clone());
            ChainEvent::new(
                block_number,
                SubstrateEventData::Unbonded {
                    stash: stash.clone(),
                    controller,
                    amount,
                },
            )
            .including(vec![stash])
        }

        SubstrateEventKind::StakingReward => {
            let data = &raw.event("staking-reward")?.data;
            let validator = string(data, "stash")?;
            let amount = balance(data, "amount")?;
            ChainEvent::new(
                block_number,
                SubstrateEventData::StakingReward {
                    validator: validator.clone(),
                    amount,
                },
            )
            .including(vec![validator])
        }

        SubstrateEventKind::DemocracyProposed => {
            let data = &raw.event("democracy-proposed")?.data;
            let proposal_index = index(data, "proposalIndex")?;
            // the event itself names nobody; depositOf holds the bond and
            // the depositors, first of which is the proposer
            let (deposit, depositors) = with_timeout(api.proposal_deposit(proposal_index))
                .await?
                .ok_or(EnrichError::MissingField("depositOf"))?;
            let proposer = depositors
                .first()
                .cloned()
                .ok_or(EnrichError::MissingField("depositors"))?;
            ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyProposed {
                    proposal_index,
                    proposer: proposer.clone(),
                    deposit,
                },
            )
            .excluding(vec![proposer])
        }

        SubstrateEventKind::DemocracySeconded => {
            let extrinsic = raw.extrinsic("democracy-seconded")?;
            let who = extrinsic
                .signer
                .clone()
                .ok_or(EnrichError::MissingField("signer"))?;
            let proposal_index = index(&extrinsic.args, "proposal")?;
            ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracySeconded {
                    proposal_index,
                    who: who.clone(),
                },
            )
            .excluding(vec![who])
        }

        SubstrateEventKind::DemocracyStarted => {
            let data = &raw.event("democracy-started")?.data;
            let referendum_index = index(data, "refIndex")?;
            let vote_threshold = string(data, "threshold")?;
            let end_block = with_timeout(api.referendum_end(referendum_index))
                .await?
                .unwrap_or(block_number);
            ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyStarted {
                    referendum_index,
                    vote_threshold,
                    end_block,
                },
            )
        }

        SubstrateEventKind::DemocracyPassed => {
            let data = &raw.event("democracy-passed")?.data;
            ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyPassed {
                    referendum_index: index(data, "refIndex")?,
                },
            )
        }

        SubstrateEventKind::DemocracyNotPassed => {
            let data = &raw.event("democracy-not-passed")?.data;
            ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyNotPassed {
                    referendum_index: index(data, "refIndex")?,
                },
            )
        }

        SubstrateEventKind::DemocracyCancelled => {
            let data = &raw.event("democracy-cancelled")?.data;
            ChainEvent::new(
                block_number,
                SubstrateEventData::DemocracyCancelled {
                    referendum_index: index(data, "refIndex")?,
                },
            )
        }

        SubstrateEventKind::TreasuryProposed => {
            let data = &raw.event("treasury-proposed")?.data;
            let proposal_index = index(data, "proposalIndex")?;
            let proposal = with_timeout(api.treasury_proposal(proposal_index))
                .await?
                .ok_or(EnrichError::MissingField("proposals"))?;
            ChainEvent::new(
                block_number,
                SubstrateEventData::TreasuryProposed {
                    proposal_index,
                    proposer: proposal.proposer.clone(),
                    beneficiary: proposal.beneficiary,
                    value: proposal.value,
                    bond: proposal.bond,
                },
            )
            .excluding(vec![proposal.proposer])
        }
    };

    Ok(event)
}
