use alloy::{primitives::U256, rpc::types::Log, sol_types::SolEvent};
use common::config::EnricherSettings;
use generic_listener::{ChainEvent, EnrichError};

use super::{Approval, Erc20EventData, Erc20EventKind, Transfer};

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

fn block_number(log: &Log) -> Result<u64, EnrichError> {
    log.block_number.ok_or(EnrichError::MissingField("blockNumber"))
}

/// Builds the canonical record for one recognized token log. Exhaustive over
/// [`Erc20EventKind`] with no wildcard arm; decode-only, token transfers
/// need no auxiliary chain reads.
pub fn enrich(
    kind: Erc20EventKind,
    log: &Log,
    settings: &EnricherSettings,
) -> Result<ChainEvent<Erc20EventData>, EnrichError> {
    let block_number = block_number(log)?;
    let event = match kind {
        Erc20EventKind::Transfer => {
            let data: Transfer = decode(log, "Transfer")?;
            let from = data.from.to_string();
            let to = data.to.to_string();
            let event = ChainEvent::new(
                block_number,
                Erc20EventData::Transfer {
                    from: from.clone(),
                    to: to.clone(),
                    value: data.value,
                },
            );
            // broadcast large transfers to every watcher except the sender;
            // keep small ones between the two parties
            if data.value >= U256::from(settings.transfer_broadcast_threshold) {
                event.excluding(vec![from])
            } else {
                event.including(vec![from, to])
            }
        }

        Erc20EventKind::Approval => {
            let data: Approval = decode(log, "Approval")?;
            let owner = data.owner.to_string();
            ChainEvent::new(
                block_number,
                Erc20EventData::Approval {
                    owner: owner.clone(),
                    spender: data.spender.to_string(),
                    value: data.value,
                },
            )
            .including(vec![owner])
        }
    };

    Ok(event)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, U256};

    use super::*;
    use crate::test_util::{event_log, log_without_block_number};

    fn settings(threshold: u128) -> EnricherSettings {
        EnricherSettings {
            transfer_broadcast_threshold: threshold,
        }
    }

    #[test]
    fn large_transfers_broadcast_and_exclude_the_sender() {
        let from = address!("00000000000000000000000000000000000000aa");
        let to = address!("00000000000000000000000000000000000000bb");
        let log = event_log(
            50,
            &Transfer {
                from,
                to,
                value: U256::from(10_000u64),
            },
        );

        let event = enrich(Erc20EventKind::Transfer, &log, &settings(1_000)).expect("enrich");
        assert_eq!(event.block_number, 50);
        assert_eq!(event.exclude_addresses, Some(vec![from.to_string()]));
        assert_eq!(event.include_addresses, None);
    }

    #[test]
    fn small_transfers_only_notify_the_two_parties() {
        let from = address!("00000000000000000000000000000000000000aa");
        let to = address!("00000000000000000000000000000000000000bb");
        let log = event_log(
            50,
            &Transfer {
                from,
                to,
                value: U256::from(5u64),
            },
        );

        let event = enrich(Erc20EventKind::Transfer, &log, &settings(1_000)).expect("enrich");
        assert_eq!(
            event.include_addresses,
            Some(vec![from.to_string(), to.to_string()])
        );
        assert_eq!(event.exclude_addresses, None);
    }

    #[test]
    fn a_log_without_a_block_number_cannot_be_enriched() {
        let from = address!("00000000000000000000000000000000000000aa");
        let log = log_without_block_number(&Transfer {
            from,
            to: from,
            value: U256::ZERO,
        });

        let err = enrich(Erc20EventKind::Transfer, &log, &settings(0)).expect_err("no block");
        assert!(matches!(err, EnrichError::MissingField("blockNumber")));
    }
}
