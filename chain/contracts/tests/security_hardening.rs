//! Security Hardening Tests
//!
//! Adversarial coverage of the settlement core:
//! - Permission escalation
//! - Replay across instances, chains and networks
//! - Incorrect and tampered signatures
//! - Pause functionality
//! - Message format freeze
//! - Fuzz testing (proptest)

mod helpers;

use bridge_contracts::asset::AssetCapability;
use bridge_contracts::config::{BridgeConfig, Network};
use bridge_contracts::errors::{
    AccessError, DepositError, GovernanceError, LockerError, QuorumError, RegistryError,
    WithdrawalError,
};
use bridge_contracts::events::BridgeEvent;
use bridge_contracts::locker::LockerSet;
use bridge_contracts::signature::{signer_address, Signature};
use bridge_contracts::{Bridge, MESSAGE_FORMAT_VERSION};
use bridge_types::ids::Address;
use helpers::*;

fn mallory() -> Address {
    Address::new([0x66; 20])
}

/// A second bridge with the same committee but a different identity.
fn sibling_bridge(config: BridgeConfig, committee: &Committee) -> Bridge<bridge_contracts::asset::LedgerAsset> {
    let mut asset = new_asset();
    asset.mint(config.bridge_address, 10_000).unwrap();
    let mut bridge = Bridge::new(config, asset).unwrap();
    bridge
        .commit_validator_set(&admin(), &committee.set, T0 - 1_000)
        .unwrap();
    bridge
}

// ═══════════════════════════════════════════════════════════════════
// Permission Tests
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_non_admin_cannot_commit_validator_set() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    let next = Committee::new(1, &[1]);
    assert_eq!(
        bridge.commit_validator_set(&mallory(), &next.set, T0),
        Err(RegistryError::Unauthorized { caller: mallory() })
    );
    assert_eq!(bridge.current_epoch(), Ok(0));
}

#[test]
fn test_non_admin_cannot_commit_locker_set() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    let set = LockerSet::new(0, 1, vec![mallory()]).unwrap();
    assert_eq!(
        bridge.commit_locker_set(&mallory(), set),
        Err(LockerError::Unauthorized { caller: mallory() })
    );
    assert!(bridge.current_locker_set().is_err());
}

#[test]
fn test_non_admin_cannot_pause() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    assert_eq!(
        bridge.pause(&mallory()),
        Err(AccessError::Unauthorized { caller: mallory() })
    );
    assert!(!bridge.is_paused());
}

#[test]
fn test_pauser_cannot_unpause() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    bridge.grant_pauser(&admin(), mallory()).unwrap();
    bridge.pause(&mallory()).unwrap();
    assert!(bridge.unpause(&mallory()).is_err());
    assert!(bridge.is_paused());
}

#[test]
fn test_non_admin_cannot_grant_pauser() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    assert!(bridge.grant_pauser(&mallory(), mallory()).is_err());
    assert!(bridge.pause(&mallory()).is_err());
}

#[test]
fn test_revoked_pauser_loses_pause() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    bridge.grant_pauser(&admin(), mallory()).unwrap();
    assert!(bridge.revoke_pauser(&mallory(), &mallory()).is_err());
    bridge.revoke_pauser(&admin(), &mallory()).unwrap();

    assert_eq!(
        bridge.pause(&mallory()),
        Err(AccessError::Unauthorized { caller: mallory() })
    );
    assert!(bridge
        .events()
        .iter()
        .any(|e| *e == BridgeEvent::PauserRevoked { account: mallory() }));
}

#[test]
fn test_admin_cannot_be_revoked_as_pauser() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    assert!(bridge.revoke_pauser(&admin(), &admin()).is_err());
    assert!(bridge.pause(&admin()).is_ok());
}

#[test]
fn test_transfer_admin_moves_every_admin_right() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    let successor = Address::new([0x5c; 20]);
    assert!(bridge.transfer_admin(&mallory(), mallory()).is_err());
    assert!(bridge.transfer_admin(&admin(), Address::ZERO).is_err());
    bridge.transfer_admin(&admin(), successor).unwrap();
    assert_eq!(bridge.admin(), successor);

    let next = Committee::new(1, &[1]);
    assert_eq!(
        bridge.commit_validator_set(&admin(), &next.set, T0),
        Err(RegistryError::Unauthorized { caller: admin() })
    );
    bridge.commit_validator_set(&successor, &next.set, T0).unwrap();
    assert!(bridge.pause(&admin()).is_err());
    bridge.pause(&successor).unwrap();
    bridge.unpause(&successor).unwrap();
    assert!(bridge.events().iter().any(|e| *e
        == BridgeEvent::AdminTransferred {
            from: admin(),
            to: successor
        }));
}

#[test]
fn test_outsider_cannot_vote_halt() {
    let (mut bridge, c) = setup_bridge(&[1], 10_000);
    let set = LockerSet::new(0, 1, vec![locker(0)]).unwrap();
    bridge.commit_locker_set(&admin(), set).unwrap();
    let i = intent(10, 1);
    let message = bridge
        .request_withdrawal(i, &c.set, &c.sign_hot(&bridge.withdrawal_digest(&i), &[0]), T0)
        .unwrap();

    assert_eq!(
        bridge.vote_halt(&mallory(), &message, T0),
        Err(WithdrawalError::Locker(LockerError::NotALocker(mallory())))
    );
    assert_eq!(bridge.halt_votes(&message), 0);
}

#[test]
fn test_duplicate_locker_vote_rejected() {
    let (mut bridge, c) = setup_bridge(&[1], 10_000);
    let set = LockerSet::new(0, 2, vec![locker(0), locker(1)]).unwrap();
    bridge.commit_locker_set(&admin(), set).unwrap();
    let i = intent(10, 1);
    let message = bridge
        .request_withdrawal(i, &c.set, &c.sign_hot(&bridge.withdrawal_digest(&i), &[0]), T0)
        .unwrap();

    bridge.vote_halt(&locker(0), &message, T0).unwrap();
    assert_eq!(
        bridge.vote_halt(&locker(0), &message, T0),
        Err(WithdrawalError::Locker(LockerError::DuplicateVote(locker(0))))
    );
    assert!(!bridge.get_record(&message).unwrap().halted);
}

// ═══════════════════════════════════════════════════════════════════
// Simulate Replay Across Domains
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_signatures_do_not_replay_across_bridge_instances() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let mut other = sibling_bridge(BridgeConfig::new(Address::new([0xb1; 20]), admin()), &c);
    let i = intent(1_000, 1);
    let sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1, 2]);

    assert_ne!(bridge.withdrawal_message(&i), other.withdrawal_message(&i));
    assert_eq!(
        other.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { slot: 0 }))
    );
    assert!(bridge.request_withdrawal(i, &c.set, &sigs, T0).is_ok());
}

#[test]
fn test_signatures_do_not_replay_across_chains() {
    let (_, c) = setup_bridge(&[100, 100, 100], 0);
    let home = sibling_bridge(config(), &c);
    let mut foreign = sibling_bridge(
        BridgeConfig {
            chain_id: 42_161,
            ..config()
        },
        &c,
    );
    let i = intent(1_000, 1);
    let sigs = c.sign_hot(&home.withdrawal_digest(&i), &[0, 1]);

    // same message, different signing domain
    assert_eq!(home.withdrawal_message(&i), foreign.withdrawal_message(&i));
    assert_ne!(home.withdrawal_digest(&i), foreign.withdrawal_digest(&i));
    assert!(matches!(
        foreign.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { .. }))
    ));
}

#[test]
fn test_testnet_signatures_rejected_on_mainnet() {
    let (mut mainnet, c) = setup_bridge(&[100, 100, 100], 10_000);
    let testnet = sibling_bridge(
        BridgeConfig {
            network: Network::Testnet,
            ..config()
        },
        &c,
    );
    let i = intent(1_000, 1);
    let sigs = c.sign_hot(&testnet.withdrawal_digest(&i), &[0, 1, 2]);

    assert_ne!(mainnet.withdrawal_message(&i), testnet.withdrawal_message(&i));
    assert!(matches!(
        mainnet.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { .. }))
    ));
}

#[test]
fn test_repeated_request_same_nonce_rejected() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1]);
    let message = bridge.request_withdrawal(i, &c.set, &sigs, T0).unwrap();
    bridge
        .finalize_withdrawal(&message, T0 + bridge.dispute_period())
        .unwrap();

    // a finalized message can never be requested again
    assert_eq!(
        bridge.request_withdrawal(i, &c.set, &sigs, T0 + 10_000),
        Err(WithdrawalError::AlreadyRequested { message })
    );
    assert_eq!(bridge.asset().balance_of(&destination()), 1_000);
}

#[test]
fn test_repeated_request_different_nonce_allowed() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let first = intent(1_000, 1);
    let second = intent(1_000, 2);
    let m1 = bridge
        .request_withdrawal(first, &c.set, &c.sign_hot(&bridge.withdrawal_digest(&first), &[0, 1]), T0)
        .unwrap();
    let m2 = bridge
        .request_withdrawal(second, &c.set, &c.sign_hot(&bridge.withdrawal_digest(&second), &[1, 2]), T0)
        .unwrap();
    assert_ne!(m1, m2);
}

#[test]
fn test_governance_action_replay_rejected() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 0);
    let sigs = c.sign_cold(&bridge.dispute_period_digest(600, 1), &[0, 1]);
    bridge.change_dispute_period(600, 1, &c.set, &sigs, T0).unwrap();
    assert!(matches!(
        bridge.change_dispute_period(600, 1, &c.set, &sigs, T0 + 1),
        Err(GovernanceError::ActionReplayed(_))
    ));
    assert_eq!(bridge.dispute_period(), 600);
}

// ═══════════════════════════════════════════════════════════════════
// Simulate Incorrect Signature
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_flipped_recovery_id_rejected() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let mut sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1, 2]);
    let good = sigs[1].unwrap();
    // 27 <-> 28
    sigs[1] = Signature::new(55 - good.v(), *good.r(), *good.s()).ok();

    assert_eq!(
        bridge.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { slot: 1 }))
    );
}

#[test]
fn test_signature_over_other_intent_rejected() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let honest = intent(1_000, 1);
    let inflated = intent(9_000, 1);
    let sigs = c.sign_hot(&bridge.withdrawal_digest(&honest), &[0, 1, 2]);

    assert!(matches!(
        bridge.request_withdrawal(inflated, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { slot: 0 }))
    ));
}

#[test]
fn test_swapped_slots_rejected() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let mut sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1]);
    sigs.swap(0, 1);

    assert_eq!(
        bridge.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { slot: 0 }))
    );
}

#[test]
fn test_cold_keys_cannot_authorize_withdrawal() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let sigs = c.sign_cold(&bridge.withdrawal_digest(&i), &[0, 1, 2]);

    assert!(matches!(
        bridge.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { .. }))
    ));
}

#[test]
fn test_extra_signature_slot_rejected() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let mut sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1, 2]);
    sigs.push(sigs[0]);

    assert_eq!(
        bridge.request_withdrawal(i, &c.set, &sigs, T0),
        Err(WithdrawalError::Quorum(QuorumError::SignatureOrderMismatch { slot: 3 }))
    );
}

#[test]
fn test_forged_permit_in_batch_only_fails_that_item() {
    let (mut bridge, _) = setup_bridge(&[1], 0);
    let honest = user_key(0);
    let victim = user_key(1);
    bridge.asset_mut().mint(signer_address(&honest), 100).unwrap();
    bridge.asset_mut().mint(signer_address(&victim), 100).unwrap();

    let good = deposit_intent(bridge.asset(), &honest, 100, T0 + 60);
    let mut forged = deposit_intent(bridge.asset(), &honest, 100, T0 + 60);
    forged.user = signer_address(&victim);

    let report = bridge.batched_deposit_with_permit(&[forged, good], T0).unwrap();
    assert_eq!(report.failed_indices(), vec![0]);
    assert_eq!(bridge.asset().balance_of(&signer_address(&victim)), 100);
    assert_eq!(bridge.custody_balance(), 100);
}

// ═══════════════════════════════════════════════════════════════════
// Test Pause Functionality
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_pause_blocks_requests_finalizes_and_deposits() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1]);
    let message = bridge.request_withdrawal(i, &c.set, &sigs, T0).unwrap();
    let k = user_key(0);
    bridge.asset_mut().mint(signer_address(&k), 100).unwrap();
    let batch = vec![deposit_intent(bridge.asset(), &k, 100, T0 + 10_000)];

    bridge.pause(&admin()).unwrap();
    let late = T0 + bridge.dispute_period();
    let other = intent(5, 2);
    let other_sigs = c.sign_hot(&bridge.withdrawal_digest(&other), &[0, 1]);

    assert_eq!(
        bridge.request_withdrawal(other, &c.set, &other_sigs, T0),
        Err(WithdrawalError::Paused)
    );
    assert_eq!(bridge.finalize_withdrawal(&message, late), Err(WithdrawalError::Paused));
    assert_eq!(
        bridge.batched_deposit_with_permit(&batch, T0),
        Err(DepositError::Paused)
    );
    assert_eq!(bridge.custody_balance(), 10_000);
}

#[test]
fn test_pause_does_not_block_halt() {
    let (mut bridge, c) = setup_bridge(&[1], 10_000);
    let set = LockerSet::new(0, 1, vec![locker(0)]).unwrap();
    bridge.commit_locker_set(&admin(), set).unwrap();
    let i = intent(10, 1);
    let message = bridge
        .request_withdrawal(i, &c.set, &c.sign_hot(&bridge.withdrawal_digest(&i), &[0]), T0)
        .unwrap();

    bridge.pause(&admin()).unwrap();
    assert!(bridge.vote_halt(&locker(0), &message, T0 + 1).unwrap().reached());
}

#[test]
fn test_pause_unpause_cycle() {
    let (mut bridge, c) = setup_bridge(&[100, 100, 100], 10_000);
    let i = intent(1_000, 1);
    let sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0, 1]);
    let message = bridge.request_withdrawal(i, &c.set, &sigs, T0).unwrap();
    let at = T0 + bridge.dispute_period();

    bridge.pause(&admin()).unwrap();
    assert!(bridge.finalize_withdrawal(&message, at).is_err());
    bridge.unpause(&admin()).unwrap();
    assert!(bridge.finalize_withdrawal(&message, at).is_ok());
}

// ═══════════════════════════════════════════════════════════════════
// Message Format Freeze
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_message_format_version_frozen() {
    assert_eq!(MESSAGE_FORMAT_VERSION, "1.0.0");
}

#[test]
fn test_withdrawal_message_stable_across_instances() {
    let (a, _) = setup_bridge(&[1], 0);
    let (b, _) = setup_bridge(&[1], 0);
    let i = intent(1_000, 1);
    assert_eq!(a.withdrawal_message(&i), b.withdrawal_message(&i));
    assert_eq!(a.withdrawal_digest(&i), b.withdrawal_digest(&i));
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Tests (Proptest)
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    fn powers() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(1u64..1_000u64, 1..6)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Invariant: a request passes iff signed power reaches two thirds.
        #[test]
        fn fuzz_quorum_iff_two_thirds(
            powers in powers(),
            mask in prop::collection::vec(any::<bool>(), 6),
        ) {
            let (mut bridge, c) = setup_bridge(&powers, 10_000);
            let slots: Vec<usize> = (0..powers.len()).filter(|i| mask[*i]).collect();
            let signed: u64 = slots.iter().map(|i| powers[*i]).sum();
            let total: u64 = powers.iter().sum();

            let i = intent(1, 1);
            let sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &slots);
            let result = bridge.request_withdrawal(i, &c.set, &sigs, T0);

            let expected = u128::from(signed) * 3 >= u128::from(total) * 2;
            prop_assert_eq!(result.is_ok(), expected);
            if !expected {
                let is_insufficient = matches!(
                    result,
                    Err(WithdrawalError::Quorum(QuorumError::InsufficientQuorum { .. }))
                );
                prop_assert!(is_insufficient);
            }
        }

        /// Invariant: custody grows by exactly the amounts of the items that succeed.
        #[test]
        fn fuzz_deposit_batch_conservation(
            items in prop::collection::vec((1u64..1_000u64, any::<bool>()), 1..6),
        ) {
            let (mut bridge, _) = setup_bridge(&[1], 0);
            let keys: Vec<_> = (0..items.len()).map(user_key).collect();
            for k in &keys {
                bridge.asset_mut().mint(signer_address(k), 1_000).unwrap();
            }

            let batch: Vec<_> = items
                .iter()
                .zip(&keys)
                .map(|((amount, valid), k)| {
                    // an expired deadline stands in for a bad permit
                    let deadline = if *valid { T0 + 60 } else { T0 - 1 };
                    deposit_intent(bridge.asset(), k, *amount, deadline)
                })
                .collect();

            let report = bridge.batched_deposit_with_permit(&batch, T0).unwrap();
            let expected: u64 = items.iter().filter(|(_, v)| *v).map(|(a, _)| *a).sum();
            let failed: Vec<usize> = (0..items.len()).filter(|i| !items[*i].1).collect();

            prop_assert_eq!(bridge.custody_balance(), expected);
            prop_assert_eq!(report.deposited_total(), u128::from(expected));
            prop_assert_eq!(report.failed_indices(), failed);
        }

        /// Invariant: each (user, destination, amount, nonce) is requested at most once.
        #[test]
        fn fuzz_nonce_uniqueness(
            nonces in prop::collection::vec(1u64..20u64, 1..10),
        ) {
            let (mut bridge, c) = setup_bridge(&[1], 0);
            let mut seen = std::collections::HashSet::new();

            for nonce in nonces {
                let i = intent(7, nonce);
                let sigs = c.sign_hot(&bridge.withdrawal_digest(&i), &[0]);
                let result = bridge.request_withdrawal(i, &c.set, &sigs, T0);
                if seen.insert(nonce) {
                    prop_assert!(result.is_ok(), "Fresh nonce {} was rejected", nonce);
                } else {
                    let is_duplicate = matches!(result, Err(WithdrawalError::AlreadyRequested { .. }));
                    prop_assert!(is_duplicate, "Duplicate nonce {} was accepted", nonce);
                }
            }
        }
    }
}
