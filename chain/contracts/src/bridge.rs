//! Bridge: the settlement core
//!
//! Owns the validator registry, locker gate, withdrawal ledger and the
//! custodied asset, and exposes every state-changing operation as a
//! `&mut self` call that either commits completely or returns an error
//! with nothing written.
//!
//! All operations take an explicit `now` (seconds). There is no clock and
//! no scheduler inside; the dispute window is a guard re-checked on every
//! finalize attempt.

use bridge_types::ids::{Address, H256};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::asset::AssetCapability;
use crate::config::{check_dispute_period, BridgeConfig};
use crate::deposit::{process_batch, BatchReport, DepositIntent, DepositOutcome};
use crate::digest::Eip712Domain;
use crate::errors::{
    AccessError, ConfigError, DepositError, GovernanceError, LockerError, RegistryError,
    WithdrawalError,
};
use crate::events::{self, BridgeEvent};
use crate::locker::{HaltTally, LockerGate, LockerSet};
use crate::message::{dispute_period_action_data, MessageEncoder, WithdrawalIntent, WithdrawalMessage};
use crate::quorum::{verify_quorum, QuorumReport};
use crate::registry::{Committee, SetCommitment, ValidatorRegistry, ValidatorSet};
use crate::security::{AccessControl, PauseGuard, Role};
use crate::signature::Signature;
use crate::withdrawal::{WithdrawalLedger, WithdrawalRecord, WithdrawalStatus};

/// A hot-quorum-approved committee waiting out the dispute period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingValidatorSetUpdate {
    pub set: ValidatorSet,
    pub requested_at: u64,
    /// Epoch of the committee whose quorum approved the update
    pub approved_by_epoch: u64,
    pub approved_by_hot_hash: H256,
}

impl PendingValidatorSetUpdate {
    /// The approving committee must still be the current one.
    pub fn check_approver(&self, current: &SetCommitment) -> Result<(), GovernanceError> {
        if current.epoch != self.approved_by_epoch || current.hot_hash != self.approved_by_hot_hash {
            return Err(GovernanceError::StaleUpdate {
                approved_by_epoch: self.approved_by_epoch,
                current_epoch: current.epoch,
            });
        }
        Ok(())
    }
}

/// Settlement core for one bridge instance and one custodied asset.
#[derive(Debug)]
pub struct Bridge<A: AssetCapability> {
    config: BridgeConfig,
    encoder: MessageEncoder,
    domain: Eip712Domain,
    registry: ValidatorRegistry,
    pending_update: Option<PendingValidatorSetUpdate>,
    lockers: LockerGate,
    withdrawals: WithdrawalLedger,
    /// Current value; starts at `config.dispute_period_seconds`
    dispute_period: u64,
    /// Agent messages of executed governance actions
    executed_actions: HashSet<H256>,
    asset: A,
    access_control: AccessControl,
    pause_guard: PauseGuard,
    events: Vec<BridgeEvent>,
}

impl<A: AssetCapability> Bridge<A> {
    /// Build a bridge from a validated config. No committee is committed yet.
    pub fn new(config: BridgeConfig, asset: A) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            bridge = %config.bridge_address,
            chain_id = config.chain_id,
            source = config.network.source_tag(),
            dispute_period = config.dispute_period_seconds,
            "Bridge initialized"
        );

        Ok(Self {
            encoder: MessageEncoder::new(config.bridge_address, config.network),
            domain: Eip712Domain::exchange(config.chain_id),
            registry: ValidatorRegistry::new(),
            pending_update: None,
            lockers: LockerGate::new(),
            withdrawals: WithdrawalLedger::new(),
            dispute_period: config.dispute_period_seconds,
            executed_actions: HashSet::new(),
            asset,
            access_control: AccessControl::new(config.admin),
            pause_guard: PauseGuard::new(),
            events: Vec::new(),
            config,
        })
    }

    /// Configuration the bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Bridge identity bound into every message.
    pub fn bridge_address(&self) -> Address {
        self.config.bridge_address
    }

    /// Current dispute period in seconds.
    pub fn dispute_period(&self) -> u64 {
        self.dispute_period
    }

    // ───────────────────────── Messages & Digests ─────────────────────────

    /// Canonical message for `intent` on this bridge.
    pub fn withdrawal_message(&self, intent: &WithdrawalIntent) -> WithdrawalMessage {
        self.encoder.withdrawal_message(intent)
    }

    /// EIP-712 digest of an agent message under the committee domain.
    pub fn signing_digest(&self, message: &H256) -> H256 {
        self.domain.digest(message)
    }

    /// What the hot committee signs to authorize `intent`.
    pub fn withdrawal_digest(&self, intent: &WithdrawalIntent) -> H256 {
        self.signing_digest(self.withdrawal_message(intent).as_h256())
    }

    /// What the hot committee signs to rotate to `new_set`.
    pub fn validator_set_update_digest(&self, new_set: &ValidatorSet) -> H256 {
        self.signing_digest(&self.encoder.agent_message(&new_set.update_action_data()))
    }

    /// What the cold committee signs to change the dispute period.
    pub fn dispute_period_digest(&self, new_period_seconds: u64, nonce: u64) -> H256 {
        self.signing_digest(&self.dispute_period_message(new_period_seconds, nonce))
    }

    fn dispute_period_message(&self, new_period_seconds: u64, nonce: u64) -> H256 {
        self.encoder
            .agent_message(&dispute_period_action_data(new_period_seconds, nonce))
    }

    // ───────────────────────── Validator Registry ─────────────────────────

    /// Commit a committee directly. Admin-only.
    ///
    /// Discards any pending signed rotation, since its approving committee is
    /// no longer current.
    pub fn commit_validator_set(
        &mut self,
        caller: &Address,
        set: &ValidatorSet,
        now: u64,
    ) -> Result<SetCommitment, RegistryError> {
        if !self.access_control.is_admin(caller) {
            return Err(RegistryError::Unauthorized { caller: *caller });
        }
        let commitment = self.registry.commit(set, now)?;

        if let Some(pending) = self.pending_update.take() {
            warn!(
                pending_epoch = pending.set.epoch(),
                approved_by_epoch = pending.approved_by_epoch,
                superseded_by = commitment.epoch,
                "Pending validator set update discarded"
            );
            self.events
                .push(BridgeEvent::ValidatorSetUpdateDiscarded(events::ValidatorSetUpdateDiscarded {
                    epoch: pending.set.epoch(),
                    approved_by_epoch: pending.approved_by_epoch,
                    superseded_by: commitment.epoch,
                }));
        }

        info!(
            epoch = commitment.epoch,
            validators = commitment.validator_count,
            total_power = commitment.total_power,
            hot_hash = %commitment.hot_hash,
            "Validator set committed"
        );
        self.events
            .push(BridgeEvent::ValidatorSetCommitted(events::ValidatorSetCommitted {
                epoch: commitment.epoch,
                hot_hash: commitment.hot_hash,
                cold_hash: commitment.cold_hash,
                total_power: commitment.total_power,
            }));
        Ok(commitment)
    }

    /// Epoch of the current committee.
    pub fn current_epoch(&self) -> Result<u64, RegistryError> {
        self.registry.current_epoch()
    }

    /// Committed hot-key hash of `epoch`.
    pub fn validator_set_hash(&self, epoch: u64) -> Result<H256, RegistryError> {
        self.registry.set_hash(epoch)
    }

    /// Committed cold-key hash of `epoch`.
    pub fn cold_validator_set_hash(&self, epoch: u64) -> Result<H256, RegistryError> {
        self.registry.cold_set_hash(epoch)
    }

    /// All committed epochs, ascending.
    pub fn committed_epochs(&self) -> Vec<u64> {
        self.registry.committed_epochs()
    }

    /// Signed rotation waiting out the dispute period, if any.
    pub fn pending_validator_set_update(&self) -> Option<&PendingValidatorSetUpdate> {
        self.pending_update.as_ref()
    }

    /// Propose `new_set`, authorized by the current hot committee.
    ///
    /// The set becomes current only through
    /// [`finalize_validator_set_update`](Self::finalize_validator_set_update)
    /// after the dispute period. A later request with a higher epoch replaces
    /// an unfinalized one.
    pub fn request_validator_set_update(
        &mut self,
        new_set: ValidatorSet,
        active_set: &ValidatorSet,
        signatures: &[Option<Signature>],
        now: u64,
    ) -> Result<QuorumReport, GovernanceError> {
        let current = self.registry.current_commitment()?;
        let floor = self
            .pending_update
            .as_ref()
            .map_or(current.epoch, |p| p.set.epoch().max(current.epoch));
        if new_set.epoch() <= floor {
            return Err(RegistryError::NonMonotonicEpoch {
                current: floor,
                proposed: new_set.epoch(),
            }
            .into());
        }

        let digest = self.validator_set_update_digest(&new_set);
        let report = verify_quorum(
            &digest,
            signatures,
            active_set,
            Committee::Hot,
            &current.hot_hash,
        )
        .inspect_err(|e| warn!(error = %e, "Validator set update rejected"))?;

        let event = events::ValidatorSetUpdateRequested {
            epoch: new_set.epoch(),
            hot_hash: new_set.hot_hash(),
            cold_hash: new_set.cold_hash(),
            requested_at: now,
        };
        info!(
            epoch = new_set.epoch(),
            signed_power = report.signed_power,
            available_at = now.saturating_add(self.dispute_period),
            "Validator set update requested"
        );
        self.pending_update = Some(PendingValidatorSetUpdate {
            set: new_set,
            requested_at: now,
            approved_by_epoch: current.epoch,
            approved_by_hot_hash: current.hot_hash,
        });
        self.events
            .push(BridgeEvent::ValidatorSetUpdateRequested(event));
        Ok(report)
    }

    /// Commit the pending committee once its dispute period has elapsed.
    pub fn finalize_validator_set_update(
        &mut self,
        now: u64,
    ) -> Result<SetCommitment, GovernanceError> {
        let pending = self
            .pending_update
            .as_ref()
            .ok_or(GovernanceError::NoPendingUpdate)?;
        let available_at = pending.requested_at.saturating_add(self.dispute_period);
        if now < available_at {
            return Err(GovernanceError::UpdateNotReady { available_at });
        }
        pending.check_approver(self.registry.current_commitment()?)?;

        let commitment = self.registry.commit(&pending.set, now)?;
        self.pending_update = None;

        info!(
            epoch = commitment.epoch,
            hot_hash = %commitment.hot_hash,
            "Validator set update finalized"
        );
        self.events
            .push(BridgeEvent::ValidatorSetUpdateFinalized(events::ValidatorSetUpdateFinalized {
                epoch: commitment.epoch,
                hot_hash: commitment.hot_hash,
                cold_hash: commitment.cold_hash,
            }));
        Ok(commitment)
    }

    // ───────────────────────── Governance ─────────────────────────

    /// Change the dispute period, authorized by the current cold committee.
    /// Each `(new_period, nonce)` action executes at most once.
    pub fn change_dispute_period(
        &mut self,
        new_period_seconds: u64,
        nonce: u64,
        active_set: &ValidatorSet,
        signatures: &[Option<Signature>],
        now: u64,
    ) -> Result<QuorumReport, GovernanceError> {
        check_dispute_period(new_period_seconds).map_err(|(value, min, max)| {
            GovernanceError::DisputePeriodOutOfRange { value, min, max }
        })?;
        let current = self.registry.current_commitment()?;

        let message = self.dispute_period_message(new_period_seconds, nonce);
        if self.executed_actions.contains(&message) {
            return Err(GovernanceError::ActionReplayed(message));
        }

        let digest = self.signing_digest(&message);
        let report = verify_quorum(
            &digest,
            signatures,
            active_set,
            Committee::Cold,
            &current.cold_hash,
        )
        .inspect_err(|e| warn!(error = %e, "Dispute period change rejected"))?;

        self.executed_actions.insert(message);
        let old_seconds = std::mem::replace(&mut self.dispute_period, new_period_seconds);

        info!(
            old_seconds,
            new_seconds = new_period_seconds,
            at = now,
            "Dispute period changed"
        );
        self.events
            .push(BridgeEvent::DisputePeriodChanged(events::DisputePeriodChanged {
                old_seconds,
                new_seconds: new_period_seconds,
            }));
        Ok(report)
    }

    // ───────────────────────── Lockers ─────────────────────────

    /// Install a new locker committee. Admin-only.
    pub fn commit_locker_set(&mut self, caller: &Address, set: LockerSet) -> Result<(), LockerError> {
        if !self.access_control.is_admin(caller) {
            return Err(LockerError::Unauthorized { caller: *caller });
        }
        let event = events::LockerSetCommitted {
            epoch: set.epoch(),
            threshold: set.threshold(),
            lockers: set.lockers().to_vec(),
        };
        self.lockers.commit_set(set)?;

        info!(
            epoch = event.epoch,
            threshold = event.threshold,
            lockers = event.lockers.len(),
            "Locker set committed"
        );
        self.events.push(BridgeEvent::LockerSetCommitted(event));
        Ok(())
    }

    /// Locker set votes are counted against.
    pub fn current_locker_set(&self) -> Result<&LockerSet, LockerError> {
        self.lockers.current_set()
    }

    /// Record `locker`'s vote to halt `message`; halts it when the current
    /// locker threshold is reached.
    ///
    /// Allowed while the withdrawal is requested and unpaid, including after
    /// its dispute window has elapsed. Not blocked by pause.
    pub fn vote_halt(
        &mut self,
        locker: &Address,
        message: &WithdrawalMessage,
        now: u64,
    ) -> Result<HaltTally, WithdrawalError> {
        self.withdrawals.check_haltable(message)?;
        let tally = self.lockers.record_vote(*locker, *message)?;

        debug!(
            message = %message,
            locker = %locker,
            votes = tally.votes,
            threshold = tally.threshold,
            "Halt vote recorded"
        );
        self.events.push(BridgeEvent::HaltVoted(events::HaltVoted {
            message: *message,
            locker: *locker,
            locker_epoch: tally.locker_epoch,
            votes: tally.votes,
            threshold: tally.threshold,
        }));

        if tally.reached() {
            self.withdrawals.mark_halted(message, now)?;
            warn!(
                message = %message,
                locker_epoch = tally.locker_epoch,
                "Withdrawal halted by lockers"
            );
            self.events
                .push(BridgeEvent::WithdrawalHalted(events::WithdrawalHalted {
                    message: *message,
                    locker_epoch: tally.locker_epoch,
                    halted_at: now,
                }));
        }
        Ok(tally)
    }

    /// Votes for `message` under the current locker epoch.
    pub fn halt_votes(&self, message: &WithdrawalMessage) -> u32 {
        self.lockers.votes(message)
    }

    /// Locker set committed for `epoch`.
    pub fn locker_set(&self, epoch: u64) -> Option<&LockerSet> {
        self.lockers.set(epoch)
    }

    /// Dry run of [`vote_halt`](Self::vote_halt): same checks, no writes.
    pub fn check_halt_vote(
        &self,
        locker: &Address,
        message: &WithdrawalMessage,
    ) -> Result<(), WithdrawalError> {
        self.withdrawals.check_haltable(message)?;
        self.lockers.check_can_vote(locker, message)?;
        Ok(())
    }

    // ───────────────────────── Withdrawals ─────────────────────────

    /// Record a withdrawal authorized by the current hot committee.
    ///
    /// `active_set` must hash to the current epoch's commitment and
    /// `signatures` must be aligned with its validator order.
    pub fn request_withdrawal(
        &mut self,
        intent: WithdrawalIntent,
        active_set: &ValidatorSet,
        signatures: &[Option<Signature>],
        now: u64,
    ) -> Result<WithdrawalMessage, WithdrawalError> {
        if self.is_paused() {
            return Err(WithdrawalError::Paused);
        }
        if intent.amount == 0 {
            return Err(WithdrawalError::InvalidAmount);
        }
        if intent.user.is_zero() || intent.destination.is_zero() {
            return Err(WithdrawalError::ZeroAddress);
        }

        let current = self.registry.current_commitment()?;
        let epoch = current.epoch;
        let message = self.withdrawal_message(&intent);
        let digest = self.signing_digest(message.as_h256());

        let report = verify_quorum(
            &digest,
            signatures,
            active_set,
            Committee::Hot,
            &current.hot_hash,
        )
        .inspect_err(|e| {
            warn!(message = %message, user = %intent.user, error = %e, "Withdrawal quorum failed")
        })?;

        self.withdrawals
            .insert_requested(message, intent, epoch, now)?;

        info!(
            message = %message,
            user = %intent.user,
            amount = intent.amount,
            nonce = intent.nonce,
            epoch,
            signed_power = report.signed_power,
            "Withdrawal requested"
        );
        self.events
            .push(BridgeEvent::WithdrawalRequested(events::WithdrawalRequested {
                message,
                user: intent.user,
                destination: intent.destination,
                amount: intent.amount,
                nonce: intent.nonce,
                epoch,
                requested_at: now,
            }));
        Ok(message)
    }

    /// Release the funds of a requested withdrawal whose dispute period has
    /// elapsed under the current period value.
    pub fn finalize_withdrawal(
        &mut self,
        message: &WithdrawalMessage,
        now: u64,
    ) -> Result<events::WithdrawalFinalized, WithdrawalError> {
        if self.is_paused() {
            return Err(WithdrawalError::Paused);
        }

        let intent = self
            .withdrawals
            .check_finalizable(message, self.dispute_period, now)?
            .intent;

        self.asset
            .transfer(self.config.bridge_address, intent.destination, intent.amount)
            .inspect_err(|e| warn!(message = %message, error = %e, "Withdrawal payout failed"))?;
        self.withdrawals.mark_finalized(message, now)?;

        let event = events::WithdrawalFinalized {
            user: intent.user,
            destination: intent.destination,
            amount: intent.amount,
            nonce: intent.nonce,
            message: *message,
        };
        info!(
            message = %message,
            destination = %intent.destination,
            amount = intent.amount,
            "Withdrawal finalized"
        );
        self.events
            .push(BridgeEvent::WithdrawalFinalized(event.clone()));
        Ok(event)
    }

    /// Lifecycle record of `message`.
    pub fn get_record(&self, message: &WithdrawalMessage) -> Option<&WithdrawalRecord> {
        self.withdrawals.get(message)
    }

    /// Lifecycle state of `message` at `now`.
    pub fn withdrawal_status(&self, message: &WithdrawalMessage, now: u64) -> WithdrawalStatus {
        self.withdrawals.status(message, self.dispute_period, now)
    }

    // ───────────────────────── Deposits ─────────────────────────

    /// Pull each deposit into custody via permit. Failed items are reported
    /// and announced with `DepositFailed`; they never abort the batch.
    pub fn batched_deposit_with_permit(
        &mut self,
        deposits: &[DepositIntent],
        now: u64,
    ) -> Result<BatchReport, DepositError> {
        if self.is_paused() {
            return Err(DepositError::Paused);
        }

        let report = process_batch(&mut self.asset, self.config.bridge_address, deposits, now)?;

        for outcome in &report.outcomes {
            let event = match outcome {
                DepositOutcome::Deposited { user, amount } => {
                    BridgeEvent::Deposited(events::Deposited {
                        user: *user,
                        amount: *amount,
                    })
                }
                DepositOutcome::Failed {
                    user, amount, code, ..
                } => BridgeEvent::DepositFailed(events::DepositFailed {
                    user: *user,
                    amount: *amount,
                    error_code: code.as_u8(),
                }),
            };
            self.events.push(event);
        }

        info!(
            items = deposits.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Deposit batch processed"
        );
        Ok(report)
    }

    // ───────────────────────── Pause ─────────────────────────

    /// Admin or pauser.
    pub fn pause(&mut self, caller: &Address) -> Result<(), AccessError> {
        if !self.access_control.can_pause(caller) {
            return Err(AccessError::Unauthorized { caller: *caller });
        }
        self.pause_guard.pause();
        warn!(by = %caller, "Bridge paused");
        self.events.push(BridgeEvent::Paused { by: *caller });
        Ok(())
    }

    /// Admin-only.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), AccessError> {
        if !self.access_control.is_admin(caller) {
            return Err(AccessError::Unauthorized { caller: *caller });
        }
        self.pause_guard.unpause();
        info!(by = %caller, "Bridge unpaused");
        self.events.push(BridgeEvent::Unpaused { by: *caller });
        Ok(())
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    /// Grant the pause-only role. Admin-only.
    pub fn grant_pauser(&mut self, caller: &Address, target: Address) -> Result<(), AccessError> {
        if !self.access_control.grant_role(caller, target, Role::Pauser) {
            return Err(AccessError::Unauthorized { caller: *caller });
        }
        info!(by = %caller, account = %target, "Pauser granted");
        self.events.push(BridgeEvent::PauserGranted { account: target });
        Ok(())
    }

    /// Remove a pauser. Admin-only; the primary admin cannot be revoked.
    pub fn revoke_pauser(&mut self, caller: &Address, target: &Address) -> Result<(), AccessError> {
        if !self.access_control.has_role(target, Role::Pauser)
            || !self.access_control.revoke_role(caller, target)
        {
            return Err(AccessError::Unauthorized { caller: *caller });
        }
        info!(by = %caller, account = %target, "Pauser revoked");
        self.events.push(BridgeEvent::PauserRevoked { account: *target });
        Ok(())
    }

    /// Hand the admin role to `new_admin`. The caller loses it.
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> Result<(), AccessError> {
        if !self.access_control.transfer_admin(caller, new_admin) {
            return Err(AccessError::Unauthorized { caller: *caller });
        }
        warn!(from = %caller, to = %new_admin, "Admin transferred");
        self.events.push(BridgeEvent::AdminTransferred {
            from: *caller,
            to: new_admin,
        });
        Ok(())
    }

    /// Current primary admin.
    pub fn admin(&self) -> Address {
        self.access_control.admin()
    }

    // ───────────────────────── Asset ─────────────────────────

    /// Custodied asset.
    pub fn asset(&self) -> &A {
        &self.asset
    }

    /// Mutable access to the custodied asset.
    pub fn asset_mut(&mut self) -> &mut A {
        &mut self.asset
    }

    /// Asset balance held by the bridge.
    pub fn custody_balance(&self) -> u64 {
        self.asset.balance_of(&self.config.bridge_address)
    }

    // ───────────────────────── Events ─────────────────────────

    /// Events emitted since the last drain.
    pub fn events(&self) -> &[BridgeEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        std::mem::take(&mut self.events)
    }
}
