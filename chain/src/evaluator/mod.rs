mod account;
mod asset;
mod content;
mod custom;
mod market;
mod proposal;
mod recovery;
mod transfer;
mod witness;

use muse_common::operation::Operation;

use crate::{database::Database, error::BlockchainError};

pub use proposal::try_execute_proposal;
pub(crate) use market::cancel_order;
pub(crate) use transfer::routes_from;

/// Dispatch an already-validated, already-authorized operation to its
/// evaluator. Virtual operations are applier-emitted and never evaluated.
pub fn apply_operation(db: &mut Database, op: &Operation) -> Result<(), BlockchainError> {
    match op {
        Operation::Vote(op) => content::apply_vote(db, op),
        Operation::Content(op) => content::apply_content(db, op),
        Operation::ContentUpdate(op) => content::apply_content_update(db, op),
        Operation::ContentApprove(op) => content::apply_content_approve(db, op),
        Operation::ContentDisable(op) => content::apply_content_disable(db, op),
        Operation::Transfer(op) => transfer::apply_transfer(db, op),
        Operation::TransferToVesting(op) => transfer::apply_transfer_to_vesting(db, op),
        Operation::WithdrawVesting(op) => transfer::apply_withdraw_vesting(db, op),
        Operation::LimitOrderCreate(op) => market::apply_limit_order_create(db, op),
        Operation::LimitOrderCreate2(op) => market::apply_limit_order_create2(db, op),
        Operation::LimitOrderCancel(op) => market::apply_limit_order_cancel(db, op),
        Operation::FeedPublish(op) => market::apply_feed_publish(db, op),
        Operation::Convert(op) => market::apply_convert(db, op),
        Operation::AccountCreate(op) => account::apply_account_create(db, op),
        Operation::AccountUpdate(op) => account::apply_account_update(db, op),
        Operation::WitnessUpdate(op) => witness::apply_witness_update(db, op),
        Operation::AccountWitnessVote(op) => witness::apply_account_witness_vote(db, op),
        Operation::AccountWitnessProxy(op) => witness::apply_account_witness_proxy(db, op),
        Operation::StreamingPlatformUpdate(op) => content::apply_streaming_platform_update(db, op),
        Operation::AccountStreamingPlatformVote(op) => {
            content::apply_account_streaming_platform_vote(db, op)
        }
        Operation::StreamingPlatformReport(op) => {
            content::apply_streaming_platform_report(db, op)
        }
        Operation::AssetCreate(op) => asset::apply_asset_create(db, op),
        Operation::AssetUpdate(op) => asset::apply_asset_update(db, op),
        Operation::AssetIssue(op) => asset::apply_asset_issue(db, op),
        Operation::AssetReserve(op) => asset::apply_asset_reserve(db, op),
        Operation::Custom(op) => custom::apply_custom(db, op),
        Operation::ReportOverProduction(op) => custom::apply_report_over_production(db, op),
        Operation::CustomJson(op) => custom::apply_custom_json(db, op),
        Operation::SetWithdrawVestingRoute(op) => {
            transfer::apply_set_withdraw_vesting_route(db, op)
        }
        Operation::ChallengeAuthority(op) => account::apply_challenge_authority(db, op),
        Operation::ProveAuthority(op) => account::apply_prove_authority(db, op),
        Operation::RequestAccountRecovery(op) => recovery::apply_request_account_recovery(db, op),
        Operation::RecoverAccount(op) => recovery::apply_recover_account(db, op),
        Operation::ChangeRecoveryAccount(op) => recovery::apply_change_recovery_account(db, op),
        Operation::EscrowTransfer(op) => transfer::apply_escrow_transfer(db, op),
        Operation::EscrowDispute(op) => transfer::apply_escrow_dispute(db, op),
        Operation::EscrowRelease(op) => transfer::apply_escrow_release(db, op),
        Operation::ProposalCreate(op) => proposal::apply_proposal_create(db, op),
        Operation::ProposalUpdate(op) => proposal::apply_proposal_update(db, op),
        Operation::ProposalDelete(op) => proposal::apply_proposal_delete(db, op),
        Operation::Friendship(op) => account::apply_friendship(db, op),
        Operation::Unfriend(op) => account::apply_unfriend(db, op),
        Operation::BalanceClaim(op) => account::apply_balance_claim(db, op),
        op if op.is_virtual() => Err(BlockchainError::Evaluate(format!(
            "virtual operation {} cannot be evaluated",
            op.name()
        ))),
        op => Err(BlockchainError::Evaluate(format!(
            "no evaluator for {}",
            op.name()
        ))),
    }
}
