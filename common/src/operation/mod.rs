mod asset_ops;
mod base;
mod content;
mod market;
mod proposal;
mod virtual_ops;

use std::collections::BTreeSet;

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    asset::AmountError,
    authority::{Authority, AuthorityError},
    serializer::{varuint_size, Reader, ReaderError, Serializer, Writer},
};

pub use asset_ops::{
    AssetCreateOperation, AssetIssueOperation, AssetOptions, AssetReserveOperation,
    AssetUpdateOperation, ASSET_ISSUER_PERMISSION_MASK, CHARGE_MARKET_FEE, DISABLE_CONFIDENTIAL,
    OVERRIDE_AUTHORITY, TRANSFER_RESTRICTED, UIA_ASSET_ISSUER_PERMISSION_MASK, WHITE_LIST,
};
pub use base::{
    AccountCreateOperation, AccountUpdateOperation, AccountWitnessProxyOperation,
    AccountWitnessVoteOperation, BalanceClaimOperation, ChainProperties,
    ChallengeAuthorityOperation, ChangeRecoveryAccountOperation, CustomJsonOperation,
    CustomOperation, EscrowDisputeOperation, EscrowReleaseOperation, EscrowTransferOperation,
    FriendshipOperation, ProveAuthorityOperation, RecoverAccountOperation,
    ReportOverProductionOperation, RequestAccountRecoveryOperation,
    SetWithdrawVestingRouteOperation, TransferOperation, TransferToVestingOperation,
    UnfriendOperation, WithdrawVestingOperation, WitnessUpdateOperation,
};
pub use content::{
    AccountStreamingPlatformVoteOperation, AlbumMetadata, ContentApproveOperation,
    ContentDisableOperation, ContentOperation, ContentUpdateOperation, Distribution,
    ManagementVote, PublisherMetadata, Side, StreamingPlatformReportOperation,
    StreamingPlatformUpdateOperation, TrackMetadata, VoteOperation,
};
pub use market::{
    ConvertOperation, FeedPublishOperation, LimitOrderCancelOperation,
    LimitOrderCreate2Operation, LimitOrderCreateOperation,
};
pub use proposal::{
    ProposalCreateOperation, ProposalDeleteOperation, ProposalId, ProposalUpdateOperation,
};
pub use virtual_ops::{
    ContentRewardOperation, CurateRewardOperation, FillConvertRequestOperation,
    FillOrderOperation, FillVestingWithdrawOperation, InterestOperation,
    LiquidityRewardOperation, PlayingRewardOperation,
};

/// Failure of a pure `validate()` check; raised before any state is read.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidateError {
    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("Wrong asset type: {0}")]
    WrongAssetType(&'static str),

    #[error("Memo is too large: {0} bytes")]
    MemoTooLarge(usize),

    #[error("Title length out of bounds: {0}")]
    TitleLength(usize),

    #[error("Distribution shares must sum to 0 or 10000 bp, got {0}")]
    DistributionSum(u32),

    #[error("Management percentages must sum to 100, got {0}")]
    ManagementSum(u32),

    #[error("Split maximum is 10000 bp, got {0}")]
    SplitTooLarge(u16),

    #[error("The publisher side cannot edit master-side info")]
    PublisherEditsMasterSide,

    #[error("Vote weight out of range: {0}")]
    WeightOutOfRange(i16),

    #[error("Play time out of range: {0}")]
    InvalidPlayTime(u32),

    #[error("Percent out of range: {0}")]
    PercentOutOfRange(u16),

    #[error("Fee is below the required minimum")]
    InsufficientFee,

    #[error("Field may not reference the operation's own subject: {0}")]
    SelfReference(&'static str),

    #[error("At least one account must be specified")]
    EmptyRequiredAuths,

    #[error("Id is too long: {0}")]
    IdTooLong(usize),

    #[error("Invalid over-production proof")]
    InvalidOverProductionProof,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Authority cannot be satisfied")]
    ImpossibleAuthority,

    #[error("Invalid asset symbol: {0}")]
    InvalidSymbol(String),

    #[error("Asset precision too large: {0}")]
    PrecisionTooLarge(u8),

    #[error("Share supply out of bounds")]
    ExcessiveShareSupply,

    #[error("Unknown permission bits: {0:#x}")]
    UnknownPermissionBits(u16),

    #[error("Virtual operations cannot be submitted")]
    VirtualOperationSubmitted,

    #[error("Proposals cannot nest proposals")]
    NestedProposal,

    #[error("An approval cannot be both added and removed")]
    ConflictingApprovals,

    #[error(transparent)]
    Authority(#[from] AuthorityError),

    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Authority sets an operation declares; the checker unions these across
/// a transaction before matching them against recovered signature keys.
#[derive(Clone, Debug, Default)]
pub struct RequiredAuthorities {
    pub active: BTreeSet<String>,
    pub owner: BTreeSet<String>,
    pub basic: BTreeSet<String>,
    // content urls whose master-side management must approve
    pub master_content: BTreeSet<String>,
    // content urls whose composition-side management must approve
    pub comp_content: BTreeSet<String>,
    // raw authorities (recovery proofs, claimed keys, proposal key approvals)
    pub other: Vec<Authority>,
}

impl RequiredAuthorities {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
            && self.owner.is_empty()
            && self.basic.is_empty()
            && self.master_content.is_empty()
            && self.comp_content.is_empty()
            && self.other.is_empty()
    }
}

macro_rules! op_validate {
    (user, $op:expr) => {
        $op.validate()
    };
    (virtual, $op:expr) => {{
        let _ = $op;
        Err(ValidateError::VirtualOperationSubmitted)
    }};
}

macro_rules! op_auths {
    (user, $op:expr, $auths:expr) => {
        $op.get_required_authorities($auths)
    };
    (virtual, $op:expr, $auths:expr) => {{
        let _ = ($op, $auths);
    }};
}

macro_rules! op_is_virtual {
    (user) => {
        false
    };
    (virtual) => {
        true
    };
}

// The one place the consensus tag order lives. Do not reorder entries:
// tag numbers are part of every signed transaction and reordering them
// is a hard fork. Virtual operations follow user operations in tag space.
macro_rules! operations {
    ( $( $tag:literal => $variant:ident ( $payload:ty ) as $name:literal [$kind:tt], )* ) => {
        /// Closed union of every operation kind. Exhaustive matching is
        /// deliberate: adding a kind forces every dispatch site to decide.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Operation {
            $( $variant($payload), )*
        }

        impl Operation {
            pub fn tag(&self) -> u64 {
                match self {
                    $( Operation::$variant(_) => $tag, )*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $( Operation::$variant(_) => $name, )*
                }
            }

            pub fn tag_from_name(name: &str) -> Option<u64> {
                match name {
                    $( $name => Some($tag), )*
                    _ => None,
                }
            }

            pub fn is_virtual(&self) -> bool {
                match self {
                    $( Operation::$variant(_) => op_is_virtual!($kind), )*
                }
            }

            /// Pure well-formedness check; never reads chain state.
            pub fn validate(&self) -> Result<(), ValidateError> {
                match self {
                    $( Operation::$variant(op) => op_validate!($kind, op), )*
                }
            }

            pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
                match self {
                    $( Operation::$variant(op) => op_auths!($kind, op, auths), )*
                }
            }

            fn from_json_value(
                tag: u64,
                value: serde_json::Value,
            ) -> Result<Operation, serde_json::Error> {
                match tag {
                    $( $tag => Ok(Operation::$variant(serde_json::from_value(value)?)), )*
                    _ => Err(serde::de::Error::custom(format!("invalid operation tag {tag}"))),
                }
            }
        }

        impl Serializer for Operation {
            fn write(&self, writer: &mut Writer) {
                writer.write_varuint(self.tag());
                match self {
                    $( Operation::$variant(op) => op.write(writer), )*
                }
            }

            fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
                let tag = reader.read_varuint()?;
                match tag {
                    $( $tag => Ok(Operation::$variant(<$payload>::read(reader)?)), )*
                    _ => Err(ReaderError::InvalidValue),
                }
            }

            fn size(&self) -> usize {
                varuint_size(self.tag())
                    + match self {
                        $( Operation::$variant(op) => op.size(), )*
                    }
            }
        }

        // External shape: ["name", { fields... }]; the numeric tag is
        // accepted in place of the name when parsing.
        impl Serialize for Operation {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                match self {
                    $(
                        Operation::$variant(op) => {
                            let mut tuple = serializer.serialize_tuple(2)?;
                            tuple.serialize_element($name)?;
                            tuple.serialize_element(op)?;
                            tuple.end()
                        }
                    )*
                }
            }
        }
    };
}

operations! {
    0 => Vote(VoteOperation) as "vote" [user],
    1 => Content(ContentOperation) as "content" [user],
    2 => ContentUpdate(ContentUpdateOperation) as "content_update" [user],
    3 => ContentApprove(ContentApproveOperation) as "content_approve" [user],
    4 => ContentDisable(ContentDisableOperation) as "content_disable" [user],
    5 => Transfer(TransferOperation) as "transfer" [user],
    6 => TransferToVesting(TransferToVestingOperation) as "transfer_to_vesting" [user],
    7 => WithdrawVesting(WithdrawVestingOperation) as "withdraw_vesting" [user],
    8 => LimitOrderCreate(LimitOrderCreateOperation) as "limit_order_create" [user],
    9 => LimitOrderCreate2(LimitOrderCreate2Operation) as "limit_order_create2" [user],
    10 => LimitOrderCancel(LimitOrderCancelOperation) as "limit_order_cancel" [user],
    11 => FeedPublish(FeedPublishOperation) as "feed_publish" [user],
    12 => Convert(ConvertOperation) as "convert" [user],
    13 => AccountCreate(AccountCreateOperation) as "account_create" [user],
    14 => AccountUpdate(AccountUpdateOperation) as "account_update" [user],
    15 => WitnessUpdate(WitnessUpdateOperation) as "witness_update" [user],
    16 => AccountWitnessVote(AccountWitnessVoteOperation) as "account_witness_vote" [user],
    17 => AccountWitnessProxy(AccountWitnessProxyOperation) as "account_witness_proxy" [user],
    18 => StreamingPlatformUpdate(StreamingPlatformUpdateOperation) as "streaming_platform_update" [user],
    19 => AccountStreamingPlatformVote(AccountStreamingPlatformVoteOperation) as "account_streaming_platform_vote" [user],
    20 => StreamingPlatformReport(StreamingPlatformReportOperation) as "streaming_platform_report" [user],
    21 => AssetCreate(AssetCreateOperation) as "asset_create" [user],
    22 => AssetUpdate(AssetUpdateOperation) as "asset_update" [user],
    23 => AssetIssue(AssetIssueOperation) as "asset_issue" [user],
    24 => AssetReserve(AssetReserveOperation) as "asset_reserve" [user],
    25 => Custom(CustomOperation) as "custom" [user],
    26 => ReportOverProduction(ReportOverProductionOperation) as "report_over_production" [user],
    27 => CustomJson(CustomJsonOperation) as "custom_json" [user],
    28 => SetWithdrawVestingRoute(SetWithdrawVestingRouteOperation) as "set_withdraw_vesting_route" [user],
    29 => ChallengeAuthority(ChallengeAuthorityOperation) as "challenge_authority" [user],
    30 => ProveAuthority(ProveAuthorityOperation) as "prove_authority" [user],
    31 => RequestAccountRecovery(RequestAccountRecoveryOperation) as "request_account_recovery" [user],
    32 => RecoverAccount(RecoverAccountOperation) as "recover_account" [user],
    33 => ChangeRecoveryAccount(ChangeRecoveryAccountOperation) as "change_recovery_account" [user],
    34 => EscrowTransfer(EscrowTransferOperation) as "escrow_transfer" [user],
    35 => EscrowDispute(EscrowDisputeOperation) as "escrow_dispute" [user],
    36 => EscrowRelease(EscrowReleaseOperation) as "escrow_release" [user],
    37 => ProposalCreate(ProposalCreateOperation) as "proposal_create" [user],
    38 => ProposalUpdate(ProposalUpdateOperation) as "proposal_update" [user],
    39 => ProposalDelete(ProposalDeleteOperation) as "proposal_delete" [user],
    // virtual operations below this point
    40 => FillConvertRequest(FillConvertRequestOperation) as "fill_convert_request" [virtual],
    41 => PlayingReward(PlayingRewardOperation) as "playing_reward" [virtual],
    42 => ContentReward(ContentRewardOperation) as "content_reward" [virtual],
    43 => CurateReward(CurateRewardOperation) as "curate_reward" [virtual],
    44 => LiquidityReward(LiquidityRewardOperation) as "liquidity_reward" [virtual],
    45 => Interest(InterestOperation) as "interest" [virtual],
    46 => FillVestingWithdraw(FillVestingWithdrawOperation) as "fill_vesting_withdraw" [virtual],
    47 => FillOrder(FillOrderOperation) as "fill_order" [virtual],
    48 => Friendship(FriendshipOperation) as "friendship" [user],
    49 => Unfriend(UnfriendOperation) as "unfriend" [user],
    50 => BalanceClaim(BalanceClaimOperation) as "balance_claim" [user],
}

impl Operation {
    pub fn is_market(&self) -> bool {
        matches!(
            self,
            Operation::LimitOrderCreate(_)
                | Operation::LimitOrderCreate2(_)
                | Operation::LimitOrderCancel(_)
                | Operation::Transfer(_)
                | Operation::TransferToVesting(_)
        )
    }

    pub fn is_proposal(&self) -> bool {
        matches!(self, Operation::ProposalCreate(_))
    }

    /// Union of the declared authorities of a list of operations.
    pub fn required_authorities(operations: &[Operation]) -> RequiredAuthorities {
        let mut auths = RequiredAuthorities::default();
        for op in operations {
            op.get_required_authorities(&mut auths);
        }
        auths
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NameOrTag {
            Tag(u64),
            Name(String),
        }

        let (key, value): (NameOrTag, serde_json::Value) = Deserialize::deserialize(deserializer)?;
        let tag = match key {
            NameOrTag::Tag(tag) => tag,
            NameOrTag::Name(name) => Operation::tag_from_name(&name).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid operation name: {name}"))
            })?,
        };
        Operation::from_json_value(tag, value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::config::MUSE_SYMBOL;

    fn transfer() -> Operation {
        Operation::Transfer(TransferOperation {
            from: "alice".to_owned(),
            to: "bob".to_owned(),
            amount: Asset::new(100, MUSE_SYMBOL),
            memo: "for the album".to_owned(),
        })
    }

    #[test]
    fn tags_are_frozen() {
        assert_eq!(
            Operation::Vote(VoteOperation {
                voter: "alice".into(),
                url: "ipfs://x".into(),
                weight: 1
            })
            .tag(),
            0
        );
        assert_eq!(transfer().tag(), 5);
        assert_eq!(Operation::tag_from_name("proposal_delete"), Some(39));
        assert_eq!(Operation::tag_from_name("fill_convert_request"), Some(40));
        assert_eq!(Operation::tag_from_name("balance_claim"), Some(50));
        assert_eq!(Operation::tag_from_name("does_not_exist"), None);
    }

    #[test]
    fn wire_round_trip() {
        let op = transfer();
        let bytes = op.to_bytes();
        assert_eq!(bytes.len(), op.size());
        assert_eq!(Operation::from_bytes(&bytes).unwrap(), op);
    }

    #[test]
    fn json_shape_is_name_and_fields() {
        let op = transfer();
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json[0], "transfer");
        assert_eq!(json[1]["from"], "alice");
        assert_eq!(json[1]["amount"], "0.000100 2.28.0");

        let parsed: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, op);

        // numeric tag accepted in place of the name
        let tagged = serde_json::json!([5, {
            "from": "alice", "to": "bob",
            "amount": "0.000100 2.28.0", "memo": "for the album"
        }]);
        let parsed: Operation = serde_json::from_value(tagged).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn virtual_operations_reject_validation() {
        let op = Operation::Interest(InterestOperation {
            owner: "alice".into(),
            interest: Asset::new(1, MUSE_SYMBOL),
        });
        assert!(op.is_virtual());
        assert_eq!(op.validate(), Err(ValidateError::VirtualOperationSubmitted));
        let auths = Operation::required_authorities(std::slice::from_ref(&op));
        assert!(auths.is_empty());
    }

    #[test]
    fn declared_authorities_union() {
        let ops = vec![
            transfer(),
            Operation::AccountWitnessVote(AccountWitnessVoteOperation {
                account: "carol".into(),
                witness: "initminer".into(),
                approve: true,
            }),
        ];
        let auths = Operation::required_authorities(&ops);
        assert!(auths.active.contains("alice"));
        assert!(auths.active.contains("carol"));
        assert!(auths.owner.is_empty());
    }
}
