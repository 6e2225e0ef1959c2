use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Operation, RequiredAuthorities, ValidateError};
use crate::{
    authority::Authority,
    crypto::PublicKey,
    serializer::{Reader, ReaderError, Serializer, Writer},
    time::TimePointSec,
    utils::is_valid_account_name,
};

fn validate_account_name(name: &str) -> Result<(), ValidateError> {
    if !is_valid_account_name(name) {
        return Err(ValidateError::InvalidAccountName(name.to_owned()));
    }
    Ok(())
}

// 48-bit instance of a proposal row
pub type ProposalId = u64;

/// Proposes a transaction to be executed once every required authority of
/// its inner operations has granted approval. The proposal expires if the
/// approvals do not arrive in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalCreateOperation {
    pub proposed_ops: Vec<Operation>,
    pub expiration_time: TimePointSec,
    pub review_period_seconds: Option<u32>,
}

impl ProposalCreateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.proposed_ops.is_empty() {
            return Err(ValidateError::MissingField("proposed_ops"));
        }
        for op in &self.proposed_ops {
            if op.is_virtual() {
                return Err(ValidateError::VirtualOperationSubmitted);
            }
            // nesting proposals would allow unbounded authority laundering
            if op.is_proposal() {
                return Err(ValidateError::NestedProposal);
            }
            op.validate()?;
        }
        Ok(())
    }

    // The proposal itself needs no authority; approvals are collected by
    // later proposal_update operations.
    pub fn get_required_authorities(&self, _auths: &mut RequiredAuthorities) {}
}

impl Serializer for ProposalCreateOperation {
    fn write(&self, writer: &mut Writer) {
        self.proposed_ops.write(writer);
        self.expiration_time.write(writer);
        self.review_period_seconds.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ProposalCreateOperation {
            proposed_ops: reader.read()?,
            expiration_time: reader.read()?,
            review_period_seconds: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.proposed_ops.size() + self.expiration_time.size() + self.review_period_seconds.size()
    }
}

/// Adds or revokes approvals on a pending proposal. Every account whose
/// approval is added must authorize this transaction at the named level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalUpdateOperation {
    pub proposal: ProposalId,
    pub active_approvals_to_add: BTreeSet<String>,
    pub active_approvals_to_remove: BTreeSet<String>,
    pub owner_approvals_to_add: BTreeSet<String>,
    pub owner_approvals_to_remove: BTreeSet<String>,
    pub key_approvals_to_add: BTreeSet<PublicKey>,
    pub key_approvals_to_remove: BTreeSet<PublicKey>,
}

impl ProposalUpdateOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        let total = self.active_approvals_to_add.len()
            + self.active_approvals_to_remove.len()
            + self.owner_approvals_to_add.len()
            + self.owner_approvals_to_remove.len()
            + self.key_approvals_to_add.len()
            + self.key_approvals_to_remove.len();
        if total == 0 {
            return Err(ValidateError::MissingField("approvals"));
        }
        for name in self
            .active_approvals_to_add
            .iter()
            .chain(&self.active_approvals_to_remove)
            .chain(&self.owner_approvals_to_add)
            .chain(&self.owner_approvals_to_remove)
        {
            validate_account_name(name)?;
        }
        // an approval cannot be both added and removed
        if self
            .active_approvals_to_add
            .intersection(&self.active_approvals_to_remove)
            .next()
            .is_some()
            || self
                .owner_approvals_to_add
                .intersection(&self.owner_approvals_to_remove)
                .next()
                .is_some()
            || self
                .key_approvals_to_add
                .intersection(&self.key_approvals_to_remove)
                .next()
                .is_some()
        {
            return Err(ValidateError::ConflictingApprovals);
        }
        Ok(())
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths
            .active
            .extend(self.active_approvals_to_add.iter().cloned());
        auths
            .active
            .extend(self.active_approvals_to_remove.iter().cloned());
        auths
            .owner
            .extend(self.owner_approvals_to_add.iter().cloned());
        auths
            .owner
            .extend(self.owner_approvals_to_remove.iter().cloned());
        for key in self
            .key_approvals_to_add
            .iter()
            .chain(&self.key_approvals_to_remove)
        {
            auths.other.push(Authority::single_key(key.clone()));
        }
    }
}

impl Serializer for ProposalUpdateOperation {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64(&self.proposal);
        self.active_approvals_to_add.write(writer);
        self.active_approvals_to_remove.write(writer);
        self.owner_approvals_to_add.write(writer);
        self.owner_approvals_to_remove.write(writer);
        self.key_approvals_to_add.write(writer);
        self.key_approvals_to_remove.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ProposalUpdateOperation {
            proposal: reader.read_u64()?,
            active_approvals_to_add: reader.read()?,
            active_approvals_to_remove: reader.read()?,
            owner_approvals_to_add: reader.read()?,
            owner_approvals_to_remove: reader.read()?,
            key_approvals_to_add: reader.read()?,
            key_approvals_to_remove: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        8 + self.active_approvals_to_add.size()
            + self.active_approvals_to_remove.size()
            + self.owner_approvals_to_add.size()
            + self.owner_approvals_to_remove.size()
            + self.key_approvals_to_add.size()
            + self.key_approvals_to_remove.size()
    }
}

/// Early veto of a pending proposal by one of its required authorities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDeleteOperation {
    pub vetoer: String,
    pub using_owner_authority: bool,
    pub proposal: ProposalId,
}

impl ProposalDeleteOperation {
    pub fn validate(&self) -> Result<(), ValidateError> {
        validate_account_name(&self.vetoer)
    }

    pub fn get_required_authorities(&self, auths: &mut RequiredAuthorities) {
        if self.using_owner_authority {
            auths.owner.insert(self.vetoer.clone());
        } else {
            auths.active.insert(self.vetoer.clone());
        }
    }
}

impl Serializer for ProposalDeleteOperation {
    fn write(&self, writer: &mut Writer) {
        self.vetoer.write(writer);
        writer.write_bool(self.using_owner_authority);
        writer.write_u64(&self.proposal);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ProposalDeleteOperation {
            vetoer: reader.read()?,
            using_owner_authority: reader.read_bool()?,
            proposal: reader.read_u64()?,
        })
    }

    fn size(&self) -> usize {
        self.vetoer.size() + 1 + 8
    }
}
