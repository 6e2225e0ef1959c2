use muse_common::operation::{
    CustomJsonOperation, CustomOperation, ReportOverProductionOperation,
};

use crate::{database::Database, error::BlockchainError};

// custom and custom_json are consensus no-ops: their payloads are
// interpreted by external observers, never by the state machine.

pub fn apply_custom(db: &mut Database, op: &CustomOperation) -> Result<(), BlockchainError> {
    for name in &op.required_auths {
        db.get_account(name)?;
    }
    Ok(())
}

pub fn apply_custom_json(
    db: &mut Database,
    op: &CustomJsonOperation,
) -> Result<(), BlockchainError> {
    for name in op.required_auths.iter().chain(&op.required_basic_auths) {
        db.get_account(name)?;
    }
    Ok(())
}

// The double-production proof is validated in isolation; the chain keeps
// no penalty state for it.
pub fn apply_report_over_production(
    db: &mut Database,
    op: &ReportOverProductionOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.reporter)?;
    db.get_witness(&op.first_block.header.witness)?;
    Ok(())
}
