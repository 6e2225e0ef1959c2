// Shared fixture: a single-witness test chain with deterministic actor
// keys, producing real signed blocks through the full applier.

use std::collections::BTreeMap;

use muse_common::{
    asset::Asset,
    authority::Authority,
    block::SignedBlock,
    config::{MUSE_SYMBOL, TESTNET_CHAIN_ID},
    crypto::PrivateKey,
    operation::{AccountCreateOperation, Operation, TransferOperation},
    transaction::{SignedTransaction, Transaction},
};
use muse_chain::{genesis, BlockchainError, Database};

pub struct TestNet {
    pub db: Database,
    keys: BTreeMap<String, PrivateKey>,
}

#[allow(dead_code)]
impl TestNet {
    pub fn new() -> Self {
        let mut db = Database::new(TESTNET_CHAIN_ID.clone());
        genesis::init_genesis(&mut db).expect("genesis");
        let mut keys = BTreeMap::new();
        keys.insert("initminer".to_owned(), genesis::init_key());
        TestNet { db, keys }
    }

    pub fn key(&self, name: &str) -> PrivateKey {
        self.keys
            .get(name)
            .cloned()
            .unwrap_or_else(|| PrivateKey::from_seed(name))
    }

    /// Mint a liquid balance directly into committed state; the test
    /// equivalent of premined funds.
    pub fn fund(&mut self, name: &str, amount: i64) {
        self.db
            .adjust_supply(Asset::new(amount, MUSE_SYMBOL))
            .expect("supply");
        self.db
            .adjust_balance(name, Asset::new(amount, MUSE_SYMBOL))
            .expect("balance");
    }

    /// Build a signed transaction out of operations, anchored to the
    /// current head.
    pub fn sign_tx(&self, operations: Vec<Operation>, signers: &[&str]) -> SignedTransaction {
        let mut tx = Transaction {
            expiration: self.db.head_block_time().add_seconds(60),
            operations,
            ..Transaction::default()
        };
        tx.set_reference_block(&self.db.head_block_id());
        let mut signed = SignedTransaction::new(tx);
        for signer in signers {
            signed.sign(&self.key(signer), self.db.chain_id());
        }
        signed
    }

    /// Produce a block in the given slot with whichever witness the
    /// schedule assigns, signing with that witness's key.
    pub fn produce_at_slot_with(
        &mut self,
        slot: u64,
        transactions: Vec<SignedTransaction>,
    ) -> Result<SignedBlock, BlockchainError> {
        let witness = muse_chain::witness_schedule::get_scheduled_witness(&self.db, slot)
            .expect("non-empty schedule");
        let key = self.key(&witness);
        self.db.generate_block(slot, &witness, &key, transactions)
    }

    pub fn produce_block_with(
        &mut self,
        transactions: Vec<SignedTransaction>,
    ) -> Result<SignedBlock, BlockchainError> {
        self.produce_at_slot_with(1, transactions)
    }

    pub fn produce_block(&mut self) -> SignedBlock {
        self.produce_block_with(Vec::new()).expect("empty block")
    }

    pub fn produce_blocks(&mut self, count: u32) {
        for _ in 0..count {
            self.produce_block();
        }
    }

    /// Skip ahead: produce one block `slots` block-intervals after head.
    pub fn produce_block_at_slot(&mut self, slot: u64) -> SignedBlock {
        self.produce_at_slot_with(slot, Vec::new())
            .expect("skipped-slot block")
    }

    /// Push a transaction through a produced block.
    pub fn push_tx(
        &mut self,
        operations: Vec<Operation>,
        signers: &[&str],
    ) -> Result<SignedBlock, BlockchainError> {
        let tx = self.sign_tx(operations, signers);
        self.produce_block_with(vec![tx])
    }

    /// Register an account whose keys derive from its name, funded by
    /// initminer.
    pub fn create_account(&mut self, name: &str) {
        let key = PrivateKey::from_seed(name).public_key();
        self.fund("initminer", 10);
        let op = Operation::AccountCreate(AccountCreateOperation {
            fee: Asset::new(1, MUSE_SYMBOL),
            creator: "initminer".to_owned(),
            new_account_name: name.to_owned(),
            owner: Authority::single_key(key.clone()),
            active: Authority::single_key(key.clone()),
            basic: Authority::single_key(key.clone()),
            memo_key: key,
            json_metadata: String::new(),
        });
        self.push_tx(vec![op], &["initminer"]).expect("account creation");
        self.keys
            .insert(name.to_owned(), PrivateKey::from_seed(name));
    }

    pub fn transfer(&mut self, from: &str, to: &str, amount: i64) {
        let op = Operation::Transfer(TransferOperation {
            from: from.to_owned(),
            to: to.to_owned(),
            amount: Asset::new(amount, MUSE_SYMBOL),
            memo: String::new(),
        });
        self.push_tx(vec![op], &[from]).expect("transfer");
    }

    pub fn balance(&self, name: &str, asset: muse_common::asset::AssetId) -> i64 {
        self.db.get_account(name).expect("account").balance(asset)
    }
}

#[allow(dead_code)]
impl TestNet {
    /// Mint an arbitrary asset straight into a balance.
    pub fn fund_asset(&mut self, name: &str, amount: Asset) {
        self.db.adjust_supply(amount).expect("supply");
        self.db.adjust_balance(name, amount).expect("balance");
    }

    /// Produce the block that crosses the next boundary of `period_sec`.
    pub fn cross_time_boundary(&mut self, period_sec: u64) -> SignedBlock {
        let now = self.db.head_block_time().seconds() as u64;
        let target = (now / period_sec + 1) * period_sec;
        let slot = (target - now).div_ceil(muse_common::config::BLOCK_INTERVAL);
        self.produce_block_at_slot(slot)
    }
}
