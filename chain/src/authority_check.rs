use std::collections::BTreeSet;

use muse_common::{
    authority::Authority,
    config::MAX_SIG_CHECK_DEPTH,
    crypto::PublicKey,
    operation::RequiredAuthorities,
};

use crate::{database::Database, error::BlockchainError};

/// Which of an account's three authorities a requirement names.
/// Satisfying a stronger level always satisfies a weaker one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorityLevel {
    Basic,
    Active,
    Owner,
}

/// Walks authority graphs against a set of candidate keys (and, for
/// proposals, pre-granted account approvals). Keys that contribute to
/// any walk are marked used so leftover signatures can be flagged as
/// irrelevant.
pub struct SignState<'a> {
    db: &'a Database,
    provided_keys: BTreeSet<PublicKey>,
    approved_active: BTreeSet<String>,
    approved_owner: BTreeSet<String>,
    used_keys: BTreeSet<PublicKey>,
}

impl<'a> SignState<'a> {
    pub fn new(db: &'a Database, keys: impl IntoIterator<Item = PublicKey>) -> Self {
        SignState {
            db,
            provided_keys: keys.into_iter().collect(),
            approved_active: BTreeSet::new(),
            approved_owner: BTreeSet::new(),
            used_keys: BTreeSet::new(),
        }
    }

    pub fn with_approvals(
        mut self,
        active: BTreeSet<String>,
        owner: BTreeSet<String>,
    ) -> Self {
        self.approved_active = active;
        self.approved_owner = owner;
        self
    }

    fn is_approved(&self, name: &str, level: AuthorityLevel) -> bool {
        match level {
            AuthorityLevel::Owner => self.approved_owner.contains(name),
            _ => self.approved_owner.contains(name) || self.approved_active.contains(name),
        }
    }

    /// True when the account's authority at `level` (or any stronger
    /// level) is satisfied.
    pub fn check_account_authority(&mut self, name: &str, level: AuthorityLevel) -> bool {
        if self.is_approved(name, level) {
            return true;
        }
        let Some(account) = self.db.find_account(name) else {
            return false;
        };
        let mut candidates: Vec<Authority> = Vec::new();
        match level {
            AuthorityLevel::Basic => {
                candidates.push(account.basic.clone());
                candidates.push(account.active.clone());
                candidates.push(account.owner.clone());
            }
            AuthorityLevel::Active => {
                candidates.push(account.active.clone());
                candidates.push(account.owner.clone());
            }
            AuthorityLevel::Owner => candidates.push(account.owner.clone()),
        }
        let expand = match level {
            AuthorityLevel::Owner => AuthorityLevel::Owner,
            _ => AuthorityLevel::Active,
        };
        candidates
            .iter()
            .any(|authority| self.check_authority(authority, expand))
    }

    /// Threshold-weighted satisfaction of one authority. Account members
    /// expand through the referenced account's authority at
    /// `expand_level`, bounded by the signature check depth. Implemented
    /// with an explicit frame stack so a hostile authority graph cannot
    /// grow the call stack.
    pub fn check_authority(&mut self, authority: &Authority, expand_level: AuthorityLevel) -> bool {
        struct Frame {
            authority: Authority,
            weight_in_parent: u64,
            total: u64,
            member: usize,
        }

        // the weight of a frame's directly provided keys, consumed on push
        fn seed(state: &mut SignState, authority: &Authority) -> u64 {
            let mut total = 0u64;
            for (key, weight) in &authority.key_auths {
                if state.provided_keys.contains(key) {
                    state.used_keys.insert(key.clone());
                    total += *weight as u64;
                }
            }
            total
        }

        let total = seed(self, authority);
        let mut stack = vec![Frame {
            authority: authority.clone(),
            weight_in_parent: 0,
            total,
            member: 0,
        }];

        loop {
            let depth = (stack.len() - 1) as u32;
            let frame = stack.last_mut().expect("stack never empties mid-loop");
            let satisfied = frame.total >= frame.authority.weight_threshold as u64;
            let exhausted = frame.member >= frame.authority.account_auths.len();

            if satisfied || exhausted {
                let done = stack.pop().expect("frame exists");
                let ok = done.total >= done.authority.weight_threshold as u64;
                let Some(parent) = stack.last_mut() else {
                    return ok;
                };
                if ok {
                    parent.total += done.weight_in_parent;
                }
                continue;
            }

            // expand the next account member
            let (name, weight) = frame
                .authority
                .account_auths
                .get_index(frame.member)
                .map(|(name, weight)| (name.clone(), *weight))
                .expect("member index checked");
            frame.member += 1;

            if self.is_approved(&name, expand_level) {
                frame.total += weight as u64;
                continue;
            }
            if depth >= MAX_SIG_CHECK_DEPTH {
                continue;
            }
            let Some(account) = self.db.find_account(&name) else {
                continue;
            };
            let child = match expand_level {
                AuthorityLevel::Owner => account.owner.clone(),
                _ => account.active.clone(),
            };
            let child_total = seed(self, &child);
            stack.push(Frame {
                authority: child,
                weight_in_parent: weight as u64,
                total: child_total,
                member: 0,
            });
        }
    }

    pub fn unused_keys(&self) -> impl Iterator<Item = &PublicKey> {
        self.provided_keys.difference(&self.used_keys)
    }
}

/// Full transaction-level authority verification: unions were already
/// collected per operation; this resolves them against the recovered
/// keys. Owner satisfaction implies active, active implies basic.
pub fn verify_authority(
    db: &Database,
    required: &RequiredAuthorities,
    keys: &[PublicKey],
) -> Result<(), BlockchainError> {
    let mut unique = BTreeSet::new();
    for key in keys {
        if !unique.insert(key.clone()) {
            return Err(BlockchainError::DuplicateSignature);
        }
    }

    let mut state = SignState::new(db, unique);

    for authority in &required.other {
        if !state.check_authority(authority, AuthorityLevel::Active) {
            return Err(BlockchainError::MissingOtherAuthority);
        }
    }
    for name in &required.owner {
        if !state.check_account_authority(name, AuthorityLevel::Owner) {
            return Err(BlockchainError::MissingOwnerAuthority(name.clone()));
        }
    }
    for name in &required.active {
        if !state.check_account_authority(name, AuthorityLevel::Active) {
            return Err(BlockchainError::MissingActiveAuthority(name.clone()));
        }
    }
    for name in &required.basic {
        if !state.check_account_authority(name, AuthorityLevel::Basic) {
            return Err(BlockchainError::MissingBasicAuthority(name.clone()));
        }
    }
    for url in &required.master_content {
        let content = db
            .find_content_by_url(url)
            .ok_or_else(|| BlockchainError::UnknownContent(url.clone()))?;
        let manage = content.manage_master.clone();
        if !state.check_authority(&manage, AuthorityLevel::Active) {
            return Err(BlockchainError::MissingContentAuthority(url.clone()));
        }
    }
    for url in &required.comp_content {
        let content = db
            .find_content_by_url(url)
            .ok_or_else(|| BlockchainError::UnknownContent(url.clone()))?;
        let manage = content.manage_comp.clone();
        if !state.check_authority(&manage, AuthorityLevel::Active) {
            return Err(BlockchainError::MissingContentAuthority(url.clone()));
        }
    }

    if let Some(key) = state.unused_keys().next() {
        return Err(BlockchainError::IrrelevantSignature(key.to_string()));
    }
    Ok(())
}
