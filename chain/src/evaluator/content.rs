use log::{debug, trace};

use muse_common::{
    authority::Authority,
    config::{
        CURATION_DURATION_SEC, CURATION_THRESHOLD_1, CURATION_THRESHOLD_2,
        MAX_VOTED_STREAMING_PLATFORMS, MAX_VOTE_CHANGES,
    },
    operation::{
        AccountStreamingPlatformVoteOperation, ContentApproveOperation, ContentDisableOperation,
        ContentOperation, ContentUpdateOperation, Distribution, ManagementVote, Side,
        StreamingPlatformReportOperation, StreamingPlatformUpdateOperation, VoteOperation,
    },
};

use crate::{
    database::Database,
    db::UniqueIndex,
    error::BlockchainError,
    object::{
        ContentApproveObject, ContentVoteObject, StreamingPlatformVoteObject,
    },
};

fn check_payees_exist(db: &Database, distributions: &[Distribution]) -> Result<(), BlockchainError> {
    for distribution in distributions {
        db.get_account(&distribution.payee)?;
    }
    Ok(())
}

// Management percentages become authority weights; the threshold is the
// percentage that has to agree.
fn management_authority(
    db: &Database,
    votes: &[ManagementVote],
    threshold: u32,
) -> Result<Authority, BlockchainError> {
    let mut authority = Authority::new(threshold);
    for vote in votes {
        db.get_account(&vote.voter)?;
        authority
            .account_auths
            .insert(vote.voter.clone(), vote.percentage as u16);
    }
    authority.validate()?;
    Ok(authority)
}

pub fn apply_content(db: &mut Database, op: &ContentOperation) -> Result<(), BlockchainError> {
    db.get_account(&op.uploader)?;
    if db.find_content_by_url(&op.url).is_some() {
        return Err(BlockchainError::DuplicateEntity(format!("content {}", op.url)));
    }

    check_payees_exist(db, &op.distributions)?;
    let manage_master = management_authority(db, &op.management, op.management_threshold)?;
    let manage_comp = if op.comp_meta.third_party_publishers {
        let votes = op
            .management_comp
            .as_ref()
            .ok_or_else(|| BlockchainError::Evaluate("missing composition management".to_owned()))?;
        let threshold = op
            .management_threshold_comp
            .ok_or_else(|| BlockchainError::Evaluate("missing composition threshold".to_owned()))?;
        if let Some(distributions_comp) = &op.distributions_comp {
            check_payees_exist(db, distributions_comp)?;
        }
        management_authority(db, votes, threshold)?
    } else {
        manage_master.clone()
    };

    let now = db.head_block_time();
    db.contents.create(|content| {
        content.uploader = op.uploader.clone();
        content.url = op.url.clone();
        content.album_meta = op.album_meta.clone();
        content.track_meta = op.track_meta.clone();
        content.comp_meta = op.comp_meta.clone();
        content.track_title = op.track_meta.track_title.clone();
        content.created = now;
        content.last_update = now;
        content.distributions_master = op.distributions.clone();
        content.distributions_comp = op.distributions_comp.clone().unwrap_or_default();
        content.playing_reward = op.playing_reward;
        content.publishers_share = op.publishers_share;
        content.manage_master = manage_master;
        content.manage_comp = manage_comp;
        content.curation_reward_expiration = now.add_seconds(CURATION_DURATION_SEC);
    });
    debug!("registered content {}", op.url);
    Ok(())
}

pub fn apply_content_update(
    db: &mut Database,
    op: &ContentUpdateOperation,
) -> Result<(), BlockchainError> {
    let content = db.get_content_by_url(&op.url)?;
    let instance = content.id;
    if content.disabled {
        return Err(BlockchainError::Evaluate("content is disabled".to_owned()));
    }
    if op.side == Side::Publisher && !content.comp_meta.third_party_publishers {
        return Err(BlockchainError::Evaluate(
            "content has no third-party composition side".to_owned(),
        ));
    }
    // with third-party publishers the composition side is theirs alone
    if op.side == Side::Master
        && content.comp_meta.third_party_publishers
        && op.new_comp_meta.is_some()
    {
        return Err(BlockchainError::Evaluate(
            "master side cannot edit third-party composition info".to_owned(),
        ));
    }

    if !op.new_distributions.is_empty() {
        check_payees_exist(db, &op.new_distributions)?;
    }
    let new_management = if op.new_management.is_empty() {
        None
    } else {
        Some(management_authority(db, &op.new_management, op.new_threshold)?)
    };

    let now = db.head_block_time();
    db.contents.modify(instance, |content| {
        match op.side {
            Side::Master => {
                if let Some(album_meta) = &op.new_album_meta {
                    content.album_meta = album_meta.clone();
                }
                if let Some(track_meta) = &op.new_track_meta {
                    content.track_meta = track_meta.clone();
                    content.track_title = track_meta.track_title.clone();
                }
                if !op.new_distributions.is_empty() {
                    content.distributions_master = op.new_distributions.clone();
                }
                if let Some(authority) = new_management {
                    content.manage_master = authority;
                }
                // splits are master-side properties; zero keeps the
                // current value
                if op.new_playing_reward > 0 {
                    content.playing_reward = op.new_playing_reward;
                }
                if op.new_publishers_share > 0 {
                    content.publishers_share = op.new_publishers_share;
                }
            }
            Side::Publisher => {
                if let Some(comp_meta) = &op.new_comp_meta {
                    content.comp_meta = comp_meta.clone();
                }
                if !op.new_distributions.is_empty() {
                    content.distributions_comp = op.new_distributions.clone();
                }
                if let Some(authority) = new_management {
                    content.manage_comp = authority;
                }
            }
        }
        if op.side == Side::Master {
            if let Some(comp_meta) = &op.new_comp_meta {
                // reachable only without third-party publishers
                content.comp_meta = comp_meta.clone();
            }
        }
        content.last_update = now;
    })
}

pub fn apply_content_disable(
    db: &mut Database,
    op: &ContentDisableOperation,
) -> Result<(), BlockchainError> {
    let content = db.get_content_by_url(&op.url)?;
    if content.disabled {
        return Err(BlockchainError::Evaluate("content already disabled".to_owned()));
    }
    let instance = content.id;
    db.contents.modify(instance, |content| {
        content.disabled = true;
    })
}

pub fn apply_content_approve(
    db: &mut Database,
    op: &ContentApproveOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.approver)?;
    let content = db.get_content_by_url(&op.url)?;
    if content.disabled {
        return Err(BlockchainError::Evaluate("content is disabled".to_owned()));
    }

    let index = db
        .content_approvals
        .index::<UniqueIndex<ContentApproveObject, (String, String)>>()
        .expect("registered in new");
    if index.contains(&(op.url.clone(), op.approver.clone())) {
        return Err(BlockchainError::DuplicateEntity(format!(
            "approval of {} by {}",
            op.url, op.approver
        )));
    }
    db.content_approvals.create(|approval| {
        approval.content = op.url.clone();
        approval.approver = op.approver.clone();
    });
    Ok(())
}

pub fn apply_vote(db: &mut Database, op: &VoteOperation) -> Result<(), BlockchainError> {
    db.get_account(&op.voter)?;
    let content = db.get_content_by_url(&op.url)?;
    let content_instance = content.id;
    if content.disabled {
        return Err(BlockchainError::Evaluate("content is disabled".to_owned()));
    }
    if !content.allow_votes {
        return Err(BlockchainError::Evaluate("content does not allow votes".to_owned()));
    }
    let now = db.head_block_time();
    if now >= content.curation_reward_expiration {
        return Err(BlockchainError::Evaluate(
            "voting window has closed".to_owned(),
        ));
    }

    let existing = db
        .content_votes
        .index::<UniqueIndex<ContentVoteObject, (u64, String)>>()
        .expect("registered in new")
        .find(&(content_instance, op.voter.clone()));

    match existing {
        Some(instance) => {
            let vote = db.content_votes.get(instance)?;
            if vote.num_changes >= MAX_VOTE_CHANGES {
                return Err(BlockchainError::Evaluate(format!(
                    "votes may be changed at most {MAX_VOTE_CHANGES} times"
                )));
            }
            db.content_votes.modify(instance, |vote| {
                vote.weight = op.weight;
                vote.num_changes += 1;
                vote.last_update = now;
            })?;
        }
        None => {
            db.content_votes.create(|vote| {
                vote.content = content_instance;
                vote.voter = op.voter.clone();
                vote.weight = op.weight;
                vote.last_update = now;
            });
        }
    }
    db.modify_account(&op.voter, |account| {
        account.last_vote_time = now;
    })?;
    trace!("{} voted {} on {}", op.voter, op.weight, op.url);
    Ok(())
}

pub fn apply_streaming_platform_update(
    db: &mut Database,
    op: &StreamingPlatformUpdateOperation,
) -> Result<(), BlockchainError> {
    db.get_account(&op.owner)?;

    if let Some(platform) = db.find_streaming_platform(&op.owner) {
        let instance = platform.id;
        return db.streaming_platforms.modify(instance, |platform| {
            platform.url = op.url.clone();
        });
    }

    // the registration fee is burned
    db.adjust_balance(&op.owner, op.fee.negate())?;
    db.adjust_supply(op.fee.negate())?;

    let now = db.head_block_time();
    db.streaming_platforms.create(|platform| {
        platform.owner = op.owner.clone();
        platform.created = now;
        platform.url = op.url.clone();
    });
    debug!("registered streaming platform {}", op.owner);
    Ok(())
}

pub fn apply_account_streaming_platform_vote(
    db: &mut Database,
    op: &AccountStreamingPlatformVoteOperation,
) -> Result<(), BlockchainError> {
    let account = db.get_account(&op.account)?;
    let weight = account.witness_vote_weight();
    let voted_for = account.streaming_platforms_voted_for;
    let platform_instance = db.get_streaming_platform(&op.streaming_platform)?.id;

    let existing = db
        .streaming_platform_votes
        .index::<UniqueIndex<StreamingPlatformVoteObject, (String, String)>>()
        .expect("registered in new")
        .find(&(op.account.clone(), op.streaming_platform.clone()));

    match (op.approve, existing) {
        (true, Some(_)) => Err(BlockchainError::Evaluate(format!(
            "{} already votes for platform {}",
            op.account, op.streaming_platform
        ))),
        (true, None) => {
            if voted_for as usize >= MAX_VOTED_STREAMING_PLATFORMS {
                return Err(BlockchainError::Evaluate(format!(
                    "accounts may vote for at most {MAX_VOTED_STREAMING_PLATFORMS} platforms"
                )));
            }
            db.streaming_platform_votes.create(|vote| {
                vote.streaming_platform = op.streaming_platform.clone();
                vote.account = op.account.clone();
            });
            db.streaming_platforms.modify(platform_instance, |platform| {
                platform.votes += weight;
            })?;
            db.modify_account(&op.account, |account| {
                account.streaming_platforms_voted_for += 1;
            })
        }
        (false, Some(vote_instance)) => {
            db.streaming_platform_votes.remove(vote_instance)?;
            db.streaming_platforms.modify(platform_instance, |platform| {
                platform.votes -= weight;
            })?;
            db.modify_account(&op.account, |account| {
                account.streaming_platforms_voted_for -= 1;
            })
        }
        (false, None) => Err(BlockchainError::Evaluate(format!(
            "{} does not vote for platform {}",
            op.account, op.streaming_platform
        ))),
    }
}

pub fn apply_streaming_platform_report(
    db: &mut Database,
    op: &StreamingPlatformReportOperation,
) -> Result<(), BlockchainError> {
    db.get_streaming_platform(&op.streaming_platform)?;
    db.get_account(&op.consumer)?;
    if let Some(playlist_creator) = &op.playlist_creator {
        db.get_account(playlist_creator)?;
    }
    let content = db.get_content_by_url(&op.content)?;
    if content.disabled {
        return Err(BlockchainError::Evaluate("content is disabled".to_owned()));
    }
    let content_instance = content.id;
    let now = db.head_block_time();

    db.reports.create(|report| {
        report.streaming_platform = op.streaming_platform.clone();
        report.consumer = op.consumer.clone();
        report.content = content_instance;
        report.created = now;
        report.play_time = op.play_time;
        report.playlist_creator = op.playlist_creator.clone();
    });

    let mut crossed_threshold = false;
    db.contents.modify(content_instance, |content| {
        let before = content.times_played;
        content.times_played += 1;
        content.times_played_24 += 1;
        content.last_played = now;
        crossed_threshold = (before < CURATION_THRESHOLD_1 as u64
            && content.times_played >= CURATION_THRESHOLD_1 as u64)
            || (before < CURATION_THRESHOLD_2 as u64
                && content.times_played >= CURATION_THRESHOLD_2 as u64);
    })?;

    // crossing a popularity threshold flags the standing votes for the
    // curation payout, while the curation window is open
    let content = db.contents.get(content_instance)?;
    if crossed_threshold && content.curation_rewards && now < content.curation_reward_expiration {
        let votes: Vec<u64> = db
            .content_votes
            .iter()
            .filter(|vote| vote.content == content_instance && !vote.marked_for_curation_reward)
            .map(|vote| vote.id)
            .collect();
        for instance in votes {
            db.content_votes.modify(instance, |vote| {
                vote.marked_for_curation_reward = true;
            })?;
        }
    }
    Ok(())
}
