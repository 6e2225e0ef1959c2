// Virtual operations are emitted by the block applier so observers can
// see why state changed. They are never submitted by users: validate()
// rejects them and they declare no authorities.

use serde::{Deserialize, Serialize};

use crate::{
    asset::Asset,
    serializer::{Reader, ReaderError, Serializer, Writer},
};

/// A matured MBD conversion paid out at the median feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillConvertRequestOperation {
    pub owner: String,
    pub request_id: u32,
    pub amount_in: Asset,
    pub amount_out: Asset,
}

impl Serializer for FillConvertRequestOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        writer.write_u32(&self.request_id);
        self.amount_in.write(writer);
        self.amount_out.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(FillConvertRequestOperation {
            owner: reader.read()?,
            request_id: reader.read_u32()?,
            amount_in: reader.read()?,
            amount_out: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size() + 4 + self.amount_in.size() + self.amount_out.size()
    }
}

/// Share of a content payout credited to a streaming platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayingRewardOperation {
    pub platform: String,
    pub url: String,
    pub payout: Asset,
}

impl Serializer for PlayingRewardOperation {
    fn write(&self, writer: &mut Writer) {
        self.platform.write(writer);
        self.url.write(writer);
        self.payout.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(PlayingRewardOperation {
            platform: reader.read()?,
            url: reader.read()?,
            payout: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.platform.size() + self.url.size() + self.payout.size()
    }
}

/// Share of a content payout credited to a distribution payee.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentRewardOperation {
    pub payee: String,
    pub url: String,
    pub payout: Asset,
}

impl Serializer for ContentRewardOperation {
    fn write(&self, writer: &mut Writer) {
        self.payee.write(writer);
        self.url.write(writer);
        self.payout.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(ContentRewardOperation {
            payee: reader.read()?,
            url: reader.read()?,
            payout: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.payee.size() + self.url.size() + self.payout.size()
    }
}

/// Curation payout for an early vote on content that became popular.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurateRewardOperation {
    pub curator: String,
    pub url: String,
    pub reward: Asset,
}

impl Serializer for CurateRewardOperation {
    fn write(&self, writer: &mut Writer) {
        self.curator.write(writer);
        self.url.write(writer);
        self.reward.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(CurateRewardOperation {
            curator: reader.read()?,
            url: reader.read()?,
            reward: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.curator.size() + self.url.size() + self.reward.size()
    }
}

/// Hourly payout to market makers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRewardOperation {
    pub owner: String,
    pub payout: Asset,
}

impl Serializer for LiquidityRewardOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        self.payout.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(LiquidityRewardOperation {
            owner: reader.read()?,
            payout: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size() + self.payout.size()
    }
}

/// Interest accrued on an MBD balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterestOperation {
    pub owner: String,
    pub interest: Asset,
}

impl Serializer for InterestOperation {
    fn write(&self, writer: &mut Writer) {
        self.owner.write(writer);
        self.interest.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(InterestOperation {
            owner: reader.read()?,
            interest: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.owner.size() + self.interest.size()
    }
}

/// One weekly vesting withdrawal tranche, possibly routed to another
/// account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillVestingWithdrawOperation {
    pub from_account: String,
    pub to_account: String,
    pub withdrawn: Asset,
    pub deposited: Asset,
}

impl Serializer for FillVestingWithdrawOperation {
    fn write(&self, writer: &mut Writer) {
        self.from_account.write(writer);
        self.to_account.write(writer);
        self.withdrawn.write(writer);
        self.deposited.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(FillVestingWithdrawOperation {
            from_account: reader.read()?,
            to_account: reader.read()?,
            withdrawn: reader.read()?,
            deposited: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.from_account.size()
            + self.to_account.size()
            + self.withdrawn.size()
            + self.deposited.size()
    }
}

/// A (partial) match between two limit orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillOrderOperation {
    pub current_owner: String,
    pub current_order_id: u32,
    pub current_pays: Asset,
    pub open_owner: String,
    pub open_order_id: u32,
    pub open_pays: Asset,
}

impl Serializer for FillOrderOperation {
    fn write(&self, writer: &mut Writer) {
        self.current_owner.write(writer);
        writer.write_u32(&self.current_order_id);
        self.current_pays.write(writer);
        self.open_owner.write(writer);
        writer.write_u32(&self.open_order_id);
        self.open_pays.write(writer);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(FillOrderOperation {
            current_owner: reader.read()?,
            current_order_id: reader.read_u32()?,
            current_pays: reader.read()?,
            open_owner: reader.read()?,
            open_order_id: reader.read_u32()?,
            open_pays: reader.read()?,
        })
    }

    fn size(&self) -> usize {
        self.current_owner.size()
            + 4
            + self.current_pays.size()
            + self.open_owner.size()
            + 4
            + self.open_pays.size()
    }
}
