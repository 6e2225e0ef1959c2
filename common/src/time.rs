// Consensus time is always the block timestamp, expressed in whole
// seconds since the unix epoch. System clocks are never consulted by
// the state machine.

use std::fmt::{Display, Error, Formatter};

use serde::{Deserialize, Serialize};

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub const fn new(seconds: u32) -> Self {
        TimePointSec(seconds)
    }

    pub const fn zero() -> Self {
        TimePointSec(0)
    }

    pub const fn maximum() -> Self {
        TimePointSec(u32::MAX)
    }

    pub const fn seconds(&self) -> u32 {
        self.0
    }

    pub const fn add_seconds(&self, seconds: u32) -> Self {
        TimePointSec(self.0.saturating_add(seconds))
    }

    pub const fn sub_seconds(&self, seconds: u32) -> Self {
        TimePointSec(self.0.saturating_sub(seconds))
    }

    // Seconds elapsed since `earlier`, zero if `earlier` is in the future
    pub const fn elapsed_since(&self, earlier: TimePointSec) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Display for TimePointSec {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

impl Serializer for TimePointSec {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(TimePointSec(reader.read_u32()?))
    }

    fn size(&self) -> usize {
        4
    }
}
