use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The persisted busy/idle scan flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Idle,
    Busy,
}
impl ScanState {
    /// Storage (and wire) representation: `"1"` busy, `"0"` idle.
    pub fn as_flag(&self) -> &'static str {
        match self {
            ScanState::Idle => "0",
            ScanState::Busy => "1",
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ScanState::Busy)
    }
}
impl Display for ScanState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_flag())
    }
}
impl FromStr for ScanState {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(ScanState::Idle),
            "1" => Ok(ScanState::Busy),
            _ => exn::bail!(ErrorKind::InvalidData("scan state")),
        }
    }
}
