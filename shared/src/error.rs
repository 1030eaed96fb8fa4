use chrono::NaiveDate;
use thiserror::Error;

/// Problems found while loading a campaign. All of them are configuration
/// integrity violations and are reported before any session is served.
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("campaign file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog must contain at least one reward")]
    EmptyCatalog,

    #[error("reward code {0:?} appears more than once in the catalog")]
    DuplicateRewardCode(String),

    #[error("rule for {date} references reward code {code:?}, which is not in the catalog")]
    UnknownRewardCode { date: NaiveDate, code: String },

    #[error("range {lower}..={upper} for {date} has its bounds inverted")]
    InvertedRange { date: NaiveDate, lower: u32, upper: u32 },

    #[error("range for {date} must have one or two bounds, got {len}")]
    MalformedRange { date: NaiveDate, len: usize },

    #[error("rule date {0:?} is not in YYYY-MM-DD form")]
    InvalidDate(String),

    #[error("utc offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),

    #[error("full_rotations must be at least 1")]
    NoFullRotation,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("reward code {0:?} is not on the wheel")]
    UnknownRewardCode(String),
}
