use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::catalog::{Catalog, Reward};
use crate::coupon::CouponActions;
use crate::draw::DrawEngine;
use crate::error::CampaignError;
use crate::prize_rules::{DayAudit, DayRuleSet, RewardRange, RuleTable};
use crate::shared_wheel_game::{RecoveryPolicy, SpinSession, WheelSession, SPIN_DURATION_MS};
use crate::wheel_geometry::{WheelGeometry, FULL_ROTATIONS};

/// Black Friday 2025 campaign shipped with the crate.
pub const BUILTIN_CAMPAIGN: &str = include_str!("../campaigns/black_friday_2025.json");

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TimezoneConfig {
    /// Informational, e.g. `America/Sao_Paulo`.
    pub label: String,
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SpinSettings {
    pub full_rotations: u32,
    pub reveal_delay_ms: u64,
    pub unresolved_policy: RecoveryPolicy,
}

impl Default for SpinSettings {
    fn default() -> Self {
        Self {
            full_rotations: FULL_ROTATIONS,
            reveal_delay_ms: SPIN_DURATION_MS,
            unresolved_policy: RecoveryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    range: Vec<u32>,
    code: String,
}

#[derive(Debug, Deserialize)]
struct CampaignFile {
    name: String,
    timezone: TimezoneConfig,
    rewards: Vec<Reward>,
    #[serde(default)]
    rules: BTreeMap<String, Vec<RuleEntry>>,
    #[serde(default)]
    spin: SpinSettings,
    actions: CouponActions,
}

/// Resolves "today" for the campaign. The wall clock stays outside the
/// engine; callers pass the instant in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignClock {
    label: String,
    offset: FixedOffset,
}

impl CampaignClock {
    pub fn new(config: &TimezoneConfig) -> Result<Self, CampaignError> {
        let offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(CampaignError::InvalidUtcOffset(config.utc_offset_minutes))?;
        Ok(Self {
            label: config.label.clone(),
            offset,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn date_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

/// Immutable campaign configuration: catalog, rules, clock and actions.
#[derive(Debug, Clone)]
pub struct Campaign {
    name: String,
    catalog: Catalog,
    rules: RuleTable,
    clock: CampaignClock,
    spin: SpinSettings,
    actions: CouponActions,
}

impl Campaign {
    pub fn builtin() -> Result<Self, CampaignError> {
        Self::from_json(BUILTIN_CAMPAIGN)
    }

    pub fn from_json(text: &str) -> Result<Self, CampaignError> {
        let file: CampaignFile = serde_json::from_str(text)?;

        if file.spin.full_rotations == 0 {
            return Err(CampaignError::NoFullRotation);
        }
        let catalog = Catalog::new(file.rewards)?;
        let clock = CampaignClock::new(&file.timezone)?;

        let mut days = BTreeMap::new();
        for (key, entries) in file.rules {
            let date = NaiveDate::parse_from_str(&key, DATE_FORMAT)
                .map_err(|_| CampaignError::InvalidDate(key.clone()))?;
            let ranges = entries
                .into_iter()
                .map(|entry| parse_range(date, entry, &catalog))
                .collect::<Result<Vec<_>, _>>()?;
            days.insert(date, DayRuleSet::new(ranges));
        }

        let campaign = Self {
            name: file.name,
            catalog,
            rules: RuleTable::new(days),
            clock,
            spin: file.spin,
            actions: file.actions,
        };
        campaign.report_anomalies();
        Ok(campaign)
    }

    // Dead or gapped ranges are kept as configured; past odds depend on them.
    fn report_anomalies(&self) {
        for (date, audit) in self.audit() {
            for range in audit.unreachable() {
                warn!(
                    "{} - range {},{} for {} can never be drawn (draws cover 1..={})",
                    date, range.lower_bound, range.upper_bound, range.reward_code, audit.max_range
                );
            }
            if audit.unmatched > 0 {
                warn!(
                    "{} - {} of {} numbers fall outside every range",
                    date, audit.unmatched, audit.max_range
                );
            }
        }
        info!(
            "Loaded campaign {} with {} rewards and {} dated rule sets ({})",
            self.name,
            self.catalog.len(),
            self.rules.len(),
            self.clock.label()
        );
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn clock(&self) -> &CampaignClock {
        &self.clock
    }

    pub fn spin_settings(&self) -> SpinSettings {
        self.spin
    }

    pub fn actions(&self) -> &CouponActions {
        &self.actions
    }

    pub fn engine(&self) -> DrawEngine<'_> {
        DrawEngine::new(&self.catalog, &self.rules)
    }

    pub fn geometry(&self) -> WheelGeometry {
        WheelGeometry::new(self.spin.full_rotations)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.spin.reveal_delay_ms)
    }

    /// A fresh session configured for this campaign.
    pub fn new_session(&self) -> WheelSession {
        WheelSession::new(
            SpinSession::new(self.geometry(), self.spin.unresolved_policy),
            self.reveal_delay(),
        )
    }

    pub fn audit(&self) -> Vec<(NaiveDate, DayAudit)> {
        self.rules
            .iter()
            .map(|(date, day)| (*date, day.audit(self.catalog.len())))
            .collect()
    }
}

fn parse_range(
    date: NaiveDate,
    entry: RuleEntry,
    catalog: &Catalog,
) -> Result<RewardRange, CampaignError> {
    let (lower, upper) = match entry.range.as_slice() {
        [value] => (*value, *value),
        [lower, upper] => (*lower, *upper),
        other => {
            return Err(CampaignError::MalformedRange {
                date,
                len: other.len(),
            })
        }
    };
    if lower > upper {
        return Err(CampaignError::InvertedRange { date, lower, upper });
    }
    if !catalog.contains(&entry.code) {
        return Err(CampaignError::UnknownRewardCode {
            date,
            code: entry.code,
        });
    }
    Ok(RewardRange::new(lower, upper, entry.code))
}
