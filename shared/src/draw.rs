use chrono::NaiveDate;
use log::{info, warn};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::prize_rules::RuleTable;

/// Source of uniform integers for the draw. Every `rand` generator qualifies;
/// tests substitute scripted sources to force specific numbers.
pub trait RandomSource {
    /// Uniform integer in `[low, high]`, both inclusive. Callers guarantee
    /// `low <= high`.
    fn next_in_range(&mut self, low: u32, high: u32) -> u32;
}

impl<R: RngCore> RandomSource for R {
    fn next_in_range(&mut self, low: u32, high: u32) -> u32 {
        self.gen_range(low..=high)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawSource {
    /// A day rule set covered the drawn number.
    DayRules,
    /// No rule set for the date; equal odds over the catalog.
    Fallback,
    /// A rule set exists but the number fell into a gap.
    Unresolved,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DrawResult {
    /// Empty when `source` is `Unresolved`.
    pub reward_code: String,
    /// The generated number. For fallback draws this is the catalog index.
    pub raw_random_number: u32,
    pub matched: bool,
    pub source: DrawSource,
}

impl DrawResult {
    pub fn is_unresolved(&self) -> bool {
        self.source == DrawSource::Unresolved
    }
}

/// Date-scoped weighted draw over a catalog. Holds only borrowed, immutable
/// configuration; every call is independent.
#[derive(Debug, Clone, Copy)]
pub struct DrawEngine<'a> {
    catalog: &'a Catalog,
    rules: &'a RuleTable,
}

impl<'a> DrawEngine<'a> {
    pub fn new(catalog: &'a Catalog, rules: &'a RuleTable) -> Self {
        Self { catalog, rules }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Draws a reward for `date`. Never fails: a missing day uses the
    /// equal-odds fallback, and a gap in the day's ranges comes back as an
    /// unmatched result with an empty code for the caller to handle.
    pub fn draw<R: RandomSource + ?Sized>(&self, date: NaiveDate, rng: &mut R) -> DrawResult {
        let Some(day) = self.rules.resolve_day_rule_set(date) else {
            let result = self.draw_fallback(rng);
            info!("{} - no rules for date, equal odds - {}", date, result.reward_code);
            return result;
        };

        let max_range = day.generator_bound(self.catalog.len());
        let n = rng.next_in_range(1, max_range);

        match day.first_match(n) {
            Some(range) => {
                info!(
                    "{} - number {} - range {},{} - {}",
                    date, n, range.lower_bound, range.upper_bound, range.reward_code
                );
                DrawResult {
                    reward_code: range.reward_code.clone(),
                    raw_random_number: n,
                    matched: true,
                    source: DrawSource::DayRules,
                }
            }
            None => {
                warn!("{} - number {} is outside every configured range", date, n);
                DrawResult {
                    reward_code: String::new(),
                    raw_random_number: n,
                    matched: false,
                    source: DrawSource::Unresolved,
                }
            }
        }
    }

    /// Equal-probability pick over the catalog. Does not look at the rule table.
    pub fn draw_fallback<R: RandomSource + ?Sized>(&self, rng: &mut R) -> DrawResult {
        let last = u32::try_from(self.catalog.len() - 1).unwrap_or(u32::MAX);
        let index = rng.next_in_range(0, last);
        let reward_code = self
            .catalog
            .at(index as usize)
            .map(|r| r.code.clone())
            .unwrap_or_default();

        DrawResult {
            reward_code,
            raw_random_number: index,
            matched: false,
            source: DrawSource::Fallback,
        }
    }
}
