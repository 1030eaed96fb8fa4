use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Inclusive numeric range mapped to a reward code. `lower_bound == upper_bound`
/// is a single-value range; `[0, 0]` is legal configuration even though draws
/// start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRange {
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub reward_code: String,
}

impl RewardRange {
    pub fn new(lower_bound: u32, upper_bound: u32, reward_code: impl Into<String>) -> Self {
        Self {
            lower_bound,
            upper_bound,
            reward_code: reward_code.into(),
        }
    }

    pub fn single(value: u32, reward_code: impl Into<String>) -> Self {
        Self::new(value, value, reward_code)
    }

    pub fn contains(&self, n: u32) -> bool {
        self.lower_bound <= n && n <= self.upper_bound
    }
}

/// Ranges for one calendar day, in declared order. Overlaps are resolved by
/// that order and are never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayRuleSet {
    ranges: Vec<RewardRange>,
}

impl DayRuleSet {
    pub fn new(ranges: Vec<RewardRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[RewardRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Largest upper bound, or `None` for an empty set.
    pub fn max_range(&self) -> Option<u32> {
        self.ranges.iter().map(|r| r.upper_bound).max()
    }

    /// Upper end of the generator interval `[1, bound]` for this day. An empty
    /// set falls back to the catalog size; the bound never drops below 1.
    pub fn generator_bound(&self, catalog_len: usize) -> u32 {
        let bound = match self.max_range() {
            Some(max) => max,
            None => u32::try_from(catalog_len).unwrap_or(u32::MAX),
        };
        bound.max(1)
    }

    pub fn first_match(&self, n: u32) -> Option<&RewardRange> {
        self.ranges.iter().find(|r| r.contains(n))
    }

    /// Counts, for every number the generator can produce, which range wins
    /// it. Ranges with zero hits are dead under this rule set.
    ///
    /// Range bounds split `[1, max_range]` into segments where the set of
    /// covering ranges is constant, so each segment goes to its first
    /// covering range as a whole. Cost depends on the number of ranges, not
    /// their width.
    pub fn audit(&self, catalog_len: usize) -> DayAudit {
        let max_range = self.generator_bound(catalog_len);
        // exclusive end; u64 so u32::MAX + 1 fits
        let end = u64::from(max_range) + 1;

        let mut cuts = vec![1, end];
        for range in &self.ranges {
            cuts.push(u64::from(range.lower_bound));
            cuts.push(u64::from(range.upper_bound) + 1);
        }
        cuts.retain(|cut| (1..=end).contains(cut));
        cuts.sort_unstable();
        cuts.dedup();

        let mut hits = vec![0u64; self.ranges.len()];
        let mut unmatched = 0u64;
        for segment in cuts.windows(2) {
            let (start, stop) = (segment[0], segment[1]);
            // start < end, so it is a generator value
            let representative = start as u32;
            match self.ranges.iter().position(|r| r.contains(representative)) {
                Some(idx) => hits[idx] += stop - start,
                None => unmatched += stop - start,
            }
        }

        // all counts sum to max_range, which is a u32
        let hits: Vec<u32> = hits.into_iter().map(|h| h as u32).collect();
        let unmatched = unmatched as u32;

        let ranges = self
            .ranges
            .iter()
            .zip(hits)
            .map(|(range, hits)| RangeAudit {
                lower_bound: range.lower_bound,
                upper_bound: range.upper_bound,
                reward_code: range.reward_code.clone(),
                hits,
            })
            .collect();

        DayAudit {
            max_range,
            ranges,
            unmatched,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeAudit {
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub reward_code: String,
    pub hits: u32,
}

impl RangeAudit {
    pub fn is_reachable(&self) -> bool {
        self.hits > 0
    }
}

/// Exact odds of one day's rules, counted over `[1, max_range]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayAudit {
    pub max_range: u32,
    pub ranges: Vec<RangeAudit>,
    /// Numbers that fall into a configuration gap.
    pub unmatched: u32,
}

impl DayAudit {
    pub fn unreachable(&self) -> impl Iterator<Item = &RangeAudit> {
        self.ranges.iter().filter(|r| !r.is_reachable())
    }

    pub fn probability_of(&self, reward_code: &str) -> f64 {
        let hits: u32 = self
            .ranges
            .iter()
            .filter(|r| r.reward_code == reward_code)
            .map(|r| r.hits)
            .sum();
        f64::from(hits) / f64::from(self.max_range)
    }
}

/// Date-scoped rules. Built once at load and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    days: BTreeMap<NaiveDate, DayRuleSet>,
}

impl RuleTable {
    pub fn new(days: BTreeMap<NaiveDate, DayRuleSet>) -> Self {
        Self { days }
    }

    pub fn resolve_day_rule_set(&self, date: NaiveDate) -> Option<&DayRuleSet> {
        self.days.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DayRuleSet)> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl FromIterator<(NaiveDate, DayRuleSet)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, DayRuleSet)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
