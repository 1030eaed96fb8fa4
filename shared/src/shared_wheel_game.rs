use chrono::NaiveDate;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crate::activation::ActivationGate;
use crate::coupon::coupon_code;
use crate::draw::{DrawEngine, DrawResult, RandomSource};
use crate::wheel_geometry::WheelGeometry;

// Duration of the spin animation; the reward is revealed when it ends.
pub const SPIN_DURATION_MS: u64 = 3000;

/// Where the wheel stops when a draw is revealed without a reward.
pub const UNMATCHED_SEGMENT: usize = 0;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    Idle,
    Spinning,
    Revealed,
}

/// What to do when the day's ranges leave the drawn number uncovered.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Draw again with equal odds over the catalog.
    #[default]
    Fallback,
    /// Keep the unmatched result; the reveal shows no reward.
    RevealUnmatched,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpinOutcome {
    Started { rotation_angle: f64 },
    /// The activation gate has not fired yet.
    NotReady,
    /// A spin already happened in this session; nothing changed.
    AlreadySpun,
}

/// One visitor's wheel. Phases only move forward: Idle, Spinning, Revealed.
#[derive(Debug, Clone)]
pub struct SpinSession {
    phase: SpinPhase,
    ready: bool,
    rotation_angle: f64,
    // Drawn at spin time, published at reveal time.
    pending: Option<DrawResult>,
    draw_result: Option<DrawResult>,
    geometry: WheelGeometry,
    policy: RecoveryPolicy,
}

impl Default for SpinSession {
    fn default() -> Self {
        Self::new(WheelGeometry::default(), RecoveryPolicy::default())
    }
}

impl SpinSession {
    pub fn new(geometry: WheelGeometry, policy: RecoveryPolicy) -> Self {
        Self {
            phase: SpinPhase::Idle,
            ready: false,
            rotation_angle: 0.0,
            pending: None,
            draw_result: None,
            geometry,
            policy,
        }
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// Returns true the first time only.
    pub fn mark_ready(&mut self) -> bool {
        !std::mem::replace(&mut self.ready, true)
    }

    /// Draws, fixes the landing angle and enters `Spinning`. Any call outside
    /// `Idle` is ignored without drawing.
    pub fn start_spin<R: RandomSource + ?Sized>(
        &mut self,
        engine: &DrawEngine<'_>,
        date: NaiveDate,
        rng: &mut R,
    ) -> SpinOutcome {
        if self.phase != SpinPhase::Idle {
            debug!("spin ignored in phase {:?}", self.phase);
            return SpinOutcome::AlreadySpun;
        }
        if !self.ready {
            debug!("spin ignored before activation");
            return SpinOutcome::NotReady;
        }

        let mut result = engine.draw(date, rng);
        if result.is_unresolved() && self.policy == RecoveryPolicy::Fallback {
            warn!(
                "{} - number {} left unresolved, redrawing with equal odds",
                date, result.raw_random_number
            );
            result = engine.draw_fallback(rng);
        }

        let catalog = engine.catalog();
        let angle = if result.is_unresolved() {
            debug!(
                "{} - number {} revealed unmatched, landing on segment {}",
                date, result.raw_random_number, UNMATCHED_SEGMENT
            );
            self.geometry.angle_for_index(UNMATCHED_SEGMENT, catalog)
        } else {
            match self.geometry.angle_for(&result.reward_code, catalog) {
                Ok(angle) => angle,
                Err(e) => {
                    if cfg!(debug_assertions) {
                        panic!("{} (rules and catalog disagree)", e);
                    }
                    error!("{}; landing on the first segment", e);
                    self.geometry.angle_for_index(0, catalog)
                }
            }
        };

        self.rotation_angle = angle;
        self.pending = Some(result);
        self.phase = SpinPhase::Spinning;
        SpinOutcome::Started {
            rotation_angle: angle,
        }
    }

    /// Moves `Spinning` to `Revealed` and publishes the draw. No-op otherwise.
    pub fn complete_spin(&mut self) -> bool {
        if self.phase != SpinPhase::Spinning {
            return false;
        }
        self.draw_result = self.pending.take();
        self.phase = SpinPhase::Revealed;
        true
    }

    /// The draw, once revealed.
    pub fn draw_result(&self) -> Option<&DrawResult> {
        match self.phase {
            SpinPhase::Revealed => self.draw_result.as_ref(),
            _ => None,
        }
    }

    /// Uppercased coupon code, once revealed. `None` for an unmatched reveal.
    pub fn revealed_code(&self) -> Option<String> {
        self.draw_result()
            .filter(|r| !r.reward_code.is_empty())
            .map(|r| coupon_code(&r.reward_code))
    }
}

pub type RevealTask = Box<dyn FnOnce() + Send + 'static>;

/// Runs a task once after a delay. There is deliberately no way to cancel a
/// scheduled reveal.
pub trait RevealScheduler {
    fn schedule(&self, delay: Duration, task: RevealTask);
}

fn lock(session: &Mutex<SpinSession>) -> MutexGuard<'_, SpinSession> {
    // A panic elsewhere must not leave the wheel stuck mid-spin.
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shareable handle to a session that owns the timed reveal.
#[derive(Debug, Clone)]
pub struct WheelSession {
    inner: Arc<Mutex<SpinSession>>,
    reveal_delay: Duration,
}

impl WheelSession {
    pub fn new(session: SpinSession, reveal_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            reveal_delay,
        }
    }

    pub fn reveal_delay(&self) -> Duration {
        self.reveal_delay
    }

    /// Becomes spinnable when `gate` fires.
    pub fn attach_gate<G: ActivationGate + ?Sized>(&self, gate: &G) {
        let session: Weak<Mutex<SpinSession>> = Arc::downgrade(&self.inner);
        gate.on_ready(Box::new(move || {
            if let Some(session) = session.upgrade() {
                lock(&session).mark_ready();
            }
        }));
    }

    /// Resolves the draw under the lock, then schedules the reveal.
    pub fn spin<R, S>(
        &self,
        engine: &DrawEngine<'_>,
        date: NaiveDate,
        rng: &mut R,
        scheduler: &S,
    ) -> SpinOutcome
    where
        R: RandomSource + ?Sized,
        S: RevealScheduler + ?Sized,
    {
        let outcome = lock(&self.inner).start_spin(engine, date, rng);

        if let SpinOutcome::Started { .. } = outcome {
            let session = self.inner.clone();
            scheduler.schedule(
                self.reveal_delay,
                Box::new(move || {
                    lock(&session).complete_spin();
                }),
            );
        }
        outcome
    }

    pub fn snapshot(&self) -> SpinSession {
        lock(&self.inner).clone()
    }

    pub fn with<T>(&self, f: impl FnOnce(&SpinSession) -> T) -> T {
        f(&lock(&self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ReadinessSignal;
    use crate::catalog::{Catalog, Reward};
    use crate::draw::tests::ScriptedSource;
    use crate::draw::DrawSource;
    use crate::prize_rules::{DayRuleSet, RewardRange, RuleTable};

    #[derive(Default)]
    struct ManualScheduler {
        tasks: Mutex<Vec<(Duration, RevealTask)>>,
    }

    impl ManualScheduler {
        fn pending(&self) -> usize {
            self.tasks.lock().unwrap().len()
        }

        fn fire_all(&self) {
            let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
            for (_, task) in tasks {
                task();
            }
        }
    }

    impl RevealScheduler for ManualScheduler {
        fn schedule(&self, delay: Duration, task: RevealTask) {
            self.tasks.lock().unwrap().push((delay, task));
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
    }

    fn gap_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 11).unwrap()
    }

    fn fixture() -> (Catalog, RuleTable) {
        let catalog = Catalog::new(
            ["A", "B", "C", "D", "E"]
                .iter()
                .map(|c| Reward::new(c.to_lowercase(), *c))
                .collect(),
        )
        .unwrap();
        let rules = [
            (
                date(),
                DayRuleSet::new(vec![
                    RewardRange::new(1, 40, "a"),
                    RewardRange::new(41, 45, "b"),
                    RewardRange::new(46, 47, "c"),
                    RewardRange::new(48, 49, "d"),
                    RewardRange::single(0, "e"),
                ]),
            ),
            (
                gap_date(),
                DayRuleSet::new(vec![RewardRange::new(1, 2, "a"), RewardRange::new(5, 6, "b")]),
            ),
        ]
        .into_iter()
        .collect();
        (catalog, rules)
    }

    fn ready_session(policy: RecoveryPolicy) -> SpinSession {
        let mut session = SpinSession::new(WheelGeometry::default(), policy);
        session.mark_ready();
        session
    }

    #[test]
    fn test_spin_then_reveal() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = ready_session(RecoveryPolicy::Fallback);

        let outcome = session.start_spin(&engine, date(), &mut ScriptedSource::new(&[43]));
        assert_eq!(outcome, SpinOutcome::Started { rotation_angle: 1368.0 });
        assert_eq!(session.phase(), SpinPhase::Spinning);
        assert_eq!(session.rotation_angle(), 1368.0);
        assert!(session.draw_result().is_none());
        assert!(session.revealed_code().is_none());

        assert!(session.complete_spin());
        assert_eq!(session.phase(), SpinPhase::Revealed);
        assert_eq!(session.draw_result().unwrap().reward_code, "b");
        assert_eq!(session.revealed_code().as_deref(), Some("B"));
        assert!(!session.complete_spin());
    }

    #[test]
    fn test_spin_before_ready_is_ignored() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = SpinSession::default();
        let mut rng = ScriptedSource::new(&[1]);

        assert_eq!(session.start_spin(&engine, date(), &mut rng), SpinOutcome::NotReady);
        assert_eq!(session.phase(), SpinPhase::Idle);
        assert!(rng.requested.is_empty());
    }

    #[test]
    fn test_respin_after_reveal_draws_nothing() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = ready_session(RecoveryPolicy::Fallback);

        session.start_spin(&engine, date(), &mut ScriptedSource::new(&[25]));
        session.complete_spin();
        let before = (session.rotation_angle(), session.draw_result().cloned());

        let mut rng = ScriptedSource::new(&[49]);
        assert_eq!(session.start_spin(&engine, date(), &mut rng), SpinOutcome::AlreadySpun);
        assert!(rng.requested.is_empty());
        assert_eq!(before, (session.rotation_angle(), session.draw_result().cloned()));
        assert_eq!(session.phase(), SpinPhase::Revealed);
    }

    #[test]
    fn test_gap_redraws_with_equal_odds() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = ready_session(RecoveryPolicy::Fallback);
        // 3 lands in the gap, then index 3 picks "d"
        let mut rng = ScriptedSource::new(&[3, 3]);

        session.start_spin(&engine, gap_date(), &mut rng);
        session.complete_spin();
        assert_eq!(rng.requested, vec![(1, 6), (0, 4)]);

        let result = session.draw_result().unwrap();
        assert_eq!(result.reward_code, "d");
        assert_eq!(result.source, DrawSource::Fallback);
        assert_eq!(session.rotation_angle(), 1440.0 - 3.0 * 72.0);
    }

    #[test]
    fn test_gap_kept_when_policy_reveals_unmatched() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = ready_session(RecoveryPolicy::RevealUnmatched);

        let mut rng = ScriptedSource::new(&[4]);
        let outcome = session.start_spin(&engine, gap_date(), &mut rng);
        assert_eq!(
            outcome,
            SpinOutcome::Started {
                rotation_angle: WheelGeometry::default().angle_for_index(UNMATCHED_SEGMENT, &catalog)
            }
        );
        // no equal-odds redraw under this policy
        assert_eq!(rng.requested, vec![(1, 6)]);

        session.complete_spin();
        let result = session.draw_result().unwrap();
        assert!(result.is_unresolved());
        assert_eq!(result.raw_random_number, 4);
        assert!(session.revealed_code().is_none());
    }

    fn mismatched_fixture() -> (Catalog, RuleTable) {
        let (catalog, _) = fixture();
        let rules = [(date(), DayRuleSet::new(vec![RewardRange::new(1, 10, "zz")]))]
            .into_iter()
            .collect();
        (catalog, rules)
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "rules and catalog disagree")]
    fn test_code_missing_from_catalog_fails_fast_in_debug() {
        let (catalog, rules) = mismatched_fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = ready_session(RecoveryPolicy::Fallback);
        session.start_spin(&engine, date(), &mut ScriptedSource::new(&[5]));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_code_missing_from_catalog_lands_on_first_segment_in_release() {
        let (catalog, rules) = mismatched_fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let mut session = ready_session(RecoveryPolicy::Fallback);
        let outcome = session.start_spin(&engine, date(), &mut ScriptedSource::new(&[5]));
        assert_eq!(outcome, SpinOutcome::Started { rotation_angle: 1440.0 });
    }

    #[test]
    fn test_double_spin_before_timer_records_one_draw() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let scheduler = ManualScheduler::default();
        let wheel = WheelSession::new(
            ready_session(RecoveryPolicy::Fallback),
            Duration::from_millis(SPIN_DURATION_MS),
        );
        let mut rng = ScriptedSource::new(&[25, 43]);

        let first = wheel.spin(&engine, date(), &mut rng, &scheduler);
        let second = wheel.spin(&engine, date(), &mut rng, &scheduler);
        assert!(matches!(first, SpinOutcome::Started { .. }));
        assert_eq!(second, SpinOutcome::AlreadySpun);
        assert_eq!(rng.requested.len(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(
            scheduler.tasks.lock().unwrap()[0].0,
            Duration::from_millis(3000)
        );

        assert_eq!(wheel.with(|s| s.phase()), SpinPhase::Spinning);
        scheduler.fire_all();

        let session = wheel.snapshot();
        assert_eq!(session.phase(), SpinPhase::Revealed);
        assert_eq!(session.draw_result().unwrap().reward_code, "a");
    }

    #[test]
    fn test_gate_activates_session() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let scheduler = ManualScheduler::default();
        let gate = ReadinessSignal::new();
        let wheel = WheelSession::new(SpinSession::default(), Duration::from_millis(10));
        wheel.attach_gate(&gate);

        let mut rng = ScriptedSource::new(&[1]);
        assert_eq!(wheel.spin(&engine, date(), &mut rng, &scheduler), SpinOutcome::NotReady);

        gate.signal();
        assert!(wheel.with(|s| s.is_ready()));
        assert!(matches!(
            wheel.spin(&engine, date(), &mut rng, &scheduler),
            SpinOutcome::Started { .. }
        ));
    }

    #[test]
    fn test_reveal_survives_poisoned_lock() {
        let (catalog, rules) = fixture();
        let engine = DrawEngine::new(&catalog, &rules);
        let scheduler = ManualScheduler::default();
        let wheel = WheelSession::new(ready_session(RecoveryPolicy::Fallback), Duration::ZERO);
        wheel.spin(&engine, date(), &mut ScriptedSource::new(&[48]), &scheduler);

        let inner = wheel.inner.clone();
        let _ = std::thread::spawn(move || {
            let _guard = inner.lock().unwrap();
            panic!("poison the session lock");
        })
        .join();

        scheduler.fire_all();
        assert_eq!(wheel.with(|s| s.phase()), SpinPhase::Revealed);
    }
}
