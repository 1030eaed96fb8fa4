//! Date-scoped weighted prize draw and the spin-the-wheel session that
//! reveals it.

pub mod activation;
pub mod campaign;
pub mod catalog;
pub mod coupon;
pub mod draw;
pub mod error;
pub mod prize_rules;
pub mod shared_wheel_game;
pub mod validation;
pub mod wheel_geometry;

pub use activation::{ActivationGate, ReadinessSignal};
pub use campaign::{Campaign, CampaignClock};
pub use catalog::{Catalog, Reward};
pub use draw::{DrawEngine, DrawResult, DrawSource, RandomSource};
pub use error::{CampaignError, GeometryError};
pub use prize_rules::{DayRuleSet, RewardRange, RuleTable};
pub use shared_wheel_game::{
    RecoveryPolicy, RevealScheduler, SpinOutcome, SpinPhase, SpinSession, WheelSession,
};
pub use wheel_geometry::WheelGeometry;
