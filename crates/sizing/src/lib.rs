pub mod cppi;
pub mod drawdown;
mod error;
pub mod kelly;
mod module;
pub mod profile;
pub mod sizer;
pub mod streak;
pub mod volatility;

pub use cppi::CppiFreeze;
pub use drawdown::{DrawdownTier, DrawdownTiers, TierAction};
pub use error::SizingError;
pub use kelly::{kelly_fraction, KellyEstimate, KellyModule, BASIC_KELLY_CAP, DEFAULT_KELLY_CAP};
pub use module::{ModuleMetadata, RiskModule, SizingInputs};
pub use profile::{ModuleEntry, ModuleSpec, SizingProfile};
pub use sizer::{ModuleFactor, PositionSizer, SizingDecision};
pub use streak::StreakDecay;
pub use volatility::VolatilityTarget;
