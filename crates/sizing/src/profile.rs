use serde::{Deserialize, Serialize};

use crate::cppi::{CppiFreeze, DEFAULT_FLOOR_RATIO, DEFAULT_FREEZE_THRESHOLD};
use crate::drawdown::{default_tiers, DrawdownTier, DrawdownTiers};
use crate::error::SizingError;
use crate::kelly::{KellyModule, BASIC_KELLY_CAP, DEFAULT_KELLY_CAP};
use crate::module::{ModuleMetadata, RiskModule};
use crate::sizer::PositionSizer;
use crate::streak::{StreakDecay, DEFAULT_MAX_STEPS, DEFAULT_STEP_DOWN, DEFAULT_STREAK_FLOOR};
use crate::volatility::{VolatilityTarget, DEFAULT_CAP_MULTIPLIER, DEFAULT_TARGET_VOL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleSpec {
    Kelly {
        #[serde(default = "default_kelly_cap", alias = "fCap")]
        f_cap: f64,
    },
    DrawdownTiers {
        #[serde(default = "default_tiers")]
        tiers: Vec<DrawdownTier>,
    },
    CppiFreeze {
        #[serde(default = "default_floor_ratio")]
        floor_ratio: f64,
        #[serde(default = "default_freeze_threshold")]
        freeze_threshold: f64,
    },
    StreakDecay {
        #[serde(default = "default_step_down")]
        step_down: f64,
        #[serde(default = "default_max_steps")]
        max_steps: u32,
        #[serde(default = "default_streak_floor")]
        floor: f64,
    },
    VolatilityTarget {
        #[serde(default = "default_target_vol")]
        target_vol: f64,
        #[serde(default = "default_cap_multiplier")]
        cap_multiplier: f64,
    },
}

impl ModuleSpec {
    pub fn build(&self) -> Result<Box<dyn RiskModule>, SizingError> {
        let module: Box<dyn RiskModule> = match self {
            Self::Kelly { f_cap } => Box::new(KellyModule::new(*f_cap)?),
            Self::DrawdownTiers { tiers } => Box::new(DrawdownTiers::new(tiers.clone())?),
            Self::CppiFreeze {
                floor_ratio,
                freeze_threshold,
            } => Box::new(CppiFreeze::new(*floor_ratio, *freeze_threshold)?),
            Self::StreakDecay {
                step_down,
                max_steps,
                floor,
            } => Box::new(StreakDecay::new(*step_down, *max_steps, *floor)?),
            Self::VolatilityTarget {
                target_vol,
                cap_multiplier,
            } => Box::new(VolatilityTarget::new(*target_vol, *cap_multiplier)?),
        };
        Ok(module)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
    pub module: ModuleSpec,
}

impl ModuleEntry {
    pub fn new(priority: i32, module: ModuleSpec) -> Self {
        Self {
            enabled: true,
            priority,
            module,
        }
    }
}

/// Serializable recipe for a `PositionSizer`. Resolved into concrete modules
/// once, before a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingProfile {
    pub id: String,
    pub name: String,
    pub version: String,
    pub modules: Vec<ModuleEntry>,
}

impl SizingProfile {
    /// Single Kelly module held to a 3% per-trade budget.
    pub fn basic() -> Self {
        Self {
            id: "basic".to_string(),
            name: "Basic Kelly".to_string(),
            version: "1.0.0".to_string(),
            modules: vec![ModuleEntry::new(
                0,
                ModuleSpec::Kelly {
                    f_cap: BASIC_KELLY_CAP,
                },
            )],
        }
    }

    pub fn kelly(f_cap: f64) -> Self {
        Self {
            id: "kelly".to_string(),
            name: "Capped Kelly".to_string(),
            version: "1.0.0".to_string(),
            modules: vec![ModuleEntry::new(0, ModuleSpec::Kelly { f_cap })],
        }
    }

    /// Drops disabled entries, orders the rest by ascending priority (ties
    /// keep their listed order) and instantiates them.
    pub fn build(&self) -> Result<PositionSizer, SizingError> {
        let mut entries: Vec<&ModuleEntry> =
            self.modules.iter().filter(|entry| entry.enabled).collect();
        entries.sort_by_key(|entry| entry.priority);

        let modules = entries
            .into_iter()
            .map(|entry| entry.module.build())
            .collect::<Result<Vec<_>, _>>()?;

        let metadata = ModuleMetadata {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            ..ModuleMetadata::position_sizer()
        };
        Ok(PositionSizer::with_metadata(metadata, modules))
    }
}

impl Default for SizingProfile {
    fn default() -> Self {
        Self::kelly(DEFAULT_KELLY_CAP)
    }
}

fn enabled_by_default() -> bool {
    true
}

fn default_kelly_cap() -> f64 {
    DEFAULT_KELLY_CAP
}

fn default_floor_ratio() -> f64 {
    DEFAULT_FLOOR_RATIO
}

fn default_freeze_threshold() -> f64 {
    DEFAULT_FREEZE_THRESHOLD
}

fn default_step_down() -> f64 {
    DEFAULT_STEP_DOWN
}

fn default_max_steps() -> u32 {
    DEFAULT_MAX_STEPS
}

fn default_streak_floor() -> f64 {
    DEFAULT_STREAK_FLOOR
}

fn default_target_vol() -> f64 {
    DEFAULT_TARGET_VOL
}

fn default_cap_multiplier() -> f64 {
    DEFAULT_CAP_MULTIPLIER
}
