mod caps;
mod config;
mod generators;
mod state;
mod trade;

pub use caps::{
    enforce_portfolio_caps, CappedExposure, ExposureRequest, ExposureTotals, PortfolioCaps,
};
pub use config::SimConfig;
pub use generators::{TradeGenerator, TradeTemplate};
pub use state::{AssetState, DEFAULT_INITIAL_CAPITAL};
pub use trade::{LastResult, Trade, TradeMatrix};
