use serde::{Deserialize, Serialize};

/// Lock tier for staked tokens, determining multiplier, bonus APY, and vote weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockTier {
    /// No lock period: 1.0x multiplier, 0% bonus, 1.0x vote weight.
    NoLock,
    /// 3-month lock: 1.2x multiplier, 1% bonus, 1.5x vote weight.
    ThreeMonth,
    /// 6-month lock: 1.5x multiplier, 2% bonus, 2.0x vote weight.
    SixMonth,
    /// 1-year lock: 2.0x multiplier, 3% bonus, 3.0x vote weight.
    OneYear,
    /// Permanent lock (cannot unstake): 3.0x multiplier, 5% bonus, 5.0x vote weight.
    Permanent,
}

/// Number of epochs per year, assuming 1 epoch = 1 day.
pub const EPOCHS_PER_YEAR: u64 = 365;

/// Number of epochs in each lock duration.
pub const THREE_MONTHS_EPOCHS: u64 = 90;
pub const SIX_MONTHS_EPOCHS: u64 = 180;
pub const ONE_YEAR_EPOCHS: u64 = 365;

impl LockTier {
    /// The reward multiplier as a fixed-point value (x1000 for precision).
    /// e.g., 1.0x = 1000, 1.2x = 1200, etc.
    pub fn multiplier_bps(&self) -> u64 {
        match self {
            LockTier::NoLock => 1000,
            LockTier::ThreeMonth => 1200,
            LockTier::SixMonth => 1500,
            LockTier::OneYear => 2000,
            LockTier::Permanent => 3000,
        }
    }

    /// The reward multiplier as f64.
    pub fn multiplier(&self) -> f64 {
        self.multiplier_bps() as f64 / 1000.0
    }

    /// Bonus APY in basis points (100 bps = 1%).
    pub fn bonus_apy_bps(&self) -> u64 {
        match self {
            LockTier::NoLock => 0,
            LockTier::ThreeMonth => 100,
            LockTier::SixMonth => 200,
            LockTier::OneYear => 300,
            LockTier::Permanent => 500,
        }
    }

    /// Bonus APY as f64 (e.g., 0.01 for 1%).
    pub fn bonus_apy(&self) -> f64 {
        self.bonus_apy_bps() as f64 / 10_000.0
    }

    /// Vote weight multiplier as fixed-point (x1000).
    /// e.g., 1.0x = 1000, 1.5x = 1500, etc.
    pub fn vote_weight_bps(&self) -> u64 {
        match self {
            LockTier::NoLock => 1000,
            LockTier::ThreeMonth => 1500,
            LockTier::SixMonth => 2000,
            LockTier::OneYear => 3000,
            LockTier::Permanent => 5000,
        }
    }

    /// Vote weight as f64.
    pub fn vote_weight(&self) -> f64 {
        self.vote_weight_bps() as f64 / 1000.0
    }

    /// Lock duration in epochs. Returns None for Permanent (never unlocks).
    pub fn lock_duration_epochs(&self) -> Option<u64> {
        match self {
            LockTier::NoLock => Some(0),
            LockTier::ThreeMonth => Some(THREE_MONTHS_EPOCHS),
            LockTier::SixMonth => Some(SIX_MONTHS_EPOCHS),
            LockTier::OneYear => Some(ONE_YEAR_EPOCHS),
            LockTier::Permanent => None,
        }
    }
}
