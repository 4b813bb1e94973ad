//! Activation pricing
//!
//! Quote computation is pure integer arithmetic over on-chain figures. All
//! outputs are advisory; the server-side price check is authoritative.

use super::{
    ActivationMechanism, CapabilityType, ChainStats, CurrencyKind, PricingQuote, QuoteBasis,
};

/// Phase-1 base cost in capability-token base units
pub const PHASE1_BASE_COST: u64 = 1_000;
/// Phase-1 price reduction per full 10-percentage-point burn increment
pub const PHASE1_STEP: u64 = 100;
/// Phase-1 price floor
pub const PHASE1_FLOOR: u64 = 500;

/// Burn ratio (in percent) at which the protocol enters phase 2
pub const PHASE2_THRESHOLD_PCT: u64 = 90;

impl CapabilityType {
    /// Phase-2 base cost per capability type, in native base units
    pub fn phase2_base_cost(&self) -> u64 {
        match self {
            Self::Light => 500,
            Self::Full => 2_000,
            Self::Super => 5_000,
        }
    }
}

/// Determine the protocol phase from the cumulative burn ratio
pub fn activation_phase(burned: u64, supply: u64) -> u8 {
    if supply > 0 && (burned as u128) * 100 >= (supply as u128) * (PHASE2_THRESHOLD_PCT as u128) {
        2
    } else {
        1
    }
}

/// Phase-1 cost: decreases by a fixed step per 10-percentage-point burn
/// increment, down to the floor
pub fn phase1_cost(burned: u64, supply: u64) -> u64 {
    let pct = if supply == 0 {
        0
    } else {
        ((burned as u128) * 100 / (supply as u128)) as u64
    };
    let steps = pct / 10;

    PHASE1_BASE_COST
        .saturating_sub(steps.saturating_mul(PHASE1_STEP))
        .max(PHASE1_FLOOR)
}

/// Five-tier network-size multiplier, in percent
fn network_size_multiplier_pct(active_nodes: u64) -> u64 {
    match active_nodes {
        0..=999 => 100,
        1_000..=4_999 => 125,
        5_000..=9_999 => 150,
        10_000..=49_999 => 200,
        _ => 300,
    }
}

/// Phase-2 cost: per-capability base cost scaled by the network-size tier
pub fn phase2_cost(capability: CapabilityType, active_nodes: u64) -> u64 {
    capability.phase2_base_cost() * network_size_multiplier_pct(active_nodes) / 100
}

/// Compute an advisory quote for activating `capability` given the current
/// chain figures
pub fn compute_quote(capability: CapabilityType, stats: &ChainStats) -> PricingQuote {
    let phase = activation_phase(stats.burned, stats.supply);

    if phase == 1 {
        PricingQuote {
            cost: phase1_cost(stats.burned, stats.supply),
            currency: CurrencyKind::Token,
            phase,
            mechanism: ActivationMechanism::Burn,
            computed_from: QuoteBasis::BurnRatio {
                burned: stats.burned,
                supply: stats.supply,
            },
        }
    } else {
        PricingQuote {
            cost: phase2_cost(capability, stats.active_nodes),
            currency: CurrencyKind::Native,
            phase,
            mechanism: ActivationMechanism::PoolTransfer,
            computed_from: QuoteBasis::NetworkSize {
                active_nodes: stats.active_nodes,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_boundary() {
        assert_eq!(activation_phase(0, 1_000), 1);
        assert_eq!(activation_phase(899, 1_000), 1);
        // exactly 90% flips to phase 2
        assert_eq!(activation_phase(900, 1_000), 2);
        assert_eq!(activation_phase(1_000, 1_000), 2);
        // zero supply never reaches phase 2
        assert_eq!(activation_phase(0, 0), 1);
    }

    #[test]
    fn test_phase1_cost_at_zero_burn_is_base() {
        assert_eq!(phase1_cost(0, 1_000_000), PHASE1_BASE_COST);
        assert_eq!(phase1_cost(0, 0), PHASE1_BASE_COST);
    }

    #[test]
    fn test_phase1_cost_steps_down() {
        let supply = 1_000;
        assert_eq!(phase1_cost(99, supply), PHASE1_BASE_COST);
        assert_eq!(phase1_cost(100, supply), PHASE1_BASE_COST - PHASE1_STEP);
        assert_eq!(phase1_cost(250, supply), PHASE1_BASE_COST - 2 * PHASE1_STEP);
        assert_eq!(phase1_cost(400, supply), PHASE1_BASE_COST - 4 * PHASE1_STEP);
    }

    #[test]
    fn test_phase1_cost_never_drops_below_floor() {
        let supply = 1_000;
        assert_eq!(phase1_cost(500, supply), PHASE1_FLOOR);
        assert_eq!(phase1_cost(890, supply), PHASE1_FLOOR);
        assert_eq!(phase1_cost(supply, supply), PHASE1_FLOOR);
    }

    #[test]
    fn test_phase2_tiers() {
        assert_eq!(phase2_cost(CapabilityType::Light, 0), 500);
        assert_eq!(phase2_cost(CapabilityType::Light, 999), 500);
        assert_eq!(phase2_cost(CapabilityType::Light, 1_000), 625);
        assert_eq!(phase2_cost(CapabilityType::Full, 5_000), 3_000);
        assert_eq!(phase2_cost(CapabilityType::Full, 10_000), 4_000);
        assert_eq!(phase2_cost(CapabilityType::Super, 50_000), 15_000);
    }

    #[test]
    fn test_quote_mechanism_tracks_phase() {
        let phase1 = compute_quote(
            CapabilityType::Full,
            &ChainStats {
                burned: 0,
                supply: 1_000,
                active_nodes: 10,
            },
        );
        assert_eq!(phase1.phase, 1);
        assert_eq!(phase1.mechanism, ActivationMechanism::Burn);
        assert_eq!(phase1.currency, CurrencyKind::Token);
        assert_eq!(phase1.cost, PHASE1_BASE_COST);

        let phase2 = compute_quote(
            CapabilityType::Full,
            &ChainStats {
                burned: 950,
                supply: 1_000,
                active_nodes: 10,
            },
        );
        assert_eq!(phase2.phase, 2);
        assert_eq!(phase2.mechanism, ActivationMechanism::PoolTransfer);
        assert_eq!(phase2.currency, CurrencyKind::Native);
        assert_eq!(phase2.cost, 2_000);
    }
}
