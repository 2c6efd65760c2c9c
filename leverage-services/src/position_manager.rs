//! Risk-based position sizing and trailing stops
//!
//! Keeps per-symbol sizing results and trailing stop state. Stops are
//! long-side: they trail below the highest price seen since activation.

use leverage_core::{GatewayError, GatewayResult, PositionSizing, TrailingStopConfig};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

/// Default cap on leverage used when sizing a position
pub const DEFAULT_MAX_LEVERAGE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Default cap on position size as a fraction of the account (20%)
pub const DEFAULT_MAX_POSITION_PERCENT: Decimal = Decimal::from_parts(2, 0, 0, false, 1);

/// Inputs for [`PositionManager::calculate_position_size`]
#[derive(Debug, Clone, PartialEq)]
pub struct SizingParams {
    pub account_value: Decimal,
    /// Fraction of the account to risk (0.01 = 1%)
    pub risk_percent: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub max_leverage: Decimal,
    pub max_position_percent: Decimal,
}

impl SizingParams {
    pub fn new(
        account_value: Decimal,
        risk_percent: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
    ) -> Self {
        Self {
            account_value,
            risk_percent,
            entry_price,
            stop_loss,
            max_leverage: DEFAULT_MAX_LEVERAGE,
            max_position_percent: DEFAULT_MAX_POSITION_PERCENT,
        }
    }

    fn validate(&self) -> GatewayResult<()> {
        if self.account_value <= Decimal::ZERO {
            return Err(GatewayError::validation("accountValue must be positive"));
        }
        if self.risk_percent <= Decimal::ZERO || self.risk_percent > Decimal::ONE {
            return Err(GatewayError::validation("riskPercent must be in (0, 1]"));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(GatewayError::validation("entryPrice must be positive"));
        }
        if self.stop_loss == self.entry_price {
            return Err(GatewayError::validation("stopLoss must differ from entryPrice"));
        }
        if self.max_leverage <= Decimal::ZERO {
            return Err(GatewayError::validation("maxLeverage must be positive"));
        }
        if self.max_position_percent <= Decimal::ZERO || self.max_position_percent > Decimal::ONE {
            return Err(GatewayError::validation("maxPositionPercent must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Per-symbol sizing and trailing stop state
#[derive(Debug, Default)]
pub struct PositionManager {
    trailing_stops: RwLock<HashMap<String, TrailingStopConfig>>,
    position_sizes: RwLock<HashMap<String, PositionSizing>>,
}

impl PositionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size a position so that hitting the stop loses `risk_percent` of the
    /// account, capped by `max_leverage` and `max_position_percent`
    ///
    /// The result is stored for `symbol` and returned.
    pub fn calculate_position_size(
        &self,
        symbol: &str,
        params: &SizingParams,
    ) -> GatewayResult<PositionSizing> {
        params.validate()?;

        let out_of_range = || GatewayError::validation("position size out of range");

        let risk_amount = params
            .account_value
            .checked_mul(params.risk_percent)
            .ok_or_else(out_of_range)?;
        let price_distance = params
            .entry_price
            .checked_sub(params.stop_loss)
            .ok_or_else(out_of_range)?
            .abs();
        let base_position_size = risk_amount
            .checked_div(price_distance)
            .ok_or_else(out_of_range)?;

        let position_budget = params
            .account_value
            .checked_mul(params.max_position_percent)
            .ok_or_else(out_of_range)?;
        let required_leverage = base_position_size
            .checked_mul(params.entry_price)
            .and_then(|notional| notional.checked_div(position_budget))
            .ok_or_else(out_of_range)?;
        let leverage = required_leverage.min(params.max_leverage);

        let max_position_size = position_budget
            .checked_mul(leverage)
            .ok_or_else(out_of_range)?;
        let position_size = base_position_size
            .checked_mul(leverage)
            .ok_or_else(out_of_range)?
            .min(max_position_size);

        let sizing = PositionSizing {
            risk_percent: params.risk_percent,
            account_value: params.account_value,
            max_position_size,
            position_size,
            leverage,
        };

        debug!(
            "Sized {}: {} @ {}x (max {})",
            symbol, sizing.position_size, sizing.leverage, sizing.max_position_size
        );

        self.position_sizes
            .write()
            .insert(symbol.to_string(), sizing.clone());
        Ok(sizing)
    }

    /// Install (or replace) the trailing stop for `symbol`
    ///
    /// The stop is active immediately unless an activation price above the
    /// current price is given.
    pub fn set_trailing_stop(
        &self,
        symbol: &str,
        trail_percent: Decimal,
        current_price: Decimal,
        activation_price: Option<Decimal>,
    ) -> GatewayResult<TrailingStopConfig> {
        if trail_percent <= Decimal::ZERO || trail_percent >= Decimal::ONE {
            return Err(GatewayError::validation("trailPercent must be in (0, 1)"));
        }
        if current_price <= Decimal::ZERO {
            return Err(GatewayError::validation(format!(
                "No usable price for {}",
                symbol
            )));
        }

        let is_active = activation_price.map_or(true, |activation| current_price >= activation);

        let stop = TrailingStopConfig {
            activation_price,
            trail_percent,
            current_stop: current_price * (Decimal::ONE - trail_percent),
            high_water_mark: current_price,
            is_active,
        };

        info!(
            "Trailing stop set for {}: stop {} (active: {})",
            symbol, stop.current_stop, stop.is_active
        );

        self.trailing_stops
            .write()
            .insert(symbol.to_string(), stop.clone());
        Ok(stop)
    }

    /// Feed a new price into the trailing stop for `symbol`
    ///
    /// Returns the stop if the price is at or below it. Inactive stops never
    /// fire.
    pub fn update_trailing_stop(
        &self,
        symbol: &str,
        current_price: Decimal,
    ) -> Option<TrailingStopConfig> {
        let mut stops = self.trailing_stops.write();
        let stop = stops.get_mut(symbol)?;

        if !stop.is_active {
            if let Some(activation) = stop.activation_price {
                if current_price >= activation {
                    stop.is_active = true;
                    stop.high_water_mark = current_price;
                    stop.current_stop = current_price * (Decimal::ONE - stop.trail_percent);
                    info!("Trailing stop activated for {} at {}", symbol, current_price);
                }
            }
        }

        if !stop.is_active {
            return None;
        }

        if current_price > stop.high_water_mark {
            stop.high_water_mark = current_price;
            stop.current_stop = current_price * (Decimal::ONE - stop.trail_percent);
            debug!("Trailing stop for {} raised to {}", symbol, stop.current_stop);
        }

        if current_price <= stop.current_stop {
            return Some(stop.clone());
        }

        None
    }

    pub fn remove_trailing_stop(&self, symbol: &str) -> Option<TrailingStopConfig> {
        self.trailing_stops.write().remove(symbol)
    }

    /// Remove the trailing stop for `symbol` only if it still equals `expected`
    ///
    /// Returns `false` when the stop was replaced or removed in the meantime.
    pub fn remove_trailing_stop_if_unchanged(
        &self,
        symbol: &str,
        expected: &TrailingStopConfig,
    ) -> bool {
        let mut stops = self.trailing_stops.write();
        match stops.get(symbol) {
            Some(current) if current == expected => {
                stops.remove(symbol);
                true
            }
            _ => false,
        }
    }

    pub fn get_trailing_stop(&self, symbol: &str) -> Option<TrailingStopConfig> {
        self.trailing_stops.read().get(symbol).cloned()
    }

    pub fn get_position_size(&self, symbol: &str) -> Option<PositionSizing> {
        self.position_sizes.read().get(symbol).cloned()
    }

    /// Symbols that currently have a trailing stop
    pub fn trailing_symbols(&self) -> Vec<String> {
        self.trailing_stops.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sizing_below_leverage_cap() {
        let manager = PositionManager::new();
        let params = SizingParams::new(dec!(100000), dec!(0.01), dec!(2000), dec!(1900));

        let sizing = manager.calculate_position_size("ETH-USD", &params).unwrap();

        // risk 1000 over a 100 distance = 10 units, needs 1x
        assert_eq!(sizing.leverage, dec!(1));
        assert_eq!(sizing.position_size, dec!(10));
        assert_eq!(sizing.max_position_size, dec!(20000));
        assert_eq!(manager.get_position_size("ETH-USD"), Some(sizing));
    }

    #[test]
    fn test_sizing_capped_at_max_leverage() {
        let manager = PositionManager::new();
        let params = SizingParams::new(dec!(100000), dec!(0.1), dec!(2000), dec!(1900));

        let sizing = manager.calculate_position_size("ETH-USD", &params).unwrap();

        // 100 units would need 10x; capped at 5x
        assert_eq!(sizing.leverage, dec!(5));
        assert_eq!(sizing.position_size, dec!(500));
        assert_eq!(sizing.max_position_size, dec!(100000));
    }

    #[test]
    fn test_sizing_short_side_stop_above_entry() {
        let manager = PositionManager::new();
        let params = SizingParams::new(dec!(100000), dec!(0.01), dec!(2000), dec!(2100));

        let sizing = manager.calculate_position_size("ETH-USD", &params).unwrap();
        assert_eq!(sizing.position_size, dec!(10));
    }

    #[test]
    fn test_sizing_rejects_stop_at_entry() {
        let manager = PositionManager::new();
        let params = SizingParams::new(dec!(100000), dec!(0.01), dec!(2000), dec!(2000));

        let err = manager.calculate_position_size("ETH-USD", &params).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(manager.get_position_size("ETH-USD").is_none());
    }

    #[test]
    fn test_sizing_overflow_is_rejected() {
        let manager = PositionManager::new();
        let params = SizingParams::new(
            dec!(100000000000000000000),
            dec!(1),
            dec!(2000),
            dec!(1999.999999),
        );

        let err = manager.calculate_position_size("ETH-USD", &params).unwrap_err();
        assert_eq!(err, GatewayError::validation("position size out of range"));
        assert!(manager.get_position_size("ETH-USD").is_none());
    }

    #[test]
    fn test_sizing_rejects_non_positive_account() {
        let manager = PositionManager::new();
        let params = SizingParams::new(dec!(0), dec!(0.01), dec!(2000), dec!(1900));
        assert!(manager.calculate_position_size("ETH-USD", &params).is_err());
    }

    #[test]
    fn test_trailing_stop_without_activation_is_active() {
        let manager = PositionManager::new();
        let stop = manager
            .set_trailing_stop("BTC", dec!(0.02), dec!(2000), None)
            .unwrap();

        assert!(stop.is_active);
        assert_eq!(stop.current_stop, dec!(1960));
        assert_eq!(stop.high_water_mark, dec!(2000));
    }

    #[test]
    fn test_trailing_stop_activation_and_ratchet() {
        let manager = PositionManager::new();
        let stop = manager
            .set_trailing_stop("BTC", dec!(0.02), dec!(2000), Some(dec!(2100)))
            .unwrap();
        assert!(!stop.is_active);

        // Below activation: dormant, even under the initial stop
        assert!(manager.update_trailing_stop("BTC", dec!(1900)).is_none());
        assert!(!manager.get_trailing_stop("BTC").unwrap().is_active);

        // Activation re-bases the stop
        assert!(manager.update_trailing_stop("BTC", dec!(2100)).is_none());
        let stop = manager.get_trailing_stop("BTC").unwrap();
        assert!(stop.is_active);
        assert_eq!(stop.high_water_mark, dec!(2100));
        assert_eq!(stop.current_stop, dec!(2058));

        // New high ratchets upward
        assert!(manager.update_trailing_stop("BTC", dec!(2200)).is_none());
        assert_eq!(manager.get_trailing_stop("BTC").unwrap().current_stop, dec!(2156));

        // Pullback above the stop does not lower it
        assert!(manager.update_trailing_stop("BTC", dec!(2160)).is_none());
        assert_eq!(manager.get_trailing_stop("BTC").unwrap().current_stop, dec!(2156));

        // Exactly at the stop fires
        let hit = manager.update_trailing_stop("BTC", dec!(2156)).unwrap();
        assert_eq!(hit.current_stop, dec!(2156));
        assert_eq!(hit.high_water_mark, dec!(2200));
    }

    #[test]
    fn test_conditional_remove_keeps_replaced_stop() {
        let manager = PositionManager::new();
        let old = manager
            .set_trailing_stop("BTC", dec!(0.02), dec!(2000), None)
            .unwrap();
        let new = manager
            .set_trailing_stop("BTC", dec!(0.05), dec!(2100), None)
            .unwrap();

        assert!(!manager.remove_trailing_stop_if_unchanged("BTC", &old));
        assert_eq!(manager.get_trailing_stop("BTC"), Some(new.clone()));

        assert!(manager.remove_trailing_stop_if_unchanged("BTC", &new));
        assert!(manager.get_trailing_stop("BTC").is_none());
        assert!(!manager.remove_trailing_stop_if_unchanged("BTC", &new));
    }

    #[test]
    fn test_update_unknown_symbol() {
        let manager = PositionManager::new();
        assert!(manager.update_trailing_stop("NOPE", dec!(1)).is_none());
    }

    #[test]
    fn test_set_trailing_stop_validation() {
        let manager = PositionManager::new();
        assert!(manager.set_trailing_stop("BTC", dec!(0), dec!(100), None).is_err());
        assert!(manager.set_trailing_stop("BTC", dec!(1), dec!(100), None).is_err());
        assert!(manager.set_trailing_stop("BTC", dec!(0.05), dec!(0), None).is_err());
        assert!(manager.trailing_symbols().is_empty());
    }

    #[test]
    fn test_remove_trailing_stop() {
        let manager = PositionManager::new();
        manager
            .set_trailing_stop("BTC", dec!(0.05), dec!(100), None)
            .unwrap();
        assert_eq!(manager.trailing_symbols(), vec!["BTC".to_string()]);

        assert!(manager.remove_trailing_stop("BTC").is_some());
        assert!(manager.remove_trailing_stop("BTC").is_none());
        assert!(manager.get_trailing_stop("BTC").is_none());
    }
}
