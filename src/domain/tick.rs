//! Price ticks and price-series validation.

use crate::domain::error::PolicysimError;
use chrono::NaiveDate;

/// One timestamped close price, the unit of simulation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub date: NaiveDate,
    pub price: f64,
}

impl Tick {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Tick { date, price }
    }
}

/// Reject sequences the simulation loop cannot run over.
///
/// Checks: non-empty, every price finite and > 0, dates strictly increasing.
pub fn validate_prices(prices: &[Tick]) -> Result<(), PolicysimError> {
    if prices.is_empty() {
        return Err(PolicysimError::invalid_input("price sequence is empty"));
    }

    for (i, tick) in prices.iter().enumerate() {
        if !tick.price.is_finite() || tick.price <= 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "non-positive price {} at {} (index {})",
                tick.price, tick.date, i
            )));
        }
        if i > 0 && tick.date <= prices[i - 1].date {
            return Err(PolicysimError::invalid_input(format!(
                "dates not strictly increasing at index {}: {} follows {}",
                i,
                tick.date,
                prices[i - 1].date
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn valid_sequence_passes() {
        let prices = vec![Tick::new(day(1), 100.0), Tick::new(day(2), 101.5)];
        assert!(validate_prices(&prices).is_ok());
    }

    #[test]
    fn empty_sequence_fails() {
        let err = validate_prices(&[]).unwrap_err();
        assert!(matches!(err, PolicysimError::InvalidInput { .. }));
    }

    #[test]
    fn zero_price_fails() {
        let prices = vec![Tick::new(day(1), 100.0), Tick::new(day(2), 0.0)];
        let err = validate_prices(&prices).unwrap_err();
        assert!(
            matches!(err, PolicysimError::InvalidInput { reason } if reason.contains("index 1"))
        );
    }

    #[test]
    fn negative_price_fails() {
        let prices = vec![Tick::new(day(1), -3.0)];
        assert!(validate_prices(&prices).is_err());
    }

    #[test]
    fn nan_price_fails() {
        let prices = vec![Tick::new(day(1), f64::NAN)];
        assert!(validate_prices(&prices).is_err());
    }

    #[test]
    fn duplicate_date_fails() {
        let prices = vec![Tick::new(day(1), 100.0), Tick::new(day(1), 101.0)];
        assert!(validate_prices(&prices).is_err());
    }

    #[test]
    fn out_of_order_dates_fail() {
        let prices = vec![Tick::new(day(3), 100.0), Tick::new(day(2), 101.0)];
        assert!(validate_prices(&prices).is_err());
    }
}
