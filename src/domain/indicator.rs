//! Simple moving average over tick closes.
//!
//! SMA[i] = mean(close[i-n+1..=i]), computed for the whole series in one
//! O(n) sliding-window pass. Warmup: the first (n-1) ticks are undefined.

use crate::domain::tick::Tick;

/// One value per tick; `None` during warmup.
pub type IndicatorSeries = Vec<Option<f64>>;

pub fn calculate_sma(prices: &[Tick], period: usize) -> IndicatorSeries {
    if period == 0 {
        return vec![None; prices.len()];
    }

    let mut values = Vec::with_capacity(prices.len());
    let mut window_sum = 0.0;

    for (i, tick) in prices.iter().enumerate() {
        window_sum += tick.price;
        if i >= period {
            window_sum -= prices[i - period].price;
        }

        let valid = i + 1 >= period;
        values.push(valid.then(|| window_sum / period as f64));
    }

    values
}
