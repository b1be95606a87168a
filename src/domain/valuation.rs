//! Portfolio value series, one point per input tick.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

pub type ValueSeries = Vec<ValuePoint>;

/// Strip dates, keeping tick order.
pub fn values_only(series: &[ValuePoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}
