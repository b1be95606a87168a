//! Price data access port.

use crate::domain::error::PolicysimError;
use crate::domain::tick::Tick;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `ticker` within `[start_date, end_date]`, ascending by
    /// date.
    fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Tick>, PolicysimError>;
}
