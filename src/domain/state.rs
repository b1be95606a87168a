//! Starting position and per-run policy state.
//!
//! A [`PolicyState`] is built fresh from an immutable [`StartingPosition`] at
//! the start of every run and is owned by that run alone. All position
//! changes go through the methods here so cash and shares stay conserved.

use super::error::PolicysimError;
use super::tick::Tick;
use super::trade::{Side, Trade};

/// The position a run starts from. Passed by value, never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartingPosition {
    pub shares: f64,
    pub avg_cost: f64,
    pub cash: f64,
}

impl StartingPosition {
    pub fn new(shares: f64, avg_cost: f64, cash: f64) -> Self {
        StartingPosition {
            shares,
            avg_cost,
            cash,
        }
    }

    /// Capital committed at the start: shares at cost plus cash.
    pub fn initial_investment(&self) -> f64 {
        self.shares * self.avg_cost + self.cash
    }

    pub fn validate(&self) -> Result<(), PolicysimError> {
        if !self.avg_cost.is_finite() || self.avg_cost <= 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "average cost must be positive, got {}",
                self.avg_cost
            )));
        }
        if !self.shares.is_finite() || self.shares < 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "shares must be non-negative, got {}",
                self.shares
            )));
        }
        if !self.cash.is_finite() || self.cash < 0.0 {
            return Err(PolicysimError::invalid_input(format!(
                "cash must be non-negative, got {}",
                self.cash
            )));
        }
        if self.initial_investment() <= 0.0 {
            return Err(PolicysimError::invalid_input(
                "starting position holds neither shares nor cash",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyState {
    pub cash: f64,
    pub shares_held: f64,
    pub avg_cost: f64,
    pub is_holding: bool,
    pub stop_price: Option<f64>,
    pub rebuy_price: Option<f64>,
    /// Dip buys left (DCA only).
    pub remaining_buys: u32,
    /// Reference price for the next dip (DCA only).
    pub last_buy_price: f64,
    /// Starting capital plus any externally funded purchases.
    pub contributed: f64,
}

impl PolicyState {
    pub fn from_start(start: StartingPosition) -> Self {
        PolicyState {
            cash: start.cash,
            shares_held: start.shares,
            avg_cost: start.avg_cost,
            is_holding: start.shares > 0.0,
            stop_price: None,
            rebuy_price: None,
            remaining_buys: 0,
            last_buy_price: start.avg_cost,
            contributed: start.initial_investment(),
        }
    }

    /// cash + shares_held * price
    pub fn value_at(&self, price: f64) -> f64 {
        self.cash + self.shares_held * price
    }

    /// Sell every share at the tick price. Cash receives the proceeds and
    /// shares drop to exactly zero.
    pub fn liquidate(&mut self, tick: &Tick) -> Trade {
        let shares = self.shares_held;
        let proceeds = shares * tick.price;
        self.cash += proceeds;
        self.shares_held = 0.0;
        self.is_holding = false;
        Trade {
            date: tick.date,
            price: tick.price,
            side: Side::Sell,
            shares,
            amount: proceeds,
        }
    }

    /// Convert all cash into shares at the tick price. Cash drops to exactly
    /// zero.
    pub fn invest_all(&mut self, tick: &Tick) -> Trade {
        let spent = self.cash;
        let bought = spent / tick.price;
        self.absorb_purchase(spent, bought);
        self.cash = 0.0;
        Trade {
            date: tick.date,
            price: tick.price,
            side: Side::Buy,
            shares: bought,
            amount: spent,
        }
    }

    /// Sell `quantity` shares (clamped to the holding) at the tick price.
    pub fn sell_shares(&mut self, quantity: f64, tick: &Tick) -> Trade {
        let quantity = quantity.min(self.shares_held);
        let proceeds = quantity * tick.price;
        self.cash += proceeds;
        self.shares_held -= quantity;
        if self.shares_held <= 0.0 {
            self.shares_held = 0.0;
            self.is_holding = false;
        }
        Trade {
            date: tick.date,
            price: tick.price,
            side: Side::Sell,
            shares: quantity,
            amount: proceeds,
        }
    }

    /// Spend `amount` of tracked cash (clamped to the balance) on shares.
    pub fn buy_with_cash(&mut self, amount: f64, tick: &Tick) -> Trade {
        let spent = amount.min(self.cash);
        let bought = spent / tick.price;
        self.absorb_purchase(spent, bought);
        self.cash -= spent;
        Trade {
            date: tick.date,
            price: tick.price,
            side: Side::Buy,
            shares: bought,
            amount: spent,
        }
    }

    /// Buy shares with money that does not come from the tracked cash
    /// balance. The amount is added to `contributed`.
    pub fn buy_with_external_funds(&mut self, amount: f64, tick: &Tick) -> Trade {
        let bought = amount / tick.price;
        self.absorb_purchase(amount, bought);
        self.contributed += amount;
        Trade {
            date: tick.date,
            price: tick.price,
            side: Side::Buy,
            shares: bought,
            amount,
        }
    }

    // new_avg = (avg * shares_before + spent) / (shares_before + bought)
    fn absorb_purchase(&mut self, spent: f64, bought: f64) {
        let total = self.shares_held + bought;
        if total > 0.0 {
            self.avg_cost = (self.avg_cost * self.shares_held + spent) / total;
        }
        self.shares_held = total;
        self.is_holding = total > 0.0;
    }
}
