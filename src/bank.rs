// Virtual wallet balances.
//
// One non-negative dollar balance per user, mutated only by deposits, wager
// placement debits, cancellation refunds, and settlement payouts. Callers
// hold the shared state lock, so mutations for a user are serialized.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Bank {
    balances: HashMap<String, f64>,
}

impl Bank {
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Current balance; unknown users hold $0 and must deposit first.
    pub fn balance(&self, user_id: &str) -> f64 {
        self.balances.get(user_id).copied().unwrap_or(0.0)
    }

    /// Add funds. Returns the new balance.
    pub fn deposit(&mut self, user_id: &str, amount: f64) -> Result<f64, String> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err("Invalid deposit amount".to_string());
        }
        let balance = self.balances.entry(user_id.to_string()).or_insert(0.0);
        *balance += amount;
        Ok(*balance)
    }

    /// Remove funds, failing without mutation if the balance is short.
    pub fn debit(&mut self, user_id: &str, amount: f64) -> Result<f64, String> {
        let balance = self.balances.entry(user_id.to_string()).or_insert(0.0);
        if amount > *balance {
            return Err(format!("Insufficient balance: {} < {}", balance, amount));
        }
        *balance -= amount;
        Ok(*balance)
    }

    /// Add funds without validation (refunds, payouts). Returns the new
    /// balance.
    pub fn credit(&mut self, user_id: &str, amount: f64) -> f64 {
        let balance = self.balances.entry(user_id.to_string()).or_insert(0.0);
        *balance += amount;
        *balance
    }
}
