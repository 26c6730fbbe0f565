//! Balance rules for deposits and withdrawals.
//!
//! [`validate`] is a pure function of the limits, the current balance, the
//! requested amount and the transaction type. Business rejections are part of
//! the returned [`Outcome`]; only a non-positive amount, or one that would take
//! the balance out of the range of [`Decimal`], is an error.

use crate::models::{Outcome, Rejection, TransactionType};
use rust_decimal::Decimal;

/// Withdrawal limits applied by [`validate`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// Largest amount a single withdrawal may take out.
    pub max_withdrawal: Decimal,
    /// Balance an account must keep after a withdrawal.
    pub minimum_balance: Decimal,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_withdrawal: Decimal::from(10000),
            minimum_balance: Decimal::from(100),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidAmount(Decimal),
    OutOfRange(Decimal),
}

pub fn validate(
    limits: &Limits,
    balance: Decimal,
    amount: Decimal,
    transaction_type: TransactionType,
) -> Result<Outcome, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }

    match transaction_type {
        TransactionType::Deposit => balance
            .checked_add(amount)
            .map(|post_balance| Outcome::Applied { post_balance })
            .ok_or(Error::OutOfRange(amount)),
        TransactionType::Withdraw => withdraw(limits, balance, amount),
    }
}

// The max-withdrawal rule wins when both rules are broken.
fn withdraw(limits: &Limits, balance: Decimal, amount: Decimal) -> Result<Outcome, Error> {
    if amount > limits.max_withdrawal {
        return Ok(Outcome::Rejected {
            rejection: Rejection::MaxWithdrawalExceeded {
                limit: limits.max_withdrawal,
            },
            balance,
        });
    }

    let post_balance = balance
        .checked_sub(amount)
        .ok_or(Error::OutOfRange(amount))?;

    if post_balance < limits.minimum_balance {
        return Ok(Outcome::Rejected {
            rejection: Rejection::MinimumBalanceBreached {
                floor: limits.minimum_balance,
            },
            balance,
        });
    }

    Ok(Outcome::Applied { post_balance })
}
