use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::Serialize;
use std::{fmt, str::FromStr, time::SystemTime};

pub type AccountId = i32;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: AccountId,
    pub balance: Decimal,
}

/// Kind of a balance-affecting operation. Parsing is case-sensitive.
#[derive(Serialize, ToSql, FromSql, Clone, Copy, Debug, PartialEq, Eq)]
#[postgres(name = "transaction_type")]
pub enum TransactionType {
    Deposit,
    Withdraw,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnrecognizedTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = UnrecognizedTransactionType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Deposit" => Ok(Self::Deposit),
            "Withdraw" => Ok(Self::Withdraw),
            other => Err(UnrecognizedTransactionType(other.to_string())),
        }
    }
}

/// Business rule that turned a transaction down.
#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    MaxWithdrawalExceeded { limit: Decimal },
    MinimumBalanceBreached { floor: Decimal },
}

impl Rejection {
    pub fn code(&self) -> u16 {
        match self {
            Self::MinimumBalanceBreached { .. } => 4001,
            Self::MaxWithdrawalExceeded { .. } => 4002,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MaxWithdrawalExceeded { limit } => format!(
                "Invalid Transaction: Withdrawl amount is greater than ${}",
                limit
            ),
            Self::MinimumBalanceBreached { floor } => format!(
                "Invalid Transaction : Withdrawl amount will make available balance below mandatory limit of ${}",
                floor
            ),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: u16,
    pub message: String,
}

impl From<&Rejection> for ErrorInfo {
    fn from(rejection: &Rejection) -> Self {
        Self {
            code: rejection.code(),
            message: rejection.message(),
        }
    }
}

/// Result of validating a transaction against an account balance.
///
/// A rejected outcome still carries a balance: the one the account had before
/// the attempt, which is left untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Applied { post_balance: Decimal },
    Rejected { rejection: Rejection, balance: Decimal },
}

impl Outcome {
    pub fn post_balance(&self) -> Decimal {
        match self {
            Self::Applied { post_balance } => *post_balance,
            Self::Rejected { balance, .. } => *balance,
        }
    }

    pub fn error(&self) -> Option<ErrorInfo> {
        match self {
            Self::Applied { .. } => None,
            Self::Rejected { rejection, .. } => Some(rejection.into()),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub outcome: Outcome,
}

/// An applied transaction as kept in the account history.
#[derive(Serialize, Clone)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    pub transaction_amount: Decimal,
    pub post_balance: Decimal,
    pub recorded_at: SystemTime,
}
