use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Declares a provider-assigned string identifier.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

pub mod user {
    use super::*;

    string_id!(
        /// Identifier issued by the identity provider.
        UserId
    );

    /// Handle to an authenticated account.
    ///
    /// Only the attributes the application consumes are kept; everything else
    /// stays with the identity provider.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserIdentity {
        pub id: UserId,
        /// Missing for federated accounts that do not share an email.
        pub email: Option<String>,
    }
}

pub mod trip {
    use super::*;
    use crate::user::UserId;

    string_id!(TripId);

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Trip {
        pub id: TripId,
        pub place: String,
        pub country: String,
        pub owner_id: UserId,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TripNew {
        pub place: String,
        pub country: String,
        pub owner_id: UserId,
    }
}

pub mod expense {
    use super::*;
    use crate::trip::TripId;

    string_id!(ExpenseId);

    /// Rejected amount input.
    #[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
    #[error("invalid amount: {0}")]
    pub struct InvalidAmount(pub String);

    /// Non-negative, finite expense amount.
    ///
    /// Stored as a plain number, the same way the document database keeps it.
    #[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
    #[serde(try_from = "f64", into = "f64")]
    pub struct Amount(f64);

    impl Amount {
        pub const ZERO: Amount = Amount(0.0);

        pub fn new(value: f64) -> Result<Self, InvalidAmount> {
            if !value.is_finite() {
                return Err(InvalidAmount(format!("{value} is not a finite number")));
            }
            if value < 0.0 {
                return Err(InvalidAmount(format!("{value} is negative")));
            }
            // Normalize -0.0 so equality and display behave.
            Ok(Self(value.abs()))
        }

        pub fn value(self) -> f64 {
            self.0
        }

        /// Returns the amount as an integer when it has no fractional part.
        pub fn as_whole(self) -> Option<i64> {
            const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
            if self.0.fract() == 0.0 && self.0 <= MAX_SAFE_INTEGER {
                Some(self.0 as i64)
            } else {
                None
            }
        }
    }

    impl TryFrom<f64> for Amount {
        type Error = InvalidAmount;

        fn try_from(value: f64) -> Result<Self, Self::Error> {
            Self::new(value)
        }
    }

    impl From<Amount> for f64 {
        fn from(value: Amount) -> Self {
            value.0
        }
    }

    impl fmt::Display for Amount {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self.as_whole() {
                Some(whole) => write!(f, "{whole}"),
                None => write!(f, "{:.2}", self.0),
            }
        }
    }

    impl FromStr for Amount {
        type Err = InvalidAmount;

        /// Accepts both `.` and `,` as decimal separator.
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(InvalidAmount("amount must not be empty".to_string()));
            }
            let value = trimmed
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| InvalidAmount(format!("'{trimmed}' is not a number")))?;
            Self::new(value)
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Expense {
        pub id: ExpenseId,
        pub trip_id: TripId,
        pub title: String,
        pub amount: Amount,
        pub category: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub trip_id: TripId,
        pub title: String,
        pub amount: Amount,
        pub category: String,
    }
}
