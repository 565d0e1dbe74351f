use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const DEFAULT_CURRENCY_CODE: &str = "MXN";

//--------------------------------------       Pesos         ---------------------------------------------------------
/// A monetary amount in cents. Prices are stored and added as integers; the decimal point only
/// exists at the display boundary.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Pesos(i64);

impl Add for Pesos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Pesos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for Pesos {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Pesos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct PesosConversionError(pub String);

impl From<i64> for Pesos {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Pesos {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Pesos {}

impl TryFrom<u64> for Pesos {
    type Error = PesosConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PesosConversionError(format!("Value {value} is too large to convert to Pesos")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Pesos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / 100;
        let cents = (self.0 % 100).abs();
        write!(f, "${whole}.{cents:02}")
    }
}

impl Pesos {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Construct an amount from whole currency units.
    pub fn from_whole(units: i64) -> Self {
        Self(units * 100)
    }
}
