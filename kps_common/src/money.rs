use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const NPR_CURRENCY_CODE: &str = "NPR";
pub const NPR_CURRENCY_CODE_LOWER: &str = "npr";

//--------------------------------------       Paisa        -----------------------------------------------------------
/// Money in paisa, the minor unit of the Nepalese rupee (100 paisa = 1 rupee).
///
/// The gateway prices everything in paisa, so this is the canonical representation throughout the engine and the
/// database. Rupee decimals only exist at the HTTP boundary; convert them with [`Paisa::try_from`] on the way in and
/// [`Paisa::to_rupees`] on the way out.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paisa(i64);

op!(binary Paisa, Add, add);
op!(binary Paisa, Sub, sub);
op!(inplace Paisa, SubAssign, sub_assign);
op!(unary Paisa, Neg, neg);

impl Mul<i64> for Paisa {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paisa {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paisa: {0}")]
pub struct PaisaConversionError(String);

impl From<i64> for Paisa {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paisa {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paisa {}

/// Converts a rupee amount, as submitted by a client, into paisa. Fails on sub-paisa precision and on amounts that
/// overflow the minor-unit representation.
impl TryFrom<Decimal> for Paisa {
    type Error = PaisaConversionError;

    fn try_from(rupees: Decimal) -> Result<Self, Self::Error> {
        let paisa = rupees
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| PaisaConversionError(format!("Amount {rupees} is too large")))?;
        if !paisa.is_integer() {
            return Err(PaisaConversionError(format!("Amount {rupees} has sub-paisa precision")));
        }
        paisa.to_i64().map(Self).ok_or_else(|| PaisaConversionError(format!("Amount {rupees} is too large")))
    }
}

impl Display for Paisa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rs.{}", self.to_rupees())
    }
}

impl Paisa {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    /// The major-unit decimal view of this amount, always with two decimal places.
    pub fn to_rupees(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rupee_decimal_round_trip() {
        let amount = Paisa::try_from(Decimal::new(5000, 2)).unwrap();
        assert_eq!(amount, Paisa::from(5_000));
        assert_eq!(amount.to_rupees(), Decimal::new(5000, 2));
        assert_eq!(amount.to_string(), "Rs.50.00");
    }

    #[test]
    fn whole_rupees() {
        assert_eq!(Paisa::from_rupees(120), Paisa::from(12_000));
        assert_eq!(Paisa::try_from(Decimal::from(120)).unwrap(), Paisa::from(12_000));
    }

    #[test]
    fn sub_paisa_precision_is_rejected() {
        let err = Paisa::try_from(Decimal::new(50_005, 3)).unwrap_err();
        assert!(err.to_string().contains("sub-paisa"));
    }

    #[test]
    fn arithmetic() {
        let a = Paisa::from(1_500);
        let b = Paisa::from(500);
        assert_eq!(a + b, Paisa::from(2_000));
        assert_eq!(a - b, Paisa::from(1_000));
        assert_eq!(b * 3, Paisa::from(1_500));
        assert_eq!(vec![a, b].into_iter().sum::<Paisa>(), Paisa::from(2_000));
    }
}
