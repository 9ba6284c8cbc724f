//! Monetary value objects: `Money` and `Balance`.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use subledger_core::ValueObject;

/// An exact-decimal currency amount.
///
/// Thin wrapper over `rust_decimal::Decimal`; arithmetic never loses precision
/// the way binary floats would. Amounts may be negative (a negated debit), so
/// non-negativity is enforced where it matters (transaction construction), not
/// here.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// The zero amount (fold seed for balance computation).
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl ValueObject for Money {}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${}", -self.0)
        } else {
            write!(f, "${}", self.0)
        }
    }
}

/// The balance of a (sub-)account: the cleared portion plus uncleared holds.
///
/// - `available`: the settled amount the account holder can spend.
/// - `pending`: the net of not-yet-settled transactions, held against the
///   available amount (a pending debit increases it, a pending credit
///   decreases it).
/// - `total = available - pending`: what the balance will be once everything
///   settles. Settlement moves a transaction's contribution from `pending`
///   into `available` and leaves `total` unchanged.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Balance {
    available: Money,
    pending: Money,
}

impl Balance {
    /// The empty balance (fold seed).
    pub const fn zero() -> Self {
        Self {
            available: Money::zero(),
            pending: Money::zero(),
        }
    }

    pub const fn new(available: Money, pending: Money) -> Self {
        Self { available, pending }
    }

    pub const fn available(&self) -> Money {
        self.available
    }

    pub const fn pending(&self) -> Money {
        self.pending
    }

    pub fn total(&self) -> Money {
        self.available - self.pending
    }
}

impl ValueObject for Balance {}

impl Add for Balance {
    type Output = Balance;

    fn add(self, rhs: Balance) -> Balance {
        Balance {
            available: self.available + rhs.available,
            pending: self.pending + rhs.pending,
        }
    }
}

impl Sum for Balance {
    fn sum<I: Iterator<Item = Balance>>(iter: I) -> Balance {
        iter.fold(Balance::zero(), Add::add)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "available {}, pending {}, total {}",
            self.available,
            self.pending,
            self.total()
        )
    }
}
