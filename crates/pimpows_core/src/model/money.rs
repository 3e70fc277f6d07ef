//! Monetary amounts in integer cents.
//!
//! # Invariants
//! - Amounts never go through floating point; parsing and arithmetic work
//!   on whole cents.
//! - At most two fractional digits are accepted on input.
//! - Arithmetic saturates at the `i64` bounds instead of overflowing.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

/// Amount of money in cents (BRL by convention).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// Largest amount a record may hold: 10 trillion units.
    pub const MAX: Money = Money(1_000_000_000_000_000);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole units plus cents, e.g. `Money::new(12, 50)` is 12.50.
    pub const fn new(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Formats as Brazilian currency text, e.g. `R$ 1.234,56`.
    pub fn format_brl(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = group_thousands(abs / 100, '.');
        format!("{sign}R$ {units},{:02}", abs % 100)
    }
}

fn group_thousands(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

/// Error for amount text that cannot be read as cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMoneyError(pub String);

impl Display for ParseMoneyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid amount `{}`", self.0)
    }
}

impl Error for ParseMoneyError {}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Accepts `1234`, `12.5`, `12,50`, `1.234,56`, `1,234.56` and an
    /// optional `R$` prefix or leading minus sign.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let fail = || ParseMoneyError(value.to_string());

        let mut text = value.trim();
        let negative = text.starts_with('-');
        if negative {
            text = text[1..].trim_start();
        }
        text = text.strip_prefix("R$").unwrap_or(text).trim();
        if text.is_empty() {
            return Err(fail());
        }

        // The right-most separator is the decimal point when both appear.
        let decimal_sep = match (text.rfind('.'), text.rfind(',')) {
            (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
            (Some(_), None) => Some('.'),
            (None, Some(_)) => Some(','),
            (None, None) => None,
        };

        let (int_part, frac_part) = match decimal_sep {
            Some(sep) => {
                let idx = text.rfind(sep).ok_or_else(fail)?;
                (&text[..idx], &text[idx + 1..])
            }
            None => (text, ""),
        };
        let int_digits: String = int_part.chars().filter(|ch| *ch != '.' && *ch != ',').collect();

        if frac_part.len() > 2
            || !int_digits.chars().all(|ch| ch.is_ascii_digit())
            || !frac_part.chars().all(|ch| ch.is_ascii_digit())
            || (int_digits.is_empty() && frac_part.is_empty())
        {
            return Err(fail());
        }

        let units: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| fail())?
        };
        let cents: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().map_err(|_| fail())? * 10,
            _ => frac_part.parse().map_err(|_| fail())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .ok_or_else(fail)?;
        Ok(Money(if negative { -total } else { total }))
    }
}
