// Whole rubles everywhere, rounded half-up

use crate::api::TipQuote;
use crate::errors::{Error, Result};
use crate::store::INVALID_DATA;

/// Quick-pick percentages offered to the guest
pub const PERCENTAGE_OPTIONS: [u64; 4] = [5, 10, 15, 20];

/// Smallest amount a guest can type in
pub const MIN_CUSTOM_AMOUNT: u64 = 10;

/// Commission on top of the tip, in percent
pub const COMMISSION_PERCENT: u64 = 6;

/// Largest bill or tip accepted, in rubles
pub const MAX_AMOUNT: u64 = 10_000_000;

/// How the guest picked the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// One of PERCENTAGE_OPTIONS, applied to the bill
    Percentage(u64),
    /// Free-form amount
    Custom(u64),
}

fn too_large() -> Error {
    Error::Validation(INVALID_DATA.to_string())
}

/// `round(value * percent / 100)`, rounding halves up
fn percent_of(value: u64, percent: u64) -> u64 {
    let rounded = (value as u128 * percent as u128 + 50) / 100;
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

/// Tip for one of the quick-pick percentages
pub fn tip_for_percentage(base: u64, percent: u64) -> Result<u64> {
    if !PERCENTAGE_OPTIONS.contains(&percent) {
        return Err(Error::Validation(format!(
            "Недопустимый процент: {}",
            percent
        )));
    }
    if base > MAX_AMOUNT {
        return Err(too_large());
    }
    Ok(percent_of(base, percent))
}

/// Percentage of the bill a custom amount represents. Display only.
pub fn percentage_for_amount(base: u64, amount: u64) -> Option<u64> {
    if base == 0 {
        return None;
    }
    let (base, amount) = (base as u128, amount as u128);
    u64::try_from((amount * 200 + base) / (base * 2)).ok()
}

/// Service commission for a tip
pub fn commission_for(tip: u64) -> u64 {
    percent_of(tip, COMMISSION_PERCENT)
}

/// What the guest pays
pub fn total_payable(tip: u64, pay_commission: bool) -> Result<u64> {
    if !pay_commission {
        return Ok(tip);
    }
    tip.checked_add(commission_for(tip)).ok_or_else(too_large)
}

/// Compute everything the payment screen shows
pub fn quote(base: u64, selection: Selection, pay_commission: bool) -> Result<TipQuote> {
    if base > MAX_AMOUNT {
        return Err(too_large());
    }
    let (tip_amount, percentage) = match selection {
        Selection::Percentage(percent) => (tip_for_percentage(base, percent)?, Some(percent)),
        Selection::Custom(amount) => {
            if amount < MIN_CUSTOM_AMOUNT {
                return Err(Error::Validation(format!(
                    "Минимальная сумма чаевых {} ₽",
                    MIN_CUSTOM_AMOUNT
                )));
            }
            if amount > MAX_AMOUNT {
                return Err(too_large());
            }
            (amount, percentage_for_amount(base, amount))
        }
    };

    Ok(TipQuote {
        base,
        tip_amount,
        percentage,
        commission: commission_for(tip_amount),
        pay_commission,
        total: total_payable(tip_amount, pay_commission)?,
    })
}
