// In crates/risk/src/sizer.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixed-fractional position sizing.
///
/// Risks `risk_percent` of `equity` on the distance between the entry price and
/// the stop-loss level:
///
/// ```text
/// amount_to_risk = equity * risk_percent / 100
/// stop_distance  = entry_price * stop_loss_factor
/// size           = floor(amount_to_risk / stop_distance)
/// ```
///
/// The result is a whole number of units, before any instrument lot rounding
/// (see [`crate::SizingPolicy`]). Anything that does not yield at least one
/// unit is an [`Error::InvalidSize`].
pub fn risk_based_size(
    equity: Decimal,
    risk_percent: Decimal,
    entry_price: Decimal,
    stop_loss_factor: Decimal,
) -> Result<Decimal> {
    if entry_price <= Decimal::ZERO || stop_loss_factor <= Decimal::ZERO {
        return Err(Error::InvalidSize { size: Decimal::ZERO });
    }

    let overflow = || Error::InvalidParameters("position size calculation overflowed".to_string());

    let stop_distance = entry_price.checked_mul(stop_loss_factor).ok_or_else(overflow)?;
    if stop_distance.is_zero() {
        // Underflowed to zero at Decimal precision.
        return Err(Error::InvalidSize { size: Decimal::ZERO });
    }
    let amount_to_risk = equity
        .checked_mul(risk_percent)
        .and_then(|v| v.checked_div(dec!(100)))
        .ok_or_else(overflow)?;

    let size = amount_to_risk.checked_div(stop_distance).ok_or_else(overflow)?.floor();

    if size <= Decimal::ZERO {
        return Err(Error::InvalidSize { size });
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_by_risk_budget() {
        // 1% of 100k = 1000 at risk; stop distance 0.50 per unit.
        let size = risk_based_size(dec!(100000), dec!(1), dec!(50), dec!(0.01)).unwrap();
        assert_eq!(size, dec!(2000));
    }

    #[test]
    fn floors_fractional_sizes() {
        // 100 / 3 = 33.33..
        let size = risk_based_size(dec!(10000), dec!(1), dec!(300), dec!(0.01)).unwrap();
        assert_eq!(size, dec!(33));
    }

    #[test]
    fn sub_unit_size_is_invalid() {
        let err = risk_based_size(dec!(100), dec!(1), dec!(500), dec!(0.01)).unwrap_err();
        assert_eq!(err, Error::InvalidSize { size: dec!(0) });
    }

    #[test]
    fn non_positive_equity_is_invalid() {
        assert!(matches!(
            risk_based_size(dec!(0), dec!(1), dec!(50), dec!(0.01)),
            Err(Error::InvalidSize { .. })
        ));
        assert!(matches!(
            risk_based_size(dec!(-5000), dec!(1), dec!(50), dec!(0.01)),
            Err(Error::InvalidSize { .. })
        ));
    }

    #[test]
    fn non_positive_price_or_stop_is_invalid() {
        assert!(matches!(
            risk_based_size(dec!(100000), dec!(1), dec!(0), dec!(0.01)),
            Err(Error::InvalidSize { .. })
        ));
        assert!(matches!(
            risk_based_size(dec!(100000), dec!(1), dec!(50), dec!(0)),
            Err(Error::InvalidSize { .. })
        ));
        assert!(matches!(
            risk_based_size(dec!(100000), dec!(1), dec!(-50), dec!(-0.01)),
            Err(Error::InvalidSize { .. })
        ));
    }
}
