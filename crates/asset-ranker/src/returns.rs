//! Window Return Calculation
//!
//! Simple percentage change between the first and last observation of a
//! chronologically ordered series. No compounding, no averaging.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::PricePoint;

/// Percentage return over the supplied window.
///
/// `(last - first) / first * 100`, using only the endpoints. Returns `None`
/// when the series has fewer than two points or starts at a zero price;
/// callers must treat `None` as unrankable, never as zero.
pub fn compute_return(series: &[PricePoint]) -> Option<Decimal> {
    let (first, last) = match series {
        [first, .., last] => (first.price, last.price),
        _ => return None,
    };

    if first.is_zero() {
        return None;
    }

    let change = last.checked_sub(first)?;
    change.checked_div(first)?.checked_mul(dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(prices: &[Decimal]) -> Vec<PricePoint> {
        let start = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(start + Duration::days(i as i64), *p))
            .collect()
    }

    #[test]
    fn test_endpoints_only() {
        let s = series(&[dec!(100), dec!(105), dec!(98), dec!(120)]);
        assert_eq!(compute_return(&s), Some(dec!(20)));
    }

    #[test]
    fn test_intermediate_points_do_not_matter() {
        let short = series(&[dec!(50), dec!(40)]);
        let long = series(&[dec!(50), dec!(1000), dec!(1), dec!(77), dec!(40)]);
        assert_eq!(compute_return(&short), Some(dec!(-20)));
        assert_eq!(compute_return(&short), compute_return(&long));
    }

    #[test]
    fn test_fractional_return() {
        let s = series(&[dec!(36.80), dec!(38.64)]);
        assert_eq!(compute_return(&s), Some(dec!(5)));
    }

    #[test]
    fn test_insufficient_points_is_none() {
        assert_eq!(compute_return(&[]), None);
        assert_eq!(compute_return(&series(&[dec!(10)])), None);
    }

    #[test]
    fn test_zero_first_price_is_none() {
        let s = series(&[dec!(0), dec!(5)]);
        assert_eq!(compute_return(&s), None);
    }
}
