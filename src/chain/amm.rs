//! Constant-product pool quoting
//!
//! The router's own computation is authoritative for live swaps; this local
//! form of the formula backs recon sampling and sanity checks.

use rust_decimal::Decimal;

/// Output amount for an exact input against a constant-product pool.
///
/// `amount_out = reserve_out * amount_in' / (amount_in' + reserve_in)` where
/// `amount_in'` is the input after the pool fee (e.g. 0.0025 for 0.25%).
pub fn constant_product_out(
    reserve_in: Decimal,
    reserve_out: Decimal,
    amount_in: Decimal,
    fee: Decimal,
) -> Decimal {
    let effective_in = amount_in * (Decimal::ONE - fee);
    if effective_in + reserve_in == Decimal::ZERO {
        return Decimal::ZERO;
    }
    reserve_out * effective_in / (effective_in + reserve_in)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_feeless_quote() {
        // 10 in against 1000/1000 reserves moves the price along the curve
        let out = constant_product_out(dec!(1000), dec!(1000), dec!(10), dec!(0));
        assert!((out - dec!(9.90)).abs() < dec!(0.01), "got {out}");
    }

    #[test]
    fn test_fee_reduces_output() {
        let feeless = constant_product_out(dec!(1000), dec!(1000), dec!(10), dec!(0));
        let with_fee = constant_product_out(dec!(1000), dec!(1000), dec!(10), dec!(0.0025));
        assert!(with_fee < feeless);
    }

    #[test]
    fn test_large_trade_slips_hard() {
        // Taking half the pool cannot return half the reserves
        let out = constant_product_out(dec!(1000), dec!(1000), dec!(1000), dec!(0));
        assert_eq!(out, dec!(500));
    }

    #[test]
    fn test_zero_input_zero_output() {
        let out = constant_product_out(dec!(1000), dec!(1000), dec!(0), dec!(0));
        assert_eq!(out, dec!(0));
    }

    #[test]
    fn test_empty_pool_zero_output() {
        let out = constant_product_out(dec!(0), dec!(0), dec!(0), dec!(0));
        assert_eq!(out, dec!(0));
    }
}
