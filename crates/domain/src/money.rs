//! Fixed-point money. Every monetary value in the system is a `Decimal`
//! rounded to two places; nothing here ever touches `f32`/`f64`.

use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Round `value` to the two-decimal scale bids and prices are stored at.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// `a >= b` at money scale, i.e. after rounding both operands.
pub fn at_least(a: Decimal, b: Decimal) -> bool {
    round_money(a).cmp(&round_money(b)) != Ordering::Less
}

/// `amount` is the minimum next bid given the current price and the
/// auction's increment, mirroring the rule in `Auction::min_required_bid`.
pub fn next_minimum(current_price: Decimal, min_increment: Decimal) -> Decimal {
    round_money(current_price + min_increment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
    }

    #[test]
    fn at_least_is_scale_aware() {
        assert!(at_least(dec!(10.00), dec!(10.00)));
        assert!(!at_least(dec!(9.99), dec!(10.00)));
    }
}
