// Odds arithmetic for the Payday sportsbook
//
// American odds are signed integers: positive = profit per $100 stake,
// negative = stake required to win $100. Decimal odds only exist
// transiently inside this module. Every odds sign branch in the system
// routes through here.

/// Convert American odds to decimal odds.
pub fn to_decimal(american: i32) -> f64 {
    if american >= 0 {
        american as f64 / 100.0 + 1.0
    } else {
        100.0 / american.abs() as f64 + 1.0
    }
}

/// Convert decimal odds back to the nearest integer American odds.
pub fn to_american(decimal: f64) -> i32 {
    if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round() as i32
    } else {
        (-100.0 / (decimal - 1.0)).round() as i32
    }
}

/// Total payout (stake included) for a winning bet.
/// Returns 0 for a non-positive stake.
pub fn payout(american: i32, stake: f64) -> f64 {
    if stake <= 0.0 {
        return 0.0;
    }
    stake * to_decimal(american)
}

/// Combine leg odds into parlay odds: product of decimals, back to American.
/// Callers must guard against an empty slice; a combine over zero legs has
/// no meaning.
pub fn combine(legs: &[i32]) -> i32 {
    debug_assert!(!legs.is_empty(), "combine called with zero legs");
    let product: f64 = legs.iter().map(|&o| to_decimal(o)).product();
    to_american(product)
}

/// Apply a payout-reducing fee to American odds.
///
/// For positive odds the plus value shrinks (+200 at 10% -> +180); for
/// negative odds the line gets more negative (-110 at 10% -> -122). Both
/// directions make the payout worse, never better.
pub fn apply_fee(american: i32, fee_percentage: f64) -> i32 {
    let factor = 1.0 - fee_percentage / 100.0;
    if american >= 0 {
        (american as f64 * factor).round() as i32
    } else {
        (american as f64 / factor).round() as i32
    }
}

/// Implied win probability as a whole percentage. Used for ranking picks,
/// never for payout math.
pub fn implied_probability(american: i32) -> u32 {
    (win_probability(american) * 100.0).round() as u32
}

/// Implied win probability as a fraction, for the settlement simulator.
pub fn win_probability(american: i32) -> f64 {
    if american >= 0 {
        100.0 / (american as f64 + 100.0)
    } else {
        american.abs() as f64 / (american.abs() as f64 + 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_conversion() {
        assert!((to_decimal(100) - 2.0).abs() < 1e-9);
        assert!((to_decimal(150) - 2.5).abs() < 1e-9);
        assert!((to_decimal(-110) - 1.909).abs() < 0.001);
        assert!((to_decimal(-200) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_american_round_trip() {
        // Round-trips within the +/-1 rounding tolerance.
        for odds in [-350, -200, -150, -110, -105, 100, 120, 150, 250, 400] {
            let back = to_american(to_decimal(odds));
            assert!(
                (back - odds).abs() <= 1,
                "round trip {} -> {}",
                odds,
                back
            );
        }
    }

    #[test]
    fn test_payout() {
        assert_eq!(payout(150, 10.0), 25.0);
        assert_eq!(payout(-110, 0.0), 0.0);
        assert_eq!(payout(200, -5.0), 0.0);
        // Exactly stake * decimal
        assert!((payout(-110, 11.0) - 11.0 * to_decimal(-110)).abs() < 1e-9);
        // Better than even money pays more than stake
        assert!(payout(120, 10.0) > 10.0);
    }

    #[test]
    fn test_combine_parlay() {
        // -110 and +120: 1.909 * 2.2 ~= 4.2 decimal ~= +320 American
        let combined = combine(&[-110, 120]);
        assert!((combined - 320).abs() <= 1, "got {}", combined);

        let three = combine(&[-110, -110, 150]);
        let expected = to_american(to_decimal(-110) * to_decimal(-110) * to_decimal(150));
        assert_eq!(three, expected);
    }

    #[test]
    fn test_apply_fee_reduces_payout() {
        assert_eq!(apply_fee(200, 10.0), 180);
        assert_eq!(apply_fee(-110, 10.0), -122);
        for odds in [-250, -110, 100, 150, 300] {
            let reduced = apply_fee(odds, 10.0);
            assert!(
                payout(reduced, 10.0) < payout(odds, 10.0),
                "fee must reduce payout for {}",
                odds
            );
        }
    }

    #[test]
    fn test_implied_probability() {
        assert_eq!(implied_probability(100), 50);
        assert_eq!(implied_probability(-150), 60);
        assert_eq!(implied_probability(150), 40);
    }
}
