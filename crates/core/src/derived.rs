use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub fn default_gst_rate_pct() -> Decimal {
    Decimal::new(18, 0)
}

/// Refund owed on cancellation, floored at zero.
pub fn refund_amount(total_premium_paid: Decimal, premium_deduction: Decimal) -> Decimal {
    (total_premium_paid - premium_deduction).max(Decimal::ZERO)
}

/// Amount payable on a claim after deductible and salvage, floored at zero.
pub fn settlement_payable(approved: Decimal, deductible: Decimal, salvage: Decimal) -> Decimal {
    (approved - deductible - salvage).max(Decimal::ZERO)
}

/// `round(total_marks * minimum_percentage / 100)`, half away from zero.
pub fn minimum_marks(total_marks: u32, minimum_percentage: Decimal) -> u32 {
    let raw = Decimal::from(total_marks) * minimum_percentage.max(Decimal::ZERO)
        / Decimal::ONE_HUNDRED;
    raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_u32().unwrap_or(0)
}

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumBreakdown {
    pub base_premium: Decimal,
    pub gst_rate_pct: Decimal,
    pub gst_amount: Decimal,
    pub total_premium: Decimal,
}

impl Default for PremiumBreakdown {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl PremiumBreakdown {
    pub fn new(base_premium: Decimal) -> Self {
        Self::with_rate(base_premium, default_gst_rate_pct())
    }

    pub fn with_rate(base_premium: Decimal, gst_rate_pct: Decimal) -> Self {
        let mut breakdown = Self {
            base_premium,
            gst_rate_pct,
            gst_amount: Decimal::ZERO,
            total_premium: Decimal::ZERO,
        };
        breakdown.recompute();
        breakdown
    }

    /// Rewrites `gst_amount` and `total_premium` from the base premium and rate.
    pub fn recompute(&mut self) {
        self.gst_amount =
            round_money(self.base_premium * self.gst_rate_pct / Decimal::ONE_HUNDRED);
        self.total_premium = self.base_premium + self.gst_amount;
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{minimum_marks, refund_amount, settlement_payable, PremiumBreakdown};

    #[test]
    fn refund_is_paid_minus_deduction() {
        assert_eq!(
            refund_amount(Decimal::new(10_000, 0), Decimal::new(1_500, 0)),
            Decimal::new(8_500, 0)
        );
    }

    #[test]
    fn refund_never_goes_negative() {
        let cases = [(0, 0), (0, 10), (100, 250), (99_999, 100_000), (250, 250)];
        for (paid, deduction) in cases {
            let refund = refund_amount(Decimal::new(paid, 0), Decimal::new(deduction, 0));
            assert!(refund >= Decimal::ZERO, "refund for {paid}/{deduction} was {refund}");
            assert_eq!(refund, Decimal::new((paid - deduction).max(0), 0));
        }
    }

    #[test]
    fn settlement_payable_subtracts_deductible_and_salvage() {
        assert_eq!(
            settlement_payable(
                Decimal::new(80_000, 0),
                Decimal::new(2_500, 0),
                Decimal::new(7_500, 0)
            ),
            Decimal::new(70_000, 0)
        );
        assert_eq!(
            settlement_payable(Decimal::new(1_000, 0), Decimal::new(2_500, 0), Decimal::ZERO),
            Decimal::ZERO
        );
    }

    #[test]
    fn minimum_marks_rounds_half_away_from_zero() {
        assert_eq!(minimum_marks(100, Decimal::new(60, 0)), 60);
        assert_eq!(minimum_marks(75, Decimal::new(35, 0)), 26);
        assert_eq!(minimum_marks(50, Decimal::new(33, 0)), 17);
        assert_eq!(minimum_marks(0, Decimal::new(60, 0)), 0);
        assert_eq!(minimum_marks(80, Decimal::new(-10, 0)), 0);
    }

    #[test]
    fn premium_breakdown_applies_gst() {
        let breakdown = PremiumBreakdown::new(Decimal::new(12_345, 0));

        assert_eq!(breakdown.gst_amount, Decimal::new(222_210, 2));
        assert_eq!(breakdown.total_premium, Decimal::new(1_456_710, 2));
    }

    #[test]
    fn premium_recompute_is_idempotent() {
        let mut breakdown = PremiumBreakdown::new(Decimal::new(5_000, 0));
        let first = breakdown.clone();
        breakdown.recompute();
        breakdown.recompute();
        assert_eq!(breakdown, first);
    }
}
