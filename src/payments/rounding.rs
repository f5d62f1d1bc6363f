use crate::decimal::Money;
use crate::types::RoundingRule;

/// capital and interest owed for one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSplit {
    pub principal: Money,
    pub interest: Money,
    /// payment the period is pinned to, when the method fixes the total
    pub level_total: Option<Money>,
}

impl PeriodSplit {
    pub fn new(principal: Money, interest: Money) -> Self {
        Self {
            principal,
            interest,
            level_total: None,
        }
    }

    /// a fixed payment split into its interest and the capital it leaves
    pub fn level(total: Money, interest: Money) -> Self {
        Self {
            principal: (total - interest).max(Money::ZERO),
            interest,
            level_total: Some(total),
        }
    }

    pub fn total(&self) -> Money {
        self.principal + self.interest
    }

    fn round_components(&self, round: impl Fn(Money) -> Money) -> Self {
        Self {
            principal: round(self.principal),
            interest: round(self.interest),
            level_total: self.level_total,
        }
    }
}

/// rounding applied after the period formulas have produced a raw split
///
/// The period formulas never round; every rule is expressed here, so adding a
/// rule only touches this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingPolicy {
    rule: RoundingRule,
}

impl RoundingPolicy {
    pub fn new(rule: RoundingRule) -> Self {
        Self { rule }
    }

    /// level payment the constant-payment formula works from
    pub fn level_payment(&self, raw: Money) -> Money {
        match self.rule {
            RoundingRule::AdjustLast => raw.round_cents(),
            RoundingRule::RoundEach => raw,
            RoundingRule::RoundEnd => raw.round_internal(),
        }
    }

    /// round a raw period split
    pub fn apply(&self, raw: PeriodSplit) -> PeriodSplit {
        match (self.rule, raw.level_total) {
            // pinned total and interest rounded, capital takes the difference
            (RoundingRule::AdjustLast, Some(total)) => {
                let interest = raw.interest.round_cents();
                PeriodSplit {
                    principal: (total.round_cents() - interest).max(Money::ZERO),
                    interest,
                    level_total: Some(total),
                }
            }
            (RoundingRule::AdjustLast, None) | (RoundingRule::RoundEach, _) => {
                raw.round_components(|m| m.round_cents())
            }
            (RoundingRule::RoundEnd, _) => raw.round_components(|m| m.round_internal()),
        }
    }

    /// round an aggregate figure reported in the summary
    pub fn total(&self, raw: Money) -> Money {
        raw.round_cents()
    }
}

impl From<RoundingRule> for RoundingPolicy {
    fn from(rule: RoundingRule) -> Self {
        RoundingPolicy::new(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(d: rust_decimal::Decimal) -> Money {
        Money::from_decimal(d)
    }

    #[test]
    fn test_round_each_rounds_independently() {
        let policy = RoundingPolicy::new(RoundingRule::RoundEach);
        let split = policy.apply(PeriodSplit::level(money(dec!(100.00)), money(dec!(0.005))));
        assert_eq!(split.principal, money(dec!(100.00)));
        assert_eq!(split.interest, money(dec!(0.01)));
        assert_eq!(split.total(), money(dec!(100.01)));
    }

    #[test]
    fn test_adjust_last_preserves_level_total() {
        let policy = RoundingPolicy::new(RoundingRule::AdjustLast);
        let split = policy.apply(PeriodSplit::level(money(dec!(100.00)), money(dec!(0.005))));
        assert_eq!(split.interest, money(dec!(0.01)));
        assert_eq!(split.principal, money(dec!(99.99)));
        assert_eq!(split.total(), money(dec!(100.00)));
    }

    #[test]
    fn test_adjust_last_without_level_total_rounds_components() {
        let raw = PeriodSplit::new(money(dec!(33.3333)), money(dec!(0.166675)));
        let adjust = RoundingPolicy::new(RoundingRule::AdjustLast).apply(raw);
        let each = RoundingPolicy::new(RoundingRule::RoundEach).apply(raw);
        assert_eq!(adjust, each);
        assert_eq!(adjust.principal, money(dec!(33.33)));
        assert_eq!(adjust.interest, money(dec!(0.17)));
    }

    #[test]
    fn test_round_end_keeps_sub_cent_precision() {
        let policy = RoundingPolicy::new(RoundingRule::RoundEnd);
        let raw = PeriodSplit::new(money(dec!(83.3333333)), money(dec!(1.23456)));
        assert_eq!(policy.apply(raw), raw);
        assert_eq!(policy.level_payment(money(dec!(10.129))), money(dec!(10.129)));
        assert_eq!(policy.total(money(dec!(10.125))), money(dec!(10.13)));

        let long = PeriodSplit::new(money(dec!(1.0000000000004)), money(dec!(0.3333333333333333)));
        assert_eq!(
            policy.apply(long),
            PeriodSplit::new(money(dec!(1.0)), money(dec!(0.333333333333)))
        );
    }

    #[test]
    fn test_level_payment_rounding() {
        assert_eq!(
            RoundingPolicy::new(RoundingRule::AdjustLast).level_payment(money(dec!(858403.3351))),
            money(dec!(858403.34))
        );
        assert_eq!(
            RoundingPolicy::new(RoundingRule::RoundEach).level_payment(money(dec!(858403.3351))),
            money(dec!(858403.3351))
        );
    }
}
