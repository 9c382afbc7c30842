//! Deterministic price computation from reservation duration.
//!
//! All money math uses [`Decimal`] — never floating point — and is a pure
//! function of the span and the pricing rule. Billing units are counted by
//! rounding the duration *up* to whole units: a 90 minute reservation at an
//! hourly rate pays for two hours.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::timespan::TimeRange;

// ── Pricing rules ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingType {
    Free,
    Paid,
}

/// The unit a paid price is quoted per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceUnit {
    Fixed,
    Per15Min,
    Per30Min,
    PerHour,
    PerHalfDay,
    PerDay,
    PerWeek,
}

impl PriceUnit {
    /// Minutes of one billing unit; `None` for a fixed price.
    pub fn minutes(self) -> Option<i64> {
        match self {
            PriceUnit::Fixed => None,
            PriceUnit::Per15Min => Some(15),
            PriceUnit::Per30Min => Some(30),
            PriceUnit::PerHour => Some(60),
            PriceUnit::PerHalfDay => Some(720),
            PriceUnit::PerDay => Some(1440),
            PriceUnit::PerWeek => Some(10080),
        }
    }
}

/// One resource's pricing rule. Gross and net are carried separately for
/// both ends of the advertised price band; the chargeable price is the
/// higher end of the band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub pricing_type: PricingType,
    pub unit: PriceUnit,
    pub lowest_price: Decimal,
    pub highest_price: Decimal,
    pub lowest_price_net: Decimal,
    pub highest_price_net: Decimal,
    pub tax_percentage: Decimal,
    pub effective_from: NaiveDate,
}

/// The rule in effect on `date`: the latest `effective_from` not after it.
pub fn active_rule(rules: &[PricingRule], date: NaiveDate) -> Option<&PricingRule> {
    rules
        .iter()
        .filter(|r| r.effective_from <= date)
        .max_by_key(|r| r.effective_from)
}

// ── Quotes ──────────────────────────────────────────────────────────────────

/// The computed price of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub gross: Decimal,
    pub net: Decimal,
    pub unit_price: Decimal,
    pub tax_percentage: Decimal,
}

impl PriceQuote {
    pub fn zero() -> Self {
        Self {
            gross: Decimal::ZERO,
            net: Decimal::ZERO,
            unit_price: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
        }
    }
}

/// Price one reservation span against one rule.
///
/// Free rules quote zero. Paid rules charge the higher end of the price
/// band; a tie keeps the higher end's net counterpart. Fixed-unit rules are
/// independent of duration; every other unit bills
/// `ceil(duration / unit) × net unit price`, with gross derived from net
/// and the tax percentage.
pub fn price(span: &TimeRange, rule: &PricingRule) -> PriceQuote {
    if rule.pricing_type != PricingType::Paid {
        return PriceQuote::zero();
    }

    let (unit_price, unit_price_net) = if rule.highest_price >= rule.lowest_price {
        (rule.highest_price, rule.highest_price_net)
    } else {
        (rule.lowest_price, rule.lowest_price_net)
    };

    match rule.unit.minutes() {
        None => PriceQuote {
            gross: unit_price,
            net: unit_price_net,
            unit_price,
            tax_percentage: rule.tax_percentage,
        },
        Some(unit_minutes) => {
            let minutes = span.duration().num_minutes();
            let units = Decimal::from((minutes + unit_minutes - 1) / unit_minutes);
            let net = units * unit_price_net;
            let gross = net * (Decimal::ONE + rule.tax_percentage / Decimal::ONE_HUNDRED);
            PriceQuote {
                gross,
                net,
                unit_price,
                tax_percentage: rule.tax_percentage,
            }
        }
    }
}

/// Price one span across several resources, in caller-supplied order.
///
/// Gross and net are summed across all rules; the unit price and tax
/// percentage of the aggregate come from the *first* rule in the sequence.
/// The ordering dependency is part of the contract, not an artifact.
pub fn price_total<'a, I>(span: &TimeRange, rules: I) -> PriceQuote
where
    I: IntoIterator<Item = &'a PricingRule>,
{
    let mut iter = rules.into_iter();
    let Some(first) = iter.next() else {
        return PriceQuote::zero();
    };
    let mut total = price(span, first);
    for rule in iter {
        let quote = price(span, rule);
        total.gross += quote.gross;
        total.net += quote.net;
    }
    total
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn span(minutes: i64) -> TimeRange {
        let begin = Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap();
        TimeRange::new(begin, begin + chrono::Duration::minutes(minutes)).unwrap()
    }

    fn hourly() -> PricingRule {
        PricingRule {
            pricing_type: PricingType::Paid,
            unit: PriceUnit::PerHour,
            lowest_price: dec!(12.40),
            highest_price: dec!(12.40),
            lowest_price_net: dec!(10),
            highest_price_net: dec!(10),
            tax_percentage: dec!(24),
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_ninety_minutes_bills_two_hours() {
        let quote = price(&span(90), &hourly());
        assert_eq!(quote.net, dec!(20));
        assert_eq!(quote.gross, dec!(24.8));
        assert_eq!(quote.tax_percentage, dec!(24));
    }

    #[test]
    fn test_exact_hour_bills_one_unit() {
        let quote = price(&span(60), &hourly());
        assert_eq!(quote.net, dec!(10));
        assert_eq!(quote.gross, dec!(12.4));
    }

    #[test]
    fn test_free_rule_quotes_zero() {
        let mut rule = hourly();
        rule.pricing_type = PricingType::Free;
        assert_eq!(price(&span(90), &rule), PriceQuote::zero());
    }

    #[test]
    fn test_fixed_price_independent_of_duration() {
        let mut rule = hourly();
        rule.unit = PriceUnit::Fixed;
        let short = price(&span(30), &rule);
        let long = price(&span(600), &rule);
        assert_eq!(short, long);
        assert_eq!(short.gross, dec!(12.40));
        assert_eq!(short.net, dec!(10));
    }

    #[test]
    fn test_chargeable_price_is_higher_band_end() {
        let mut rule = hourly();
        rule.lowest_price = dec!(6.20);
        rule.lowest_price_net = dec!(5);
        let quote = price(&span(60), &rule);
        assert_eq!(quote.net, dec!(10));
        assert_eq!(quote.unit_price, dec!(12.40));
    }

    #[test]
    fn test_tie_keeps_highest_net_counterpart() {
        let mut rule = hourly();
        // Equal gross band but diverging net bookkeeping
        rule.lowest_price_net = dec!(9.50);
        let quote = price(&span(60), &rule);
        assert_eq!(quote.net, dec!(10));
    }

    #[test]
    fn test_per_half_day_rounds_up() {
        let mut rule = hourly();
        rule.unit = PriceUnit::PerHalfDay;
        // 13 hours spills into the second half-day unit
        let quote = price(&span(13 * 60), &rule);
        assert_eq!(quote.net, dec!(20));
    }

    #[test]
    fn test_total_sums_but_pins_first_unit_price() {
        let mut second = hourly();
        second.lowest_price = dec!(24.80);
        second.highest_price = dec!(24.80);
        second.lowest_price_net = dec!(20);
        second.highest_price_net = dec!(20);
        second.tax_percentage = dec!(10);
        let first = hourly();
        let total = price_total(&span(60), [&first, &second]);
        assert_eq!(total.net, dec!(30));
        assert_eq!(total.gross, dec!(12.4) + dec!(22));
        // First resource's unit price and tax win
        assert_eq!(total.unit_price, dec!(12.40));
        assert_eq!(total.tax_percentage, dec!(24));
    }

    #[test]
    fn test_total_of_nothing_is_zero() {
        assert_eq!(price_total(&span(60), []), PriceQuote::zero());
    }

    #[test]
    fn test_active_rule_prefers_latest_effective() {
        let mut old = hourly();
        old.effective_from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut future = hourly();
        future.effective_from = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let current = hourly();
        let rules = vec![old, current.clone(), future];
        let on = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(active_rule(&rules, on), Some(&current));
    }

    #[test]
    fn test_active_rule_none_before_first_effective() {
        let rules = vec![hourly()];
        let on = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(active_rule(&rules, on), None);
    }
}
