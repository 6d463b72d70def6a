use serde::Serialize;

use super::domain::{LoanTerms, RepaymentStyle};

const BALANCE_EPSILON: f64 = 1e-9;

/// Single-draw construction facility.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanFacility {
    pub principal: f64,
    /// Annual rate as a fraction (0.08 for 8%).
    pub annual_rate: f64,
    pub term_periods: usize,
    pub repayment_style: RepaymentStyle,
    pub grace_periods: usize,
}

impl LoanFacility {
    /// Builds the facility for a project horizon. A zero term, or a term
    /// longer than the horizon, matures on the horizon's final period.
    pub fn from_terms(terms: &LoanTerms, horizon: usize) -> Self {
        let term = terms.term_months as usize;
        let term_periods = if term == 0 { horizon } else { term.min(horizon) };

        Self {
            principal: terms.principal.max(0.0),
            annual_rate: terms.interest_rate_pct / 100.0,
            term_periods,
            repayment_style: terms.repayment_style,
            grace_periods: terms.grace_period_months as usize,
        }
    }

    /// Period-by-period draw, interest and repayment. The balance is always
    /// cleared in the final period, even when the grace period outlasts the
    /// term.
    pub fn schedule(&self) -> LoanSchedule {
        let periods = self.term_periods;
        let mut schedule = LoanSchedule::zeroed(periods);
        if periods == 0 || self.principal <= 0.0 {
            return schedule;
        }

        let last = periods - 1;
        let mut outstanding = self.principal;
        schedule.drawn[0] = self.principal;

        for index in 0..periods {
            if outstanding > 0.0 {
                schedule.interest[index] = outstanding * self.annual_rate / 12.0;
            }

            let repayment = if index == last {
                outstanding
            } else if index >= self.grace_periods {
                match self.repayment_style {
                    RepaymentStyle::EqualInstallment => {
                        outstanding / (last - index + 1) as f64
                    }
                    RepaymentStyle::Bullet | RepaymentStyle::InterestOnly => 0.0,
                }
            } else {
                0.0
            };

            schedule.repayment[index] = repayment;
            outstanding -= repayment;
            if outstanding < BALANCE_EPSILON || index == last {
                outstanding = 0.0;
            }
            schedule.outstanding[index] = outstanding;
        }

        schedule
    }
}

/// Per-period facility series. `outstanding` holds closing balances.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSchedule {
    pub drawn: Vec<f64>,
    pub interest: Vec<f64>,
    pub repayment: Vec<f64>,
    pub outstanding: Vec<f64>,
}

impl LoanSchedule {
    fn zeroed(periods: usize) -> Self {
        Self {
            drawn: vec![0.0; periods],
            interest: vec![0.0; periods],
            repayment: vec![0.0; periods],
            outstanding: vec![0.0; periods],
        }
    }

    pub fn len(&self) -> usize {
        self.drawn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawn.is_empty()
    }

    pub fn total_interest(&self) -> f64 {
        self.interest.iter().sum()
    }

    pub fn total_repaid(&self) -> f64 {
        self.repayment.iter().sum()
    }

    pub fn closing_balance(&self) -> f64 {
        self.outstanding.last().copied().unwrap_or(0.0)
    }

    /// Value at `index`, or zero beyond the facility's maturity.
    pub(crate) fn at(series: &[f64], index: usize) -> f64 {
        series.get(index).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(style: RepaymentStyle) -> LoanFacility {
        LoanFacility {
            principal: 1_000_000.0,
            annual_rate: 0.08,
            term_periods: 24,
            repayment_style: style,
            grace_periods: 2,
        }
    }

    #[test]
    fn every_style_clears_the_balance_by_maturity() {
        for style in RepaymentStyle::ordered() {
            let schedule = facility(style).schedule();
            assert_eq!(schedule.len(), 24);
            assert_eq!(schedule.closing_balance(), 0.0, "{:?}", style);
            assert!(
                schedule.outstanding.iter().all(|balance| *balance >= 0.0),
                "{:?} went negative",
                style
            );
            assert!((schedule.total_repaid() - 1_000_000.0).abs() < 1e-6);
            assert_eq!(schedule.drawn[0], 1_000_000.0);
            assert!(schedule.drawn[1..].iter().all(|draw| *draw == 0.0));
        }
    }

    #[test]
    fn balance_never_increases_once_amortizing() {
        let schedule = facility(RepaymentStyle::EqualInstallment).schedule();
        for window in schedule.outstanding.windows(2) {
            assert!(window[1] <= window[0] + 1e-9);
        }
    }

    #[test]
    fn bullet_repays_only_in_final_period() {
        let schedule = facility(RepaymentStyle::Bullet).schedule();
        assert!(schedule.repayment[..23].iter().all(|value| *value == 0.0));
        assert_eq!(schedule.repayment[23], 1_000_000.0);
        let monthly_interest = 1_000_000.0 * 0.08 / 12.0;
        assert!(schedule
            .interest
            .iter()
            .all(|value| (*value - monthly_interest).abs() < 1e-6));
    }

    #[test]
    fn equal_installments_respect_grace_period() {
        let schedule = facility(RepaymentStyle::EqualInstallment).schedule();
        assert_eq!(schedule.repayment[0], 0.0);
        assert_eq!(schedule.repayment[1], 0.0);
        let installment = 1_000_000.0 / 22.0;
        for value in &schedule.repayment[2..] {
            assert!((value - installment).abs() < 1e-6);
        }
    }

    #[test]
    fn interest_only_matches_bullet_cash_profile() {
        let bullet = facility(RepaymentStyle::Bullet).schedule();
        let interest_only = facility(RepaymentStyle::InterestOnly).schedule();
        assert_eq!(bullet.repayment, interest_only.repayment);
        assert_eq!(bullet.interest, interest_only.interest);
    }

    #[test]
    fn grace_longer_than_term_still_clears_at_maturity() {
        let mut long_grace = facility(RepaymentStyle::EqualInstallment);
        long_grace.grace_periods = 40;
        let schedule = long_grace.schedule();
        assert_eq!(schedule.repayment[23], 1_000_000.0);
        assert_eq!(schedule.closing_balance(), 0.0);
    }

    #[test]
    fn term_is_clamped_to_the_horizon() {
        let terms = LoanTerms {
            principal: 500.0,
            interest_rate_pct: 6.0,
            term_months: 36,
            repayment_style: RepaymentStyle::Bullet,
            grace_period_months: 0,
        };
        assert_eq!(LoanFacility::from_terms(&terms, 12).term_periods, 12);

        let open_ended = LoanTerms {
            term_months: 0,
            ..terms
        };
        assert_eq!(LoanFacility::from_terms(&open_ended, 12).term_periods, 12);
    }

    #[test]
    fn zero_principal_produces_empty_flows() {
        let mut empty = facility(RepaymentStyle::Bullet);
        empty.principal = 0.0;
        let schedule = empty.schedule();
        assert_eq!(schedule.len(), 24);
        assert_eq!(schedule.total_interest(), 0.0);
        assert_eq!(schedule.total_repaid(), 0.0);
    }
}
