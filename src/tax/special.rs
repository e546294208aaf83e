//! Special-Rate Income Calculator (SI): flat-rate tax for the statutory
//! special-rate categories, read from the post-BFLA snapshot (or the
//! post-CYLA one when BFLA did not run).
//!
//! The 112A exemption applies to the tax computation only; the disclosed
//! gross amount stays at the full bucket value.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::itr::OtherSourcesSchedule;
use crate::tax::config::{sections, TaxConfig};
use crate::tax::heads::{HeadwiseIncome, IncomeHead};
use crate::tax::warnings::Warning;

/// One special-rate line: (section code, gross amount, rate, tax).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialRateBucket {
    pub section: String,
    pub gross: Decimal,
    pub rate: Decimal,
    pub tax: Decimal,
}

/// The special-income schedule plus its totals.
#[derive(Debug, Clone, Serialize)]
pub struct SpecialRateOutcome {
    /// Buckets in detection order
    pub buckets: Vec<SpecialRateBucket>,
    pub total_special_income: Decimal,
    pub total_special_tax: Decimal,
    /// Income read from the other-sources schedule rather than the
    /// head-wise snapshot. Not part of any set-off head, so it must be
    /// added to total income by the caller. Counted even when a section
    /// has no configured rate (the amount is then slab-taxed).
    pub schedule_income: Decimal,
    pub warnings: Vec<Warning>,
}

impl SpecialRateOutcome {
    /// Tax attributable to the given sections (for surcharge capping).
    pub fn tax_for_sections(&self, sections: &[&str]) -> Decimal {
        self.buckets
            .iter()
            .filter(|b| sections.contains(&b.section.as_str()))
            .map(|b| b.tax)
            .sum()
    }
}

/// Compute the special-rate schedule from the post-set-off snapshot and
/// the other-sources detail.
pub fn compute(
    income: &HeadwiseIncome,
    other_sources: Option<&OtherSourcesSchedule>,
    config: &TaxConfig,
) -> SpecialRateOutcome {
    let mut builder = Builder {
        config,
        buckets: Vec::new(),
        warnings: Vec::new(),
    };

    builder.flat(sections::STCG_111A, income.get(IncomeHead::Stcg15));
    builder.with_exemption(
        sections::LTCG_112A,
        income.get(IncomeHead::Ltcg10),
        config.ltcg10_exemption,
    );
    builder.flat(sections::LTCG_112, income.get(IncomeHead::Ltcg20));
    builder.flat(sections::LTCG_FOREIGN, income.get(IncomeHead::LtcgDtaaRate));

    let mut schedule_income = Decimal::ZERO;
    if let Some(os) = other_sources {
        let lottery: Decimal = os.lottery_winnings.iter().map(|w| w.amount).sum();
        schedule_income += lottery.max(Decimal::ZERO);
        schedule_income += os.vda_income.max(Decimal::ZERO);
        builder.flat(sections::LOTTERY_115BB, lottery);
        builder.flat(sections::VDA_115BBH, os.vda_income);
        if let Some(dividend) = &os.dtaa_dividend {
            schedule_income += dividend.amount.max(Decimal::ZERO);
            builder.with_rate_override(
                sections::DTAA_DIVIDEND,
                dividend.amount,
                dividend.treaty_rate,
            );
        }
    }

    let total_special_income = builder.buckets.iter().map(|b| b.gross).sum();
    let total_special_tax = builder.buckets.iter().map(|b| b.tax).sum();

    SpecialRateOutcome {
        buckets: builder.buckets,
        total_special_income,
        total_special_tax,
        schedule_income,
        warnings: builder.warnings,
    }
}

struct Builder<'a> {
    config: &'a TaxConfig,
    buckets: Vec<SpecialRateBucket>,
    warnings: Vec<Warning>,
}

impl Builder<'_> {
    fn flat(&mut self, section: &str, gross: Decimal) {
        self.push(section, gross, Decimal::ZERO, None);
    }

    fn with_exemption(&mut self, section: &str, gross: Decimal, exemption: Decimal) {
        self.push(section, gross, exemption, None);
    }

    fn with_rate_override(&mut self, section: &str, gross: Decimal, rate: Option<Decimal>) {
        self.push(section, gross, Decimal::ZERO, rate);
    }

    fn push(
        &mut self,
        section: &str,
        gross: Decimal,
        exemption: Decimal,
        rate_override: Option<Decimal>,
    ) {
        if gross <= Decimal::ZERO {
            return;
        }
        let rate = match rate_override.or_else(|| self.config.special_rate(section)) {
            Some(rate) => rate,
            None => {
                // Conservative: left in ordinary income, taxed at slab.
                self.warnings.push(Warning::UnknownSpecialRateSection {
                    section: section.to_string(),
                });
                return;
            }
        };
        let taxable = (gross - exemption).max(Decimal::ZERO);
        self.buckets.push(SpecialRateBucket {
            section: section.to_string(),
            gross,
            rate,
            tax: taxable * rate,
        });
    }
}
