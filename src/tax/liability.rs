//! Tax Liability Computer: slab tax on residual ordinary income plus
//! special-rate tax, then rebate, surcharge (tiered, with the 15% cap on
//! capital-gains/dividend sections and marginal relief at bracket
//! boundaries), cess, relief, and the final refund-or-payable balance.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::tax::config::{TaxConfig, TaxSlab};
use crate::tax::special::SpecialRateOutcome;

/// Full liability breakdown, one figure per computation step.
#[derive(Debug, Clone, Serialize)]
pub struct LiabilityBreakdown {
    pub total_income: Decimal,
    pub special_rate_income: Decimal,
    /// Total income minus special-rate income, floored at zero
    pub ordinary_income: Decimal,
    pub slab_tax: Decimal,
    pub special_rate_tax: Decimal,
    pub gross_tax_before_rebate: Decimal,
    pub rebate: Decimal,
    pub tax_after_rebate: Decimal,
    pub surcharge_rate: Decimal,
    /// Surcharge after capping and marginal relief
    pub surcharge: Decimal,
    pub marginal_relief: Decimal,
    pub cess: Decimal,
    pub gross_tax_liability: Decimal,
    pub relief: Decimal,
    pub net_tax_liability: Decimal,
    pub taxes_paid: Decimal,
    /// Negative means refund due, positive means balance payable
    pub balance: Decimal,
}

impl LiabilityBreakdown {
    pub fn refund_due(&self) -> bool {
        self.balance < Decimal::ZERO
    }
}

/// Progressive tax over the slab table: each marginal band
/// `[previous upper, this upper)` is taxed at its own rate.
pub fn slab_tax(income: Decimal, slabs: &[TaxSlab]) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut lower = Decimal::ZERO;
    for slab in slabs {
        let span_top = match slab.upper {
            Some(upper) => income.min(upper),
            None => income,
        };
        if span_top > lower {
            tax += (span_top - lower) * slab.rate;
        }
        match slab.upper {
            Some(upper) if income > upper => lower = upper,
            _ => break,
        }
    }
    tax
}

/// Tiered surcharge with the capped-rate carve-out: when the bracket
/// rate exceeds the cap, tax attributable to the capped sections bears
/// surcharge at the cap rate and only the rest bears the full rate.
fn surcharge_with_cap(
    tax: Decimal,
    capped_tax: Decimal,
    rate: Decimal,
    config: &TaxConfig,
) -> Decimal {
    if rate <= config.surcharge_cap_rate {
        return tax * rate;
    }
    let capped = capped_tax.min(tax);
    capped * config.surcharge_cap_rate + (tax - capped) * rate
}

/// Compute the final liability from the post-set-off total income and
/// the special-rate schedule.
pub fn compute(
    total_income: Decimal,
    special: &SpecialRateOutcome,
    relief: Decimal,
    taxes_paid: Decimal,
    config: &TaxConfig,
) -> LiabilityBreakdown {
    let special_rate_income = special.total_special_income;
    let special_rate_tax = special.total_special_tax;
    let ordinary_income = (total_income - special_rate_income).max(Decimal::ZERO);

    let slab = slab_tax(ordinary_income, &config.slabs);
    let gross_tax_before_rebate = slab + special_rate_tax;

    let rebate = if total_income <= config.rebate.income_limit {
        gross_tax_before_rebate.min(config.rebate.max_rebate)
    } else {
        Decimal::ZERO
    };
    let tax_after_rebate = gross_tax_before_rebate - rebate;

    let surcharge_rate = config.surcharge_rate(total_income);
    let capped_tax = special.tax_for_sections(&config.surcharge_capped_sections);
    let surcharge_raw = surcharge_with_cap(tax_after_rebate, capped_tax, surcharge_rate, config);

    // Marginal relief: tax plus surcharge may not exceed what would be
    // owed at the bracket's lower bound by more than the income in
    // excess of that bound.
    let marginal_relief = if surcharge_rate > Decimal::ZERO {
        let floor = config.surcharge_bracket_floor(total_income);
        let excess_income = total_income - floor;
        let ordinary_at_floor = (ordinary_income - excess_income).max(Decimal::ZERO);
        let tax_at_floor = slab_tax(ordinary_at_floor, &config.slabs) + special_rate_tax;
        let rate_at_floor = config.surcharge_rate(floor);
        let surcharge_at_floor =
            surcharge_with_cap(tax_at_floor, capped_tax, rate_at_floor, config);
        ((tax_after_rebate + surcharge_raw) - (tax_at_floor + surcharge_at_floor + excess_income))
            .max(Decimal::ZERO)
            .min(surcharge_raw)
    } else {
        Decimal::ZERO
    };
    let surcharge = surcharge_raw - marginal_relief;

    let cess = config.cess_rate * (tax_after_rebate + surcharge);
    let gross_tax_liability = tax_after_rebate + surcharge + cess;
    let net_tax_liability = (gross_tax_liability - relief).max(Decimal::ZERO);
    let balance = net_tax_liability - taxes_paid;

    log::debug!(
        "liability: slab={} special={} rebate={} surcharge={} cess={} net={}",
        slab,
        special_rate_tax,
        rebate,
        surcharge,
        cess,
        net_tax_liability
    );

    LiabilityBreakdown {
        total_income,
        special_rate_income,
        ordinary_income,
        slab_tax: slab,
        special_rate_tax,
        gross_tax_before_rebate,
        rebate,
        tax_after_rebate,
        surcharge_rate,
        surcharge,
        marginal_relief,
        cess,
        gross_tax_liability,
        relief,
        net_tax_liability,
        taxes_paid,
        balance,
    }
}
