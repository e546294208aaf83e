//! Income Aggregator: per-head schedules to one signed amount per bucket.
//!
//! Pure extraction and sign normalization; no set-off logic lives here.
//! Loss schedules store losses as positive magnitudes, so this stage is
//! where "loss" becomes "amount < 0" for every later stage.

use rust_decimal::Decimal;

use crate::itr::TaxReturnInput;
use crate::tax::heads::{HeadwiseIncome, IncomeHead};

/// Build the headwise income/loss snapshot from the populated schedules.
/// Absent schedules contribute zero.
pub fn aggregate(input: &TaxReturnInput) -> HeadwiseIncome {
    let mut income = HeadwiseIncome::new();

    if let Some(salary) = &input.salary {
        // Salary cannot be a loss; a negative net figure is clamped.
        income.set(
            IncomeHead::Salary,
            salary.net_salary.max(Decimal::ZERO),
        );
    }

    if let Some(hp) = &input.house_property {
        income.set(
            IncomeHead::HouseProperty,
            hp.net_income - hp.current_year_loss,
        );
    }

    if let Some(cg) = &input.capital_gains {
        income.set(IncomeHead::Stcg15, cg.stcg_15);
        income.set(IncomeHead::Stcg30, cg.stcg_30);
        income.set(IncomeHead::StcgAppRate, cg.stcg_applicable_rate);
        income.set(IncomeHead::StcgDtaaRate, cg.stcg_dtaa_rate);
        income.set(IncomeHead::Ltcg10, cg.ltcg_10);
        income.set(IncomeHead::Ltcg20, cg.ltcg_20);
        income.set(IncomeHead::LtcgDtaaRate, cg.ltcg_dtaa_rate);
    }

    if let Some(os) = &input.other_sources {
        // Lottery, VDA and DTAA dividend stay out of this head: they are
        // flat-rate items no loss may be set off against, priced by the
        // special-rate calculator and added back to total income there.
        income.set(IncomeHead::OtherSources, os.net_income);
        income.set(IncomeHead::OtherRaceHorses, os.race_horse_income);
    }

    income
}
