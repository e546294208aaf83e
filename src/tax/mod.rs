//! Return computation pipeline: aggregation, set-off stages, special-rate
//! income and the final liability, in statutory order.

pub mod aggregate;
pub mod bfla;
pub mod cg;
pub mod config;
pub mod cyla;
pub mod heads;
pub mod liability;
pub mod special;
pub mod warnings;

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::itr::TaxReturnInput;
use crate::tax::bfla::BflaOutcome;
use crate::tax::cg::CgOutcome;
use crate::tax::config::{AssessmentYear, Regime, TaxConfig};
use crate::tax::cyla::CylaOutcome;
use crate::tax::heads::{HeadwiseIncome, IncomeHead, LossCategory};
use crate::tax::liability::LiabilityBreakdown;
use crate::tax::special::SpecialRateOutcome;
use crate::tax::warnings::Warning;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot parse assessment year '{value}', expected e.g. \"2024-25\"")]
    InvalidAssessmentYear { value: String },
    #[error("{stage} left {head} negative at {amount}")]
    NegativeSetOffResult {
        stage: &'static str,
        head: IncomeHead,
        amount: Decimal,
    },
}

/// Every stage's output for one return, in computation order.
#[derive(Debug, Clone, Serialize)]
pub struct TaxComputation {
    pub assessment_year: AssessmentYear,
    pub regime: Regime,
    /// Signed head-wise snapshot straight from the schedules
    pub headwise: HeadwiseIncome,
    /// Intra-head capital-gains set-off (four passes)
    pub capital_gains: CgOutcome,
    /// Current-year inter-head set-off
    pub cyla: CylaOutcome,
    /// Brought-forward loss set-off
    pub bfla: BflaOutcome,
    /// Flat-rate special income schedule
    pub special: SpecialRateOutcome,
    pub liability: LiabilityBreakdown,
    /// Current-year losses eligible to carry into next year
    pub losses_to_carry_forward: BTreeMap<LossCategory, Decimal>,
    pub warnings: Vec<Warning>,
}

/// Run the whole pipeline for one return document.
///
/// Stage order: aggregate the schedules, set off capital losses within
/// the capital-gains schedule, then current-year inter-head set-off,
/// then brought-forward losses, then price the special-rate buckets and
/// compute the liability on what survives.
pub fn compute(input: &TaxReturnInput) -> Result<TaxComputation, EngineError> {
    let assessment_year = AssessmentYear::parse(&input.assessment_year).ok_or_else(|| {
        EngineError::InvalidAssessmentYear {
            value: input.assessment_year.clone(),
        }
    })?;
    let config = TaxConfig::for_year(assessment_year, input.regime);

    let headwise = aggregate::aggregate(input);
    log::debug!("aggregated head-wise income: {:?}", headwise);

    let capital_gains = cg::apply(&headwise, &config)?;

    // CYLA runs on the schedule after intra-head set-off: gain buckets at
    // their net figures, loss buckets at zero (their remainder carries
    // forward from the capital-gains stage, not from CYLA).
    let mut post_cg = headwise.clone();
    for bucket in &capital_gains.buckets {
        post_cg.set(bucket.head, bucket.net_gain_after_set_off);
    }

    let cyla = cyla::apply(&post_cg)?;
    let bfla = bfla::apply(
        &cyla.income,
        &input.carry_forward_losses,
        assessment_year,
        &config,
    )?;

    let special = special::compute(&bfla.income, input.other_sources.as_ref(), &config);

    // Flat-rate other-sources items live outside the set-off heads, so
    // total income is the post-BFLA head total plus those amounts.
    let total_income = bfla.total_income + special.schedule_income;

    let relief = input.relief.as_ref().map(|r| r.total()).unwrap_or_default();
    let taxes_paid = input
        .taxes_paid
        .as_ref()
        .map(|t| t.total())
        .unwrap_or_default();
    let liability = liability::compute(total_income, &special, relief, taxes_paid, &config);

    let mut losses_to_carry_forward = cyla.loss_remaining.clone();
    if capital_gains.remaining_short_term_loss > Decimal::ZERO {
        *losses_to_carry_forward
            .entry(LossCategory::ShortTermCapital)
            .or_insert(Decimal::ZERO) += capital_gains.remaining_short_term_loss;
    }
    if capital_gains.remaining_long_term_loss > Decimal::ZERO {
        *losses_to_carry_forward
            .entry(LossCategory::LongTermCapital)
            .or_insert(Decimal::ZERO) += capital_gains.remaining_long_term_loss;
    }

    let mut all_warnings = bfla.warnings.clone();
    all_warnings.extend(special.warnings.clone());

    Ok(TaxComputation {
        assessment_year,
        regime: input.regime,
        headwise,
        capital_gains,
        cyla,
        bfla,
        special,
        liability,
        losses_to_carry_forward,
        warnings: all_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itr::{
        CapitalGainsSchedule, CarryForwardLossRecord, HousePropertySchedule, LotteryWinning,
        OtherSourcesSchedule, SalarySchedule, TaxesPaid,
    };
    use rust_decimal_macros::dec;

    fn base_input() -> TaxReturnInput {
        TaxReturnInput {
            assessment_year: "2024-25".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn bad_assessment_year_is_an_error() {
        let mut input = base_input();
        input.assessment_year = "24-25".to_string();
        let err = compute(&input).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAssessmentYear { .. }));
    }

    #[test]
    fn empty_return_owes_nothing() {
        let computation = compute(&base_input()).unwrap();
        assert_eq!(computation.liability.total_income, Decimal::ZERO);
        assert_eq!(computation.liability.net_tax_liability, Decimal::ZERO);
        assert!(computation.warnings.is_empty());
    }

    #[test]
    fn salary_only_return_flows_straight_through() {
        let mut input = base_input();
        input.salary = Some(SalarySchedule {
            net_salary: dec!(1100000),
        });

        let computation = compute(&input).unwrap();
        assert_eq!(computation.liability.total_income, dec!(1100000));
        // 15k + 30k + 30k on the 1.1M new-regime slabs
        assert_eq!(computation.liability.slab_tax, dec!(75000));
        assert_eq!(computation.liability.rebate, Decimal::ZERO);
        assert_eq!(
            computation.liability.net_tax_liability,
            dec!(75000) * dec!(1.04)
        );
    }

    #[test]
    fn intra_head_set_off_runs_before_cyla() {
        // A long-term loss must drain long-term gains inside the schedule
        // before house-property loss gets a shot at them.
        let mut input = base_input();
        input.salary = Some(SalarySchedule {
            net_salary: dec!(1000000),
        });
        input.house_property = Some(HousePropertySchedule {
            net_income: Decimal::ZERO,
            current_year_loss: dec!(50000),
        });
        input.capital_gains = Some(CapitalGainsSchedule {
            ltcg_20: dec!(80000),
            ltcg_10: dec!(-80000),
            ..Default::default()
        });

        let computation = compute(&input).unwrap();
        // LTCG 20% fully absorbed by the LTCG 10% loss, so HP loss lands
        // on salary.
        assert_eq!(
            computation.cyla.income.get(IncomeHead::Salary),
            dec!(950000)
        );
        assert_eq!(
            computation.cyla.income.get(IncomeHead::Ltcg20),
            Decimal::ZERO
        );
        assert_eq!(computation.capital_gains.total_long_term_set_off, dec!(80000));
    }

    #[test]
    fn unabsorbed_losses_reach_the_carry_forward_summary() {
        let mut input = base_input();
        input.capital_gains = Some(CapitalGainsSchedule {
            stcg_15: dec!(-120000),
            ..Default::default()
        });
        input.house_property = Some(HousePropertySchedule {
            net_income: Decimal::ZERO,
            current_year_loss: dec!(250000),
        });

        let computation = compute(&input).unwrap();
        assert_eq!(
            computation
                .losses_to_carry_forward
                .get(&LossCategory::ShortTermCapital),
            Some(&dec!(120000))
        );
        assert_eq!(
            computation
                .losses_to_carry_forward
                .get(&LossCategory::HouseProperty),
            Some(&dec!(250000))
        );
    }

    #[test]
    fn losses_never_drain_flat_rate_winnings() {
        // A house-property loss finds no target when the only other
        // income is lottery winnings: the winnings are taxed in full at
        // the flat rate and the loss carries forward intact.
        let mut input = base_input();
        input.house_property = Some(HousePropertySchedule {
            net_income: Decimal::ZERO,
            current_year_loss: dec!(100000),
        });
        input.other_sources = Some(OtherSourcesSchedule {
            lottery_winnings: vec![LotteryWinning {
                period: "upto 15/6".to_string(),
                amount: dec!(100000),
            }],
            ..Default::default()
        });

        let computation = compute(&input).unwrap();
        assert!(computation.cyla.ledger.is_empty());
        assert_eq!(
            computation
                .losses_to_carry_forward
                .get(&LossCategory::HouseProperty),
            Some(&dec!(100000))
        );
        assert_eq!(computation.liability.total_income, dec!(100000));
        assert_eq!(computation.liability.special_rate_income, dec!(100000));
        assert_eq!(computation.liability.special_rate_tax, dec!(30000));
        assert_eq!(computation.liability.ordinary_income, Decimal::ZERO);
    }

    #[test]
    fn bfla_warnings_surface_at_the_top_level() {
        let mut input = base_input();
        input.carry_forward_losses = vec![CarryForwardLossRecord {
            assessment_year: "2010-11".to_string(),
            house_property_loss: dec!(10000),
            ..Default::default()
        }];

        let computation = compute(&input).unwrap();
        assert_eq!(computation.warnings.len(), 1);
        assert!(matches!(
            computation.warnings[0],
            Warning::InvalidCarryForwardRecord { .. }
        ));
    }

    #[test]
    fn refund_position_reported_as_negative_balance() {
        let mut input = base_input();
        input.salary = Some(SalarySchedule {
            net_salary: dec!(600000),
        });
        input.taxes_paid = Some(TaxesPaid {
            tds: dec!(30000),
            ..Default::default()
        });

        let computation = compute(&input).unwrap();
        // Rebate wipes the liability, so the whole TDS comes back.
        assert_eq!(computation.liability.balance, dec!(-30000));
        assert!(computation.liability.refund_due());
    }
}
