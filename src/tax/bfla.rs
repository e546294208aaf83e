//! Brought-Forward Set-off Engine (BFLA): losses carried from up to
//! eight prior assessment years set off against post-CYLA income.
//!
//! Records are processed oldest first. Within one record the order is
//! fixed: house-property loss, then short-term capital loss, then
//! long-term capital loss, then race-horse loss. Whatever a record's
//! loss cannot absorb lapses here, since the record was already in its
//! final eligible year for the amounts it still carried.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::itr::CarryForwardLossRecord;
use crate::tax::config::{AssessmentYear, TaxConfig};
use crate::tax::heads::{HeadwiseIncome, IncomeHead, LossCategory};
use crate::tax::warnings::Warning;
use crate::tax::EngineError;

/// One utilized brought-forward set-off, tagged with the loss year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BflaSetOff {
    pub loss_year: AssessmentYear,
    pub category: LossCategory,
    pub target: IncomeHead,
    pub amount: Decimal,
}

/// Post-BFLA snapshot plus this stage's ledger.
#[derive(Debug, Clone, Serialize)]
pub struct BflaOutcome {
    /// Post-set-off income per head, all amounts >= 0
    pub income: HeadwiseIncome,
    pub ledger: Vec<BflaSetOff>,
    /// Running total of every amount utilized across all records
    pub total_bf_loss_set_off: Decimal,
    /// Sum of all heads' non-negative post-BFLA amounts
    pub total_income: Decimal,
    pub warnings: Vec<Warning>,
}

/// Apply brought-forward losses to the post-CYLA snapshot.
pub fn apply(
    post_cyla: &HeadwiseIncome,
    records: &[CarryForwardLossRecord],
    current_year: AssessmentYear,
    config: &TaxConfig,
) -> Result<BflaOutcome, EngineError> {
    let mut income = post_cyla.clone();
    let mut ledger: Vec<BflaSetOff> = Vec::new();
    let mut warnings: Vec<Warning> = Vec::new();

    for record in records {
        let Some(loss_year) = AssessmentYear::parse(&record.assessment_year) else {
            warnings.push(Warning::InvalidCarryForwardRecord {
                assessment_year: record.assessment_year.clone(),
                reason: "unparseable assessment year".to_string(),
            });
            continue;
        };
        let years_back = current_year.years_back(loss_year);
        if years_back < 1 || years_back > config.carry_forward_years {
            warnings.push(Warning::InvalidCarryForwardRecord {
                assessment_year: record.assessment_year.clone(),
                reason: format!(
                    "outside the {}-year carry-forward window",
                    config.carry_forward_years
                ),
            });
            continue;
        }

        let race_horse_loss = if record.race_horse_loss > Decimal::ZERO
            && years_back > config.race_horse_years
        {
            warnings.push(Warning::StaleRaceHorseLoss {
                assessment_year: record.assessment_year.clone(),
            });
            Decimal::ZERO
        } else {
            record.race_horse_loss
        };

        apply_category(
            &mut income,
            &mut ledger,
            loss_year,
            LossCategory::HouseProperty,
            record.house_property_loss,
            &hp_targets(config),
        );
        apply_category(
            &mut income,
            &mut ledger,
            loss_year,
            LossCategory::ShortTermCapital,
            record.short_term_capital_loss,
            &stcl_targets(config),
        );
        apply_category(
            &mut income,
            &mut ledger,
            loss_year,
            LossCategory::LongTermCapital,
            record.long_term_capital_loss,
            &config.ltcg_priority,
        );
        apply_category(
            &mut income,
            &mut ledger,
            loss_year,
            LossCategory::RaceHorses,
            race_horse_loss,
            &[IncomeHead::OtherRaceHorses],
        );
    }

    for head in IncomeHead::ALL {
        let amount = income.get(head);
        if amount < Decimal::ZERO {
            return Err(EngineError::NegativeSetOffResult {
                stage: "BFLA",
                head,
                amount,
            });
        }
    }

    let total_bf_loss_set_off = ledger.iter().map(|r| r.amount).sum();
    let total_income = income.total_income();

    Ok(BflaOutcome {
        income,
        ledger,
        total_bf_loss_set_off,
        total_income,
        warnings,
    })
}

/// House-property loss drains same-head income first, then salary, other
/// sources, and finally capital gains (long-term before short-term).
fn hp_targets(config: &TaxConfig) -> Vec<IncomeHead> {
    let mut targets = vec![
        IncomeHead::HouseProperty,
        IncomeHead::Salary,
        IncomeHead::OtherSources,
    ];
    targets.extend(config.ltcg_priority.iter().copied());
    targets.extend(config.stcg_priority.iter().copied());
    targets
}

/// Short-term capital loss drains short-term buckets first, then
/// long-term ones.
fn stcl_targets(config: &TaxConfig) -> Vec<IncomeHead> {
    let mut targets: Vec<IncomeHead> = config.stcg_priority.clone();
    targets.extend(config.ltcg_priority.iter().copied());
    targets
}

fn apply_category(
    income: &mut HeadwiseIncome,
    ledger: &mut Vec<BflaSetOff>,
    loss_year: AssessmentYear,
    category: LossCategory,
    mut loss: Decimal,
    targets: &[IncomeHead],
) {
    if loss <= Decimal::ZERO {
        return;
    }
    for &target in targets {
        if loss.is_zero() {
            break;
        }
        let available = income.get(target);
        if available <= Decimal::ZERO {
            continue;
        }
        let used = loss.min(available);
        income.set(target, available - used);
        loss -= used;
        ledger.push(BflaSetOff {
            loss_year,
            category,
            target,
            amount: used,
        });
        log::debug!(
            "BFLA: AY {} {} loss of {} set off against {}",
            loss_year,
            category,
            used,
            target
        );
    }
    // Anything left lapses: this was the loss's final eligible year.
}
