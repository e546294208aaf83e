//! Current-Year Set-off Engine (CYLA): inter-head loss adjustment using
//! only the current year's figures (section 71 analogue).
//!
//! The permitted source-to-target pairs are encoded explicitly in
//! [`permitted_targets`]; anything not listed fails closed: the loss is
//! not set off and becomes "loss remaining" for its category instead.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::tax::heads::{HeadwiseIncome, IncomeHead, LossCategory, SetOffRecord};
use crate::tax::EngineError;

/// Post-CYLA snapshot plus this stage's ledger and loss totals.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CylaOutcome {
    /// Post-set-off income per head, all amounts >= 0
    pub income: HeadwiseIncome,
    pub ledger: Vec<SetOffRecord>,
    /// Loss magnitude each head started the year with
    pub loss_generated: BTreeMap<IncomeHead, Decimal>,
    /// Total loss absorbed per receiving head
    pub loss_absorbed: BTreeMap<IncomeHead, Decimal>,
    /// Loss not set off this year, per category
    pub loss_remaining: BTreeMap<LossCategory, Decimal>,
}

/// Inter-head targets a current-year loss from `source` may be set off
/// against, in application order. Heads absent here (capital-gains
/// buckets, race horses, salary) may not cross into other heads: capital
/// losses stay within the capital-gains schedule and race-horse losses
/// stay with race horses.
fn permitted_targets(source: IncomeHead) -> &'static [IncomeHead] {
    const HP_TARGETS: &[IncomeHead] = &[
        IncomeHead::Salary,
        IncomeHead::OtherSources,
        IncomeHead::Ltcg20,
        IncomeHead::Ltcg10,
        IncomeHead::LtcgDtaaRate,
        IncomeHead::StcgAppRate,
        IncomeHead::Stcg15,
        IncomeHead::Stcg30,
        IncomeHead::StcgDtaaRate,
        IncomeHead::OtherRaceHorses,
    ];
    const OS_TARGETS: &[IncomeHead] = &[
        IncomeHead::Salary,
        IncomeHead::HouseProperty,
        IncomeHead::Ltcg20,
        IncomeHead::Ltcg10,
        IncomeHead::LtcgDtaaRate,
        IncomeHead::StcgAppRate,
        IncomeHead::Stcg15,
        IncomeHead::Stcg30,
        IncomeHead::StcgDtaaRate,
        IncomeHead::OtherRaceHorses,
    ];
    match source {
        IncomeHead::HouseProperty => HP_TARGETS,
        IncomeHead::OtherSources => OS_TARGETS,
        _ => &[],
    }
}

/// Source heads are drained in this order; house-property loss moves
/// before other-sources loss.
const SOURCE_ORDER: [IncomeHead; 2] = [IncomeHead::HouseProperty, IncomeHead::OtherSources];

/// Apply current-year inter-head set-off. Returns a fresh snapshot where
/// every head is non-negative.
pub fn apply(current: &HeadwiseIncome) -> Result<CylaOutcome, EngineError> {
    let mut post = current.clone();
    let mut ledger = Vec::new();
    let mut loss_generated = BTreeMap::new();
    let mut loss_absorbed: BTreeMap<IncomeHead, Decimal> = BTreeMap::new();
    let mut loss_remaining: BTreeMap<LossCategory, Decimal> = BTreeMap::new();

    for head in IncomeHead::ALL {
        let amount = current.get(head);
        if amount < Decimal::ZERO {
            loss_generated.insert(head, -amount);
        }
    }

    // Cross-head sources first, in fixed order.
    for source in SOURCE_ORDER {
        let mut loss = -post.get(source).min(Decimal::ZERO);
        if loss.is_zero() {
            continue;
        }
        post.set(source, Decimal::ZERO);

        for &target in permitted_targets(source) {
            if loss.is_zero() {
                break;
            }
            let available = post.get(target);
            if available <= Decimal::ZERO {
                continue;
            }
            let used = loss.min(available);
            post.set(target, available - used);
            loss -= used;
            *loss_absorbed.entry(target).or_insert(Decimal::ZERO) += used;
            ledger.push(SetOffRecord {
                source,
                target,
                amount: used,
            });
            log::debug!(
                "CYLA: {} loss of {} set off against {}",
                source,
                used,
                target
            );
        }

        if loss > Decimal::ZERO {
            *loss_remaining
                .entry(source.loss_category())
                .or_insert(Decimal::ZERO) += loss;
        }
    }

    // Remaining losses have no permitted cross-head target; the bucket is
    // zeroed and the full amount carried as loss remaining.
    for head in IncomeHead::ALL {
        let amount = post.get(head);
        if amount < Decimal::ZERO {
            post.set(head, Decimal::ZERO);
            *loss_remaining
                .entry(head.loss_category())
                .or_insert(Decimal::ZERO) += -amount;
        }
    }

    for head in IncomeHead::ALL {
        let amount = post.get(head);
        if amount < Decimal::ZERO {
            return Err(EngineError::NegativeSetOffResult {
                stage: "CYLA",
                head,
                amount,
            });
        }
    }

    Ok(CylaOutcome {
        income: post,
        ledger,
        loss_generated,
        loss_absorbed,
        loss_remaining,
    })
}
