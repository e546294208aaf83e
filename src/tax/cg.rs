//! Capital-Gains Intra-Head Set-off: ordering rules among the seven
//! capital-gains rate buckets (section 70 analogue).
//!
//! Runs directly on the capital-gains schedule amounts, independent of
//! CYLA/BFLA. Four fixed passes, each drained until the loss source is
//! exhausted or no eligible gain target remains:
//!
//! 1. long-term loss -> long-term gain buckets
//! 2. remaining long-term loss -> short-term gain buckets
//! 3. short-term loss -> short-term gain buckets
//! 4. remaining short-term loss -> long-term gain buckets
//!
//! Target order within a pass comes from the configured priority lists.
//! Pair eligibility is decided by [`set_off_permitted`] and fails closed.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::tax::config::TaxConfig;
use crate::tax::heads::{HeadwiseIncome, IncomeHead};
use crate::tax::EngineError;

/// Source category for the aggregate ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CgLossSource {
    ShortTerm,
    LongTerm,
}

impl std::fmt::Display for CgLossSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CgLossSource::ShortTerm => "Short-Term",
            CgLossSource::LongTerm => "Long-Term",
        };
        write!(f, "{}", s)
    }
}

/// One utilized intra-head set-off, tagged with the pass that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CgSetOff {
    pub pass: u8,
    pub source: IncomeHead,
    pub category: CgLossSource,
    pub target: IncomeHead,
    pub amount: Decimal,
}

/// Per-bucket disclosure record: every bucket's own line must show which
/// source categories reduced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CgBucket {
    pub head: IncomeHead,
    /// Signed schedule amount the bucket started with
    pub original: Decimal,
    /// Short-term loss set off against this bucket's gain
    pub short_term_loss_applied: Decimal,
    /// Long-term loss set off against this bucket's gain
    pub long_term_loss_applied: Decimal,
    /// Gain surviving set-off, never negative
    pub net_gain_after_set_off: Decimal,
    /// Unabsorbed loss eligible for carry-forward to next year
    pub remaining_loss_to_carry: Decimal,
}

/// Outcome of the four-pass intra-head set-off.
#[derive(Debug, Clone, Serialize)]
pub struct CgOutcome {
    /// All seven buckets, in schedule order
    pub buckets: Vec<CgBucket>,
    pub ledger: Vec<CgSetOff>,
    pub total_short_term_set_off: Decimal,
    pub total_long_term_set_off: Decimal,
    /// Sum of per-bucket net gains (only the >= 0 side)
    pub net_capital_gains: Decimal,
    pub remaining_short_term_loss: Decimal,
    pub remaining_long_term_loss: Decimal,
}

/// Whether a loss in `source` may be set off against a gain in `target`.
/// The short-term 15% (STT-paid) bucket's loss is not offered long-term
/// targets; the statute reading there is unsettled, so the pair fails
/// closed.
pub fn set_off_permitted(source: IncomeHead, target: IncomeHead) -> bool {
    if source == target {
        return false;
    }
    if !source.is_capital_gains() || !target.is_capital_gains() {
        return false;
    }
    if source == IncomeHead::Stcg15 && target.is_long_term() {
        return false;
    }
    true
}

const LT_SOURCES: [IncomeHead; 3] = [
    IncomeHead::Ltcg10,
    IncomeHead::Ltcg20,
    IncomeHead::LtcgDtaaRate,
];

const ST_SOURCES: [IncomeHead; 4] = [
    IncomeHead::Stcg15,
    IncomeHead::Stcg30,
    IncomeHead::StcgAppRate,
    IncomeHead::StcgDtaaRate,
];

/// Apply the four-pass set-off over the capital-gains buckets of the
/// given snapshot. Non-capital-gains heads are ignored.
pub fn apply(amounts: &HeadwiseIncome, config: &TaxConfig) -> Result<CgOutcome, EngineError> {
    let mut gains: BTreeMap<IncomeHead, Decimal> = BTreeMap::new();
    let mut losses: BTreeMap<IncomeHead, Decimal> = BTreeMap::new();
    for head in IncomeHead::CAPITAL_GAINS {
        let amount = amounts.get(head);
        if amount >= Decimal::ZERO {
            gains.insert(head, amount);
        } else {
            losses.insert(head, -amount);
        }
    }

    let mut ledger: Vec<CgSetOff> = Vec::new();
    let mut st_applied: BTreeMap<IncomeHead, Decimal> = BTreeMap::new();
    let mut lt_applied: BTreeMap<IncomeHead, Decimal> = BTreeMap::new();

    let passes: [(u8, &[IncomeHead], CgLossSource, &[IncomeHead]); 4] = [
        (1, &LT_SOURCES, CgLossSource::LongTerm, &config.ltcg_priority),
        (2, &LT_SOURCES, CgLossSource::LongTerm, &config.stcg_priority),
        (3, &ST_SOURCES, CgLossSource::ShortTerm, &config.stcg_priority),
        (4, &ST_SOURCES, CgLossSource::ShortTerm, &config.ltcg_priority),
    ];

    for (pass, sources, category, targets) in passes {
        for &source in sources {
            for &target in targets {
                if !set_off_permitted(source, target) {
                    continue;
                }
                let loss = losses.get(&source).copied().unwrap_or(Decimal::ZERO);
                if loss.is_zero() {
                    break;
                }
                let gain = gains.get(&target).copied().unwrap_or(Decimal::ZERO);
                if gain.is_zero() {
                    continue;
                }
                let used = loss.min(gain);
                losses.insert(source, loss - used);
                gains.insert(target, gain - used);
                match category {
                    CgLossSource::ShortTerm => {
                        *st_applied.entry(target).or_insert(Decimal::ZERO) += used
                    }
                    CgLossSource::LongTerm => {
                        *lt_applied.entry(target).or_insert(Decimal::ZERO) += used
                    }
                }
                ledger.push(CgSetOff {
                    pass,
                    source,
                    category,
                    target,
                    amount: used,
                });
                log::debug!(
                    "CG pass {}: {} loss of {} set off against {}",
                    pass,
                    source,
                    used,
                    target
                );
            }
        }
    }

    let mut buckets = Vec::with_capacity(IncomeHead::CAPITAL_GAINS.len());
    let mut net_capital_gains = Decimal::ZERO;
    let mut remaining_short_term_loss = Decimal::ZERO;
    let mut remaining_long_term_loss = Decimal::ZERO;

    for head in IncomeHead::CAPITAL_GAINS {
        let original = amounts.get(head);
        let net = gains.get(&head).copied().unwrap_or(Decimal::ZERO);
        let remaining = losses.get(&head).copied().unwrap_or(Decimal::ZERO);
        if net < Decimal::ZERO {
            return Err(EngineError::NegativeSetOffResult {
                stage: "CG intra-head",
                head,
                amount: net,
            });
        }
        net_capital_gains += net;
        if head.is_short_term() {
            remaining_short_term_loss += remaining;
        } else {
            remaining_long_term_loss += remaining;
        }
        buckets.push(CgBucket {
            head,
            original,
            short_term_loss_applied: st_applied.get(&head).copied().unwrap_or(Decimal::ZERO),
            long_term_loss_applied: lt_applied.get(&head).copied().unwrap_or(Decimal::ZERO),
            net_gain_after_set_off: net,
            remaining_loss_to_carry: remaining,
        });
    }

    let total_short_term_set_off = ledger
        .iter()
        .filter(|r| r.category == CgLossSource::ShortTerm)
        .map(|r| r.amount)
        .sum();
    let total_long_term_set_off = ledger
        .iter()
        .filter(|r| r.category == CgLossSource::LongTerm)
        .map(|r| r.amount)
        .sum();

    Ok(CgOutcome {
        buckets,
        ledger,
        total_short_term_set_off,
        total_long_term_set_off,
        net_capital_gains,
        remaining_short_term_loss,
        remaining_long_term_loss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::config::{AssessmentYear, Regime};
    use rust_decimal_macros::dec;

    fn config() -> TaxConfig {
        TaxConfig::for_year(AssessmentYear(2024), Regime::New)
    }

    fn snapshot(entries: &[(IncomeHead, Decimal)]) -> HeadwiseIncome {
        let mut income = HeadwiseIncome::new();
        for (head, amount) in entries {
            income.set(*head, *amount);
        }
        income
    }

    fn bucket(outcome: &CgOutcome, head: IncomeHead) -> &CgBucket {
        outcome.buckets.iter().find(|b| b.head == head).unwrap()
    }

    #[test]
    fn all_gain_input_is_a_no_op() {
        let amounts = snapshot(&[
            (IncomeHead::Stcg15, dec!(50000)),
            (IncomeHead::Ltcg10, dec!(100000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        assert!(outcome.ledger.is_empty());
        assert_eq!(outcome.net_capital_gains, dec!(150000));
        assert_eq!(outcome.remaining_short_term_loss, Decimal::ZERO);
        assert_eq!(outcome.remaining_long_term_loss, Decimal::ZERO);
        assert_eq!(
            bucket(&outcome, IncomeHead::Stcg15).net_gain_after_set_off,
            dec!(50000)
        );
    }

    #[test]
    fn long_term_loss_prefers_ltcg_20_target() {
        let amounts = snapshot(&[
            (IncomeHead::Ltcg10, dec!(-30000)),
            (IncomeHead::Ltcg20, dec!(40000)),
            (IncomeHead::LtcgDtaaRate, dec!(10000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        assert_eq!(
            outcome.ledger,
            vec![CgSetOff {
                pass: 1,
                source: IncomeHead::Ltcg10,
                category: CgLossSource::LongTerm,
                target: IncomeHead::Ltcg20,
                amount: dec!(30000),
            }]
        );
        assert_eq!(
            bucket(&outcome, IncomeHead::Ltcg20).net_gain_after_set_off,
            dec!(10000)
        );
        assert_eq!(outcome.net_capital_gains, dec!(20000));
    }

    #[test]
    fn long_term_loss_spills_into_short_term_buckets() {
        let amounts = snapshot(&[
            (IncomeHead::Ltcg20, dec!(-50000)),
            (IncomeHead::Ltcg10, dec!(20000)),
            (IncomeHead::StcgAppRate, dec!(10000)),
            (IncomeHead::Stcg15, dec!(40000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        // Pass 1: 20k against LTCG 10%; pass 2: app-rate first, then 15%.
        assert_eq!(outcome.ledger.len(), 3);
        assert_eq!(outcome.ledger[0].target, IncomeHead::Ltcg10);
        assert_eq!(outcome.ledger[1].target, IncomeHead::StcgAppRate);
        assert_eq!(outcome.ledger[1].pass, 2);
        assert_eq!(outcome.ledger[2].target, IncomeHead::Stcg15);
        assert_eq!(outcome.ledger[2].amount, dec!(20000));
        assert_eq!(
            bucket(&outcome, IncomeHead::Stcg15).long_term_loss_applied,
            dec!(20000)
        );
        assert_eq!(outcome.remaining_long_term_loss, Decimal::ZERO);
        assert_eq!(outcome.net_capital_gains, dec!(20000));
    }

    #[test]
    fn short_term_loss_prefers_short_term_targets() {
        let amounts = snapshot(&[
            (IncomeHead::Stcg30, dec!(-25000)),
            (IncomeHead::StcgAppRate, dec!(10000)),
            (IncomeHead::Ltcg20, dec!(100000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        // Pass 3 takes the app-rate gain first, pass 4 the long-term one.
        assert_eq!(outcome.ledger.len(), 2);
        assert_eq!(outcome.ledger[0].pass, 3);
        assert_eq!(outcome.ledger[0].target, IncomeHead::StcgAppRate);
        assert_eq!(outcome.ledger[0].amount, dec!(10000));
        assert_eq!(outcome.ledger[1].pass, 4);
        assert_eq!(outcome.ledger[1].target, IncomeHead::Ltcg20);
        assert_eq!(outcome.ledger[1].amount, dec!(15000));
        assert_eq!(outcome.remaining_short_term_loss, Decimal::ZERO);
    }

    #[test]
    fn stcg_15_loss_never_offsets_long_term_gain() {
        let amounts = snapshot(&[
            (IncomeHead::Stcg15, dec!(-30000)),
            (IncomeHead::Ltcg20, dec!(100000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        assert!(outcome.ledger.is_empty());
        assert_eq!(
            bucket(&outcome, IncomeHead::Ltcg20).net_gain_after_set_off,
            dec!(100000)
        );
        assert_eq!(
            bucket(&outcome, IncomeHead::Stcg15).remaining_loss_to_carry,
            dec!(30000)
        );
        assert_eq!(outcome.remaining_short_term_loss, dec!(30000));
    }

    #[test]
    fn stcg_15_loss_still_offsets_short_term_gain() {
        let amounts = snapshot(&[
            (IncomeHead::Stcg15, dec!(-30000)),
            (IncomeHead::Stcg30, dec!(50000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        assert_eq!(outcome.ledger.len(), 1);
        assert_eq!(outcome.ledger[0].target, IncomeHead::Stcg30);
        assert_eq!(
            bucket(&outcome, IncomeHead::Stcg30).short_term_loss_applied,
            dec!(30000)
        );
        assert_eq!(outcome.net_capital_gains, dec!(20000));
    }

    #[test]
    fn loss_never_targets_its_own_bucket() {
        // A bucket cannot be both gain and loss, but the permitted table
        // must still exclude the self pair.
        assert!(!set_off_permitted(IncomeHead::Ltcg10, IncomeHead::Ltcg10));
        assert!(set_off_permitted(IncomeHead::Ltcg10, IncomeHead::Ltcg20));
        assert!(!set_off_permitted(IncomeHead::Salary, IncomeHead::Ltcg20));
    }

    #[test]
    fn mixed_losses_partial_absorption() {
        let amounts = snapshot(&[
            (IncomeHead::Ltcg10, dec!(-80000)),
            (IncomeHead::Stcg30, dec!(-40000)),
            (IncomeHead::Ltcg20, dec!(50000)),
            (IncomeHead::StcgAppRate, dec!(30000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        // LT loss: 50k vs LTCG20 (pass 1), 30k vs app-rate (pass 2).
        // ST loss finds nothing left: 40k carried.
        assert_eq!(outcome.total_long_term_set_off, dec!(80000));
        assert_eq!(outcome.total_short_term_set_off, Decimal::ZERO);
        assert_eq!(outcome.net_capital_gains, Decimal::ZERO);
        assert_eq!(outcome.remaining_short_term_loss, dec!(40000));
        assert_eq!(outcome.remaining_long_term_loss, Decimal::ZERO);
    }

    #[test]
    fn conservation_of_amounts() {
        let amounts = snapshot(&[
            (IncomeHead::Stcg15, dec!(25000)),
            (IncomeHead::Stcg30, dec!(-40000)),
            (IncomeHead::Ltcg10, dec!(-80000)),
            (IncomeHead::Ltcg20, dec!(70000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        let set_off: Decimal = outcome.ledger.iter().map(|r| r.amount).sum();
        let pre_gain = dec!(25000) + dec!(70000);
        let pre_loss = dec!(40000) + dec!(80000);

        assert_eq!(outcome.net_capital_gains, pre_gain - set_off);
        assert_eq!(
            outcome.remaining_short_term_loss + outcome.remaining_long_term_loss,
            pre_loss - set_off
        );
    }

    #[test]
    fn per_bucket_breakdown_sums_to_ledger() {
        let amounts = snapshot(&[
            (IncomeHead::Stcg30, dec!(-15000)),
            (IncomeHead::Ltcg10, dec!(-20000)),
            (IncomeHead::StcgAppRate, dec!(50000)),
        ]);

        let outcome = apply(&amounts, &config()).unwrap();
        let app_rate = bucket(&outcome, IncomeHead::StcgAppRate);
        assert_eq!(app_rate.short_term_loss_applied, dec!(15000));
        assert_eq!(app_rate.long_term_loss_applied, dec!(20000));
        assert_eq!(app_rate.net_gain_after_set_off, dec!(15000));

        let total_applied: Decimal = outcome
            .buckets
            .iter()
            .map(|b| b.short_term_loss_applied + b.long_term_loss_applied)
            .sum();
        let ledger_total: Decimal = outcome.ledger.iter().map(|r| r.amount).sum();
        assert_eq!(total_applied, ledger_total);
    }
}
