use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A statutory income bucket ("head" of income, subdivided by tax rate
/// where the rate drives set-off eligibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeHead {
    Salary,
    HouseProperty,
    /// STT-paid short-term capital gains taxed at 15% (section 111A)
    Stcg15,
    /// Short-term capital gains taxed at 30%
    Stcg30,
    /// Short-term capital gains taxed at the applicable slab rate
    StcgAppRate,
    /// Short-term capital gains taxed at a DTAA treaty rate
    StcgDtaaRate,
    /// Long-term capital gains taxed at 10% (section 112A)
    Ltcg10,
    /// Long-term capital gains taxed at 20% (section 112)
    Ltcg20,
    /// Long-term capital gains taxed at a DTAA treaty rate
    LtcgDtaaRate,
    /// Income from other sources, excluding race horses
    OtherSources,
    /// Income from owning and maintaining race horses
    OtherRaceHorses,
}

impl IncomeHead {
    pub const ALL: [IncomeHead; 11] = [
        IncomeHead::Salary,
        IncomeHead::HouseProperty,
        IncomeHead::Stcg15,
        IncomeHead::Stcg30,
        IncomeHead::StcgAppRate,
        IncomeHead::StcgDtaaRate,
        IncomeHead::Ltcg10,
        IncomeHead::Ltcg20,
        IncomeHead::LtcgDtaaRate,
        IncomeHead::OtherSources,
        IncomeHead::OtherRaceHorses,
    ];

    /// The seven capital-gains rate buckets, short-term first.
    pub const CAPITAL_GAINS: [IncomeHead; 7] = [
        IncomeHead::Stcg15,
        IncomeHead::Stcg30,
        IncomeHead::StcgAppRate,
        IncomeHead::StcgDtaaRate,
        IncomeHead::Ltcg10,
        IncomeHead::Ltcg20,
        IncomeHead::LtcgDtaaRate,
    ];

    pub fn is_short_term(&self) -> bool {
        matches!(
            self,
            IncomeHead::Stcg15
                | IncomeHead::Stcg30
                | IncomeHead::StcgAppRate
                | IncomeHead::StcgDtaaRate
        )
    }

    pub fn is_long_term(&self) -> bool {
        matches!(
            self,
            IncomeHead::Ltcg10 | IncomeHead::Ltcg20 | IncomeHead::LtcgDtaaRate
        )
    }

    pub fn is_capital_gains(&self) -> bool {
        self.is_short_term() || self.is_long_term()
    }

    /// The carry-forward category a loss in this head belongs to.
    pub fn loss_category(&self) -> LossCategory {
        match self {
            IncomeHead::Salary => LossCategory::Salary,
            IncomeHead::HouseProperty => LossCategory::HouseProperty,
            h if h.is_short_term() => LossCategory::ShortTermCapital,
            h if h.is_long_term() => LossCategory::LongTermCapital,
            IncomeHead::OtherSources => LossCategory::OtherSources,
            _ => LossCategory::RaceHorses,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            IncomeHead::Salary => "Salary",
            IncomeHead::HouseProperty => "House Property",
            IncomeHead::Stcg15 => "STCG 15%",
            IncomeHead::Stcg30 => "STCG 30%",
            IncomeHead::StcgAppRate => "STCG App. Rate",
            IncomeHead::StcgDtaaRate => "STCG DTAA Rate",
            IncomeHead::Ltcg10 => "LTCG 10%",
            IncomeHead::Ltcg20 => "LTCG 20%",
            IncomeHead::LtcgDtaaRate => "LTCG DTAA Rate",
            IncomeHead::OtherSources => "Other Sources",
            IncomeHead::OtherRaceHorses => "Race Horses",
        }
    }
}

impl std::fmt::Display for IncomeHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Loss category as tracked across years and in set-off ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LossCategory {
    Salary,
    HouseProperty,
    ShortTermCapital,
    LongTermCapital,
    OtherSources,
    RaceHorses,
}

impl std::fmt::Display for LossCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LossCategory::Salary => "Salary",
            LossCategory::HouseProperty => "House Property",
            LossCategory::ShortTermCapital => "Short-Term Capital",
            LossCategory::LongTermCapital => "Long-Term Capital",
            LossCategory::OtherSources => "Other Sources",
            LossCategory::RaceHorses => "Race Horses",
        };
        write!(f, "{}", s)
    }
}

/// One signed amount per income bucket. Negative means loss. Absent heads
/// are zero. Every pipeline stage returns a fresh snapshot; inputs are
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadwiseIncome {
    amounts: BTreeMap<IncomeHead, Decimal>,
}

impl HeadwiseIncome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, head: IncomeHead) -> Decimal {
        self.amounts.get(&head).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, head: IncomeHead, amount: Decimal) {
        if amount.is_zero() {
            self.amounts.remove(&head);
        } else {
            self.amounts.insert(head, amount);
        }
    }

    pub fn add(&mut self, head: IncomeHead, amount: Decimal) {
        let updated = self.get(head) + amount;
        self.set(head, updated);
    }

    /// Sum over all heads, signed.
    pub fn total(&self) -> Decimal {
        self.amounts.values().sum()
    }

    /// Sum of the non-negative amounts only.
    pub fn total_income(&self) -> Decimal {
        self.amounts
            .values()
            .filter(|v| **v > Decimal::ZERO)
            .sum()
    }

    /// Sum of loss magnitudes (the negative amounts, as positive values).
    pub fn total_loss(&self) -> Decimal {
        -self
            .amounts
            .values()
            .filter(|v| **v < Decimal::ZERO)
            .sum::<Decimal>()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IncomeHead, Decimal)> + '_ {
        self.amounts.iter().map(|(h, v)| (*h, *v))
    }

    pub fn heads_with_loss(&self) -> Vec<IncomeHead> {
        IncomeHead::ALL
            .iter()
            .copied()
            .filter(|h| self.get(*h) < Decimal::ZERO)
            .collect()
    }
}

/// One utilized set-off: `amount` of loss from `source` absorbed by income
/// in `target`. Each pipeline stage keeps its own ledger of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetOffRecord {
    pub source: IncomeHead,
    pub target: IncomeHead,
    pub amount: Decimal,
}
