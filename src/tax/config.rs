use crate::tax::heads::IncomeHead;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Statutory section codes used for special-rate income buckets.
pub mod sections {
    /// STT-paid short-term capital gains, flat 15%
    pub const STCG_111A: &str = "111A";
    /// Listed-equity long-term capital gains, flat 10% above the exemption
    pub const LTCG_112A: &str = "112A";
    /// Other long-term capital gains, flat 20%
    pub const LTCG_112: &str = "112";
    /// Long-term gains on unlisted/foreign assets without indexation, 10%
    pub const LTCG_FOREIGN: &str = "112(1)(c)(iii)";
    /// Lottery, gambling and games winnings, flat 30%
    pub const LOTTERY_115BB: &str = "115BB";
    /// Virtual digital asset income, flat 30%
    pub const VDA_115BBH: &str = "115BBH";
    /// Dividend taxed at a DTAA treaty rate
    pub const DTAA_DIVIDEND: &str = "DTAA-DIV";
}

/// Indian Assessment Year (runs 1 April to 31 March). The value is the
/// starting calendar year, e.g. 2024 for AY 2024-25.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssessmentYear(pub i32);

impl AssessmentYear {
    /// Parse "2024-25" (or a bare "2024") into an assessment year. The
    /// two-digit suffix must name the following year.
    pub fn parse(s: &str) -> Option<AssessmentYear> {
        let mut parts = s.splitn(2, '-');
        let start = parts.next()?;
        let year: i32 = start.trim().parse().ok()?;
        if !(1961..=2100).contains(&year) {
            return None;
        }
        if let Some(end) = parts.next() {
            let end: i32 = end.trim().parse().ok()?;
            if end != (year + 1) % 100 {
                return None;
            }
        }
        Some(AssessmentYear(year))
    }

    /// How many years back `other` is from this assessment year.
    pub fn years_back(&self, other: AssessmentYear) -> i32 {
        self.0 - other.0
    }

    /// Display as "2024-25" format
    pub fn display(&self) -> String {
        format!("{}-{:02}", self.0, (self.0 + 1) % 100)
    }
}

impl std::fmt::Display for AssessmentYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl Serialize for AssessmentYear {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display())
    }
}

/// Tax regime selected on the return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    #[default]
    New,
    Old,
}

impl Regime {
    pub fn display(&self) -> &'static str {
        match self {
            Regime::New => "new",
            Regime::Old => "old",
        }
    }
}

/// One slab of the progressive rate table. `upper` is exclusive;
/// `None` means unbounded (the final slab).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxSlab {
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

/// One surcharge bracket keyed on total income. `upper` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurchargeBracket {
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

/// Section 87A rebate rule for a regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RebateRule {
    pub income_limit: Decimal,
    pub max_rebate: Decimal,
}

/// Flat rate for one special-rate section code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialRate {
    pub section: &'static str,
    pub rate: Decimal,
}

/// All statutory tables for one (assessment year, regime) pair. The
/// engines read everything from here; nothing rate- or threshold-shaped
/// is hard-coded in the set-off logic.
#[derive(Debug, Clone, Serialize)]
pub struct TaxConfig {
    pub assessment_year: AssessmentYear,
    pub regime: Regime,
    pub slabs: Vec<TaxSlab>,
    pub surcharge_brackets: Vec<SurchargeBracket>,
    pub rebate: RebateRule,
    pub cess_rate: Decimal,
    /// Section 112A exemption, applied only when computing tax.
    pub ltcg10_exemption: Decimal,
    pub special_rates: Vec<SpecialRate>,
    /// Sections whose surcharge rate is capped at `surcharge_cap_rate`.
    pub surcharge_capped_sections: Vec<&'static str>,
    pub surcharge_cap_rate: Decimal,
    /// Target preference for set-offs landing in long-term buckets.
    pub ltcg_priority: Vec<IncomeHead>,
    /// Target preference for set-offs landing in short-term buckets.
    pub stcg_priority: Vec<IncomeHead>,
    /// Brought-forward window in years.
    pub carry_forward_years: i32,
    /// Race-horse losses lapse after this many years.
    pub race_horse_years: i32,
}

impl TaxConfig {
    pub fn for_year(assessment_year: AssessmentYear, regime: Regime) -> TaxConfig {
        TaxConfig {
            assessment_year,
            regime,
            slabs: slab_table(assessment_year, regime),
            surcharge_brackets: vec![
                SurchargeBracket { upper: Some(dec!(5000000)), rate: Decimal::ZERO },
                SurchargeBracket { upper: Some(dec!(10000000)), rate: dec!(0.10) },
                SurchargeBracket { upper: Some(dec!(20000000)), rate: dec!(0.15) },
                SurchargeBracket { upper: Some(dec!(50000000)), rate: dec!(0.25) },
                SurchargeBracket { upper: None, rate: dec!(0.37) },
            ],
            rebate: match regime {
                Regime::New => RebateRule {
                    income_limit: dec!(700000),
                    max_rebate: dec!(25000),
                },
                Regime::Old => RebateRule {
                    income_limit: dec!(500000),
                    max_rebate: dec!(12500),
                },
            },
            cess_rate: dec!(0.04),
            ltcg10_exemption: dec!(100000),
            special_rates: vec![
                SpecialRate { section: sections::STCG_111A, rate: dec!(0.15) },
                SpecialRate { section: sections::LTCG_112A, rate: dec!(0.10) },
                SpecialRate { section: sections::LTCG_112, rate: dec!(0.20) },
                SpecialRate { section: sections::LTCG_FOREIGN, rate: dec!(0.10) },
                SpecialRate { section: sections::LOTTERY_115BB, rate: dec!(0.30) },
                SpecialRate { section: sections::VDA_115BBH, rate: dec!(0.30) },
                SpecialRate { section: sections::DTAA_DIVIDEND, rate: dec!(0.15) },
            ],
            surcharge_capped_sections: vec![
                sections::STCG_111A,
                sections::LTCG_112A,
                sections::LTCG_112,
                sections::LTCG_FOREIGN,
                sections::DTAA_DIVIDEND,
            ],
            surcharge_cap_rate: dec!(0.15),
            ltcg_priority: vec![
                IncomeHead::Ltcg20,
                IncomeHead::Ltcg10,
                IncomeHead::LtcgDtaaRate,
            ],
            stcg_priority: vec![
                IncomeHead::StcgAppRate,
                IncomeHead::Stcg15,
                IncomeHead::Stcg30,
                IncomeHead::StcgDtaaRate,
            ],
            carry_forward_years: 8,
            race_horse_years: 4,
        }
    }

    /// Flat rate for a section code, if configured.
    pub fn special_rate(&self, section: &str) -> Option<Decimal> {
        self.special_rates
            .iter()
            .find(|r| r.section == section)
            .map(|r| r.rate)
    }

    /// Surcharge rate for a total income figure.
    pub fn surcharge_rate(&self, total_income: Decimal) -> Decimal {
        for bracket in &self.surcharge_brackets {
            match bracket.upper {
                Some(upper) if total_income <= upper => return bracket.rate,
                None => return bracket.rate,
                _ => {}
            }
        }
        Decimal::ZERO
    }

    /// Lower bound of the surcharge bracket `total_income` falls in
    /// (zero for the first bracket). Used for marginal relief.
    pub fn surcharge_bracket_floor(&self, total_income: Decimal) -> Decimal {
        let mut floor = Decimal::ZERO;
        for bracket in &self.surcharge_brackets {
            match bracket.upper {
                Some(upper) if total_income <= upper => return floor,
                Some(upper) => floor = upper,
                None => return floor,
            }
        }
        floor
    }
}

fn slab_table(ay: AssessmentYear, regime: Regime) -> Vec<TaxSlab> {
    match regime {
        // New regime slabs as rationalised from AY 2024-25; earlier years
        // fall back to the same table.
        Regime::New => match ay.0 {
            2024.. => vec![
                TaxSlab { upper: Some(dec!(300000)), rate: Decimal::ZERO },
                TaxSlab { upper: Some(dec!(600000)), rate: dec!(0.05) },
                TaxSlab { upper: Some(dec!(900000)), rate: dec!(0.10) },
                TaxSlab { upper: Some(dec!(1200000)), rate: dec!(0.15) },
                TaxSlab { upper: Some(dec!(1500000)), rate: dec!(0.20) },
                TaxSlab { upper: None, rate: dec!(0.30) },
            ],
            _ => vec![
                TaxSlab { upper: Some(dec!(250000)), rate: Decimal::ZERO },
                TaxSlab { upper: Some(dec!(500000)), rate: dec!(0.05) },
                TaxSlab { upper: Some(dec!(750000)), rate: dec!(0.10) },
                TaxSlab { upper: Some(dec!(1000000)), rate: dec!(0.15) },
                TaxSlab { upper: Some(dec!(1250000)), rate: dec!(0.20) },
                TaxSlab { upper: Some(dec!(1500000)), rate: dec!(0.25) },
                TaxSlab { upper: None, rate: dec!(0.30) },
            ],
        },
        // Old regime slabs have been stable for years.
        Regime::Old => vec![
            TaxSlab { upper: Some(dec!(250000)), rate: Decimal::ZERO },
            TaxSlab { upper: Some(dec!(500000)), rate: dec!(0.05) },
            TaxSlab { upper: Some(dec!(1000000)), rate: dec!(0.20) },
            TaxSlab { upper: None, rate: dec!(0.30) },
        ],
    }
}
