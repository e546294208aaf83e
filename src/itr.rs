//! Input return document: the head-wise schedules this engine consumes.
//!
//! Produced by out-of-scope document-ingestion collaborators; here it is
//! just deserialized. Missing schedules mean zero income for that head,
//! never an error.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tax::config::Regime;

/// Unified JSON input format for one (taxpayer, assessment year) return.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaxReturnInput {
    /// Assessment year, e.g. "2024-25"
    pub assessment_year: String,
    /// Tax regime: "new" or "old"
    #[serde(default)]
    pub regime: Regime,
    #[serde(default)]
    pub salary: Option<SalarySchedule>,
    #[serde(default)]
    pub house_property: Option<HousePropertySchedule>,
    #[serde(default)]
    pub capital_gains: Option<CapitalGainsSchedule>,
    #[serde(default)]
    pub other_sources: Option<OtherSourcesSchedule>,
    /// Up to 8 prior-year loss records, oldest first.
    #[serde(default)]
    pub carry_forward_losses: Vec<CarryForwardLossRecord>,
    #[serde(default)]
    pub taxes_paid: Option<TaxesPaid>,
    #[serde(default)]
    pub relief: Option<Relief>,
}

/// Salary head, already net of standard deduction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SalarySchedule {
    /// Net salary after standard deduction
    #[schemars(with = "f64")]
    pub net_salary: Decimal,
}

/// House-property head. The loss is stored as a positive magnitude, the
/// way the source schedule reports it; sign normalization happens in the
/// aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct HousePropertySchedule {
    /// Net income from house property (let-out and deemed let-out)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub net_income: Decimal,
    /// Current-year house-property loss, as a positive magnitude
    #[serde(default)]
    #[schemars(with = "f64")]
    pub current_year_loss: Decimal,
}

/// Capital-gains head, one signed amount per rate bucket
/// (negative = loss).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CapitalGainsSchedule {
    /// Short-term, STT-paid, 15% bucket (section 111A)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub stcg_15: Decimal,
    /// Short-term, 30% bucket
    #[serde(default)]
    #[schemars(with = "f64")]
    pub stcg_30: Decimal,
    /// Short-term, applicable-rate bucket
    #[serde(default)]
    #[schemars(with = "f64")]
    pub stcg_applicable_rate: Decimal,
    /// Short-term, DTAA-rate bucket
    #[serde(default)]
    #[schemars(with = "f64")]
    pub stcg_dtaa_rate: Decimal,
    /// Long-term, 10% bucket (section 112A)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub ltcg_10: Decimal,
    /// Long-term, 20% bucket (section 112)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub ltcg_20: Decimal,
    /// Long-term, DTAA-rate bucket
    #[serde(default)]
    #[schemars(with = "f64")]
    pub ltcg_dtaa_rate: Decimal,
}

/// Other-sources head plus the special-rate detail reported inside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OtherSourcesSchedule {
    /// Net income excluding race horses and the special-rate items below
    #[serde(default)]
    #[schemars(with = "f64")]
    pub net_income: Decimal,
    /// Income (or loss) from owning and maintaining race horses
    #[serde(default)]
    #[schemars(with = "f64")]
    pub race_horse_income: Decimal,
    /// Lottery/gambling winnings by sub-period date range (section 115BB)
    #[serde(default)]
    pub lottery_winnings: Vec<LotteryWinning>,
    /// Virtual-digital-asset income (section 115BBH)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub vda_income: Decimal,
    /// Dividend income taxed at a DTAA treaty rate
    #[serde(default)]
    pub dtaa_dividend: Option<DtaaDividend>,
}

/// One sub-period of lottery/gambling winnings. Periods exist because the
/// return reports these by advance-tax instalment window; tax is a flat
/// rate on the sum.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LotteryWinning {
    /// Sub-period label, e.g. "upto 15/6" or "16/12 to 15/3"
    #[serde(default)]
    pub period: String,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DtaaDividend {
    #[schemars(with = "f64")]
    pub amount: Decimal,
    /// Treaty rate as a fraction (e.g. 0.10); falls back to the configured
    /// default DTAA dividend rate when absent
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub treaty_rate: Option<Decimal>,
}

/// Losses brought forward from one prior assessment year. Amounts are
/// positive magnitudes as filed in that year's return.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CarryForwardLossRecord {
    /// Assessment year the loss was first reported in, e.g. "2019-20"
    pub assessment_year: String,
    /// Date the loss-year return was filed
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub house_property_loss: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub short_term_capital_loss: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub long_term_capital_loss: Decimal,
    /// Race-horse losses lapse after 4 years; older records must not
    /// carry one.
    #[serde(default)]
    #[schemars(with = "f64")]
    pub race_horse_loss: Decimal,
}

/// Taxes already paid against this year's liability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaxesPaid {
    #[serde(default)]
    #[schemars(with = "f64")]
    pub tds: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub tcs: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub advance_tax: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub self_assessment_tax: Decimal,
}

impl TaxesPaid {
    pub fn total(&self) -> Decimal {
        self.tds + self.tcs + self.advance_tax + self.self_assessment_tax
    }
}

/// Statutory relief deducted from gross tax liability.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Relief {
    /// Foreign tax relief under treaty (section 90/90A/91)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub foreign_tax_relief: Decimal,
    /// Any other statutory relief (e.g. section 89 arrears)
    #[serde(default)]
    #[schemars(with = "f64")]
    pub other_relief: Decimal,
}

impl Relief {
    pub fn total(&self) -> Decimal {
        self.foreign_tax_relief + self.other_relief
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minimal_document_parses() {
        let input: TaxReturnInput =
            serde_json::from_str(r#"{ "assessment_year": "2024-25" }"#).unwrap();
        assert_eq!(input.assessment_year, "2024-25");
        assert_eq!(input.regime, Regime::New);
        assert!(input.salary.is_none());
        assert!(input.carry_forward_losses.is_empty());
    }

    #[test]
    fn full_document_parses() {
        let json = r#"{
            "assessment_year": "2024-25",
            "regime": "old",
            "salary": { "net_salary": 800000 },
            "house_property": { "current_year_loss": 250000 },
            "capital_gains": { "stcg_15": 50000, "ltcg_10": -20000 },
            "other_sources": {
                "net_income": 10000,
                "lottery_winnings": [ { "period": "upto 15/6", "amount": 5000 } ],
                "vda_income": 1000,
                "dtaa_dividend": { "amount": 2000, "treaty_rate": 0.10 }
            },
            "carry_forward_losses": [
                {
                    "assessment_year": "2019-20",
                    "filing_date": "2019-07-31",
                    "house_property_loss": 100000
                }
            ],
            "taxes_paid": { "tds": 50000, "advance_tax": 10000 },
            "relief": { "foreign_tax_relief": 1500 }
        }"#;
        let input: TaxReturnInput = serde_json::from_str(json).unwrap();

        assert_eq!(input.regime, Regime::Old);
        assert_eq!(input.salary.unwrap().net_salary, dec!(800000));
        assert_eq!(input.capital_gains.as_ref().unwrap().ltcg_10, dec!(-20000));
        let os = input.other_sources.unwrap();
        assert_eq!(os.lottery_winnings[0].amount, dec!(5000));
        assert_eq!(os.dtaa_dividend.unwrap().treaty_rate, Some(dec!(0.10)));
        assert_eq!(input.carry_forward_losses.len(), 1);
        assert_eq!(input.taxes_paid.unwrap().total(), dec!(60000));
        assert_eq!(input.relief.unwrap().total(), dec!(1500));
    }

    #[test]
    fn carry_forward_defaults_to_zero_amounts() {
        let record: CarryForwardLossRecord =
            serde_json::from_str(r#"{ "assessment_year": "2020-21" }"#).unwrap();
        assert_eq!(record.house_property_loss, Decimal::ZERO);
        assert_eq!(record.race_horse_loss, Decimal::ZERO);
        assert!(record.filing_date.is_none());
    }
}
