use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Domain warning types emitted during validation/calculation. These are
/// data-quality findings, not failures: the amounts involved are treated
/// as zero (or left slab-taxed) and the computation continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Carry-forward record falls outside the brought-forward window.
    InvalidCarryForwardRecord {
        assessment_year: String,
        reason: String,
    },
    /// Race-horse loss in a record older than the race-horse window;
    /// the amount is zeroed.
    StaleRaceHorseLoss { assessment_year: String },
    /// Income tagged with a section code not in the configured rate map;
    /// the amount stays slab-taxed.
    UnknownSpecialRateSection { section: String },
}

impl Warning {
    pub fn message(&self) -> String {
        match self {
            Warning::InvalidCarryForwardRecord {
                assessment_year,
                reason,
            } => format!(
                "carry-forward record for AY {} rejected: {}",
                assessment_year, reason
            ),
            Warning::StaleRaceHorseLoss { assessment_year } => format!(
                "race-horse loss from AY {} has lapsed and was ignored",
                assessment_year
            ),
            Warning::UnknownSpecialRateSection { section } => format!(
                "no special rate configured for section {}; amount taxed at slab rates",
                section
            ),
        }
    }
}
