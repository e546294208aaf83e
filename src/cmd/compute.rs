//! Compute command - full pipeline run with stage-by-stage output

use crate::cmd::read_return;
use crate::tax::heads::IncomeHead;
use crate::tax::{self, TaxComputation};
use clap::Args;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ComputeCommand {
    /// JSON file containing the return document (or "-" for stdin)
    #[arg(short, long)]
    r#return: PathBuf,

    /// Output the full computation as JSON instead of formatted text
    #[arg(long)]
    json: bool,

    /// Output the set-off ledger as CSV instead of formatted text
    #[arg(long)]
    csv: bool,
}

/// Row for the head-wise income table
#[derive(Debug, Tabled)]
struct HeadRow {
    #[tabled(rename = "Head")]
    head: String,

    #[tabled(rename = "Schedule")]
    schedule: String,

    #[tabled(rename = "After CG Set-off")]
    after_cg: String,

    #[tabled(rename = "After CYLA")]
    after_cyla: String,

    #[tabled(rename = "After BFLA")]
    after_bfla: String,
}

/// Row for the special-rate income table
#[derive(Debug, Tabled)]
struct SpecialRow {
    #[tabled(rename = "Section")]
    section: String,

    #[tabled(rename = "Gross")]
    gross: String,

    #[tabled(rename = "Rate")]
    rate: String,

    #[tabled(rename = "Tax")]
    tax: String,
}

/// Row for the CSV set-off ledger
#[derive(Debug, serde::Serialize)]
struct LedgerRow {
    stage: String,
    detail: String,
    source: String,
    target: String,
    amount: String,
}

impl ComputeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let input = read_return(&self.r#return)?;
        let computation = tax::compute(&input)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&computation)?);
            Ok(())
        } else if self.csv {
            self.write_ledger_csv(&computation)
        } else {
            self.print_report(&computation);
            Ok(())
        }
    }

    fn print_report(&self, c: &TaxComputation) {
        println!();
        println!(
            "RETURN COMPUTATION ({}, {} regime)",
            c.assessment_year.display(),
            c.regime.display()
        );
        println!();

        self.print_head_table(c);
        self.print_set_off(c);
        self.print_special(c);
        self.print_liability(c);
        self.print_carry_forward(c);
        self.print_warnings(c);
    }

    fn print_head_table(&self, c: &TaxComputation) {
        let rows: Vec<HeadRow> = IncomeHead::ALL
            .iter()
            .filter(|&&head| {
                !c.headwise.get(head).is_zero() || !c.bfla.income.get(head).is_zero()
            })
            .map(|&head| {
                let after_cg = c
                    .capital_gains
                    .buckets
                    .iter()
                    .find(|b| b.head == head)
                    .map(|b| b.net_gain_after_set_off)
                    .unwrap_or_else(|| c.headwise.get(head));
                HeadRow {
                    head: head.to_string(),
                    schedule: format_inr_signed(c.headwise.get(head)),
                    after_cg: format_inr_signed(after_cg),
                    after_cyla: format_inr(c.cyla.income.get(head)),
                    after_bfla: format_inr(c.bfla.income.get(head)),
                }
            })
            .collect();

        if rows.is_empty() {
            println!("No income reported.");
            println!();
            return;
        }

        println!("INCOME BY HEAD");
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
    }

    fn print_set_off(&self, c: &TaxComputation) {
        let total_entries =
            c.capital_gains.ledger.len() + c.cyla.ledger.len() + c.bfla.ledger.len();
        if total_entries == 0 {
            return;
        }

        println!("SET-OFF");
        for entry in &c.capital_gains.ledger {
            println!(
                "  CG pass {}: {} loss of {} against {}",
                entry.pass,
                entry.source,
                format_inr(entry.amount),
                entry.target
            );
        }
        for entry in &c.cyla.ledger {
            println!(
                "  CYLA: {} loss of {} against {}",
                entry.source,
                format_inr(entry.amount),
                entry.target
            );
        }
        for entry in &c.bfla.ledger {
            println!(
                "  BFLA {}: {} loss of {} against {}",
                entry.loss_year.display(),
                entry.category,
                format_inr(entry.amount),
                entry.target
            );
        }
        println!();
    }

    fn print_special(&self, c: &TaxComputation) {
        if c.special.buckets.is_empty() {
            return;
        }

        let rows: Vec<SpecialRow> = c
            .special
            .buckets
            .iter()
            .map(|b| SpecialRow {
                section: b.section.clone(),
                gross: format_inr(b.gross),
                rate: format_pct(b.rate),
                tax: format_inr(b.tax),
            })
            .collect();

        println!("SPECIAL-RATE INCOME");
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
    }

    fn print_liability(&self, c: &TaxComputation) {
        let l = &c.liability;

        println!("LIABILITY");
        println!("  Total Income: {}", format_inr(l.total_income));
        println!(
            "  Ordinary: {} | Special Rate: {}",
            format_inr(l.ordinary_income),
            format_inr(l.special_rate_income)
        );
        println!(
            "  Slab Tax: {} | Special-Rate Tax: {}",
            format_inr(l.slab_tax),
            format_inr(l.special_rate_tax)
        );
        if !l.rebate.is_zero() {
            println!("  Rebate: {}", format_inr(l.rebate));
        }
        if !l.surcharge.is_zero() || !l.marginal_relief.is_zero() {
            println!(
                "  Surcharge @ {}: {} (marginal relief {})",
                format_pct(l.surcharge_rate),
                format_inr(l.surcharge),
                format_inr(l.marginal_relief)
            );
        }
        println!("  Cess: {}", format_inr(l.cess));
        if !l.relief.is_zero() {
            println!("  Relief: {}", format_inr(l.relief));
        }
        println!("  Net Tax Liability: {}", format_inr(l.net_tax_liability));
        if !l.taxes_paid.is_zero() {
            println!("  Taxes Paid: {}", format_inr(l.taxes_paid));
        }
        println!();

        if l.refund_due() {
            println!("REFUND DUE: {}", format_inr(-l.balance));
        } else {
            println!("BALANCE PAYABLE: {}", format_inr(l.balance));
        }
        println!();
    }

    fn print_carry_forward(&self, c: &TaxComputation) {
        if c.losses_to_carry_forward.is_empty() {
            return;
        }

        println!("LOSSES TO CARRY FORWARD");
        for (category, amount) in &c.losses_to_carry_forward {
            println!("  {}: {}", category, format_inr(*amount));
        }
        println!();
    }

    fn print_warnings(&self, c: &TaxComputation) {
        if c.warnings.is_empty() {
            return;
        }

        println!("\u{26A0} {} warning(s):", c.warnings.len());
        for warning in &c.warnings {
            println!("  - {}", warning.message());
        }
        println!();
    }

    fn write_ledger_csv(&self, c: &TaxComputation) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for entry in &c.capital_gains.ledger {
            wtr.serialize(LedgerRow {
                stage: "CG".to_string(),
                detail: format!("pass {}", entry.pass),
                source: entry.source.to_string(),
                target: entry.target.to_string(),
                amount: format!("{:.2}", entry.amount),
            })?;
        }
        for entry in &c.cyla.ledger {
            wtr.serialize(LedgerRow {
                stage: "CYLA".to_string(),
                detail: String::new(),
                source: entry.source.to_string(),
                target: entry.target.to_string(),
                amount: format!("{:.2}", entry.amount),
            })?;
        }
        for entry in &c.bfla.ledger {
            wtr.serialize(LedgerRow {
                stage: "BFLA".to_string(),
                detail: entry.loss_year.display(),
                source: entry.category.to_string(),
                target: entry.target.to_string(),
                amount: format!("{:.2}", entry.amount),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn format_inr(amount: Decimal) -> String {
    format!("\u{20B9}{:.2}", amount.round_dp(2))
}

fn format_inr_signed(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-\u{20B9}{:.2}", amount.abs().round_dp(2))
    } else {
        format!("\u{20B9}{:.2}", amount.round_dp(2))
    }
}

fn format_pct(rate: Decimal) -> String {
    let pct = rate * Decimal::from(100);
    format!("{}%", pct.normalize())
}
