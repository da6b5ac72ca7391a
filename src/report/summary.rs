//! Prepare-run summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{FeatureCorrelation, FittedStep, StepParameters};

use super::export::SplitSummary;

/// Summary of a prepare run
#[derive(Debug, Default)]
pub struct PrepareSummary {
    pub input_columns: usize,
    pub output_columns: usize,
    pub excluded_columns: Vec<String>,
    pub split: Option<SplitSummary>,
}

impl PrepareSummary {
    pub fn new(input_columns: usize) -> Self {
        Self {
            input_columns,
            ..Default::default()
        }
    }

    pub fn with_split(mut self, split: SplitSummary) -> Self {
        self.split = Some(split);
        self
    }

    pub fn with_outputs(mut self, output_columns: usize, excluded: &[String]) -> Self {
        self.output_columns = output_columns;
        self.excluded_columns = excluded.to_vec();
        self
    }

    pub fn display(&self) {
        print_section_title("📋", "PREPARE SUMMARY");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        if let Some(split) = &self.split {
            table.add_row(vec![Cell::new("📁 Rows Read"), Cell::new(split.rows_read)]);
            table.add_row(vec![
                Cell::new("🗑️  Rows Dropped (Missing)"),
                Cell::new(split.rows_dropped).fg(if split.rows_dropped == 0 {
                    Color::White
                } else {
                    Color::Yellow
                }),
            ]);
            table.add_row(vec![
                Cell::new("🏋️ Training Rows"),
                Cell::new(format!(
                    "{} ({:.1}% positive)",
                    split.train_rows,
                    split.train_positive_rate * 100.0
                )),
            ]);
            table.add_row(vec![
                Cell::new("🧪 Testing Rows"),
                Cell::new(format!(
                    "{} ({:.1}% positive)",
                    split.test_rows,
                    split.test_positive_rate * 100.0
                )),
            ]);
        }

        table.add_row(vec![
            Cell::new("📥 Input Columns"),
            Cell::new(self.input_columns),
        ]);
        table.add_row(vec![
            Cell::new("⚠️  Excluded (Nominal)"),
            Cell::new(self.excluded_columns.len()).fg(if self.excluded_columns.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Output Columns"),
            Cell::new(self.output_columns)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        print_indented(&table);

        if !self.excluded_columns.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Nominal columns without an encode step").yellow(),
                style(format!("({})", self.excluded_columns.len())).dim()
            );
            for column in &self.excluded_columns {
                println!("        {} {}", style("•").dim(), column);
            }
        }
    }
}

/// Print learned parameters of each fitted step in execution order
pub fn display_fitted_steps(steps: &[FittedStep]) {
    print_section_title("🧩", "FITTED STEPS");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Step").add_attribute(Attribute::Bold),
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Learned").add_attribute(Attribute::Bold),
    ]);

    for (i, fitted) in steps.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(fitted.step.name()).fg(Color::Cyan),
            Cell::new(fitted.step.column()),
            Cell::new(describe_parameters(&fitted.parameters)),
        ]);
    }

    print_indented(&table);
}

fn describe_parameters(params: &StepParameters) -> String {
    match params {
        StepParameters::Discretize { thresholds, .. } => {
            let cuts: Vec<String> = thresholds.iter().map(|t| format!("{:.4}", t)).collect();
            format!("{} bins, cuts [{}]", thresholds.len() + 1, cuts.join(", "))
        }
        StepParameters::LogTransform => "ln(x)".to_string(),
        StepParameters::CategoricalEncode {
            reference,
            categories,
        } => format!(
            "reference '{}', {} indicator(s)",
            reference,
            categories.len()
        ),
        StepParameters::CenterScale { mean, std_dev } => {
            format!("mean {:.4}, sd {:.4}", mean, std_dev)
        }
    }
}

/// Print the `top` strongest correlations, strongest first
pub fn display_correlations(ranked: &[FeatureCorrelation], top: usize) {
    print_section_title("🔗", "OUTCOME CORRELATIONS");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Pearson r").add_attribute(Attribute::Bold),
    ]);

    for fc in ranked.iter().rev().take(top) {
        let color = if fc.coefficient >= 0.0 {
            Color::Red
        } else {
            Color::Green
        };
        table.add_row(vec![
            Cell::new(&fc.feature),
            Cell::new(format!("{:+.4}", fc.coefficient))
                .fg(color)
                .set_alignment(CellAlignment::Right),
        ]);
    }

    print_indented(&table);

    if ranked.len() > top {
        println!(
            "      {}",
            style(format!("... {} weaker feature(s) not shown", ranked.len() - top)).dim()
        );
    }
}

pub(crate) fn print_section_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

pub(crate) fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
