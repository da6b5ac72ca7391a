//! Evaluation report tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};

use crate::pipeline::{ConfusionMatrix, MetricsReport};

use super::summary::{print_indented, print_section_title};

/// Print the confusion matrix followed by the derived statistics
pub fn display_metrics(report: &MetricsReport) {
    display_confusion(&report.confusion);

    print_section_title("📈", "CLASSIFICATION METRICS");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    for (name, value) in [
        ("Accuracy", report.accuracy),
        ("Precision", report.precision),
        ("Recall", report.recall),
        ("Specificity", report.confusion.specificity()),
        ("F1", report.f1),
    ] {
        table.add_row(vec![Cell::new(name), metric_cell(value)]);
    }

    table.add_row(vec![
        Cell::new("ROC AUC").add_attribute(Attribute::Bold),
        metric_cell(report.auc).add_attribute(Attribute::Bold),
    ]);

    print_indented(&table);
}

fn display_confusion(confusion: &ConfusionMatrix) {
    print_section_title("🧮", "CONFUSION MATRIX");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new(""),
        Cell::new("Predicted 1").add_attribute(Attribute::Bold),
        Cell::new("Predicted 0").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Actual 1").add_attribute(Attribute::Bold),
        Cell::new(confusion.true_positive)
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right),
        Cell::new(confusion.false_negative)
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Actual 0").add_attribute(Attribute::Bold),
        Cell::new(confusion.false_positive)
            .fg(Color::Red)
            .set_alignment(CellAlignment::Right),
        Cell::new(confusion.true_negative)
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right),
    ]);

    print_indented(&table);
}

fn metric_cell(value: f64) -> Cell {
    let color = if value >= 0.8 {
        Color::Green
    } else if value >= 0.6 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{:.4}", value))
        .fg(color)
        .set_alignment(CellAlignment::Right)
}
