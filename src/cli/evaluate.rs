//! The `evaluate` subcommand: score predictions against truth

use anyhow::Result;
use console::style;

use crate::pipeline::{evaluate, load_predictions, roc_curve, PredictionColumns};
use crate::report::{display_metrics, export_json, EvaluationExport, EvaluationMetadata};
use crate::utils::{create_spinner, finish_with_success, print_completion, print_info};

use super::args::EvaluateArgs;

impl EvaluateArgs {
    /// Column layout of the predictions file
    pub fn prediction_columns(&self) -> PredictionColumns {
        PredictionColumns {
            truth: self.truth.clone(),
            positive: self.positive.clone(),
            predicted: self.predicted.clone(),
            probability: self.probability.clone(),
            threshold: self.threshold,
        }
    }
}

pub fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    println!(
        "\n {} Evaluating predictions",
        style("◆").cyan().bold()
    );
    println!("   Input: {}", style(args.input.display()).dim());
    if args.predicted.is_none() {
        println!(
            "   Labels derived from '{}' at threshold {}",
            args.probability,
            style(args.threshold).yellow()
        );
    }
    println!();

    let spinner = create_spinner("Reading predictions...");
    let predictions = load_predictions(&args.input, &args.prediction_columns())?;
    finish_with_success(
        &spinner,
        &format!("{} prediction(s) loaded", predictions.truth.len()),
    );

    let report = evaluate(
        &predictions.truth,
        &predictions.predicted,
        &predictions.probability,
    )?;
    display_metrics(&report);

    if let Some(report_path) = &args.report {
        let export = EvaluationExport {
            metadata: EvaluationMetadata::new(
                &args.input,
                args.predicted.is_none().then_some(args.threshold),
            ),
            roc_curve: roc_curve(&predictions.truth, &predictions.probability)?,
            metrics: report,
        };
        export_json(&export, report_path)?;
        println!();
        print_info(&format!("Report: {}", report_path.display()));
    }

    print_completion("churnprep evaluation complete!");
    Ok(())
}
