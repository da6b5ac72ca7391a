//! The `prepare` subcommand: load, split, fit, apply, rank and save

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use crate::pipeline::{load_dataset, rank_correlations, split, write_matrix, RecipeSpec};
use crate::report::{
    display_correlations, display_fitted_steps, export_json, PrepareExport, PrepareMetadata,
    PrepareSummary, SplitSummary,
};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
    PrepareCard,
};

use super::args::PrepareArgs;

/// Read a recipe file, or fall back to the built-in churn recipe
pub fn read_recipe(path: Option<&Path>) -> Result<RecipeSpec> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read recipe file: {}", path.display()))?;
            RecipeSpec::from_json(&json)
                .with_context(|| format!("Invalid recipe file: {}", path.display()))
        }
        None => Ok(RecipeSpec::churn_default()),
    }
}

/// Run the full preparation flow for `args`
pub fn run_prepare(args: &PrepareArgs) -> Result<()> {
    let mut recipe = read_recipe(args.recipe.as_deref())?;
    if let Some(outcome) = &args.outcome {
        recipe.outcome.column = outcome.clone();
    }
    if let Some(positive) = &args.positive {
        recipe.outcome.positive = positive.clone();
    }

    let train_output = args.train_output_path();
    let test_output = args.test_output_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&PrepareCard {
        input: &args.input,
        recipe: args.recipe.as_deref(),
        outcome: &recipe.outcome.column,
        positive: &recipe.outcome.positive,
        train_output: &train_output,
        test_output: &test_output,
        train_fraction: args.train_fraction,
        seed: args.seed,
    });

    // Step 1: Load
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading input...");
    let loaded = load_dataset(&args.input, args.infer_schema_length, &args.drop_columns)?;
    if loaded.rows_dropped > 0 {
        finish_with_warning(&spinner, "Dataset loaded with incomplete rows");
    } else {
        finish_with_success(&spinner, "Dataset loaded");
    }

    let dataset = &loaded.dataset;
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", dataset.n_rows());
    println!("      Columns: {}", dataset.n_cols());
    if loaded.rows_dropped > 0 {
        print_warning(&format!(
            "Dropped {} of {} row(s) with missing values",
            loaded.rows_dropped, loaded.rows_read
        ));
    }

    dataset.column(&recipe.outcome.column).with_context(|| {
        format!(
            "Outcome column '{}' not found. Available columns: {:?}",
            recipe.outcome.column,
            dataset.column_names()
        )
    })?;
    let all_labels = dataset.labels(&recipe.outcome)?;
    if !all_labels.contains(&1) {
        anyhow::bail!(
            "Positive value '{}' never appears in outcome column '{}'",
            recipe.outcome.positive,
            recipe.outcome.column
        );
    }
    print_step_time(step_start.elapsed());

    // Step 2: Split
    print_step_header(2, "Train/Test Split");
    let step_start = Instant::now();
    let partitions = split(dataset, args.train_fraction, args.seed)?;
    let train_labels = partitions.train.labels(&recipe.outcome)?;
    let test_labels = partitions.test.labels(&recipe.outcome)?;
    let split_summary =
        SplitSummary::new(loaded.rows_read, loaded.rows_dropped, &train_labels, &test_labels);
    print_success(&format!(
        "{} training row(s), {} testing row(s)",
        split_summary.train_rows, split_summary.test_rows
    ));
    print_step_time(step_start.elapsed());

    // Step 3: Fit on training rows only
    print_step_header(3, "Fit Recipe");
    let step_start = Instant::now();
    let spinner = create_spinner("Learning step parameters from training rows...");
    let pipeline = recipe.fit(&partitions.train)?;
    finish_with_success(&spinner, "Recipe fit");
    print_count(
        "fitted step(s)",
        pipeline.fitted_steps()?.len(),
        Some(&format!("({} output columns)", pipeline.output_columns()?.len())),
    );
    print_step_time(step_start.elapsed());

    // Step 4: Apply to both partitions
    print_step_header(4, "Apply Recipe");
    let step_start = Instant::now();
    let spinner = create_spinner("Transforming training and testing rows...");
    let train_matrix = pipeline.apply(&partitions.train)?;
    let test_matrix = pipeline.apply(&partitions.test)?;
    finish_with_success(&spinner, "Matrices built");
    print_step_time(step_start.elapsed());

    // Step 5: Correlation ranking on training rows
    print_step_header(5, "Outcome Correlation");
    let step_start = Instant::now();
    let spinner = create_spinner("Ranking features by correlation with the outcome...");
    let outcome: Vec<f64> = train_labels.iter().map(|&l| f64::from(l)).collect();
    let correlations = rank_correlations(&train_matrix, &outcome)?;
    finish_with_success(&spinner, "Correlations ranked");
    print_step_time(step_start.elapsed());

    // Step 6: Save
    print_step_header(6, "Save Matrices");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output files...");
    let label_name = recipe.outcome.column.as_str();
    write_matrix(&train_matrix, Some((label_name, train_labels.as_slice())), &train_output)?;
    write_matrix(&test_matrix, Some((label_name, test_labels.as_slice())), &test_output)?;
    finish_with_success(&spinner, "Matrices written");
    print_info(&format!("Train: {}", train_output.display()));
    print_info(&format!("Test:  {}", test_output.display()));

    if let Some(report_path) = &args.report {
        let export = PrepareExport::new(
            PrepareMetadata::new(
                &args.input,
                args.recipe.as_deref(),
                &recipe.outcome.column,
                &recipe.outcome.positive,
                args.train_fraction,
                args.seed,
            ),
            split_summary.clone(),
            &pipeline,
            &correlations,
        )?;
        export_json(&export, report_path)?;
        print_info(&format!("Report: {}", report_path.display()));
    }
    print_step_time(step_start.elapsed());

    let removed = std::iter::once(&recipe.outcome.column)
        .chain(&recipe.ignore)
        .filter(|c| dataset.column(c).is_ok())
        .count();
    let input_columns = dataset.n_cols().saturating_sub(removed);
    PrepareSummary::new(input_columns)
        .with_split(split_summary)
        .with_outputs(train_matrix.n_cols(), pipeline.excluded_columns()?)
        .display();
    display_fitted_steps(pipeline.fitted_steps()?);
    display_correlations(&correlations, args.top);

    print_completion("churnprep preparation complete!");
    Ok(())
}
