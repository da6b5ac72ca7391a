//! Integration tests for split, fit and apply on churn data

use churnprep::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn fitted_default(n: usize) -> (Split, Pipeline) {
    let customers = create_churn_dataset(n);
    let partitions = split(&customers, DEFAULT_TRAIN_FRACTION, DEFAULT_SEED).unwrap();
    let pipeline = RecipeSpec::churn_default().fit(&partitions.train).unwrap();
    (partitions, pipeline)
}

#[test]
fn test_default_recipe_produces_numeric_matrix() {
    let (partitions, pipeline) = fitted_default(120);

    let train = pipeline.apply(&partitions.train).unwrap();
    let test = pipeline.apply(&partitions.test).unwrap();

    assert_eq!(train.n_rows(), partitions.train.n_rows());
    assert_eq!(test.n_rows(), partitions.test.n_rows());
    assert_eq!(train.column_names(), pipeline.output_columns().unwrap());
    assert_eq!(test.column_names(), train.column_names());

    let names = train.column_names();
    assert!(names.contains(&"Contract_One year".to_string()));
    assert!(names.contains(&"InternetService_Fiber optic".to_string()));
    assert!(names.contains(&"TotalCharges".to_string()));
    assert!(names.iter().any(|n| n.starts_with("tenure_bin")));
    assert!(!names.contains(&"customerID".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("Churn")));
    assert!(pipeline.excluded_columns().unwrap().is_empty());
}

#[test]
fn test_apply_is_deterministic() {
    let (partitions, pipeline) = fitted_default(120);

    let first = pipeline.apply(&partitions.test).unwrap();
    let second = pipeline.apply(&partitions.test).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_scaled_training_columns_are_standardized() {
    let (partitions, pipeline) = fitted_default(120);
    let train = pipeline.apply(&partitions.train).unwrap();

    for (name, values) in train.columns() {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
        assert!(mean.abs() < 1e-9, "{} has mean {}", name, mean);
        assert!((var - 1.0).abs() < 1e-9, "{} has variance {}", name, var);
    }
}

#[test]
fn test_test_rows_transform_independently() {
    let (partitions, pipeline) = fitted_default(120);
    let whole = pipeline.apply(&partitions.test).unwrap();

    for i in 0..partitions.test.n_rows() {
        let single = pipeline.apply(&partitions.test.take_rows(&[i])).unwrap();
        assert_eq!(single.row(0), whole.row(i), "row {} depends on its neighbours", i);
    }
}

#[test]
fn test_holdout_scaling_uses_training_parameters() {
    let customers = create_churn_dataset(120);
    let partitions = split(&customers, 0.8, 7).unwrap();
    let pipeline = Pipeline::new(vec![TransformStep::center_scale("MonthlyCharges")])
        .with_outcome("Churn")
        .fit(&partitions.train)
        .unwrap();

    let train_values = partitions.train.numeric("MonthlyCharges").unwrap();
    let n = train_values.len() as f64;
    let mean = train_values.iter().sum::<f64>() / n;
    let sd = (train_values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0)).sqrt();

    // Shift every holdout value far away; statistics of the holdout must not leak in.
    let shifted: Vec<f64> = partitions
        .test
        .numeric("MonthlyCharges")
        .unwrap()
        .iter()
        .map(|v| v * 1000.0 + 1.0)
        .collect();
    let holdout = Dataset::new(vec![Column::numeric("MonthlyCharges", shifted.clone())]).unwrap();
    let matrix = pipeline.apply(&holdout).unwrap();

    let scaled = matrix.column("MonthlyCharges").unwrap();
    assert_eq!(scaled.len(), shifted.len());
    for (out, raw) in scaled.iter().zip(&shifted) {
        let expected = (raw - mean) / sd;
        assert!((out - expected).abs() < 1e-9 * expected.abs().max(1.0));
    }
}

#[test]
fn test_unseen_category_encodes_as_zeros() {
    let train = Dataset::new(vec![
        Column::nominal("Contract", vec!["Month-to-month", "One year", "One year", "Month-to-month"]),
        Column::nominal("Churn", vec!["Yes", "No", "No", "Yes"]),
    ])
    .unwrap();
    let pipeline = Pipeline::new(vec![TransformStep::encode("Contract")])
        .with_outcome("Churn")
        .fit(&train)
        .unwrap();

    let test = Dataset::new(vec![Column::nominal("Contract", vec!["Two year", "One year"])]).unwrap();
    let matrix = pipeline.apply(&test).unwrap();

    assert_eq!(matrix.column_names(), &["Contract_One year".to_string()]);
    assert_eq!(matrix.column("Contract_One year").unwrap(), &[0.0, 1.0]);
}

#[test]
fn test_independent_pipelines_do_not_share_state() {
    let steps = vec![TransformStep::center_scale("MonthlyCharges")];
    let a = Dataset::new(vec![Column::numeric("MonthlyCharges", vec![10.0, 20.0, 30.0])]).unwrap();
    let b = Dataset::new(vec![Column::numeric("MonthlyCharges", vec![100.0, 300.0])]).unwrap();

    let unfit = Pipeline::new(steps);
    let fit_a = unfit.fit(&a).unwrap();
    let fit_b = unfit.fit(&b).unwrap();
    let refit_a = fit_a.fit(&b).unwrap();

    assert!(!unfit.is_fit());
    assert_eq!(
        fit_a.fitted_steps().unwrap()[0].parameters,
        StepParameters::CenterScale {
            mean: 20.0,
            std_dev: 10.0
        }
    );
    assert_eq!(fit_b.fitted_steps().unwrap(), refit_a.fitted_steps().unwrap());
    assert_eq!(fit_a.apply(&a).unwrap().column("MonthlyCharges").unwrap(), &[-1.0, 0.0, 1.0]);
}

#[test]
fn test_apply_requires_fit() {
    let unfit = Pipeline::new(vec![TransformStep::log("TotalCharges")]);
    assert_eq!(
        unfit.apply(&create_churn_dataset(10)).unwrap_err(),
        PrepError::PipelineNotFit
    );
    assert!(unfit.fitted_steps().is_err());
}

#[test]
fn test_apply_reports_missing_columns() {
    let (_, pipeline) = fitted_default(60);
    let incomplete = create_churn_dataset(5).without_columns(&["TotalCharges".to_string()]);

    assert_eq!(
        pipeline.apply(&incomplete).unwrap_err(),
        PrepError::UnknownColumn {
            column: "TotalCharges".to_string()
        }
    );
}

#[test]
fn test_apply_rejects_non_positive_log_input() {
    let train = Dataset::new(vec![Column::numeric("TotalCharges", vec![20.0, 200.0, 2000.0])]).unwrap();
    let pipeline = Pipeline::new(vec![TransformStep::log("TotalCharges")])
        .fit(&train)
        .unwrap();

    let test = Dataset::new(vec![Column::numeric("TotalCharges", vec![50.0, 0.0])]).unwrap();
    assert!(matches!(
        pipeline.apply(&test),
        Err(PrepError::NonPositiveValue { row: 1, .. })
    ));
}

#[test]
fn test_json_recipe_with_explicit_columns() {
    let recipe = RecipeSpec::from_json(
        r#"{
            "outcome": {"column": "Churn", "positive": "Yes"},
            "ignore": ["customerID", "gender"],
            "steps": [
                {"step": "log", "select": {"columns": ["TotalCharges"]}},
                {"step": "encode", "select": {"columns": ["Contract"]}},
                {"step": "center_scale", "select": {"columns": ["MonthlyCharges", "TotalCharges"]}}
            ]
        }"#,
    )
    .unwrap();

    let customers = create_churn_dataset(60);
    let pipeline = recipe.fit(&customers).unwrap();
    let steps: Vec<String> = pipeline
        .fitted_steps()
        .unwrap()
        .iter()
        .map(|f| f.step.to_string())
        .collect();
    assert_eq!(
        steps,
        vec![
            "log(TotalCharges)",
            "encode(Contract)",
            "center_scale(MonthlyCharges)",
            "center_scale(TotalCharges)"
        ]
    );

    // InternetService was never encoded, so it is excluded from the matrix
    assert_eq!(
        pipeline.excluded_columns().unwrap(),
        &["InternetService".to_string()]
    );
    let matrix = pipeline.apply(&customers).unwrap();
    assert!(matrix.column("InternetService").is_none());
    assert!(matrix.column("SeniorCitizen").is_some());
}

#[test]
fn test_fit_pipeline_is_shared_across_threads() {
    let (partitions, pipeline) = fitted_default(120);
    let expected = pipeline.apply(&partitions.test).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| pipeline.apply(&partitions.test).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
