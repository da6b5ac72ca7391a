//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;

use churnprep::pipeline::{Column, Dataset};
use rand::prelude::*;
use rand::SeedableRng;
use tempfile::TempDir;

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const INTERNET: [&str; 3] = ["DSL", "Fiber optic", "No"];
const GENDERS: [&str; 2] = ["Female", "Male"];

/// One customer row of the deterministic fixture
pub struct Customer {
    pub id: String,
    pub gender: &'static str,
    pub senior: f64,
    pub tenure: f64,
    pub contract: &'static str,
    pub internet: &'static str,
    pub monthly: f64,
    pub total: f64,
    pub churn: &'static str,
}

/// Deterministic customers with varied values in every column.
///
/// Short-tenure month-to-month fiber customers churn, which gives the
/// correlation ranking a real signal.
pub fn customers(n: usize) -> Vec<Customer> {
    (0..n)
        .map(|i| {
            let tenure = (1 + (i * 7) % 72) as f64;
            let contract = CONTRACTS[i % 3];
            let internet = INTERNET[(i / 2) % 3];
            let monthly = 20.0 + ((i * 13) % 97) as f64 + 0.35;
            let churns = contract == "Month-to-month" && (tenure < 30.0 || internet == "Fiber optic");
            Customer {
                id: format!("{:04}-CUST", i),
                gender: GENDERS[(i / 3) % 2],
                senior: ((i % 5) == 0) as u8 as f64,
                tenure,
                contract,
                internet,
                monthly,
                total: tenure * monthly,
                churn: if churns { "Yes" } else { "No" },
            }
        })
        .collect()
}

/// The deterministic fixture as an in-memory dataset
pub fn create_churn_dataset(n: usize) -> Dataset {
    let rows = customers(n);
    Dataset::new(vec![
        Column::nominal("customerID", rows.iter().map(|c| c.id.clone()).collect()),
        Column::nominal("gender", rows.iter().map(|c| c.gender).collect()),
        Column::numeric("SeniorCitizen", rows.iter().map(|c| c.senior).collect()),
        Column::numeric("tenure", rows.iter().map(|c| c.tenure).collect()),
        Column::nominal("Contract", rows.iter().map(|c| c.contract).collect()),
        Column::nominal("InternetService", rows.iter().map(|c| c.internet).collect()),
        Column::numeric("MonthlyCharges", rows.iter().map(|c| c.monthly).collect()),
        Column::numeric("TotalCharges", rows.iter().map(|c| c.total).collect()),
        Column::nominal("Churn", rows.iter().map(|c| c.churn).collect()),
    ])
    .unwrap()
}

/// Write the fixture as CSV; rows listed in `blank_total` get a blank TotalCharges cell
pub fn create_churn_csv(n: usize, blank_total: &[usize]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("telco.csv");

    let mut csv = String::from(
        "customerID,gender,SeniorCitizen,tenure,Contract,InternetService,MonthlyCharges,TotalCharges,Churn\n",
    );
    for (i, c) in customers(n).iter().enumerate() {
        let total = if blank_total.contains(&i) {
            " ".to_string()
        } else {
            format!("{:.2}", c.total)
        };
        writeln!(
            csv,
            "{},{},{},{},{},{},{:.2},{},{}",
            c.id, c.gender, c.senior, c.tenure, c.contract, c.internet, c.monthly, total, c.churn
        )
        .unwrap();
    }

    std::fs::write(&path, csv).unwrap();
    (temp_dir, path)
}

/// Write a predictions CSV with truth, label and probability columns
pub fn create_predictions_csv(rows: &[(&str, &str, f64)]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("predictions.csv");

    let mut csv = String::from("Churn,predicted,probability\n");
    for (truth, predicted, probability) in rows {
        writeln!(csv, "{},{},{}", truth, predicted, probability).unwrap();
    }

    std::fs::write(&path, csv).unwrap();
    (temp_dir, path)
}

/// Random numeric features and a random 0/1 outcome for stress tests
pub fn create_random_features(rows: usize, cols: usize, seed: u64) -> (Vec<(String, Vec<f64>)>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let outcome: Vec<f64> = (0..rows).map(|_| f64::from(rng.gen::<bool>())).collect();
    let columns = (0..cols)
        .map(|c| {
            let values = (0..rows).map(|_| rng.gen::<f64>()).collect();
            (format!("feature_{}", c), values)
        })
        .collect();
    (columns, outcome)
}
