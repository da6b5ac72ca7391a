//! Seeded train/test partitioning

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::dataset::Dataset;
use super::error::{PrepError, PrepResult};

/// Default share of records assigned to the training partition
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Default seed for reproducible experiments
pub const DEFAULT_SEED: u64 = 42;

/// A disjoint partition of a dataset into training and holdout records
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
    /// Original row positions of the training records, ascending
    pub train_rows: Vec<usize>,
    /// Original row positions of the holdout records, ascending
    pub test_rows: Vec<usize>,
}

/// Partition `dataset` into train and test subsets.
///
/// Each record independently joins the training set with probability
/// `train_fraction`, driven by a PRNG seeded with `seed`. The same inputs
/// always give the same partition. No stratification is attempted, so the
/// outcome balance of each side may drift from the full dataset's.
pub fn split(dataset: &Dataset, train_fraction: f64, seed: u64) -> PrepResult<Split> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(PrepError::invalid(
            "train_fraction",
            format!("must be strictly between 0 and 1, got {}", train_fraction),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let (train_rows, test_rows): (Vec<usize>, Vec<usize>) =
        (0..dataset.n_rows()).partition(|_| rng.gen::<f64>() < train_fraction);

    Ok(Split {
        train: dataset.take_rows(&train_rows),
        test: dataset.take_rows(&test_rows),
        train_rows,
        test_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::Column;

    fn indexed_dataset(n: usize) -> Dataset {
        Dataset::new(vec![Column::numeric(
            "id",
            (0..n).map(|i| i as f64).collect(),
        )])
        .unwrap()
    }

    #[test]
    fn test_split_rejects_out_of_range_fraction() {
        let ds = indexed_dataset(10);
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let err = split(&ds, bad, 1).unwrap_err();
            assert!(
                matches!(err, PrepError::InvalidParameter { .. }),
                "fraction {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let ds = indexed_dataset(200);
        let a = split(&ds, 0.7, 123).unwrap();
        let b = split(&ds, 0.7, 123).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_covers_every_row_once() {
        let ds = indexed_dataset(500);
        let s = split(&ds, 0.8, 7).unwrap();

        let mut all: Vec<usize> = s.train_rows.iter().chain(s.test_rows.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..500).collect::<Vec<_>>());
        assert_eq!(s.train.n_rows() + s.test.n_rows(), 500);

        let ids = s.train.numeric("id").unwrap();
        assert!(ids.iter().zip(&s.train_rows).all(|(&id, &row)| id == row as f64));
    }

    #[test]
    fn test_split_fraction_is_roughly_honored() {
        let ds = indexed_dataset(10_000);
        let s = split(&ds, 0.8, DEFAULT_SEED).unwrap();
        let share = s.train.n_rows() as f64 / 10_000.0;
        assert!((share - 0.8).abs() < 0.03, "train share {} too far from 0.8", share);
    }

    #[test]
    fn test_different_seeds_differ() {
        let ds = indexed_dataset(200);
        let a = split(&ds, 0.5, 1).unwrap();
        let b = split(&ds, 0.5, 2).unwrap();
        assert_ne!(a.train_rows, b.train_rows);
    }
}
