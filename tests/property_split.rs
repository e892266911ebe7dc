//! Partition properties of the random train/test split.

use ndarray::{Array4, Axis};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use segmentar::data::train_test;
use segmentar::TensorDataset;

/// Dataset whose sample index is recoverable from its feature values.
fn indexed_dataset(n: usize) -> TensorDataset {
    let mut features = Array4::zeros((n, 1, 2, 2));
    for i in 0..n {
        features.index_axis_mut(Axis(0), i).fill(i as f32);
    }
    TensorDataset::new(features, Array4::zeros((n, 1, 2, 2))).unwrap()
}

proptest! {
    #[test]
    fn prop_split_is_an_exact_partition(
        n in 1usize..64,
        r in 0.1f64..=0.99,
        seed in any::<u64>(),
    ) {
        let ds = indexed_dataset(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let (train, test) = train_test(&ds, r, &mut rng).unwrap();

        prop_assert_eq!(train.len(), (n as f64 * r).round() as usize);
        prop_assert_eq!(train.len() + test.len(), n);

        let mut seen: Vec<usize> = Vec::with_capacity(n);
        for half in [&train, &test] {
            for i in 0..half.len() {
                seen.push(half.features()[[i, 0, 0, 0]] as usize);
            }
        }
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_out_of_range_ratios_are_rejected(
        r in prop_oneof![-1.0f64..0.0999, 0.9901f64..2.0],
        seed in any::<u64>(),
    ) {
        let ds = indexed_dataset(8);
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert!(train_test(&ds, r, &mut rng).is_err());
    }

    #[test]
    fn prop_same_seed_reproduces_the_split(
        n in 2usize..32,
        seed in any::<u64>(),
    ) {
        let ds = indexed_dataset(n);
        let (a, _) = train_test(&ds, 0.5, &mut StdRng::seed_from_u64(seed)).unwrap();
        let (b, _) = train_test(&ds, 0.5, &mut StdRng::seed_from_u64(seed)).unwrap();
        prop_assert_eq!(a.features(), b.features());
    }
}
