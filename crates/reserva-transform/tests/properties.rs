//! Property tests for the encoding and skewness primitives.

use proptest::prelude::*;

use reserva_model::CategoryMap;
use reserva_transform::sample_skewness;

proptest! {
    /// Codes are a dense range below the distinct-value count, whatever
    /// the input values look like.
    #[test]
    fn encoder_codes_are_dense(values in proptest::collection::vec("[a-z]{1,6}", 1..40)) {
        let map = CategoryMap::fit(values.iter().cloned());
        let distinct = map.len() as u32;
        for value in &values {
            let code = map.code(value).expect("every fitted value has a code");
            prop_assert!(code < distinct);
        }
        // Bijection: one code per category, no gaps.
        let mut codes: Vec<u32> = map.categories().filter_map(|c| map.code(c)).collect();
        codes.sort_unstable();
        prop_assert_eq!(codes, (0..distinct).collect::<Vec<u32>>());
    }

    /// Fitting twice over the same values yields the same mapping.
    #[test]
    fn encoder_is_deterministic(values in proptest::collection::vec("[a-z]{1,6}", 1..40)) {
        let a = CategoryMap::fit(values.iter().cloned());
        let b = CategoryMap::fit(values.iter().cloned());
        prop_assert_eq!(a, b);
    }

    /// Mirroring a sample around zero flips the sign of its skewness.
    #[test]
    fn skewness_is_antisymmetric(values in proptest::collection::vec(-1000.0f64..1000.0, 3..50)) {
        let mirrored: Vec<f64> = values.iter().map(|v| -v).collect();
        let skew = sample_skewness(&values);
        let mirrored_skew = sample_skewness(&mirrored);
        prop_assert!((skew + mirrored_skew).abs() < 1e-6);
    }
}
