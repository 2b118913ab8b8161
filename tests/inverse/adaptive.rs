use approx::assert_relative_eq;
use lrpc_rs::inverse::config::default_adaptive_eta;
use lrpc_rs::inverse::{
    pseudo_inverse_diagonal, AdaptiveInverse, DataQualityWarning, DirectInverse, InverseEstimator,
    Symmetrize,
};
use lrpc_rs::simulate::{banded_precision, simulate_from_precision};
use lrpc_rs::utils::WorkerPool;
use ndarray::{arr2, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::test_helpers::{is_symmetric, max_abs_diff, spd_inverse};

/// Difference between the adaptive and the direct estimate at the rate
/// `2·√(log p / n)`, with the pilot cutoff relaxed.
fn adaptive_direct_gap(n: usize) -> f64 {
    let p = 6;
    let covariance = spd_inverse(&banded_precision(p, 0.3));
    let eta = default_adaptive_eta(p, n);
    let pool = WorkerPool::new(2).unwrap();

    let adaptive = AdaptiveInverse::new()
        .with_eta_adaptive(eta)
        .with_relax_cutoff(true)
        .estimate_with_pool(&pool, &covariance, n, Some(eta))
        .unwrap();
    let direct = DirectInverse::new()
        .estimate_with_pool(&pool, &covariance, eta)
        .unwrap();

    max_abs_diff(&adaptive.matrix, &direct.matrix)
}

#[test]
fn test_adaptive_approaches_direct_as_n_grows() {
    let small = adaptive_direct_gap(100);
    let large = adaptive_direct_gap(100_000);

    assert!(large < small, "gap did not shrink: {} vs {}", large, small);
    assert!(large < 0.05, "gap at large n is {}", large);
}

#[test]
fn test_adaptive_output_is_valid() {
    let p = 8;
    let precision = banded_precision(p, 0.4);
    let covariance = spd_inverse(&precision);

    let est = AdaptiveInverse::new()
        .with_n_cores(2)
        .estimate(&covariance, 2_000, None)
        .unwrap();

    assert!(is_symmetric(&est.matrix));
    for i in 0..p {
        assert!(est.matrix[[i, i]] > 0.0);
    }
    let pilot = est.pilot.expect("adaptive estimate carries its pilot");
    assert_eq!(pilot.len(), p);
    assert!(pilot.iter().all(|v| *v > 0.0));
    assert_eq!(est.eta_adaptive, Some(default_adaptive_eta(p, 2_000)));
}

#[test]
fn test_short_sample_pilots_stay_positive_and_columns_sparse() {
    let (p, n) = (30, 40);
    let mut rng = ChaCha8Rng::seed_from_u64(40);
    let x = simulate_from_precision(n, &banded_precision(p, 0.4), &mut rng).unwrap();
    let gamma = x.dot(&x.t()) / n as f64;

    let est = AdaptiveInverse::new()
        .with_symmetrize(Symmetrize::None)
        .with_n_cores(2)
        .estimate(&gamma, n, None)
        .unwrap();

    let pilot = est.pilot.as_ref().unwrap();
    for i in 0..p {
        assert!(pilot[i] > 0.0, "pilot {} is {}", i, pilot[i]);
        let nnz = est.matrix.column(i).iter().filter(|v| **v != 0.0).count();
        assert!(nnz < p / 2, "column {} has {} non-zeros", i, nnz);
    }
}

/// Both variances sit above the pilot cutoff for n = 2, so both pilots take the
/// fallback value. The strong coupling makes column 0 cheaper to fit through
/// d_1 alone, which leaves a zero on the diagonal.
fn zero_diagonal_target() -> Array2<f64> {
    arr2(&[[4.0, 5.9], [5.9, 9.0]])
}

#[test]
fn test_zero_diagonal_replaced_from_ridge_free_target() {
    let gamma = zero_diagonal_target();
    let n = 2;
    let eta = 0.4;

    let raw = AdaptiveInverse::new()
        .with_correct_diagonal(false)
        .with_n_cores(1)
        .estimate(&gamma, n, Some(eta))
        .unwrap();
    assert_eq!(raw.matrix[[0, 0]], 0.0);
    assert!(raw.warnings.iter().any(|w| matches!(
        w,
        DataQualityWarning::NonPositiveDiagonal { indices, .. } if indices == &vec![0]
    )));

    let est = AdaptiveInverse::new()
        .with_n_cores(1)
        .estimate(&gamma, n, Some(eta))
        .unwrap();
    assert_eq!(est.corrected, vec![0]);
    assert!(est.warnings.is_empty());

    let ridge_free = pseudo_inverse_diagonal(gamma.view()).unwrap();
    let mut ridged_gamma = gamma.clone();
    ridged_gamma.diag_mut().mapv_inplace(|v| v + 1.0 / n as f64);
    let ridged = pseudo_inverse_diagonal(ridged_gamma.view()).unwrap();
    assert_relative_eq!(est.matrix[[0, 0]], ridge_free[0], epsilon = 1e-9);
    assert_relative_eq!(est.matrix[[0, 0]], 9.0 / 1.19, epsilon = 1e-9);
    assert!((est.matrix[[0, 0]] - ridged[0]).abs() > 1.0);

    // The positive entry is left as solved
    assert_eq!(est.matrix[[1, 1]], raw.matrix[[1, 1]]);
    assert!(est.matrix[[1, 1]] > 0.0);
}

#[test]
fn test_trait_object_dispatch() {
    let covariance = spd_inverse(&banded_precision(4, 0.2));
    let pool = WorkerPool::new(1).unwrap();

    let estimators: Vec<Box<dyn InverseEstimator>> =
        vec![Box::new(DirectInverse::new()), Box::new(AdaptiveInverse::new())];

    for estimator in &estimators {
        let est = estimator
            .estimate_in(&pool, &covariance, Some(0.05), 500)
            .unwrap();
        assert_eq!(est.pilot.is_some(), estimator.is_adaptive());
        assert_eq!(est.eta, 0.05);
    }
}
