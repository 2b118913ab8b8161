use approx::assert_relative_eq;
use lrpc_rs::error::LrpcError;
use lrpc_rs::inverse::{DirectInverse, Symmetrize};
use lrpc_rs::simulate::banded_precision;
use lrpc_rs::utils::WorkerPool;
use ndarray::{arr2, Array2};

use crate::test_helpers::{is_symmetric, max_abs_diff, spd_inverse};

#[test]
fn test_scaled_identity_gives_reciprocal() {
    for &sigma in &[0.5, 1.0, 4.0] {
        let gamma = Array2::<f64>::eye(6) * sigma;
        let est = DirectInverse::new()
            .with_n_cores(2)
            .estimate(&gamma, 1e-4)
            .unwrap();

        let expected = Array2::<f64>::eye(6) / sigma;
        assert!(max_abs_diff(&est.matrix, &expected) < 1e-3 / sigma);
    }
}

#[test]
fn test_recovers_banded_precision_from_exact_covariance() {
    let precision = banded_precision(8, 0.3);
    let covariance = spd_inverse(&precision);

    let est = DirectInverse::new()
        .with_n_cores(2)
        .estimate(&covariance, 1e-4)
        .unwrap();

    assert!(is_symmetric(&est.matrix));
    assert!(max_abs_diff(&est.matrix, &precision) < 0.01);
    assert!(est.corrected.is_empty());
    assert!(est.warnings.is_empty());
}

#[test]
fn test_shared_pool_matches_standalone_call() {
    let gamma = arr2(&[[2.0, 0.5, 0.0], [0.5, 2.0, 0.5], [0.0, 0.5, 2.0]]);
    let estimator = DirectInverse::new().with_symmetrize(Symmetrize::Avg);

    let pool = WorkerPool::new(3).unwrap();
    let shared = estimator.estimate_with_pool(&pool, &gamma, 0.05).unwrap();
    let standalone = estimator.estimate(&gamma, 0.05).unwrap();

    assert!(max_abs_diff(&shared.matrix, &standalone.matrix) < 1e-9);
    assert_eq!(shared.symmetrize, Symmetrize::Avg);
    assert_relative_eq!(shared.eta, 0.05);
}

#[test]
fn test_zero_row_target_fails_with_column_index() {
    let mut gamma = Array2::<f64>::eye(3);
    gamma[[1, 1]] = 0.0;

    match DirectInverse::new().estimate(&gamma, 0.1) {
        Err(LrpcError::ColumnSolveFailed { column, .. }) => assert_eq!(column, 1),
        other => panic!("expected a column failure, got {:?}", other),
    }
}

#[test]
fn test_rejects_invalid_eta_and_shape() {
    let gamma = Array2::<f64>::eye(3);
    assert!(matches!(
        DirectInverse::new().estimate(&gamma, -0.1),
        Err(LrpcError::InvalidConfig(_))
    ));

    let rect = Array2::<f64>::zeros((2, 3));
    assert!(matches!(
        DirectInverse::new().estimate(&rect, 0.1),
        Err(LrpcError::DimensionMismatch(_))
    ));
}
