use approx::assert_relative_eq;
use lrpc_rs::collaborators::{DynamicEstimator, EdgeCountThreshold, SampleAutocovariance};
use lrpc_rs::cv::residual_autocovariance;
use lrpc_rs::inverse::DataQualityWarning;
use lrpc_rs::simulate::{simulate_gaussian, simulate_var1, Innovations};
use lrpc_rs::{FactorVarFit, LongRunPartialCorrelation, LrpcConfig};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

use crate::test_helpers::{is_symmetric, random_matrix};

/// Identity plus symmetric off-diagonal noise below 0.05 in magnitude.
fn near_identity(p: usize, seed: u64) -> Array2<f64> {
    let noise = random_matrix(p, p, -0.05, 0.05, seed);
    let mut gamma = (&noise + &noise.t()) / 2.0;
    for i in 0..p {
        gamma[[i, i]] = 1.0;
    }
    gamma
}

/// Model quantities computed from a VAR(1) series with known coefficient.
fn fit_var1(x: &Array2<f64>, coefficient: f64) -> FactorVarFit {
    let p = x.nrows();
    let beta = Array2::<f64>::eye(p) * coefficient;
    let estimate = SampleAutocovariance::new()
        .estimate(x.view(), 0, 10.0, 1)
        .unwrap();

    FactorVarFit {
        innovation_autocovariance: residual_autocovariance(&estimate, &beta).unwrap(),
        var_coefficients: beta,
        spectral_density: estimate.spectral_density,
        mean: x.mean_axis(Axis(1)).unwrap(),
        factor_count: 0,
        kernel_bandwidth: 10.0,
    }
}

#[test]
fn test_fixed_eta_near_identity() {
    let (p, n) = (10, 500);
    let gamma = near_identity(p, 21);
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let x = simulate_gaussian(n, &gamma, &mut rng).unwrap();

    let fit = FactorVarFit {
        innovation_autocovariance: gamma.clone(),
        var_coefficients: Array2::zeros((p, p)),
        spectral_density: &gamma / (2.0 * PI),
        mean: Array1::zeros(p),
        factor_count: 0,
        kernel_bandwidth: 5.0,
    };

    let result = LongRunPartialCorrelation::new(LrpcConfig::default().with_eta(0.1))
        .estimate(&fit, x.view(), &SampleAutocovariance::new(), &EdgeCountThreshold::new())
        .unwrap();

    assert!(result.cv.is_none());
    assert!(is_symmetric(&result.delta));
    for i in 0..p {
        let off: f64 = (0..p)
            .filter(|&j| j != i)
            .map(|j| result.delta[[i, j]].abs())
            .sum();
        assert!(result.delta[[i, i]] > off, "row {} not diagonally dominant", i);

        assert_eq!(result.pc[[i, i]], -1.0);
        assert_eq!(result.lrpc[[i, i]], -1.0);
        for j in 0..p {
            if i != j {
                assert!(result.pc[[i, j]].abs() < 0.2);
            }
        }
    }

    // A(1) = I, so Omega is Delta scaled by 2π
    for i in 0..p {
        for j in 0..p {
            assert_relative_eq!(result.omega[[i, j]], 2.0 * PI * result.delta[[i, j]], epsilon = 1e-10);
        }
    }
}

#[test]
fn test_cross_validated_var1_pipeline() {
    let (p, n) = (8, 400);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let x = simulate_var1(n, p, 0.5, Innovations::Gaussian { sd: 1.0 }, 200, &mut rng).unwrap();
    let fit = fit_var1(&x, 0.5);

    for adaptive in [false, true] {
        let config = LrpcConfig::default()
            .with_adaptive(adaptive)
            .with_path_length(6)
            .with_n_cores(2);
        let result = LongRunPartialCorrelation::new(config)
            .estimate(&fit, x.view(), &SampleAutocovariance::new(), &EdgeCountThreshold::new())
            .unwrap();

        let cv = result.cv.as_ref().expect("eta was cross-validated");
        assert_eq!(result.eta, cv.eta);
        assert!(cv.path.contains(&result.eta));
        assert_eq!(result.adaptive, adaptive);
        assert_eq!(result.eta_adaptive.is_some(), adaptive);

        assert!(is_symmetric(&result.delta));
        for i in 0..p {
            assert!(result.delta[[i, i]] > 0.0);
            assert!(result.omega[[i, i]] > 0.0);
            assert_eq!(result.lrpc[[i, i]], -1.0);
        }
        assert!(result.warnings.is_empty());
    }
}

#[test]
fn test_thresholded_pipeline() {
    let (p, n) = (6, 300);
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let x = simulate_var1(n, p, 0.3, Innovations::StudentT { df: 8.0, scale: 1.0 }, 100, &mut rng)
        .unwrap();
    let fit = fit_var1(&x, 0.3);

    let config = LrpcConfig::default()
        .with_eta(0.05)
        .with_threshold(true)
        .with_n_cores(1);
    let result = LongRunPartialCorrelation::new(config)
        .estimate(&fit, x.view(), &SampleAutocovariance::new(), &EdgeCountThreshold::new())
        .unwrap();

    assert!(result.delta_threshold.is_some());
    assert!(result.omega_threshold.is_some());
    for i in 0..p {
        assert_eq!(result.pc[[i, i]], -1.0);
    }
}

#[test]
fn test_uncorrected_diagonal_reports_warning() {
    let p = 3;
    // A negative innovation variance carries into Delta and Omega
    let gamma = Array2::from_diag(&Array1::from_vec(vec![-1.0, 1.0, 1.0]));
    let fit = FactorVarFit {
        innovation_autocovariance: gamma.clone(),
        var_coefficients: Array2::zeros((p, p)),
        spectral_density: Array2::eye(p),
        mean: Array1::zeros(p),
        factor_count: 0,
        kernel_bandwidth: 2.0,
    };
    let x = Array2::<f64>::zeros((p, 30));

    let config = LrpcConfig::default()
        .with_eta(0.1)
        .with_correct_diagonal(false);
    let result = LongRunPartialCorrelation::new(config)
        .estimate(&fit, x.view(), &SampleAutocovariance::new(), &EdgeCountThreshold::new())
        .unwrap();

    assert!(result.warnings.iter().any(|w| matches!(
        w,
        DataQualityWarning::NonPositiveDiagonal { matrix, indices } if matrix == "Delta" && indices == &vec![0]
    )));
    assert!(result.warnings.iter().any(|w| matches!(
        w,
        DataQualityWarning::NonPositiveDiagonal { matrix, .. } if matrix == "Omega"
    )));
    assert!(!result.pc[[0, 1]].is_finite());
}
