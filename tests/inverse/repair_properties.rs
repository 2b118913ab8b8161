use approx::assert_relative_eq;
use lrpc_rs::inverse::{correct_diagonal, partial_correlation, symmetrize, Symmetrize};
use ndarray::Array2;

use crate::test_helpers::{is_symmetric, random_matrix};

#[test]
fn property_symmetrize_is_exact() {
    for seed in 0..10 {
        let d = random_matrix(6, 6, -1.0, 1.0, seed);

        for rule in [Symmetrize::Min, Symmetrize::Max, Symmetrize::Avg] {
            let s = symmetrize(&d, rule).unwrap();
            assert!(is_symmetric(&s), "{:?} output not symmetric", rule);
        }
    }
}

#[test]
fn property_symmetrize_picks_by_magnitude() {
    let d = random_matrix(5, 5, -1.0, 1.0, 42);
    let min = symmetrize(&d, Symmetrize::Min).unwrap();
    let max = symmetrize(&d, Symmetrize::Max).unwrap();
    let avg = symmetrize(&d, Symmetrize::Avg).unwrap();
    let expected_avg = (&d + &d.t()) / 2.0;

    for i in 0..5 {
        for j in 0..5 {
            let (a, b) = (d[[i, j]], d[[j, i]]);
            assert_eq!(min[[i, j]].abs(), a.abs().min(b.abs()));
            assert_eq!(max[[i, j]].abs(), a.abs().max(b.abs()));
            assert!(min[[i, j]] == a || min[[i, j]] == b);
            assert_relative_eq!(avg[[i, j]], expected_avg[[i, j]], epsilon = 1e-15);
        }
    }
}

#[test]
fn property_symmetrize_none_is_identity() {
    let d = random_matrix(4, 4, -1.0, 1.0, 3);
    assert_eq!(symmetrize(&d, Symmetrize::None).unwrap(), d);
}

#[test]
fn property_correction_gives_positive_diagonal() {
    for seed in 0..5 {
        let a = random_matrix(5, 5, -1.0, 1.0, 100 + seed);
        let gamma = a.dot(&a.t());

        // Force some bad diagonal entries
        let mut d = random_matrix(5, 5, -0.2, 0.2, 200 + seed);
        d[[0, 0]] = -1.0;
        d[[3, 3]] = 0.0;

        let (fixed, replaced) = correct_diagonal(&d, gamma.view()).unwrap();
        assert!(replaced.contains(&0));
        assert!(replaced.contains(&3));
        for i in 0..5 {
            assert!(fixed[[i, i]] > 0.0);
        }
    }
}

#[test]
fn property_correction_on_rank_deficient_target() {
    // Rank one target: every diagonal entry of its pseudo-inverse is positive
    // except those in its null space, which fall back to the smallest positive one
    let mut gamma = Array2::<f64>::zeros((3, 3));
    gamma[[0, 0]] = 2.0;
    let d = Array2::<f64>::from_diag(&ndarray::arr1(&[-1.0, -1.0, 1.0]));

    let (fixed, replaced) = correct_diagonal(&d, gamma.view()).unwrap();
    assert_eq!(replaced, vec![0, 1]);
    assert_relative_eq!(fixed[[0, 0]], 0.5, epsilon = 1e-12);
    assert_relative_eq!(fixed[[1, 1]], 0.5, epsilon = 1e-12);
    assert_eq!(fixed[[2, 2]], 1.0);
}

#[test]
fn property_repair_is_idempotent_on_valid_input() {
    let a = random_matrix(4, 4, -0.3, 0.3, 9);
    let mut d = (&a + &a.t()) / 2.0;
    for i in 0..4 {
        d[[i, i]] = 1.0 + i as f64;
    }
    let gamma = Array2::<f64>::eye(4);

    let s = symmetrize(&d, Symmetrize::Min).unwrap();
    assert_eq!(s, d);
    let (fixed, replaced) = correct_diagonal(&s, gamma.view()).unwrap();
    assert!(replaced.is_empty());
    assert_eq!(fixed, d);
}

#[test]
fn property_partial_correlation_diagonal_is_minus_one() {
    let a = random_matrix(6, 6, -1.0, 1.0, 17);
    let m = a.dot(&a.t()) + Array2::<f64>::eye(6);
    let pc = partial_correlation(&m).unwrap();

    for i in 0..6 {
        assert_eq!(pc[[i, i]], -1.0);
        for j in 0..6 {
            assert!(pc[[i, j]].abs() <= 1.0 + 1e-12);
        }
    }
}
