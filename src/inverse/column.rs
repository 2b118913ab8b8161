//! Column-wise constrained L1 problem.
//!
//! Column `i` of the inverse estimate solves
//!
//! ```text
//! minimize ‖d‖₁  subject to  |(Γ d)_j − δ_ij| ≤ b_j   for every row j
//! ```
//!
//! written as a linear program over the split `d = d⁺ − d⁻` with
//! `d⁺, d⁻ ≥ 0` and objective `Σ (d⁺ + d⁻)`. Every row gives one `≤` and one
//! `≥` constraint on `Γ (d⁺ − d⁻)`.
//!
//! With a scaled tolerance the bound of row `j` is `b_j · d_i` instead of
//! `b_j`, and the term moves to the left-hand side:
//!
//! ```text
//! (Γ d)_j − b_j d⁺_i ≤ δ_ij      (Γ d)_j + b_j d⁺_i ≥ δ_ij
//! ```
//!
//! This is the pilot problem of the adaptive estimator; it is only meaningful
//! together with `d⁻_i = 0`.

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem as LpProblem, Variable};
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{LrpcError, Result};

/// Entries of a column solution below this magnitude are set to zero.
const ZERO_CLEANUP: f64 = 1e-12;

/// One column problem: a target matrix, a column index and row tolerances.
#[derive(Debug, Clone)]
pub struct ColumnProblem<'a> {
    /// The target matrix Γ (p×p)
    gamma: ArrayView2<'a, f64>,

    /// Column index i
    column: usize,

    /// Row tolerances b (length p)
    tolerances: ArrayView1<'a, f64>,

    /// Force the own diagonal entry d_i to be non-negative
    nonnegative_diagonal: bool,

    /// Multiply every row tolerance by the own diagonal entry d⁺_i
    scaled_tolerance: bool,
}

impl<'a> ColumnProblem<'a> {
    /// Create a column problem.
    ///
    /// # Arguments
    ///
    /// * `gamma` - Square target matrix
    /// * `column` - Index of the column to solve for
    /// * `tolerances` - Non-negative, finite tolerance per row
    ///
    /// # Returns
    ///
    /// * `Result<ColumnProblem>` - The problem, or an error on invalid input
    pub fn new(
        gamma: ArrayView2<'a, f64>,
        column: usize,
        tolerances: ArrayView1<'a, f64>,
    ) -> Result<Self> {
        let (rows, cols) = gamma.dim();
        if rows != cols {
            return Err(LrpcError::DimensionMismatch(format!(
                "Target matrix must be square, got {}x{}",
                rows, cols
            )));
        }
        if tolerances.len() != rows {
            return Err(LrpcError::DimensionMismatch(format!(
                "Expected {} tolerances, got {}",
                rows,
                tolerances.len()
            )));
        }
        if column >= rows {
            return Err(LrpcError::InvalidInput(format!(
                "Column index {} out of range for dimension {}",
                column, rows
            )));
        }
        if let Some(bad) = tolerances.iter().find(|b| !b.is_finite() || **b < 0.0) {
            return Err(LrpcError::InvalidInput(format!(
                "Tolerances must be finite and non-negative, got {}",
                bad
            )));
        }

        Ok(Self {
            gamma,
            column,
            tolerances,
            nonnegative_diagonal: false,
            scaled_tolerance: false,
        })
    }

    /// Add the equality `d⁻_i = 0`, which keeps the own diagonal entry non-negative.
    pub fn with_nonnegative_diagonal(mut self, enabled: bool) -> Self {
        self.nonnegative_diagonal = enabled;
        self
    }

    /// Use `b_j · d⁺_i` as the bound of row `j`.
    ///
    /// Enabling this also enables the non-negative diagonal equality.
    pub fn with_scaled_tolerance(mut self, enabled: bool) -> Self {
        self.scaled_tolerance = enabled;
        if enabled {
            self.nonnegative_diagonal = true;
        }
        self
    }

    /// Column index of this problem.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Solve the linear program.
    ///
    /// # Returns
    ///
    /// * `Result<Array1<f64>>` - The column `d`, or `ColumnSolveFailed` if the
    ///   program is infeasible, unbounded, or returns non-finite values
    pub fn solve(&self) -> Result<Array1<f64>> {
        let p = self.gamma.nrows();
        let mut lp = LpProblem::new(OptimizationDirection::Minimize);

        let plus: Vec<Variable> = (0..p).map(|_| lp.add_var(1.0, (0.0, f64::INFINITY))).collect();
        let minus: Vec<Variable> = (0..p).map(|_| lp.add_var(1.0, (0.0, f64::INFINITY))).collect();

        for j in 0..p {
            let target = if j == self.column { 1.0 } else { 0.0 };
            let b = self.tolerances[j];
            let (slack, own) = if self.scaled_tolerance { (0.0, b) } else { (b, 0.0) };

            let rows = (
                self.row_expr(j, &plus, &minus, -own),
                self.row_expr(j, &plus, &minus, own),
            );
            let (upper, lower) = match rows {
                (Some(upper), Some(lower)) => (upper, lower),
                // An empty row constrains nothing but the constant target
                _ => {
                    if target > slack {
                        return Err(LrpcError::ColumnSolveFailed {
                            column: self.column,
                            reason: format!("row {} of the target is zero; constraint is infeasible", j),
                        });
                    }
                    continue;
                }
            };

            lp.add_constraint(upper, ComparisonOp::Le, target + slack);
            lp.add_constraint(lower, ComparisonOp::Ge, target - slack);
        }

        if self.nonnegative_diagonal {
            let mut expr = LinearExpr::empty();
            expr.add(minus[self.column], 1.0);
            lp.add_constraint(expr, ComparisonOp::Eq, 0.0);
        }

        let solution = lp.solve().map_err(|err| LrpcError::ColumnSolveFailed {
            column: self.column,
            reason: err.to_string(),
        })?;

        let d = Array1::from_shape_fn(p, |k| {
            let value = solution[plus[k]] - solution[minus[k]];
            if value.abs() < ZERO_CLEANUP {
                0.0
            } else {
                value
            }
        });

        if d.iter().any(|v| !v.is_finite()) {
            return Err(LrpcError::ColumnSolveFailed {
                column: self.column,
                reason: "solution contains non-finite values".to_string(),
            });
        }

        Ok(d)
    }

    /// Row `j` of `Γ (d⁺ − d⁻)` with `own` added to the coefficient of `d⁺_i`,
    /// skipping zero coefficients. `None` when every coefficient is zero.
    fn row_expr(&self, j: usize, plus: &[Variable], minus: &[Variable], own: f64) -> Option<LinearExpr> {
        let mut expr = LinearExpr::empty();
        let mut empty = true;
        for (k, &g) in self.gamma.row(j).iter().enumerate() {
            // Each variable may appear once per constraint
            let coef = if k == self.column { g + own } else { g };
            if coef != 0.0 {
                expr.add(plus[k], coef);
                empty = false;
            }
            if g != 0.0 {
                expr.add(minus[k], -g);
                empty = false;
            }
        }
        if empty {
            None
        } else {
            Some(expr)
        }
    }
}

/// Reject an all-zero column: it cannot serve as a column of a precision matrix.
pub fn ensure_nonzero(column: usize, d: &Array1<f64>) -> Result<()> {
    if d.iter().all(|v| *v == 0.0) {
        return Err(LrpcError::ColumnSolveFailed {
            column,
            reason: "solution is the zero vector; the tolerance admits d = 0".to_string(),
        });
    }
    Ok(())
}
