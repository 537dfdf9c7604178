// THEORY:
// The numeric workloads that run on the `ParallelReducer`. Each one is expressed as an
// identity value, a per-index fold step, and a merge step; none of them know anything
// about threads.
//
// - Leibniz series: pi / 4 = sum over i of (-1)^i / (2i + 1).
// - Prime filter: keep the primes of a sample list, tagged with their sample index so the
//   caller can restore input order after an unordered merge.
// - Regression sums: n, Σx, Σy, Σxy, Σx², from which the least-squares line follows.

use crate::error::{Result, StencilError};
use std::fmt;

/// One `(x, y)` sample of the regression corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The `i`-th term of the Leibniz series.
#[inline]
pub fn leibniz_term(i: usize) -> f64 {
    let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
    sign / (2.0 * i as f64 + 1.0)
}

/// Trial division up to the square root.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut divisor = 3i64;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

/// Primes found so far, each paired with the index of the sample it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimeTally {
    pub found: Vec<(usize, i64)>,
}

impl PrimeTally {
    pub fn observe(&mut self, index: usize, value: i64) {
        if is_prime(value) {
            self.found.push((index, value));
        }
    }

    pub fn absorb(&mut self, other: PrimeTally) {
        self.found.extend(other.found);
    }

    pub fn count(&self) -> usize {
        self.found.len()
    }

    /// Restores sample order after merges arrived in completion order.
    pub fn into_ordered(mut self) -> Vec<i64> {
        self.found.sort_unstable_by_key(|&(index, _)| index);
        self.found.into_iter().map(|(_, value)| value).collect()
    }
}

/// Running sums for a least-squares line fit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegressionSums {
    pub n: usize,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_xy: f64,
    pub sum_x2: f64,
}

impl RegressionSums {
    pub fn observe(&mut self, point: &Point) {
        self.n += 1;
        self.sum_x += point.x;
        self.sum_y += point.y;
        self.sum_xy += point.x * point.y;
        self.sum_x2 += point.x * point.x;
    }

    pub fn absorb(&mut self, other: RegressionSums) {
        self.n += other.n;
        self.sum_x += other.sum_x;
        self.sum_y += other.sum_y;
        self.sum_xy += other.sum_xy;
        self.sum_x2 += other.sum_x2;
    }

    /// Least-squares slope and intercept.
    pub fn fit(&self) -> Result<LinearFit> {
        if self.n == 0 {
            return Err(StencilError::empty_input("regression samples"));
        }
        let n = self.n as f64;
        let mean_x = self.sum_x / n;
        let mean_y = self.sum_y / n;

        let denominator = self.sum_x2 - n * mean_x * mean_x;
        if denominator == 0.0 {
            return Err(StencilError::DegenerateRegression);
        }

        let slope = (self.sum_xy - n * mean_x * mean_y) / denominator;
        Ok(LinearFit {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }
}

/// `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

impl fmt::Display for LinearFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y = {:.2}x + {:.2}", self.slope, self.intercept)
    }
}
