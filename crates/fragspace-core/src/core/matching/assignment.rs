use nalgebra::DMatrix;

const UNREACHABLE_COST: f64 = 1.0e9;

/// Minimum-cost assignment of rows to columns.
///
/// Every row is paired with exactly one column when `rows <= cols`, and every column
/// with exactly one row otherwise. Pairs are returned as `(row, col)` sorted by row.
/// A matrix without rows or columns yields no pairs.
pub fn solve(cost: &DMatrix<f64>) -> Vec<(usize, usize)> {
    if cost.nrows() == 0 || cost.ncols() == 0 {
        return Vec::new();
    }
    if cost.nrows() > cost.ncols() {
        let transposed = cost.transpose();
        let mut pairs: Vec<(usize, usize)> = hungarian(&transposed)
            .into_iter()
            .map(|(row, col)| (col, row))
            .collect();
        pairs.sort_unstable();
        return pairs;
    }
    hungarian(cost)
}

/// Assignment maximizing the summed similarity of a similarity matrix with entries in [0, 1].
pub fn maximize_similarity(similarity: &DMatrix<f64>) -> Vec<(usize, usize)> {
    solve(&similarity.map(|s| 1.0 - s))
}

// Kuhn-Munkres with row/column potentials; requires rows <= cols.
fn hungarian(cost: &DMatrix<f64>) -> Vec<(usize, usize)> {
    let n = cost.nrows();
    let m = cost.ncols();
    debug_assert!(n <= m, "assignment solver requires rows <= cols");

    let entry = |i: usize, j: usize| {
        let c = cost[(i - 1, j - 1)];
        if c.is_finite() { c } else { UNREACHABLE_COST }
    };

    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut owner = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        owner[0] = i;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = entry(i0, j) - u[i0] - v[j];
                if reduced < min_slack[j] {
                    min_slack[j] = reduced;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut pairs: Vec<(usize, usize)> = (1..=m)
        .filter(|&j| owner[j] != 0)
        .map(|j| (owner[j] - 1, j - 1))
        .collect();
    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(cost: &DMatrix<f64>, pairs: &[(usize, usize)]) -> f64 {
        pairs.iter().map(|&(r, c)| cost[(r, c)]).sum()
    }

    #[test]
    fn solves_square_matrix_optimally() {
        let cost = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 3.0, 2.0, 0.0, 5.0, 3.0, 2.0, 2.0]);
        let pairs = solve(&cost);
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(total(&cost, &pairs), 5.0);
    }

    #[test]
    fn wide_matrix_assigns_every_row_once() {
        let cost = DMatrix::from_row_slice(2, 4, &[9.0, 2.0, 7.0, 8.0, 6.0, 4.0, 3.0, 7.0]);
        let pairs = solve(&cost);
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn tall_matrix_is_transposed_and_mapped_back() {
        let cost = DMatrix::from_row_slice(4, 2, &[9.0, 6.0, 2.0, 4.0, 7.0, 3.0, 8.0, 7.0]);
        let pairs = solve(&cost);
        assert_eq!(pairs, vec![(1, 0), (2, 1)]);
        let mut cols: Vec<usize> = pairs.iter().map(|&(_, c)| c).collect();
        cols.sort_unstable();
        cols.dedup();
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn degenerate_matrices_yield_no_pairs() {
        assert!(solve(&DMatrix::<f64>::zeros(0, 3)).is_empty());
        assert!(solve(&DMatrix::<f64>::zeros(2, 0)).is_empty());
    }

    #[test]
    fn maximize_similarity_prefers_best_pairing() {
        let sim = DMatrix::from_row_slice(2, 2, &[0.9, 0.8, 0.85, 0.1]);
        // 0.8 + 0.85 beats 0.9 + 0.1
        assert_eq!(maximize_similarity(&sim), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn non_finite_costs_are_avoided() {
        let cost = DMatrix::from_row_slice(2, 2, &[f64::NAN, 1.0, 1.0, f64::INFINITY]);
        assert_eq!(solve(&cost), vec![(0, 1), (1, 0)]);
    }
}
