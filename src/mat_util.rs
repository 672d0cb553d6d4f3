use crate::{DenseMat, DenseMatView, DenseVecView};
use ndarray::{s, Array2};
use ordered_float::{FloatIsNan, NotNan};

/// Prepend a column of ones to the given matrix.
pub fn with_bias_column(mat: DenseMatView) -> DenseMat {
    let mut augmented = Array2::ones((mat.nrows(), mat.ncols() + 1));
    augmented.slice_mut(s![.., 1..]).assign(&mat);
    augmented
}

/// Compute the lower-triangular Cholesky factor L of a symmetric matrix, A = L L^T.
///
/// Returns None if a pivot is not larger than `min_pivot`, i.e. the matrix is not (numerically)
/// positive definite.
pub fn cholesky_factor(mat: DenseMatView, min_pivot: f64) -> Option<DenseMat> {
    let n = mat.nrows();
    assert_eq!(n, mat.ncols());

    let mut l = DenseMat::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = mat[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }

            if i == j {
                if !(sum > min_pivot) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Solve L L^T X = B for X, given the Cholesky factor L and any number of right-hand sides.
pub fn cholesky_solve(l: DenseMatView, rhs: DenseMatView) -> DenseMat {
    let n = l.nrows();
    assert_eq!(n, rhs.nrows());

    let mut solution = rhs.to_owned();
    for mut column in solution.columns_mut() {
        // Forward substitution: L z = b
        for i in 0..n {
            let mut sum = column[i];
            for k in 0..i {
                sum -= l[[i, k]] * column[k];
            }
            column[i] = sum / l[[i, i]];
        }
        // Backward substitution: L^T x = z
        for i in (0..n).rev() {
            let mut sum = column[i];
            for k in (i + 1)..n {
                sum -= l[[k, i]] * column[k];
            }
            column[i] = sum / l[[i, i]];
        }
    }
    solution
}

/// Find all indices attaining the maximum value.
///
/// Returns an empty list for an empty vector, and an error if any value is NaN.
pub fn find_max_indices(vec: DenseVecView) -> Result<Vec<usize>, FloatIsNan> {
    let mut max = None;
    let mut indices = Vec::new();
    for (i, &v) in vec.indexed_iter() {
        let v = NotNan::new(v)?;
        match max {
            Some(m) if v < m => {}
            Some(m) if v == m => indices.push(i),
            _ => {
                max = Some(v);
                indices.clear();
                indices.push(i);
            }
        }
    }
    Ok(indices)
}

/// Divide every entry by the largest entry of the whole matrix.
///
/// This is a single global divisor, not per-column scaling. If the maximum is zero or not
/// finite, or the matrix is empty, an unchanged copy is returned.
pub fn rescale_by_global_max(mat: DenseMatView) -> DenseMat {
    let max = mat.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == 0. || !max.is_finite() {
        return mat.to_owned();
    }
    mat.mapv(|v| v / max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DenseVec;
    use ndarray::array;

    #[test]
    fn test_with_bias_column() {
        assert_eq!(
            array![[1., 2., 3.], [1., 4., 5.]],
            with_bias_column(array![[2., 3.], [4., 5.]].view())
        );
        assert_eq!(
            array![[1.], [1.]],
            with_bias_column(DenseMat::zeros((2, 0)).view())
        );
    }

    #[test]
    fn test_cholesky_factor() {
        let mat = array![[4., 2.], [2., 3.]];
        let l = cholesky_factor(mat.view(), 0.).unwrap();
        assert_approx_eq!(2., l[[0, 0]]);
        assert_approx_eq!(0., l[[0, 1]]);
        assert_approx_eq!(1., l[[1, 0]]);
        assert_approx_eq!(2f64.sqrt(), l[[1, 1]]);

        assert!(cholesky_factor(array![[1., 1.], [1., 1.]].view(), 1e-12).is_none());
        assert!(cholesky_factor(array![[-1.]].view(), 0.).is_none());
    }

    #[test]
    fn test_cholesky_solve() {
        let mat = array![[3., 1.], [1., 2.]];
        let rhs = array![[1., 5.], [1., 5.]];
        let l = cholesky_factor(mat.view(), 0.).unwrap();
        let x = cholesky_solve(l.view(), rhs.view());
        assert_approx_eq!(0.2, x[[0, 0]]);
        assert_approx_eq!(0.4, x[[1, 0]]);
        assert_approx_eq!(1., x[[0, 1]]);
        assert_approx_eq!(2., x[[1, 1]]);

        let residual = mat.dot(&x) - &rhs;
        assert!(residual.iter().all(|r| r.abs() < 1e-10));
    }

    #[test]
    fn test_find_max_indices() {
        assert_eq!(vec![0], find_max_indices(array![3.].view()).unwrap());
        assert_eq!(
            vec![4],
            find_max_indices(array![3., 5., 1., 5., 10., 0.].view()).unwrap()
        );
        assert_eq!(
            vec![1, 3],
            find_max_indices(array![3., 5., 1., 5., -10.].view()).unwrap()
        );
        assert_eq!(
            Vec::<usize>::new(),
            find_max_indices(DenseVec::zeros(0).view()).unwrap()
        );
        assert!(find_max_indices(array![1., f64::NAN].view()).is_err());
    }

    #[test]
    fn test_rescale_by_global_max() {
        let mat = array![[1., 2.], [4., -8.]];
        let rescaled = rescale_by_global_max(mat.view());
        assert_eq!(array![[0.25, 0.5], [1., -2.]], rescaled);
        // The input is left untouched
        assert_eq!(array![[1., 2.], [4., -8.]], mat);

        // Once the maximum is 1, rescaling again changes nothing
        assert_eq!(rescaled, rescale_by_global_max(rescaled.view()));

        let zeros = DenseMat::zeros((2, 2));
        assert_eq!(zeros, rescale_by_global_max(zeros.view()));
    }

    #[test]
    fn test_rescale_by_negative_global_max() {
        // A negative maximum flips signs, so the second pass is not a fixed point
        let rescaled = rescale_by_global_max(array![[-2., -4.]].view());
        assert_eq!(array![[1., 2.]], rescaled);
        assert_eq!(array![[0.5, 1.]], rescale_by_global_max(rescaled.view()));
    }
}
