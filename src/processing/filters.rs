//! Band-level filters and resampling
//!
//! All functions take a single 2-D band and return a new owned array.

use ndarray::{Array2, ArrayBase, Data, Ix2};

/// Kernel radius in standard deviations
const TRUNCATE: f64 = 4.0;

/// Gaussian low-pass filter
///
/// Separable convolution (columns then rows) with a normalised kernel of
/// radius `round(4σ)`. Borders are extended by mirror reflection about the
/// edge, so a constant band stays constant.
///
/// # Arguments
/// * `band` - the band to smooth
/// * `sigma` - standard deviation in pixels; `sigma <= 0` returns a copy
pub fn gaussian_filter<S: Data<Elem = f64>>(band: &ArrayBase<S, Ix2>, sigma: f64) -> Array2<f64> {
    if !(sigma > 0.0) || band.is_empty() {
        return band.to_owned();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let (rows, cols) = band.dim();

    let mut horizontal = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut sum = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let source = reflect(c as isize + k as isize - radius, cols);
                sum += weight * band[[r, source]];
            }
            horizontal[[r, c]] = sum;
        }
    }

    let mut smoothed = Array2::<f64>::zeros((rows, cols));
    for r in 0..rows {
        for c in 0..cols {
            let mut sum = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let source = reflect(r as isize + k as isize - radius, rows);
                sum += weight * horizontal[[source, c]];
            }
            smoothed[[r, c]] = sum;
        }
    }

    smoothed
}

/// Bilinear resize to `out_rows` x `out_cols`
///
/// Pixel centres are aligned (half-pixel mapping) and samples beyond the
/// edge clamp to the border pixel.
pub fn resize_bilinear<S: Data<Elem = f64>>(band: &ArrayBase<S, Ix2>, out_rows: usize, out_cols: usize) -> Array2<f64> {
    let (rows, cols) = band.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((out_rows, out_cols));
    }

    let row_taps: Vec<(usize, usize, f64)> = (0..out_rows).map(|r| linear_tap(r, rows, out_rows)).collect();
    let col_taps: Vec<(usize, usize, f64)> = (0..out_cols).map(|c| linear_tap(c, cols, out_cols)).collect();

    Array2::from_shape_fn((out_rows, out_cols), |(r, c)| {
        let (r0, r1, fy) = row_taps[r];
        let (c0, c1, fx) = col_taps[c];

        let top = band[[r0, c0]] * (1.0 - fx) + band[[r0, c1]] * fx;
        let bottom = band[[r1, c0]] * (1.0 - fx) + band[[r1, c1]] * fx;
        top * (1.0 - fy) + bottom * fy
    })
}

/// Nearest-neighbour zoom by an integer factor along both axes
pub fn zoom_nearest<S: Data<Elem = f64>>(band: &ArrayBase<S, Ix2>, factor: usize) -> Array2<f64> {
    let (rows, cols) = band.dim();
    let factor = factor.max(1);
    Array2::from_shape_fn((rows * factor, cols * factor), |(r, c)| band[[r / factor, c / factor]])
}

fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let denom = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();

    let sum: f64 = kernel.iter().sum();
    for weight in &mut kernel {
        *weight /= sum;
    }
    kernel
}

/// Mirror an out-of-range index back into `0..len` (edge sample repeated)
fn reflect(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period);
    if folded >= len as isize {
        (period - 1 - folded) as usize
    } else {
        folded as usize
    }
}

/// Source taps and weight for output index `out` when mapping `len` samples onto `out_len`
fn linear_tap(out: usize, len: usize, out_len: usize) -> (usize, usize, f64) {
    let scale = len as f64 / out_len as f64;
    let position = ((out as f64 + 0.5) * scale - 0.5).max(0.0);

    let lower = (position.floor() as usize).min(len - 1);
    let upper = (lower + 1).min(len - 1);
    (lower, upper, position - lower as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reflect_repeats_edge_sample() {
        let mapped: Vec<usize> = (-3..7).map(|i| reflect(i, 4)).collect();
        assert_eq!(mapped, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);
        assert_eq!(reflect(-1, 1), 0);
    }

    #[test]
    fn test_kernel_is_normalised() {
        let kernel = gaussian_kernel(5.0);
        assert_eq!(kernel.len(), 41);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(kernel[20] > kernel[19]);
        assert_eq!(kernel[0], kernel[40]);
    }

    #[test]
    fn test_gaussian_of_constant_is_constant() {
        let band = Array2::from_elem((7, 9), 5.0);
        let smoothed = gaussian_filter(&band, 5.0);
        assert!(smoothed.iter().all(|v| (v - 5.0).abs() < 1e-9));
    }

    #[test]
    fn test_gaussian_preserves_mean_and_spreads_impulse() {
        let mut band = Array2::<f64>::zeros((21, 21));
        band[[10, 10]] = 1.0;
        let smoothed = gaussian_filter(&band, 1.0);

        assert!((smoothed.sum() - 1.0).abs() < 1e-9);
        assert!(smoothed[[10, 10]] < 1.0);
        assert!(smoothed[[10, 11]] > 0.0);
        assert!((smoothed[[10, 11]] - smoothed[[11, 10]]).abs() < 1e-15);
    }

    #[test]
    fn test_bilinear_resize() {
        let band = array![[0.0, 10.0], [20.0, 30.0]];
        let resized = resize_bilinear(&band, 4, 4);

        assert_eq!(resized.dim(), (4, 4));
        assert_eq!(resized[[0, 0]], 0.0);
        assert_eq!(resized[[3, 3]], 30.0);
        assert!((resized[[0, 1]] - 2.5).abs() < 1e-12);
        assert!((resized[[1, 0]] - 5.0).abs() < 1e-12);

        let same = resize_bilinear(&band, 2, 2);
        assert_eq!(same, band);
    }

    #[test]
    fn test_zoom_nearest() {
        let band = array![[1.0, 2.0], [3.0, 4.0]];
        let zoomed = zoom_nearest(&band, 2);
        assert_eq!(zoomed, array![
            [1.0, 1.0, 2.0, 2.0],
            [1.0, 1.0, 2.0, 2.0],
            [3.0, 3.0, 4.0, 4.0],
            [3.0, 3.0, 4.0, 4.0],
        ]);
    }
}
