//! Box-window statistics backed by summed-area tables

use ndarray::{Array2, ArrayView2, Zip};
use num_traits::Float;

/// Summed-area table with a leading row and column of zeros
#[derive(Debug, Clone)]
pub struct IntegralImage<T> {
    table: Array2<T>,
}

impl<T: Float> IntegralImage<T> {
    /// Build the table from `values`
    pub fn new(values: ArrayView2<T>) -> Self {
        let (height, width) = values.dim();
        let mut table = Array2::from_elem((height + 1, width + 1), T::zero());

        for i in 0..height {
            let mut row_sum = T::zero();
            for j in 0..width {
                row_sum = row_sum + values[[i, j]];
                table[[i + 1, j + 1]] = table[[i, j + 1]] + row_sum;
            }
        }

        Self { table }
    }

    /// Sum over rows `r0..r1` and columns `c0..c1` of the source
    #[inline]
    pub fn sum(&self, r0: usize, c0: usize, r1: usize, c1: usize) -> T {
        self.table[[r1, c1]] - self.table[[r0, c1]] - self.table[[r1, c0]] + self.table[[r0, c0]]
    }
}

/// Copy of `image` extended by `pad` samples on every side, repeating edge samples
pub fn replicate_pad<T: Float>(image: ArrayView2<T>, pad: usize) -> Array2<T> {
    let (height, width) = image.dim();
    Array2::from_shape_fn((height + 2 * pad, width + 2 * pad), |(i, j)| {
        let si = i.saturating_sub(pad).min(height - 1);
        let sj = j.saturating_sub(pad).min(width - 1);
        image[[si, sj]]
    })
}

/// Per-pixel mean and population variance over a square window
#[derive(Debug, Clone)]
pub struct WindowMoments {
    pub mean: Array2<f64>,
    pub variance: Array2<f64>,
}

/// Local moments centred on every pixel, with replicated borders.
///
/// `window` must be odd and non-zero; callers validate it.
pub fn local_moments(image: ArrayView2<f64>, window: usize) -> WindowMoments {
    let (height, width) = image.dim();
    let half = window / 2;

    let padded = replicate_pad(image, half);
    let squared = padded.mapv(|v| v * v);
    let sums = IntegralImage::new(padded.view());
    let sq_sums = IntegralImage::new(squared.view());
    let count = (window * window) as f64;

    let mut mean = Array2::zeros((height, width));
    let mut variance = Array2::zeros((height, width));

    // Pixel (i, j) of the source sits at (i + half, j + half) in the padded copy,
    // so its window spans padded rows i..i + window.
    let fill = |(i, j): (usize, usize), m: &mut f64, v: &mut f64| {
        let s = sums.sum(i, j, i + window, j + window);
        let sq = sq_sums.sum(i, j, i + window, j + window);
        let mu = s / count;
        *m = mu;
        *v = (sq / count - mu * mu).max(0.0);
    };

    let zip = Zip::indexed(&mut mean).and(&mut variance);
    #[cfg(feature = "parallel")]
    zip.par_for_each(fill);
    #[cfg(not(feature = "parallel"))]
    zip.for_each(fill);

    WindowMoments { mean, variance }
}
