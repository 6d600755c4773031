//! Continuous-to-lattice value quantization.
//!
//! Every tunable face axis accepts a continuum of gesture positions, but each
//! distinct request body is a separate cache entry and a potential model
//! invocation. The quantizer snaps incoming values onto a fixed lattice of
//! `buckets + 1` points per axis so that repeated gestures and overlapping
//! sweeps collapse onto the same request.
//!
//! # Lattice
//!
//! For a range `[min, max]` and `N` buckets the lattice points are
//! `min + i * (max - min) / N` for `i = 0..=N`, each rounded to the
//! configured precision. Quantizing a lattice point returns that same
//! point, so quantization is idempotent.

/// Configuration for the value quantizer.
///
/// The defaults (6 buckets, 2 decimal places) match the hosted model's
/// observed cache behavior. Both values are configuration rather than
/// constants so callers can trade cache hit rate against fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizerConfig {
    /// Number of buckets per axis. The lattice has `buckets + 1` points.
    pub buckets: u32,
    /// Decimal places kept after snapping.
    pub precision: u32,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            buckets: 6,
            precision: 2,
        }
    }
}

/// Snaps continuous parameter values onto a fixed bucket lattice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantizer {
    config: QuantizerConfig,
}

impl Quantizer {
    /// Create a quantizer with the given configuration.
    pub fn new(config: QuantizerConfig) -> Self {
        Self { config }
    }

    /// Number of buckets per axis.
    pub fn buckets(&self) -> u32 {
        self.config.buckets
    }

    /// Snap `value` onto the bucket lattice for `[min, max]`.
    ///
    /// An absent value stays absent: `None` is never coerced onto the
    /// lattice, because "axis untouched" and "axis at zero" are distinct
    /// requests.
    ///
    /// # Example
    ///
    /// ```
    /// use visage::quantize::Quantizer;
    ///
    /// let q = Quantizer::default();
    /// assert_eq!(q.snap(Some(3.2), -20.0, 20.0), Some(0.0));
    /// assert_eq!(q.snap(None, -20.0, 20.0), None);
    /// ```
    pub fn snap(&self, value: Option<f64>, min: f64, max: f64) -> Option<f64> {
        let value = value?;
        let bucket_size = (max - min) / f64::from(self.config.buckets);
        let bucket_index = ((value - min) / bucket_size).round();
        let snapped = (min + bucket_index * bucket_size).clamp(min, max);
        Some(self.round(snapped))
    }

    /// All lattice points for `[min, max]`, in ascending order.
    pub fn lattice(&self, min: f64, max: f64) -> Vec<f64> {
        let bucket_size = (max - min) / f64::from(self.config.buckets);
        (0..=self.config.buckets)
            .map(|i| self.round((min + f64::from(i) * bucket_size).clamp(min, max)))
            .collect()
    }

    /// The lattice point closest to the middle of `[min, max]`.
    pub fn center(&self, min: f64, max: f64) -> f64 {
        // The midpoint always snaps, so the unwrap cannot fire.
        self.snap(Some((min + max) / 2.0), min, max)
            .expect("midpoint of a finite range snaps onto the lattice")
    }

    fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.config.precision as i32);
        (value * scale).round() / scale
    }
}
