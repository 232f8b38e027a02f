//! Fixed-point taps consumed by the kernels.
//!
//! The true value of a coefficient is `mantissa / 2^exponent`. Quantization
//! of floating-point coefficients happens outside of this crate.
use crate::TapSetError;

/// Shift applied by the vertical reduction kernels.
pub const INTERPOLATE_SHIFT: u32 = 12;
/// Fixed-point scale of the reduction mantissas, `1 << INTERPOLATE_SHIFT`.
pub const INTERPOLATE_SCALE: i32 = 1 << INTERPOLATE_SHIFT;

pub(crate) const MAX_EXPONENT: u32 = 30;

/// Sparse set of quantized convolution taps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapSet {
    offsets: Vec<i32>,
    mantissas: Vec<i16>,
    exponent: u32,
    output_offset: i32,
}

impl TapSet {
    /// Creates set of taps.
    ///
    /// `offsets[i]` is the signed byte displacement of the tap source
    /// from the current input byte. Sum of `|mantissa| * 255` plus the rounding
    /// bias must fit into the accumulator of the chosen kernel;
    /// see [TapSet::max_magnitude]. `output_offset` must fit into `i16`.
    pub fn new(
        offsets: Vec<i32>,
        mantissas: Vec<i16>,
        exponent: u32,
        output_offset: i32,
    ) -> Result<Self, TapSetError> {
        if mantissas.is_empty() {
            return Err(TapSetError::Empty);
        }
        if offsets.len() != mantissas.len() {
            return Err(TapSetError::LengthMismatch {
                offsets: offsets.len(),
                mantissas: mantissas.len(),
            });
        }
        if !(1..=MAX_EXPONENT).contains(&exponent) {
            return Err(TapSetError::ExponentOutOfRange(exponent));
        }
        if i16::try_from(output_offset).is_err() {
            return Err(TapSetError::OutputOffsetOutOfRange(output_offset));
        }
        Ok(Self {
            offsets,
            mantissas,
            exponent,
            output_offset,
        })
    }

    /// Creates set of taps from dense mask centred at `(width / 2, height / 2)`.
    ///
    /// Zero mantissas are skipped. `row_stride` and `bands` describe
    /// the input region the offsets will be applied to.
    pub fn from_mask(
        width: usize,
        height: usize,
        mantissas: &[i16],
        row_stride: usize,
        bands: usize,
        exponent: u32,
        output_offset: i32,
    ) -> Result<Self, TapSetError> {
        if width == 0 || height == 0 || mantissas.len() != width * height {
            return Err(TapSetError::InvalidMaskSize);
        }
        let cx = (width / 2) as i32;
        let cy = (height / 2) as i32;
        let mut offsets = Vec::with_capacity(mantissas.len());
        let mut nonzero = Vec::with_capacity(mantissas.len());
        for (i, &m) in mantissas.iter().enumerate() {
            if m == 0 {
                continue;
            }
            let mx = (i % width) as i32 - cx;
            let my = (i / width) as i32 - cy;
            offsets.push(my * row_stride as i32 + mx * bands as i32);
            nonzero.push(m);
        }
        Self::new(offsets, nonzero, exponent, output_offset)
    }

    #[inline(always)]
    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    #[inline(always)]
    pub fn mantissas(&self) -> &[i16] {
        &self.mantissas
    }

    /// Count of non-zero taps.
    #[inline(always)]
    pub fn nnz(&self) -> usize {
        self.mantissas.len()
    }

    #[inline(always)]
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    #[inline(always)]
    pub fn output_offset(&self) -> i32 {
        self.output_offset
    }

    /// Added to the accumulator before the shift to round half up.
    #[inline(always)]
    pub fn rounding_bias(&self) -> i32 {
        1 << (self.exponent - 1)
    }

    /// Smallest and biggest offsets.
    pub fn offset_range(&self) -> (i32, i32) {
        let min = self.offsets.iter().copied().min().unwrap_or(0);
        let max = self.offsets.iter().copied().max().unwrap_or(0);
        (min, max)
    }

    /// Biggest magnitude the accumulator can reach for any input.
    pub fn max_magnitude(&self) -> i64 {
        let sum: i64 = self.mantissas.iter().map(|&m| (m as i64).abs() * 255).sum();
        sum + self.rounding_bias() as i64
    }

    /// Returns `true` if every partial sum fits into `i16`,
    /// i.e. the 16-bit saturating kernel gives the exact result.
    pub fn fits_i16_accumulator(&self) -> bool {
        self.exponent <= 15 && self.max_magnitude() <= i16::MAX as i64
    }

    /// Result of the tap loop for one output sample.
    #[inline(always)]
    pub(crate) fn finish(&self, acc: i32) -> u8 {
        clip_u8((acc >> self.exponent) + self.output_offset)
    }
}

/// Quantized weights of vertical reduction, scaled by [INTERPOLATE_SCALE].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionTaps {
    mantissas: Vec<i16>,
}

impl ReductionTaps {
    pub fn new(mantissas: Vec<i16>) -> Result<Self, TapSetError> {
        if mantissas.is_empty() {
            return Err(TapSetError::Empty);
        }
        Ok(Self { mantissas })
    }

    /// Quantizes weights to the [INTERPOLATE_SCALE] scale, rounding
    /// every weight to the nearest mantissa.
    ///
    /// Weights are expected to be normalized (sum equal to `1.0`).
    pub fn from_weights(weights: &[f64]) -> Result<Self, TapSetError> {
        let scale = INTERPOLATE_SCALE as f64;
        let mantissas = weights
            .iter()
            .map(|&w| {
                let m = (w * scale).round();
                if m.is_finite() && (i16::MIN as f64..=i16::MAX as f64).contains(&m) {
                    Ok(m as i16)
                } else {
                    Err(TapSetError::InvalidWeight(w))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(mantissas)
    }

    #[inline(always)]
    pub fn mantissas(&self) -> &[i16] {
        &self.mantissas
    }

    /// Count of input rows summed into one output row.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mantissas.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.mantissas.is_empty()
    }

    #[inline(always)]
    pub(crate) const fn rounding_bias() -> i32 {
        1 << (INTERPOLATE_SHIFT - 1)
    }

    #[inline(always)]
    pub(crate) fn finish(acc: i32) -> u8 {
        clip_u8(acc >> INTERPOLATE_SHIFT)
    }
}

#[inline(always)]
pub(crate) fn clip_u8(v: i32) -> u8 {
    v.clamp(0, u8::MAX as i32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert_eq!(TapSet::new(vec![], vec![], 4, 0), Err(TapSetError::Empty));
        assert_eq!(
            TapSet::new(vec![0, 1], vec![1], 4, 0),
            Err(TapSetError::LengthMismatch {
                offsets: 2,
                mantissas: 1
            })
        );
        assert_eq!(
            TapSet::new(vec![0], vec![1], 0, 0),
            Err(TapSetError::ExponentOutOfRange(0))
        );
        assert_eq!(
            TapSet::new(vec![0], vec![1], 31, 0),
            Err(TapSetError::ExponentOutOfRange(31))
        );
        assert_eq!(
            TapSet::new(vec![0], vec![1], 4, i16::MAX as i32 + 1),
            Err(TapSetError::OutputOffsetOutOfRange(32768))
        );
        assert_eq!(
            TapSet::new(vec![0], vec![1], 4, i32::MIN),
            Err(TapSetError::OutputOffsetOutOfRange(i32::MIN))
        );
        assert!(TapSet::new(vec![0], vec![1], 4, i16::MIN as i32).is_ok());
        assert_eq!(ReductionTaps::new(vec![]), Err(TapSetError::Empty));
    }

    #[test]
    fn quantize_weights() {
        let taps = ReductionTaps::from_weights(&[0.25, 0.5, 0.25]).unwrap();
        assert_eq!(taps.mantissas(), &[1024, 2048, 1024]);

        let taps = ReductionTaps::from_weights(&[1. / 3.; 3]).unwrap();
        assert_eq!(taps.mantissas(), &[1365, 1365, 1365]);

        assert_eq!(
            ReductionTaps::from_weights(&[9.0]),
            Err(TapSetError::InvalidWeight(9.0))
        );
        assert_eq!(ReductionTaps::from_weights(&[]), Err(TapSetError::Empty));
    }

    #[test]
    fn mask_offsets_are_centred() {
        #[rustfmt::skip]
        let mask = [
            0, 1, 0,
            2, 4, 2,
            0, 1, 0,
        ];
        let taps = TapSet::from_mask(3, 3, &mask, 100, 3, 4, 0).unwrap();
        assert_eq!(taps.nnz(), 5);
        assert_eq!(taps.offsets(), &[-100, -3, 0, 3, 100]);
        assert_eq!(taps.mantissas(), &[1, 2, 4, 2, 1]);
        assert_eq!(taps.offset_range(), (-100, 100));
        assert_eq!(
            TapSet::from_mask(3, 2, &mask, 100, 3, 4, 0),
            Err(TapSetError::InvalidMaskSize)
        );
    }

    #[test]
    fn accumulator_limits() {
        let taps = TapSet::new(vec![0, 1], vec![64, -64], 6, 0).unwrap();
        assert_eq!(taps.rounding_bias(), 32);
        assert_eq!(taps.max_magnitude(), 2 * 64 * 255 + 32);
        assert!(taps.fits_i16_accumulator());

        let taps = TapSet::new(vec![0, 1], vec![127, 2], 7, 0).unwrap();
        assert!(!taps.fits_i16_accumulator());

        let taps = TapSet::new(vec![0], vec![1], 16, 0).unwrap();
        assert!(!taps.fits_i16_accumulator());
    }

    #[test]
    fn finish_clips() {
        let taps = TapSet::new(vec![0], vec![1], 2, 128).unwrap();
        assert_eq!(taps.finish(0), 128);
        assert_eq!(taps.finish(-1024), 0);
        assert_eq!(taps.finish(1024), 255);
        assert_eq!(ReductionTaps::finish(INTERPOLATE_SCALE * 300), 255);
        assert_eq!(ReductionTaps::finish(-INTERPOLATE_SCALE), 0);
    }
}
