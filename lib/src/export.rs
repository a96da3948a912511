//! Flat integer encoding of subcarrier arrays for serialized records:
//! `[re0, im0, re1, im1, ...]`.

use crate::csi_types::Complex;

/// Interleaves real and imaginary parts as `i16`.
///
/// Parts are truncated toward zero and saturate at the `i16` bounds; NaN
/// becomes 0.
pub fn encode(values: &[Complex]) -> Vec<i16> {
    values.iter().flat_map(|c| [c.re as i16, c.im as i16]).collect()
}

/// Rebuilds complex values from an interleaved array. A trailing unpaired
/// element is dropped.
pub fn decode(flat: &[i16]) -> Vec<Complex> {
    flat.chunks_exact(2)
        .map(|pair| Complex::new(pair[0] as f64, pair[1] as f64))
        .collect()
}
