//! Working-set estimation for one NTT multiplication.

use crate::params::fft_params;

/// Bytes of scratch one NTT multiplication of `a_bits` × `b_bits` touches:
/// two input slabs, their transforms reuse the same storage, one product
/// slab, and the reassembly accumulator.
#[must_use]
pub fn estimate_fft_memory(a_bits: usize, b_bits: usize) -> usize {
    let a_words = a_bits.div_ceil(64);
    let b_words = b_bits.div_ceil(64);
    let params = fft_params(a_words + b_words + 2);

    let slab_bytes = params.slab_words() * 8;
    let reassembly_bytes = (params.signal_len() * params.chunk_words + params.value_size()) * 8;

    // x, y, and the pointwise product each hold one slab.
    slab_bytes * 3 + reassembly_bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_positive() {
        assert!(estimate_fft_memory(1_000, 1_000) > 0);
    }

    #[test]
    fn estimate_grows_with_operands() {
        let small = estimate_fft_memory(10_000, 10_000);
        let large = estimate_fft_memory(1_000_000, 1_000_000);
        assert!(large > small);
    }

    #[test]
    fn estimate_covers_the_product() {
        // The scratch must at least hold the product itself.
        let est = estimate_fft_memory(100_000, 100_000);
        assert!(est >= 200_000 / 8);
    }
}
