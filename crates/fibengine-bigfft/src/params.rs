//! Transform parameter selection.
//!
//! `fft_params` picks the signal length 2^k and the Fermat exponent m (in
//! words) for a product of `target_words` words. The modulus 2^(64m)+1 must
//! hold every cyclic-convolution coefficient without overflow, and 128·m
//! must be divisible by 2^k so every butterfly level gets an integral
//! twiddle shift.

/// Parameters of one transform: signal length 2^k over Z/(2^(64·m)+1),
/// with `chunk_words` source words per coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FftParams {
    /// log2 of the signal length.
    pub k: u32,
    /// Fermat exponent in words; the modulus is 2^(64·m)+1.
    pub m: usize,
    /// Source words packed into each polynomial coefficient.
    pub chunk_words: usize,
}

impl FftParams {
    /// Signal length (number of coefficients).
    #[must_use]
    pub fn signal_len(&self) -> usize {
        1 << self.k
    }

    /// Words per ring element (coefficient), including the top limb.
    #[must_use]
    pub fn value_size(&self) -> usize {
        self.m + 1
    }

    /// Total words of one polynomial slab: `signal_len · value_size`.
    #[must_use]
    pub fn slab_words(&self) -> usize {
        self.signal_len() * self.value_size()
    }
}

/// Select transform parameters for a product of `target_words` words
/// (callers pass `len(x) + len(y) + 2`).
#[must_use]
pub fn fft_params(target_words: usize) -> FftParams {
    // Coarser chunks for bigger operands keep the signal length bounded.
    let chunk_words = if target_words < 160 {
        1
    } else if target_words < 1_600 {
        4
    } else if target_words < 16_000 {
        16
    } else {
        64
    };

    let chunks = target_words.div_ceil(chunk_words);
    let signal_len = chunks.max(4).next_power_of_two();
    let k = signal_len.trailing_zeros();

    // Convolution coefficients are sums of at most 2^k products of
    // chunk-sized values, so they need 128·chunk_words + k bits plus slack.
    let min_bits = 128 * chunk_words + k as usize + 2;
    let mut m = min_bits.div_ceil(64);

    // Twiddle shifts are 2·64·m / 2^k bits per level; force integrality.
    if signal_len > 128 {
        let align = signal_len / 128;
        m = m.div_ceil(align) * align;
    }

    FftParams { k, m, chunk_words }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_target() {
        let p = fft_params(16);
        assert_eq!(p.chunk_words, 1);
        assert!(p.signal_len() >= 16);
        assert!(p.signal_len().is_power_of_two());
    }

    #[test]
    fn twiddles_are_integral() {
        for target in [8, 100, 1_000, 10_000, 100_000, 1_000_000] {
            let p = fft_params(target);
            assert_eq!(
                (128 * p.m) % p.signal_len(),
                0,
                "128m not divisible by 2^k for target={target}"
            );
        }
    }

    #[test]
    fn modulus_holds_convolution_sums() {
        for target in [8, 100, 1_000, 10_000, 100_000] {
            let p = fft_params(target);
            assert!(
                64 * p.m >= 128 * p.chunk_words + p.k as usize + 2,
                "modulus too small for target={target}"
            );
        }
    }

    #[test]
    fn signal_covers_all_chunks() {
        for target in [8, 100, 1_000, 10_000] {
            let p = fft_params(target);
            assert!(p.signal_len() * p.chunk_words >= target);
        }
    }

    #[test]
    fn slab_words_is_consistent() {
        let p = fft_params(1_000);
        assert_eq!(p.slab_words(), p.signal_len() * (p.m + 1));
    }
}
