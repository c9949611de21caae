//! Forward and inverse NTT butterflies over the Fermat ring.
//!
//! 2 is a 2·64m-th root of unity mod 2^(64m)+1, so every twiddle
//! multiplication is a cyclic shift. Parameter selection guarantees the
//! per-level shift step 2·64m / size is integral at every butterfly level.

use crate::fermat::Fermat;

/// In-place forward transform (iterative Cooley-Tukey, decimation in time).
pub fn forward(data: &mut [Fermat], m: usize) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two());
    debug_assert_eq!((2 * 64 * m) % n, 0, "twiddle step must be integral");

    bit_reverse_permutation(data);

    let mut size = 2;
    while size <= n {
        let half = size / 2;
        // ω_size = 2^(2·64m / size)
        let step = 2 * 64 * m / size;

        for start in (0..n).step_by(size) {
            for j in 0..half {
                let (lo, hi) = data.split_at_mut(start + j + half);
                let upper = &lo[start + j];
                let twiddled = hi[0].shifted(step * j);

                let mut sum = upper.clone();
                sum.add_assign(&twiddled);
                let mut diff = upper.clone();
                diff.sub_assign(&twiddled);

                lo[start + j] = sum;
                hi[0] = diff;
            }
        }
        size *= 2;
    }
}

/// In-place inverse transform: reverse the tail, run the forward transform,
/// then scale by 1/n = 2^(2·64m − log2 n).
pub fn inverse(data: &mut [Fermat], m: usize) {
    let n = data.len();
    if n <= 1 {
        return;
    }

    data[1..].reverse();
    forward(data, m);

    let log_n = n.trailing_zeros() as usize;
    let inv_shift = 2 * 64 * m - log_n;
    for elem in data.iter_mut() {
        *elem = elem.shifted(inv_shift);
    }
}

/// Standard bit-reversal reordering.
fn bit_reverse_permutation(data: &mut [Fermat]) {
    let n = data.len();
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }
}
