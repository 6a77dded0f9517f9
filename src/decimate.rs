/// Converts an accumulated sum of `4^extra_bits` raw samples into a single
/// reading with `extra_bits` additional bits of resolution, rounding to the
/// nearest integer. The divisor is always `2^extra_bits`, so adding half of
/// it before the shift makes the rounding exact, with ties rounding up.
pub fn decimate(sum: u64, extra_bits: u32) -> u64 {
    let bias = (1u64 << extra_bits) >> 1;
    (sum + bias) >> extra_bits
}

#[cfg(test)]
mod tests {
    use super::decimate;

    #[test]
    fn no_extra_bits_is_identity() {
        assert_eq!(decimate(0, 0), 0);
        assert_eq!(decimate(613, 0), 613);
        assert_eq!(decimate(1023, 0), 1023);
    }

    #[test]
    fn rounds_to_nearest() {
        // divisor 4: 401.0, 401.25, 401.5, 401.75, 402.0
        assert_eq!(decimate(1604, 2), 401);
        assert_eq!(decimate(1605, 2), 401);
        assert_eq!(decimate(1606, 2), 402);
        assert_eq!(decimate(1607, 2), 402);
        assert_eq!(decimate(1608, 2), 402);
    }

    #[test]
    fn ties_round_up() {
        assert_eq!(decimate(1, 1), 1);
        assert_eq!(decimate(3, 1), 2);
        assert_eq!(decimate(6, 2), 2);
    }

    #[test]
    fn matches_float_rounding() {
        for extra_bits in 0..=11 {
            let divisor = 1u64 << extra_bits;
            for sum in (0..20_000).step_by(7) {
                let expected = (sum as f64 / divisor as f64).round() as u64;
                assert_eq!(
                    decimate(sum, extra_bits),
                    expected,
                    "sum = {}, extra_bits = {}",
                    sum,
                    extra_bits
                );
            }
        }
    }

    #[test]
    fn maximum_accumulated_sum() {
        // 1023 raw counts summed 4^11 times, the largest sum the reader
        // can produce for a 10-bit ADC.
        let sum = 1023u64 * (1 << 22);
        assert_eq!(decimate(sum, 11), 1023 << 11);
    }
}
