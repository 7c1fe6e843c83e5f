//! Measure boundaries for deferred track starts.

use super::beat::DEFAULT_BEATS_PER_BAR;

/// Steps in one measure: four sixteenths per beat.
pub fn measure_steps(beats_per_bar: u32) -> u64 {
    let beats = if beats_per_bar == 0 {
        DEFAULT_BEATS_PER_BAR
    } else {
        beats_per_bar
    };
    beats as u64 * 4
}

/// The smallest multiple of the measure length that is `>= next_step`.
pub fn next_measure_boundary(next_step: u64, beats_per_bar: u32) -> u64 {
    let measure = measure_steps(beats_per_bar);
    next_step.div_ceil(measure).saturating_mul(measure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_in_four_four() {
        assert_eq!(measure_steps(4), 16);
        assert_eq!(next_measure_boundary(0, 4), 0);
        assert_eq!(next_measure_boundary(1, 4), 16);
        assert_eq!(next_measure_boundary(16, 4), 16);
        assert_eq!(next_measure_boundary(17, 4), 32);
    }

    #[test]
    fn other_meters() {
        assert_eq!(next_measure_boundary(5, 3), 12);
        assert_eq!(measure_steps(0), 16);
    }
}
