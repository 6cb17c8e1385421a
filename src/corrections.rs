//! The polarization corrections performed on visibility data.
//!
//! The four correlation products of a baseline are indexed 0 to 3 = XX, XY,
//! YX, YY along the last axis of the visibility cube. A baseline formed from
//! one or two polarization-swapped antennas has its products filed under the
//! wrong labels, and which bijection un-scrambles them depends only on which
//! of the two antennas are swapped.

use indicatif::ProgressBar;
use itertools::izip;
use log::debug;
use marlu::c32;
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    error::CorrectionError,
    swaps::{SwapTable, NUM_ANTS},
};

/// The number of instrumental polarization products (XX, XY, YX, YY).
pub const NUM_POLS: usize = 4;

/// Which permutation of the correlation products un-swaps a baseline. The
/// names reflect the delay parity of (antenna1, antenna2): an odd-sample
/// delay is what swapped an antenna's polarizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolPermutation {
    /// Both antennas swapped.
    OddOdd,
    /// Only antenna1 swapped.
    OddEven,
    /// Only antenna2 swapped.
    EvenOdd,
}

impl PolPermutation {
    /// Select the correction for a baseline from its antennas' swap flags.
    /// `None` means the baseline needs no correction. Auto-correlations fall
    /// into the OddOdd or no-correction rows like any other baseline.
    pub fn classify(swap1: bool, swap2: bool) -> Option<PolPermutation> {
        match (swap1, swap2) {
            (true, true) => Some(PolPermutation::OddOdd),
            (true, false) => Some(PolPermutation::OddEven),
            (false, true) => Some(PolPermutation::EvenOdd),
            (false, false) => None,
        }
    }

    /// Remap one channel's four correlation products, ordered (XX, XY, YX,
    /// YY). Each variant is a bijection; OddOdd is its own inverse, while
    /// OddEven and EvenOdd are inverses of each other.
    pub fn permute(self, [xx, xy, yx, yy]: [c32; NUM_POLS]) -> [c32; NUM_POLS] {
        match self {
            PolPermutation::OddOdd => [yy, yx, xy, xx],
            PolPermutation::OddEven => [yx, yy, xx, xy],
            PolPermutation::EvenOdd => [xy, xx, yy, yx],
        }
    }

    /// Apply this permutation to one baseline's `(num_chans, NUM_POLS)` data.
    /// Channels are independent; all four products of a channel are read
    /// before any is written back.
    pub fn apply(self, mut baseline_data: ArrayViewMut2<c32>) {
        for mut chan_data in baseline_data.outer_iter_mut() {
            let permuted = self.permute([chan_data[0], chan_data[1], chan_data[2], chan_data[3]]);
            chan_data[0] = permuted[0];
            chan_data[1] = permuted[1];
            chan_data[2] = permuted[2];
            chan_data[3] = permuted[3];
        }
    }
}

/// Correct every baseline of a `(num_baselines, num_chans, NUM_POLS)`
/// visibility cube in place. `antenna1` and `antenna2` give the antenna pair
/// of each baseline, as read from the measurement set.
///
/// All antenna indices are checked against the swap table before any data is
/// touched; an index outside the table is an inconsistency between the table
/// and the measurement set's own antenna numbering, and nothing is mutated
/// when one is found. Baselines occupy disjoint slices of the cube, so the
/// corrections themselves run in parallel.
pub fn correct_cube(
    data: &mut Array3<c32>,
    antenna1: &[i32],
    antenna2: &[i32],
    swaps: &SwapTable,
    progress: Option<&ProgressBar>,
) -> Result<(), CorrectionError> {
    let num_baselines = data.len_of(Axis(0));
    let num_pols = data.len_of(Axis(2));
    if num_pols != NUM_POLS {
        return Err(CorrectionError::BadNumPols { num_pols });
    }
    if antenna1.len() != num_baselines || antenna2.len() != num_baselines {
        return Err(CorrectionError::MismatchedBaselineCounts {
            num_baselines,
            num_ant1: antenna1.len(),
            num_ant2: antenna2.len(),
        });
    }

    // Classify everything up front so a bad antenna index aborts before any
    // write happens.
    let mut corrections = Vec::with_capacity(num_baselines);
    for (baseline, (&ant1, &ant2)) in izip!(antenna1, antenna2).enumerate() {
        let swap1 = look_up_swap(swaps, baseline, ant1)?;
        let swap2 = look_up_swap(swaps, baseline, ant2)?;
        corrections.push(PolPermutation::classify(swap1, swap2));
    }
    debug!(
        "Correcting {} of {} baselines",
        corrections.iter().filter(|c| c.is_some()).count(),
        num_baselines
    );

    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(corrections.par_iter())
        .for_each(|(baseline_data, correction)| {
            if let Some(permutation) = correction {
                permutation.apply(baseline_data);
            }
            if let Some(progress) = progress {
                progress.inc(1);
            }
        });
    if let Some(progress) = progress {
        progress.finish();
    }

    Ok(())
}

fn look_up_swap(
    swaps: &SwapTable,
    baseline: usize,
    ant: i32,
) -> Result<bool, CorrectionError> {
    let index = usize::try_from(ant)
        .map_err(|_| CorrectionError::AntennaNumNegative { baseline, ant })?;
    swaps
        .needs_swap(index)
        .ok_or(CorrectionError::AntennaNumTooBig {
            baseline,
            ant,
            num_ants: NUM_ANTS,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(re: [f32; NUM_POLS]) -> [c32; NUM_POLS] {
        // Distinct imaginary parts so a permutation can't pass by luck on the
        // real parts alone.
        [
            c32::new(re[0], -1.0),
            c32::new(re[1], -2.0),
            c32::new(re[2], -3.0),
            c32::new(re[3], -4.0),
        ]
    }

    /// A cube whose every element encodes its own (baseline, channel, pol)
    /// position, for checking that nothing moves that shouldn't.
    fn position_coded_cube(num_baselines: usize, num_chans: usize) -> Array3<c32> {
        Array3::from_shape_fn((num_baselines, num_chans, NUM_POLS), |(b, c, p)| {
            c32::new((b * 1000 + c * 10 + p) as f32, b as f32)
        })
    }

    fn table_with_swaps(swapped: &[usize]) -> SwapTable {
        let mut flags = [false; NUM_ANTS];
        for &ant in swapped {
            flags[ant] = true;
        }
        SwapTable::from_flags(flags)
    }

    #[test]
    fn classify_covers_the_truth_table() {
        assert_eq!(
            PolPermutation::classify(true, true),
            Some(PolPermutation::OddOdd)
        );
        assert_eq!(
            PolPermutation::classify(true, false),
            Some(PolPermutation::OddEven)
        );
        assert_eq!(
            PolPermutation::classify(false, true),
            Some(PolPermutation::EvenOdd)
        );
        assert_eq!(PolPermutation::classify(false, false), None);
    }

    #[test]
    fn odd_odd_is_an_involution() {
        let products = quad([1.0, 2.0, 3.0, 4.0]);
        let once = PolPermutation::OddOdd.permute(products);
        assert_ne!(once, products);
        assert_eq!(PolPermutation::OddOdd.permute(once), products);
    }

    #[test]
    fn odd_even_and_even_odd_are_mutual_inverses() {
        let products = quad([5.0, 6.0, 7.0, 8.0]);
        assert_eq!(
            PolPermutation::EvenOdd.permute(PolPermutation::OddEven.permute(products)),
            products
        );
        assert_eq!(
            PolPermutation::OddEven.permute(PolPermutation::EvenOdd.permute(products)),
            products
        );
    }

    #[test]
    fn odd_even_concrete_values() {
        // ant1 swapped, ant2 not: (1, 2, 3, 4) -> (3, 4, 1, 2).
        let mut data = Array3::from_shape_vec(
            (1, 1, NUM_POLS),
            vec![
                c32::new(1.0, 0.0),
                c32::new(2.0, 0.0),
                c32::new(3.0, 0.0),
                c32::new(4.0, 0.0),
            ],
        )
        .unwrap();
        let swaps = table_with_swaps(&[0]);
        correct_cube(&mut data, &[0], &[1], &swaps, None).unwrap();
        assert_eq!(data[(0, 0, 0)], c32::new(3.0, 0.0));
        assert_eq!(data[(0, 0, 1)], c32::new(4.0, 0.0));
        assert_eq!(data[(0, 0, 2)], c32::new(1.0, 0.0));
        assert_eq!(data[(0, 0, 3)], c32::new(2.0, 0.0));
    }

    #[test]
    fn odd_odd_concrete_values() {
        // Both antennas swapped: (1, 2, 3, 4) -> (4, 3, 2, 1).
        let mut data = Array3::from_shape_vec(
            (1, 1, NUM_POLS),
            vec![
                c32::new(1.0, 0.0),
                c32::new(2.0, 0.0),
                c32::new(3.0, 0.0),
                c32::new(4.0, 0.0),
            ],
        )
        .unwrap();
        let swaps = table_with_swaps(&[0, 1]);
        correct_cube(&mut data, &[0], &[1], &swaps, None).unwrap();
        assert_eq!(data[(0, 0, 0)], c32::new(4.0, 0.0));
        assert_eq!(data[(0, 0, 1)], c32::new(3.0, 0.0));
        assert_eq!(data[(0, 0, 2)], c32::new(2.0, 0.0));
        assert_eq!(data[(0, 0, 3)], c32::new(1.0, 0.0));
    }

    #[test]
    fn all_false_table_changes_nothing() {
        let mut data = position_coded_cube(6, 3);
        let original = data.clone();
        let swaps = SwapTable::from_flags([false; NUM_ANTS]);
        // Baselines for 3 antennas, autos included.
        let ant1 = [0, 0, 0, 1, 1, 2];
        let ant2 = [0, 1, 2, 1, 2, 2];
        correct_cube(&mut data, &ant1, &ant2, &swaps, None).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn corrections_stay_within_their_baseline() {
        let mut data = position_coded_cube(3, 4);
        let original = data.clone();
        // Only antenna 1 is swapped, so of the baselines (0,1), (0,2), (1,2),
        // the first gets EvenOdd, the last gets OddEven and the middle is
        // untouched.
        let swaps = table_with_swaps(&[1]);
        correct_cube(&mut data, &[0, 0, 1], &[1, 2, 2], &swaps, None).unwrap();

        assert_eq!(data.dim(), original.dim());
        assert_ne!(data.index_axis(Axis(0), 0), original.index_axis(Axis(0), 0));
        assert_eq!(data.index_axis(Axis(0), 1), original.index_axis(Axis(0), 1));
        assert_ne!(data.index_axis(Axis(0), 2), original.index_axis(Axis(0), 2));

        // Each corrected channel holds a permutation of its original four
        // products and nothing from any other channel or baseline.
        for baseline in [0, 2] {
            for chan in 0..4 {
                let mut got: Vec<c32> = data
                    .slice(s![baseline, chan, ..])
                    .iter()
                    .copied()
                    .collect();
                let mut expected: Vec<c32> = original
                    .slice(s![baseline, chan, ..])
                    .iter()
                    .copied()
                    .collect();
                got.sort_by(|a, b| a.re.total_cmp(&b.re));
                expected.sort_by(|a, b| a.re.total_cmp(&b.re));
                assert_eq!(got, expected);
            }
        }
    }

    #[test]
    fn auto_correlations_use_the_same_rules() {
        // A swapped antenna's auto is the both-swapped case.
        let mut data = position_coded_cube(2, 1);
        let original = data.clone();
        let swaps = table_with_swaps(&[5]);
        correct_cube(&mut data, &[5, 6], &[5, 6], &swaps, None).unwrap();

        let fixed = data.slice(s![0_usize, 0_usize, ..]);
        let before = original.slice(s![0_usize, 0_usize, ..]);
        assert_eq!(fixed[0], before[3]);
        assert_eq!(fixed[1], before[2]);
        assert_eq!(fixed[2], before[1]);
        assert_eq!(fixed[3], before[0]);
        // An unswapped antenna's auto is untouched.
        assert_eq!(data.index_axis(Axis(0), 1), original.index_axis(Axis(0), 1));
    }

    #[test]
    fn bad_antenna_indices_abort_without_mutating() {
        let swaps = table_with_swaps(&[0]);

        let mut data = position_coded_cube(2, 2);
        let original = data.clone();
        let result = correct_cube(&mut data, &[0, 0], &[1, 256], &swaps, None);
        assert!(matches!(
            result,
            Err(CorrectionError::AntennaNumTooBig { baseline: 1, ant: 256, .. })
        ));
        // Baseline 0 would have been corrected, but the bad index on baseline
        // 1 must stop everything.
        assert_eq!(data, original);

        let result = correct_cube(&mut data, &[-1, 0], &[1, 1], &swaps, None);
        assert!(matches!(
            result,
            Err(CorrectionError::AntennaNumNegative { baseline: 0, ant: -1 })
        ));
        assert_eq!(data, original);
    }

    #[test]
    fn shape_problems_are_reported() {
        let swaps = table_with_swaps(&[0]);

        let mut data = Array3::<c32>::zeros((2, 3, 2));
        assert!(matches!(
            correct_cube(&mut data, &[0, 0], &[1, 2], &swaps, None),
            Err(CorrectionError::BadNumPols { num_pols: 2 })
        ));

        let mut data = Array3::<c32>::zeros((2, 3, NUM_POLS));
        assert!(matches!(
            correct_cube(&mut data, &[0], &[1, 2], &swaps, None),
            Err(CorrectionError::MismatchedBaselineCounts {
                num_baselines: 2,
                num_ant1: 1,
                num_ant2: 2,
            })
        ));
    }
}
