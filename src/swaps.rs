//! The per-antenna polarization-swap table for the March 19, 2016 "100 hr
//! run".
//!
//! A bug in the delay firmware swapped the polarizations of any antenna whose
//! applied delay was an odd number of samples. Which antennas had odd delays
//! during the run was determined externally; the table here is a faithful
//! transcription of that list, not something this tool derives. On top of the
//! firmware flags, a handful of antennas have an unrelated polarization swap
//! (presumably swapped cables) and their entries are toggled after the base
//! table is laid down.

use lazy_static::lazy_static;

/// The number of antennas the correlator supports. Antenna indices in the
/// measurement set must fall in `[0, NUM_ANTS)`.
pub const NUM_ANTS: usize = 256;

/// Whether each antenna was given an odd-sample delay during the 100 hr run.
/// This list was supplied by the array operators.
const ODD_DELAY_FLAGS: [bool; NUM_ANTS] = [
    true, false, true, true, true, true, true, true,
    false, false, true, false, true, true, true, true,
    true, true, false, true, true, true, true, true,
    false, false, false, false, true, false, true, false,
    true, false, true, false, true, false, true, false,
    true, false, true, false, true, false, false, true,
    true, true, false, false, false, true, false, false,
    false, false, true, true, true, true, false, false,
    false, true, true, true, false, true, true, false,
    true, true, true, true, false, true, false, true,
    false, false, true, true, true, false, true, false,
    false, true, false, false, false, true, true, false,
    false, true, true, true, false, true, true, false,
    false, true, false, false, false, true, false, false,
    false, false, true, true, true, false, true, false,
    true, false, false, true, true, true, false, false,
    true, false, false, true, true, false, false, false,
    false, false, true, true, true, true, true, true,
    false, false, false, false, true, false, false, true,
    false, false, true, false, false, true, false, false,
    false, true, false, true, true, true, false, true,
    false, false, false, false, false, false, true, false,
    true, false, true, false, true, true, true, true,
    false, false, true, true, false, true, true, true,
    true, false, false, true, false, false, true, false,
    false, false, true, true, true, true, true, false,
    true, false, true, true, false, true, false, true,
    true, false, true, true, true, true, true, false,
    true, false, false, true, true, true, false, false,
    false, true, true, false, false, true, true, true,
    false, true, false, false, true, true, false, true,
    true, true, true, true, false, true, false, true,
];

/// Antennas with a polarization swap unrelated to the delay firmware. Their
/// table entries are *toggled*, not set, matching how the fix has always been
/// applied.
const CABLE_SWAP_ANTS: [usize; 3] = [120, 185, 186];

lazy_static! {
    /// The swap table for the 100 hr run, overrides applied.
    pub static ref HUNDRED_HOUR_RUN: SwapTable = SwapTable::hundred_hour_run();
}

/// A fully populated antenna-index -> "needs polarization correction" map.
/// Immutable once built.
pub struct SwapTable {
    flags: [bool; NUM_ANTS],
}

impl SwapTable {
    /// The table for the 100 hr run: the odd-delay flags with the cable-swap
    /// toggles applied on top.
    pub fn hundred_hour_run() -> SwapTable {
        let mut flags = ODD_DELAY_FLAGS;
        for &ant in &CABLE_SWAP_ANTS {
            flags[ant] = !flags[ant];
        }
        SwapTable { flags }
    }

    /// Build a table directly from a flag array.
    pub fn from_flags(flags: [bool; NUM_ANTS]) -> SwapTable {
        SwapTable { flags }
    }

    /// Does this antenna need its polarizations un-swapped? `None` if the
    /// index isn't in `[0, NUM_ANTS)`; the caller must treat that as a fatal
    /// inconsistency between the table and the data, not something to skip.
    pub fn needs_swap(&self, ant: usize) -> Option<bool> {
        self.flags.get(ant).copied()
    }

    /// The number of antennas flagged for correction.
    pub fn num_swapped(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}
