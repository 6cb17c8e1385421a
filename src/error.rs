//! Errors that can occur while fixing a measurement set.

use std::path::PathBuf;

use marlu::rubbl_casatables;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwapPolError {
    #[error(transparent)]
    Ms(#[from] MsError),

    #[error(transparent)]
    Correction(#[from] CorrectionError),
}

/// Errors associated with interacting with the CASA measurement set.
#[derive(Error, Debug)]
pub enum MsError {
    #[error("Supplied path {0} does not exist or is not readable!")]
    BadFile(PathBuf),

    #[error("The main table of the measurement set contains no rows!")]
    MainTableEmpty,

    #[error("MS DATA cell from row {row_index} has shape ({num_chans}, {num_pols}), but row 0 has shape ({expected_num_chans}, {expected_num_pols})")]
    InconsistentDataShape {
        row_index: u64,
        num_chans: usize,
        num_pols: usize,
        expected_num_chans: usize,
        expected_num_pols: usize,
    },

    #[error("There are {num_rows} rows in the main table, but {num_ant1} ANTENNA1 and {num_ant2} ANTENNA2 entries")]
    MismatchedAntennaColumns {
        num_rows: usize,
        num_ant1: usize,
        num_ant2: usize,
    },

    #[error("Error when trying to interface with measurement set: {0}")]
    Table(#[from] rubbl_casatables::TableError),

    #[error("Error from casacore: {0}")]
    Casacore(#[from] rubbl_casatables::CasacoreError),
}

/// Errors raised by the correction itself. All of these indicate an
/// inconsistency between the data and the swap table; nothing is written when
/// one occurs.
#[derive(Error, Debug)]
pub enum CorrectionError {
    #[error("Baseline {baseline} has a negative antenna number ({ant}); all antenna numbers must be non-negative")]
    AntennaNumNegative { baseline: usize, ant: i32 },

    #[error("Baseline {baseline} refers to antenna {ant}, but the swap table only covers {num_ants} antennas")]
    AntennaNumTooBig {
        baseline: usize,
        ant: i32,
        num_ants: usize,
    },

    #[error("The visibility data has {num_pols} polarization products; exactly 4 (XX, XY, YX, YY) are required")]
    BadNumPols { num_pols: usize },

    #[error("The visibility data has {num_baselines} baselines, but there are {num_ant1} ANTENNA1 and {num_ant2} ANTENNA2 entries")]
    MismatchedBaselineCounts {
        num_baselines: usize,
        num_ant1: usize,
        num_ant2: usize,
    },
}
