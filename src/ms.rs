//! Reading and updating the measurement set.
//!
//! The main table's DATA column holds one `(num_chans, 4)` complex array per
//! row, one row per baseline. The whole column is pulled into memory as a
//! `(num_rows, num_chans, 4)` cube, corrected, and written back row by row;
//! the table stays open for update for the duration of the run.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::{debug, trace};
use marlu::{c32, rubbl_casatables};
use ndarray::prelude::*;
use rubbl_casatables::{Table, TableOpenMode};

use crate::error::MsError;

pub struct MsUpdater {
    main_table: Table,

    /// The path to the measurement set on disk.
    pub ms: PathBuf,

    /// The number of rows (baselines) in the main table.
    num_rows: usize,
}

impl MsUpdater {
    /// Open a measurement set's main table for update.
    pub fn open<P: AsRef<Path>>(ms: P) -> Result<MsUpdater, MsError> {
        let ms = ms.as_ref();
        debug!("Using measurement set: {}", ms.display());
        if !ms.exists() {
            return Err(MsError::BadFile(ms.to_path_buf()));
        }

        let mut main_table = Table::open(ms, TableOpenMode::ReadWrite)?;
        let num_rows = main_table.n_rows() as usize;
        trace!("{num_rows} rows in the main table");
        if num_rows == 0 {
            return Err(MsError::MainTableEmpty);
        }

        Ok(MsUpdater {
            main_table,
            ms: ms.to_path_buf(),
            num_rows,
        })
    }

    pub fn num_baselines(&self) -> usize {
        self.num_rows
    }

    /// The ANTENNA1 and ANTENNA2 columns: the antenna pair of each baseline.
    pub fn antenna_pairs(&mut self) -> Result<(Vec<i32>, Vec<i32>), MsError> {
        let antenna1: Vec<i32> = self.main_table.get_col_as_vec("ANTENNA1")?;
        let antenna2: Vec<i32> = self.main_table.get_col_as_vec("ANTENNA2")?;
        if antenna1.len() != self.num_rows || antenna2.len() != self.num_rows {
            return Err(MsError::MismatchedAntennaColumns {
                num_rows: self.num_rows,
                num_ant1: antenna1.len(),
                num_ant2: antenna2.len(),
            });
        }
        Ok((antenna1, antenna2))
    }

    /// Read the full DATA column. Every row must have the shape of row 0.
    pub fn read_data(&mut self, progress: Option<&ProgressBar>) -> Result<Array3<c32>, MsError> {
        let first: Array2<c32> = self.main_table.get_cell("DATA", 0)?;
        let (num_chans, num_pols) = first.dim();
        trace!("DATA cells have {num_chans} channels and {num_pols} polarizations");

        let mut data = Array3::zeros((self.num_rows, num_chans, num_pols));
        data.index_axis_mut(Axis(0), 0).assign(&first);
        if let Some(progress) = progress {
            progress.inc(1);
        }

        for row in 1..self.num_rows {
            let cell: Array2<c32> = self.main_table.get_cell("DATA", row as u64)?;
            if cell.dim() != (num_chans, num_pols) {
                return Err(MsError::InconsistentDataShape {
                    row_index: row as u64,
                    num_chans: cell.dim().0,
                    num_pols: cell.dim().1,
                    expected_num_chans: num_chans,
                    expected_num_pols: num_pols,
                });
            }
            data.index_axis_mut(Axis(0), row).assign(&cell);
            if let Some(progress) = progress {
                progress.inc(1);
            }
        }
        if let Some(progress) = progress {
            progress.finish();
        }

        Ok(data)
    }

    /// Replace the DATA column with the corrected cube. The cube's baseline
    /// axis must match the main table's row count.
    pub fn write_data(
        &mut self,
        data: ArrayView3<c32>,
        progress: Option<&ProgressBar>,
    ) -> Result<(), MsError> {
        for (row, baseline_data) in data.outer_iter().enumerate() {
            self.main_table
                .put_cell("DATA", row as u64, &baseline_data.to_owned())?;
            if let Some(progress) = progress {
                progress.inc(1);
            }
        }
        if let Some(progress) = progress {
            progress.finish();
        }
        Ok(())
    }
}
