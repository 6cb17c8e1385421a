//! Fix the swapped polarizations in the March 19, 2016 "100 hr run".
//!
//! A bug in the delay firmware swapped the X and Y feeds of any antenna whose
//! applied delay correction was an odd number of samples, and a few antennas
//! have an additional swap from miswired cables. This crate rewrites a
//! measurement set's correlation products in place so that every baseline's
//! XX, XY, YX and YY land under the right labels.

pub mod corrections;
pub mod error;
pub mod ms;
pub mod swaps;

pub use corrections::{correct_cube, PolPermutation, NUM_POLS};
pub use error::SwapPolError;
pub use swaps::{SwapTable, HUNDRED_HOUR_RUN, NUM_ANTS};
