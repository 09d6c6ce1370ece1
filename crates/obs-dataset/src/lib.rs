//! Canonical labeled array model for satellite observations.
//!
//! Every format reader produces a [`LabeledArrayDataset`]. The pipeline stages
//! here then combine per-file datasets, narrow them to a [`BoundingWindow`],
//! flatten them into an [`ObservationTable`] and plan chunk layouts for
//! chunked-array storage.

pub mod chunking;
pub mod combine;
pub mod dataset;
pub mod error;
pub mod select;
pub mod table;
pub mod time;
pub mod values;
pub mod window;

pub use chunking::{plan_chunks, ChunkPlan, BYTES_PER_MB, DEFAULT_TARGET_MB};
pub use combine::{combine, normalize_time};
pub use dataset::{Dimension, LabeledArrayDataset, Variable, LAT, LON, TIME};
pub use error::{DatasetError, DatasetResult};
pub use select::{select, select_masked, select_range, selection_strategy, SelectionStrategy};
pub use table::{table_to_dataset, to_table, Column, ObservationTable, INDEX_DIM};
pub use time::{decode_cf_time, parse_timestamp, to_epoch_millis, TimeParseError, EPOCH_MILLIS_UNITS};
pub use values::{ArrayValues, DataKind};
pub use window::BoundingWindow;
