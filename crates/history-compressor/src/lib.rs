//! Compression of a document's update stream before it is written to
//! history.
//!
//! Updates arrive from the editing layer one version at a time, often a
//! keystroke each. A flush job hands a batch to
//! [`compress_raw_updates`], which
//!
//! 1. splits every update into single-op updates, threading the document
//!    length through them ([`split`]);
//! 2. folds neighbouring updates by the same author into one where their
//!    ops combine ([`compress`]), re-diffing a delete followed by an insert
//!    at the same place ([`diff`]);
//! 3. drops ops left blank by the diff and regroups the rest by version
//!    ([`concat`]).
//!
//! Replaying the result with [`replay::apply_updates`] gives the same text
//! as replaying the input.

pub mod compress;
pub mod concat;
pub mod config;
pub mod diff;
pub mod error;
pub mod length;
pub mod replay;
pub mod split;
pub mod update;

pub use compress::{compress_raw_updates, compress_updates, Compressor};
pub use concat::{concat_updates_with_same_version, filter_blank_updates};
pub use config::CompressorConfig;
pub use diff::diff_as_sharejs_ops;
pub use error::{CompressError, CompressResult};
pub use length::adjust_length_by_op;
pub use replay::apply_updates;
pub use split::convert_to_single_op_updates;
pub use update::{HistoryEdit, HistoryOp, RawUpdate, SingleOpUpdate, Update, UpdateMeta};
