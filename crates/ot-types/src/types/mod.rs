pub mod json;
pub mod text;
pub mod text_tp2;

use crate::error::OtResult;
use crate::side::Side;

/// Common surface of an OT type.
///
/// Callers that work with several types hold explicit values of the
/// implementing structs ([`text::Text`], [`text_tp2::TextTp2`],
/// [`json::Json`]); there is no registry to look them up by name.
pub trait OtType {
    const NAME: &'static str;
    type Snapshot: Clone;
    type Op: Clone;

    /// Snapshot of an empty document.
    fn create(&self) -> Self::Snapshot;

    fn apply(&self, snapshot: &Self::Snapshot, op: &Self::Op) -> OtResult<Self::Snapshot>;

    /// Transform `op` so it applies after the concurrent `other`.
    fn transform(&self, op: &Self::Op, other: &Self::Op, side: Side) -> OtResult<Self::Op>;

    /// A single op with the effect of `op1` followed by `op2`.
    fn compose(&self, op1: &Self::Op, op2: &Self::Op) -> OtResult<Self::Op>;
}
