//! Operational transformation types for concurrent document editing.
//!
//! Three document representations are supported, each under [`types`]:
//!
//! - [`types::text`]: a flat string edited by position-addressed inserts,
//!   deletes and comments.
//! - [`types::text_tp2`]: text that keeps tombstones for deleted content,
//!   so transforms also satisfy TP2.
//! - [`types::json`]: a JSON tree edited by path-addressed components, with
//!   a client document that keeps listeners attached to moving nodes.
//!
//! All engines are pure functions over borrowed inputs. Errors are
//! [`OtError`]; [`OtError::requires_resync`] tells whether the caller must
//! re-derive the document from an authoritative copy.

pub mod bootstrap;
pub mod error;
pub mod side;
pub mod types;
pub mod util;

pub use bootstrap::ComponentOt;
pub use error::{OtError, OtResult};
pub use side::Side;
pub use types::json::Json;
pub use types::text::Text;
pub use types::text_tp2::TextTp2;
pub use types::OtType;
