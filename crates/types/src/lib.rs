//! Validated domain primitives shared across the clinic workspace.
//!
//! These types enforce their invariants at construction time so the rest of
//! the workspace can pass them around without re-checking: branch codes,
//! visit identifiers, payment states and non-empty text.

mod branch;
mod payment;
mod text;
mod visit;

pub use branch::{Branch, BranchError, BranchScope};
pub use payment::PaymentState;
pub use text::{NonEmptyText, TextError};
pub use visit::{VisitNo, VisitNoError};
