/// Background jobs
pub mod reconciler;

pub use reconciler::{Reconciler, ReconcilerSettings};
