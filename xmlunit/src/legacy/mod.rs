//! Streaming comparison with the classic numbered difference taxonomy.
//!
//! [`Diff`] walks two [`XmlNodeReader`](crate::xml::XmlNodeReader)s in
//! lockstep and stops at the first major difference. Minor differences are
//! recorded and the walk goes on, so a result can be equal without being
//! identical.

mod diff;
mod difference;

pub use diff::{Diff, DiffConfiguration, DiffResult};
pub use difference::{Difference, DifferenceType};
