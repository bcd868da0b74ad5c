//! Catalog passes over the source tree.
//!
//! A pass converges the catalog on whatever is on disk right now: new
//! images are [identified](identify) and inserted, sources whose file is
//! gone are [cleaned](clean) (flagged deleted, never removed) and the
//! exposed-original links in the content tree are reconciled. The primary
//! entry point is [`build`], which is safe to run at any time and as often
//! as wanted.

mod build;
mod clean;
pub mod error;
mod identify;

pub use self::build::{BuildReport, build};
pub use self::clean::clean;
pub use self::identify::identify;
