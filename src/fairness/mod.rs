//! Group partitioning and fairness constraint construction

pub mod constraints;
pub mod partition;

pub use self::constraints::*;
pub use self::partition::*;
