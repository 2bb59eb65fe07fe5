pub mod aggregator;
pub mod duplicate;

pub use aggregator::aggregate;
pub use duplicate::find_duplicate;
