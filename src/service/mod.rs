pub mod match_service;
pub mod timings;

pub use match_service::MatchService;
pub use timings::RecomputeTimings;
