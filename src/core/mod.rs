// Core matching exports
pub mod availability;
pub mod discovery;
pub mod districts;
pub mod error;
pub mod locks;
pub mod proposals;
pub mod scoring;
pub mod trigger;

pub use availability::{AvailabilityRegistry, OpenWindow};
pub use discovery::{rank_games, GameDiscovery};
pub use districts::DistrictGraph;
pub use error::MatchError;
pub use proposals::{ProposalEngine, Proposed};
pub use scoring::{calculate_match_score, MatchScorer};
pub use trigger::{MatchingTrigger, TriggerReport, TriggerSettings};
