// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Availability, CandidateEvent, District, GameFilters, MatchLabel, MatchProposal, MatchScore,
    ProposalStatus, RankedGame, Zone, normalize_sport,
};
pub use requests::{
    ListGamesQuery, OpenAvailabilityRequest, PlayerQuery, ProposeRequest, ResolveProposalRequest,
};
pub use responses::{ErrorResponse, HealthResponse, ListGamesResponse, ProposalsResponse, TriggerResponse};
