//! Playmatch - player-to-game matching for casual sports events
//!
//! Players publish an availability window, open games are scored against it
//! on sport, location, time and skill, and match proposals move through a
//! small pending/accepted/declined lifecycle.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_match_score, DistrictGraph, MatchError, MatchScorer};
pub use models::{Availability, CandidateEvent, MatchLabel, MatchProposal, MatchScore, ProposalStatus};
