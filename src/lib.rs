// Fiesta Voting - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod ballot;
pub mod db;
pub mod error;
pub mod models;
pub mod roster;
pub mod seed;
pub mod tally;

// Re-export commonly used types
pub use ballot::{submit_ballot, validate_ballot};
pub use db::{
    count_ballots, insert_ballot, insert_family, insert_guest, list_ballots, list_families,
    list_guests, list_voter_ids, setup_database,
};
pub use error::{VoteError, VoteResult};
pub use models::{
    Ballot, BallotForm, CostumeWinner, Family, FamilyTally, Guest, GuestStatus, TallyResult,
    NO_FAMILY, UNKNOWN_NAME,
};
pub use roster::{
    available_voters, available_voters_from_ids, costume_candidates, find_guest, group_by_family,
    karaoke_candidates, voted_ids,
};
pub use seed::{parse_roster, seed_database, FamilyBlock, SeedSummary};
pub use tally::compute_results;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
