// Error taxonomy for the voting core.
// Callers can tell a duplicate ballot, a rule violation, a missing roster
// reference, and a storage failure apart without parsing strings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoteError {
    /// The store already holds a ballot for this voter.
    #[error("voter {voter_id} has already voted")]
    AlreadyVoted { voter_id: String },

    /// The ballot breaks a voting rule (wrong picks, self-vote, own family).
    #[error("invalid ballot: {0}")]
    InvalidBallot(String),

    /// Referenced guest does not exist in the roster snapshot.
    #[error("unknown guest: {guest_id}")]
    UnknownGuest { guest_id: String },

    /// Referenced family does not exist in the roster snapshot.
    #[error("unknown family: {family_id}")]
    UnknownFamily { family_id: String },

    /// Underlying storage failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type VoteResult<T> = Result<T, VoteError>;
