// Roster and ballot models
// Input entities mirror storage rows (snake_case). Tally output types
// serialize in the camelCase shape the results dashboard consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display bucket for guests whose family row cannot be resolved.
pub const NO_FAMILY: &str = "Sin familia";

/// Display name for vote targets missing from the roster snapshot.
pub const UNKNOWN_NAME: &str = "Desconocido";

// ============================================================================
// ROSTER ENTITIES
// ============================================================================

/// A family competing for the karaoke award.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    /// Stable identity (UUID) - never changes
    pub id: String,
    pub name: String,
}

impl Family {
    pub fn new(name: &str) -> Self {
        Family {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        }
    }
}

/// A registered party guest. Every guest is both a voter and a costume
/// candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Stable identity (UUID) - never changes
    pub id: String,
    pub name: String,
    /// Family the guest belongs to (karaoke self-exclusion key)
    pub family_id: String,
}

impl Guest {
    pub fn new(name: &str, family_id: &str) -> Self {
        Guest {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            family_id: family_id.to_string(),
        }
    }
}

// ============================================================================
// BALLOTS
// ============================================================================

/// The choices a voter hands in: exactly three costume picks plus one family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotForm {
    pub voter_id: String,
    pub costume_votes: [String; 3],
    pub karaoke_vote: String,
}

/// A recorded ballot. One row per voter, enforced by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter_id: String,
    pub costume_votes: [String; 3],
    pub karaoke_vote: String,
    pub submitted_at: DateTime<Utc>,
}

impl Ballot {
    /// Stamp a validated form with the submission time.
    pub fn from_form(form: &BallotForm) -> Self {
        Ballot {
            voter_id: form.voter_id.clone(),
            costume_votes: form.costume_votes.clone(),
            karaoke_vote: form.karaoke_vote.clone(),
            submitted_at: Utc::now(),
        }
    }
}

// ============================================================================
// TALLY OUTPUT
// ============================================================================

/// One guest on the costume podium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostumeWinner {
    pub guest_id: String,
    pub name: String,
    pub count: u64,
    /// 1-based competition rank: tied guests share a rank, the next
    /// count band resumes past them (counts 5,5,3 print as 1,1,3).
    pub rank: usize,
}

/// Karaoke votes received by one family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyTally {
    pub family_id: String,
    pub name: String,
    pub count: u64,
}

/// Per-guest line for the live dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestStatus {
    pub guest_id: String,
    pub name: String,
    pub family: String,
    pub has_voted: bool,
    pub costume_votes_received: u64,
    /// Karaoke votes credited to the guest's own family.
    pub family_karaoke_votes: u64,
}

/// Full results snapshot: both podiums plus the per-guest board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResult {
    pub total_votes: usize,
    pub costume_winners: Vec<CostumeWinner>,
    pub karaoke_winners: Vec<FamilyTally>,
    pub guest_status: Vec<GuestStatus>,
}
