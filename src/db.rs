// SQLite persistence for the party vote.
// The ballots table carries a UNIQUE voter_id; that constraint, not any
// in-memory check, is what guarantees one ballot per voter.

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection};
use std::collections::HashSet;

use crate::error::{VoteError, VoteResult};
use crate::models::{Ballot, Family, Guest};

pub fn setup_database(conn: &Connection) -> VoteResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Families Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS families (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Guests Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS guests (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            family_id TEXT NOT NULL REFERENCES families(id),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name, family_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Ballots Table (one row per voter; voter_id UNIQUE is the duplicate guard)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ballots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            voter_id TEXT UNIQUE NOT NULL REFERENCES guests(id),
            costume_vote_1 TEXT NOT NULL,
            costume_vote_2 TEXT NOT NULL,
            costume_vote_3 TEXT NOT NULL,
            karaoke_vote TEXT NOT NULL REFERENCES families(id),
            submitted_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ballots_voter ON ballots(voter_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_guests_family ON guests(family_id)",
        [],
    )?;

    Ok(())
}

/// Insert a family, reusing the existing row when the name is already seeded.
/// Returns the id that ends up holding the name.
pub fn insert_family(conn: &Connection, family: &Family) -> VoteResult<String> {
    let result = conn.execute(
        "INSERT INTO families (id, name) VALUES (?1, ?2)",
        params![family.id, family.name],
    );

    match result {
        Ok(_) => Ok(family.id.clone()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            let existing: String = conn.query_row(
                "SELECT id FROM families WHERE name = ?1",
                params![family.name],
                |row| row.get(0),
            )?;
            debug!("family '{}' already seeded as {}", family.name, existing);
            Ok(existing)
        }
        Err(e) => Err(e.into()),
    }
}

/// Insert a guest. Returns false when (name, family) is already seeded.
pub fn insert_guest(conn: &Connection, guest: &Guest) -> VoteResult<bool> {
    let result = conn.execute(
        "INSERT INTO guests (id, name, family_id) VALUES (?1, ?2, ?3)",
        params![guest.id, guest.name, guest.family_id],
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            debug!("guest '{}' already seeded", guest.name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Record a ballot. The UNIQUE constraint on voter_id turns a second ballot
/// from the same voter into `AlreadyVoted`, whoever wins the race.
pub fn insert_ballot(conn: &Connection, ballot: &Ballot) -> VoteResult<()> {
    let result = conn.execute(
        "INSERT INTO ballots (
            voter_id, costume_vote_1, costume_vote_2, costume_vote_3,
            karaoke_vote, submitted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            ballot.voter_id,
            ballot.costume_votes[0],
            ballot.costume_votes[1],
            ballot.costume_votes[2],
            ballot.karaoke_vote,
            ballot.submitted_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            debug!("duplicate ballot rejected for voter {}", ballot.voter_id);
            Err(VoteError::AlreadyVoted {
                voter_id: ballot.voter_id.clone(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

pub fn list_families(conn: &Connection) -> VoteResult<Vec<Family>> {
    let mut stmt = conn.prepare("SELECT id, name FROM families ORDER BY name")?;

    let families = stmt
        .query_map([], |row| {
            Ok(Family {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(families)
}

pub fn list_guests(conn: &Connection) -> VoteResult<Vec<Guest>> {
    let mut stmt = conn.prepare("SELECT id, name, family_id FROM guests ORDER BY name")?;

    let guests = stmt
        .query_map([], |row| {
            Ok(Guest {
                id: row.get(0)?,
                name: row.get(1)?,
                family_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(guests)
}

pub fn list_ballots(conn: &Connection) -> VoteResult<Vec<Ballot>> {
    let mut stmt = conn.prepare(
        "SELECT voter_id, costume_vote_1, costume_vote_2, costume_vote_3,
                karaoke_vote, submitted_at
         FROM ballots
         ORDER BY id",
    )?;

    let ballots = stmt
        .query_map([], |row| {
            let submitted_str: String = row.get(5)?;

            Ok(Ballot {
                voter_id: row.get(0)?,
                costume_votes: [row.get(1)?, row.get(2)?, row.get(3)?],
                karaoke_vote: row.get(4)?,
                submitted_at: DateTime::parse_from_rfc3339(&submitted_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ballots)
}

/// Ids of every guest who already has a ballot on file.
pub fn list_voter_ids(conn: &Connection) -> VoteResult<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT voter_id FROM ballots")?;

    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(ids)
}

pub fn count_ballots(conn: &Connection) -> VoteResult<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM ballots", [], |row| row.get(0))?;

    Ok(count)
}
