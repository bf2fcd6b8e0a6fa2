// Roster seeding from a plain text guest list.
//
// File format: a line starting with "Familia " opens a family block, the
// following non-empty lines are its members, a blank line closes the block.
// Names outside any block are ignored.

use log::info;
use rusqlite::Connection;

use crate::db;
use crate::error::VoteResult;
use crate::models::{Family, Guest};

const FAMILY_PREFIX: &str = "Familia ";

/// One family block as written in the roster file.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyBlock {
    pub name: String,
    pub members: Vec<String>,
}

/// What a seeding run actually did. Re-runs reuse existing rows, so the
/// skipped count tells re-seeding apart from first seeding.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSummary {
    pub families: usize,
    pub guests_added: usize,
    pub guests_skipped: usize,
}

pub fn parse_roster(content: &str) -> Vec<FamilyBlock> {
    let mut blocks: Vec<FamilyBlock> = Vec::new();
    let mut open = false;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() {
            open = false;
            continue;
        }

        if line.starts_with(FAMILY_PREFIX) {
            blocks.push(FamilyBlock {
                name: line.to_string(),
                members: Vec::new(),
            });
            open = true;
        } else if open {
            if let Some(block) = blocks.last_mut() {
                block.members.push(line.to_string());
            }
        }
    }

    blocks
}

/// Parse a roster file and load it into the store. Safe to run twice:
/// families are matched by name, guests by (name, family).
pub fn seed_database(conn: &Connection, content: &str) -> VoteResult<SeedSummary> {
    let blocks = parse_roster(content);

    let mut summary = SeedSummary {
        families: 0,
        guests_added: 0,
        guests_skipped: 0,
    };

    for block in &blocks {
        let family_id = db::insert_family(conn, &Family::new(&block.name))?;
        summary.families += 1;

        for member in &block.members {
            if db::insert_guest(conn, &Guest::new(member, &family_id))? {
                summary.guests_added += 1;
            } else {
                summary.guests_skipped += 1;
            }
        }
    }

    info!(
        "seeded {} families, {} guests ({} already present)",
        summary.families, summary.guests_added, summary.guests_skipped
    );

    Ok(summary)
}
