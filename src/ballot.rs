// Vote recorder: checks a ballot form against the roster, then hands it to
// the store. The store's UNIQUE constraint stays the authority on
// duplicates; validation here covers the voting rules.

use log::info;
use rusqlite::Connection;

use crate::db;
use crate::error::{VoteError, VoteResult};
use crate::models::{Ballot, BallotForm, Family, Guest};
use crate::roster::find_guest;

/// Check every voting rule against a roster snapshot.
///
/// Rules, in check order: the voter exists; the three costume picks are
/// distinct, name existing guests, and never the voter; the karaoke pick
/// names an existing family that is not the voter's own.
pub fn validate_ballot(form: &BallotForm, guests: &[Guest], families: &[Family]) -> VoteResult<()> {
    let voter = find_guest(guests, &form.voter_id)?;

    let [a, b, c] = &form.costume_votes;
    if a == b || a == c || b == c {
        return Err(VoteError::InvalidBallot(
            "costume votes must name three distinct guests".to_string(),
        ));
    }

    for pick in &form.costume_votes {
        if *pick == form.voter_id {
            return Err(VoteError::InvalidBallot(
                "voters cannot vote for their own costume".to_string(),
            ));
        }
        find_guest(guests, pick)?;
    }

    if form.karaoke_vote.is_empty() {
        return Err(VoteError::InvalidBallot(
            "a karaoke vote is required".to_string(),
        ));
    }

    if !families.iter().any(|f| f.id == form.karaoke_vote) {
        return Err(VoteError::UnknownFamily {
            family_id: form.karaoke_vote.clone(),
        });
    }

    if form.karaoke_vote == voter.family_id {
        return Err(VoteError::InvalidBallot(
            "voters cannot vote for their own family".to_string(),
        ));
    }

    Ok(())
}

/// Validate and record a ballot in one go.
pub fn submit_ballot(conn: &Connection, form: &BallotForm) -> VoteResult<Ballot> {
    let guests = db::list_guests(conn)?;
    let families = db::list_families(conn)?;

    validate_ballot(form, &guests, &families)?;

    let ballot = Ballot::from_form(form);
    db::insert_ballot(conn, &ballot)?;

    info!("ballot recorded for voter {}", ballot.voter_id);
    Ok(ballot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster;
    use crate::tally;

    /// Two families with two guests each, straight into a fresh store.
    fn seed_test_roster(conn: &Connection) -> (Vec<Family>, Vec<Guest>) {
        db::setup_database(conn).unwrap();

        let perez = Family::new("Familia Pérez");
        let lopez = Family::new("Familia López");
        db::insert_family(conn, &perez).unwrap();
        db::insert_family(conn, &lopez).unwrap();

        let guests = vec![
            Guest::new("Ana", &perez.id),
            Guest::new("Luis", &perez.id),
            Guest::new("Marta", &lopez.id),
            Guest::new("Pedro", &lopez.id),
        ];
        for guest in &guests {
            db::insert_guest(conn, guest).unwrap();
        }

        (vec![perez, lopez], guests)
    }

    fn form(voter: &Guest, picks: [&Guest; 3], family: &Family) -> BallotForm {
        BallotForm {
            voter_id: voter.id.clone(),
            costume_votes: [
                picks[0].id.clone(),
                picks[1].id.clone(),
                picks[2].id.clone(),
            ],
            karaoke_vote: family.id.clone(),
        }
    }

    #[test]
    fn test_valid_ballot_passes() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);

        let form = form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[1]);

        validate_ballot(&form, &guests, &families).unwrap();
    }

    #[test]
    fn test_repeated_costume_pick_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);

        let form = form(&guests[0], [&guests[1], &guests[1], &guests[2]], &families[1]);
        let err = validate_ballot(&form, &guests, &families).unwrap_err();

        assert!(matches!(err, VoteError::InvalidBallot(_)));
    }

    #[test]
    fn test_self_costume_vote_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);

        let form = form(&guests[0], [&guests[0], &guests[1], &guests[2]], &families[1]);
        let err = validate_ballot(&form, &guests, &families).unwrap_err();

        assert!(matches!(err, VoteError::InvalidBallot(_)));
    }

    #[test]
    fn test_own_family_karaoke_vote_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);

        // Ana is a Pérez voting Pérez.
        let form = form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[0]);
        let err = validate_ballot(&form, &guests, &families).unwrap_err();

        assert!(matches!(err, VoteError::InvalidBallot(_)));
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);

        let mut bad_voter = form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[1]);
        bad_voter.voter_id = "nadie".to_string();
        assert!(matches!(
            validate_ballot(&bad_voter, &guests, &families).unwrap_err(),
            VoteError::UnknownGuest { .. }
        ));

        let mut bad_pick = form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[1]);
        bad_pick.costume_votes[2] = "nadie".to_string();
        assert!(matches!(
            validate_ballot(&bad_pick, &guests, &families).unwrap_err(),
            VoteError::UnknownGuest { .. }
        ));

        let mut bad_family = form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[1]);
        bad_family.karaoke_vote = "ninguna".to_string();
        assert!(matches!(
            validate_ballot(&bad_family, &guests, &families).unwrap_err(),
            VoteError::UnknownFamily { .. }
        ));

        let mut empty_karaoke =
            form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[1]);
        empty_karaoke.karaoke_vote = String::new();
        assert!(matches!(
            validate_ballot(&empty_karaoke, &guests, &families).unwrap_err(),
            VoteError::InvalidBallot(_)
        ));
    }

    #[test]
    fn test_second_ballot_from_same_voter_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);

        let first = form(&guests[0], [&guests[1], &guests[2], &guests[3]], &families[1]);
        submit_ballot(&conn, &first).unwrap();

        // Different picks, same voter.
        let retry = form(&guests[0], [&guests[3], &guests[2], &guests[1]], &families[1]);
        let err = submit_ballot(&conn, &retry).unwrap_err();

        assert!(matches!(err, VoteError::AlreadyVoted { .. }));
        assert_eq!(db::count_ballots(&conn).unwrap(), 1);
    }

    #[test]
    fn test_full_voting_flow() {
        let conn = Connection::open_in_memory().unwrap();
        let (families, guests) = seed_test_roster(&conn);
        let ana = &guests[0];

        // Before voting, Ana is eligible and never her own candidate.
        let ballots = db::list_ballots(&conn).unwrap();
        let available = roster::available_voters(&guests, &ballots);
        assert!(available.iter().any(|g| g.id == ana.id));

        let candidates = roster::costume_candidates(&guests, &ana.id).unwrap();
        assert!(candidates.iter().all(|g| g.id != ana.id));

        let karaoke = roster::karaoke_candidates(&guests, &families, &ana.id).unwrap();
        assert!(karaoke.iter().all(|f| f.id != ana.family_id));

        // Ana votes Luis, Marta, Pedro for costume and López for karaoke.
        let form = form(ana, [&guests[1], &guests[2], &guests[3]], &families[1]);
        submit_ballot(&conn, &form).unwrap();

        // She is no longer eligible.
        let ballots = db::list_ballots(&conn).unwrap();
        let available = roster::available_voters(&guests, &ballots);
        assert!(available.iter().all(|g| g.id != ana.id));

        // Her picks show up in the tally.
        let results = tally::compute_results(&ballots, &guests, &families);
        assert_eq!(results.total_votes, 1);
        for winner in &results.costume_winners {
            assert_eq!(winner.count, 1);
            assert_ne!(winner.guest_id, ana.id);
        }
        assert_eq!(results.karaoke_winners.len(), 1);
        assert_eq!(results.karaoke_winners[0].family_id, families[1].id);

        let ana_row = results
            .guest_status
            .iter()
            .find(|s| s.guest_id == ana.id)
            .unwrap();
        assert!(ana_row.has_voted);
        assert_eq!(ana_row.costume_votes_received, 0);
    }
}
