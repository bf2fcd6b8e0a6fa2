// Eligibility and self-exclusion filters.
// Pure functions over roster snapshots, so the rules stay testable without
// a store. Callers load fresh rows and pass them in.

use std::collections::HashSet;

use crate::error::{VoteError, VoteResult};
use crate::models::{Ballot, Family, Guest, NO_FAMILY};

/// Ids of every guest who already voted, straight off a ballot snapshot.
pub fn voted_ids(ballots: &[Ballot]) -> HashSet<String> {
    ballots.iter().map(|b| b.voter_id.clone()).collect()
}

/// Guests still allowed to cast a ballot.
pub fn available_voters(guests: &[Guest], ballots: &[Ballot]) -> Vec<Guest> {
    available_voters_from_ids(guests, &voted_ids(ballots))
}

/// Same filter for callers who already hold the voted set.
pub fn available_voters_from_ids(guests: &[Guest], voted: &HashSet<String>) -> Vec<Guest> {
    guests
        .iter()
        .filter(|g| !voted.contains(&g.id))
        .cloned()
        .collect()
}

pub fn find_guest<'a>(guests: &'a [Guest], guest_id: &str) -> VoteResult<&'a Guest> {
    guests
        .iter()
        .find(|g| g.id == guest_id)
        .ok_or_else(|| VoteError::UnknownGuest {
            guest_id: guest_id.to_string(),
        })
}

/// Costume candidates for a voter: everyone at the party except the voter.
pub fn costume_candidates(guests: &[Guest], voter_id: &str) -> VoteResult<Vec<Guest>> {
    find_guest(guests, voter_id)?;

    Ok(guests
        .iter()
        .filter(|g| g.id != voter_id)
        .cloned()
        .collect())
}

/// Karaoke candidates for a voter: every family except the voter's own.
pub fn karaoke_candidates(
    guests: &[Guest],
    families: &[Family],
    voter_id: &str,
) -> VoteResult<Vec<Family>> {
    let voter = find_guest(guests, voter_id)?;

    Ok(families
        .iter()
        .filter(|f| f.id != voter.family_id)
        .cloned()
        .collect())
}

/// Guests bucketed by family display name for the selection screen.
/// Buckets follow the family order handed in (alphabetical from the store);
/// guests whose family row cannot be resolved land in a trailing
/// `NO_FAMILY` bucket. Families with no guests get no bucket.
pub fn group_by_family(guests: &[Guest], families: &[Family]) -> Vec<(String, Vec<Guest>)> {
    let known: HashSet<&str> = families.iter().map(|f| f.id.as_str()).collect();

    let mut groups: Vec<(String, Vec<Guest>)> = Vec::new();

    for family in families {
        let members: Vec<Guest> = guests
            .iter()
            .filter(|g| g.family_id == family.id)
            .cloned()
            .collect();
        if !members.is_empty() {
            groups.push((family.name.clone(), members));
        }
    }

    let orphans: Vec<Guest> = guests
        .iter()
        .filter(|g| !known.contains(g.family_id.as_str()))
        .cloned()
        .collect();
    if !orphans.is_empty() {
        groups.push((NO_FAMILY.to_string(), orphans));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_roster() -> (Vec<Family>, Vec<Guest>) {
        let perez = Family::new("Familia Pérez");
        let lopez = Family::new("Familia López");

        let guests = vec![
            Guest::new("Ana", &perez.id),
            Guest::new("Luis", &perez.id),
            Guest::new("Marta", &lopez.id),
        ];

        (vec![lopez, perez], guests)
    }

    fn ballot_for(voter: &Guest) -> Ballot {
        Ballot {
            voter_id: voter.id.clone(),
            costume_votes: ["a".to_string(), "b".to_string(), "c".to_string()],
            karaoke_vote: "f".to_string(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_available_voters_drops_exactly_who_voted() {
        let (_, guests) = test_roster();
        let ballots = vec![ballot_for(&guests[1])];

        let available = available_voters(&guests, &ballots);

        assert_eq!(available.len(), 2);
        assert!(available.iter().all(|g| g.id != guests[1].id));

        // Nobody voted yet: everyone is eligible.
        assert_eq!(available_voters(&guests, &[]).len(), 3);

        // Everyone voted: nobody is left.
        let all: Vec<Ballot> = guests.iter().map(ballot_for).collect();
        assert!(available_voters(&guests, &all).is_empty());
    }

    #[test]
    fn test_available_voters_from_id_set() {
        let (_, guests) = test_roster();
        let voted: HashSet<String> = [guests[0].id.clone(), guests[2].id.clone()]
            .into_iter()
            .collect();

        let available = available_voters_from_ids(&guests, &voted);

        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, guests[1].id);
    }

    #[test]
    fn test_costume_candidates_exclude_only_the_voter() {
        let (_, guests) = test_roster();

        let candidates = costume_candidates(&guests, &guests[0].id).unwrap();

        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|g| g.id != guests[0].id));
    }

    #[test]
    fn test_karaoke_candidates_exclude_own_family() {
        let (families, guests) = test_roster();

        // Ana is a Pérez: only López remains.
        let candidates = karaoke_candidates(&guests, &families, &guests[0].id).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Familia López");
    }

    #[test]
    fn test_unknown_voter_is_rejected() {
        let (families, guests) = test_roster();

        let err = costume_candidates(&guests, "nadie").unwrap_err();
        assert!(matches!(err, VoteError::UnknownGuest { ref guest_id } if guest_id == "nadie"));

        let err = karaoke_candidates(&guests, &families, "nadie").unwrap_err();
        assert!(matches!(err, VoteError::UnknownGuest { .. }));
    }

    #[test]
    fn test_group_by_family_buckets_and_sentinel() {
        let (families, mut guests) = test_roster();
        guests.push(Guest::new("Colado", "familia-borrada"));

        let groups = group_by_family(&guests, &families);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, "Familia López");
        assert_eq!(groups[1].0, "Familia Pérez");
        assert_eq!(groups[1].1.len(), 2);

        // Unresolvable family lands in the trailing bucket.
        assert_eq!(groups[2].0, NO_FAMILY);
        assert_eq!(groups[2].1[0].name, "Colado");
    }
}
