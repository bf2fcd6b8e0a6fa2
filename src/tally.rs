// Tally engine: pure computation over a ballot snapshot.
// Recounting the same ballots always gives the same result; ballot order
// never matters.

use log::debug;
use std::collections::HashMap;

use crate::models::{
    Ballot, CostumeWinner, Family, FamilyTally, Guest, GuestStatus, TallyResult, NO_FAMILY,
    UNKNOWN_NAME,
};
use crate::roster::voted_ids;

/// Count every ballot and produce the full results snapshot.
pub fn compute_results(ballots: &[Ballot], guests: &[Guest], families: &[Family]) -> TallyResult {
    let mut costume_counts: HashMap<&str, u64> = HashMap::new();
    let mut karaoke_counts: HashMap<&str, u64> = HashMap::new();

    for ballot in ballots {
        for pick in &ballot.costume_votes {
            *costume_counts.entry(pick.as_str()).or_insert(0) += 1;
        }
        if !ballot.karaoke_vote.is_empty() {
            *karaoke_counts.entry(ballot.karaoke_vote.as_str()).or_insert(0) += 1;
        }
    }

    let guest_names: HashMap<&str, &str> = guests
        .iter()
        .map(|g| (g.id.as_str(), g.name.as_str()))
        .collect();
    let family_names: HashMap<&str, &str> = families
        .iter()
        .map(|f| (f.id.as_str(), f.name.as_str()))
        .collect();

    let costume_winners = rank_costume_winners(&costume_counts, &guest_names);
    let karaoke_winners = rank_karaoke_winners(&karaoke_counts, &family_names);

    let voted = voted_ids(ballots);

    let guest_status: Vec<GuestStatus> = guests
        .iter()
        .map(|g| GuestStatus {
            guest_id: g.id.clone(),
            name: g.name.clone(),
            family: family_names
                .get(g.family_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| NO_FAMILY.to_string()),
            has_voted: voted.contains(&g.id),
            costume_votes_received: costume_counts.get(g.id.as_str()).copied().unwrap_or(0),
            family_karaoke_votes: karaoke_counts.get(g.family_id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    debug!(
        "tallied {} ballots: {} costume winners, {} karaoke winners",
        ballots.len(),
        costume_winners.len(),
        karaoke_winners.len()
    );

    TallyResult {
        total_votes: ballots.len(),
        costume_winners,
        karaoke_winners,
        guest_status,
    }
}

/// Costume podium: the two highest count bands, every tied guest included.
///
/// Candidates sort by count, then name, then id, so equal snapshots render
/// identically. Ranks are competition style: the band below a two-way tie
/// at 1 prints as 3, never 2.
fn rank_costume_winners(
    counts: &HashMap<&str, u64>,
    names: &HashMap<&str, &str>,
) -> Vec<CostumeWinner> {
    let mut ranked: Vec<CostumeWinner> = counts
        .iter()
        .map(|(id, &count)| CostumeWinner {
            guest_id: id.to_string(),
            name: names
                .get(id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            count,
            rank: 0,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.guest_id.cmp(&b.guest_id))
    });

    let top = match ranked.first() {
        Some(w) => w.count,
        None => return Vec::new(),
    };

    // Second band = highest count strictly below the top. When everyone is
    // tied there is no second band and the podium is that single band.
    let second = ranked
        .iter()
        .map(|w| w.count)
        .find(|&c| c < top)
        .unwrap_or(top);

    let mut winners: Vec<CostumeWinner> =
        ranked.into_iter().filter(|w| w.count >= second).collect();

    let mut band_count = 0;
    let mut band_rank = 0;
    for (idx, winner) in winners.iter_mut().enumerate() {
        if winner.count != band_count {
            band_count = winner.count;
            band_rank = idx + 1;
        }
        winner.rank = band_rank;
    }

    winners
}

/// Karaoke podium: every family tied at the highest count.
fn rank_karaoke_winners(
    counts: &HashMap<&str, u64>,
    names: &HashMap<&str, &str>,
) -> Vec<FamilyTally> {
    let mut tallies: Vec<FamilyTally> = counts
        .iter()
        .map(|(id, &count)| FamilyTally {
            family_id: id.to_string(),
            name: names
                .get(id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            count,
        })
        .collect();

    tallies.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.family_id.cmp(&b.family_id))
    });

    let max = match tallies.first() {
        Some(t) => t.count,
        None => return Vec::new(),
    };

    tallies.into_iter().filter(|t| t.count == max).collect()
}
