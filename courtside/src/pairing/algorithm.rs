//! Greedy skill-banded pairing.
//!
//! Players are ordered by `(skill_rating, matches_played, id)` so the same
//! pool always yields the same pairings. Adjacent players (or adjacent teams
//! in doubles) are paired when their rating gap is within tolerance; anyone
//! left over joins the waiting list. Generation stops once there is one
//! proposal per court.

use crate::error::{MatchmakingError, MatchmakingResult};
use crate::matches::models::MatchMode;
use crate::pool::models::Player;

use super::models::{MatchProposal, PairingOutcome, PairingParams};

/// Deterministic pairing order
pub fn sort_players(players: &mut [Player]) {
    players.sort_by(|a, b| {
        a.skill_rating
            .cmp(&b.skill_rating)
            .then_with(|| a.matches_played.cmp(&b.matches_played))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Pair players into balanced matches.
///
/// # Errors
///
/// - `InvalidParameter` for a non-positive tolerance or court count
/// - `InsufficientParticipants` when fewer than two (singles) or four
///   (doubles) players are available
pub fn generate_matches(
    mut players: Vec<Player>,
    params: &PairingParams,
) -> MatchmakingResult<PairingOutcome> {
    params.validate()?;

    let needed = params.mode.min_players();
    if players.len() < needed {
        return Err(MatchmakingError::InsufficientParticipants {
            needed,
            available: players.len(),
        });
    }

    sort_players(&mut players);

    let outcome = match params.mode {
        MatchMode::Singles => pair_singles(players, params),
        MatchMode::Doubles => pair_doubles(players, params),
    };
    Ok(outcome)
}

fn court_limit(params: &PairingParams) -> usize {
    usize::try_from(params.max_courts).unwrap_or(usize::MAX)
}

fn pair_singles(players: Vec<Player>, params: &PairingParams) -> PairingOutcome {
    let limit = court_limit(params);
    let mut outcome = PairingOutcome::default();
    let mut rest = players.into_iter().peekable();

    while let Some(player) = rest.next() {
        if outcome.proposals.len() >= limit {
            outcome.waiting.push(player);
            continue;
        }
        // Sorted ascending, so if the next player is out of range every
        // later one is too.
        let gap = match rest.peek() {
            Some(next) => i64::from(next.skill_rating) - i64::from(player.skill_rating),
            None => {
                outcome.waiting.push(player);
                continue;
            }
        };
        if gap > params.skill_tolerance {
            outcome.waiting.push(player);
            continue;
        }
        if let Some(opponent) = rest.next() {
            outcome.proposals.push(MatchProposal {
                mode: MatchMode::Singles,
                slot1: vec![player],
                slot2: vec![opponent],
                rating_gap: gap as f64,
            });
        }
    }

    outcome
}

fn team_total(team: &[Player]) -> i64 {
    team.iter().map(|p| i64::from(p.skill_rating)).sum()
}

fn pair_doubles(players: Vec<Player>, params: &PairingParams) -> PairingOutcome {
    let limit = court_limit(params);
    let mut outcome = PairingOutcome::default();

    let mut teams: Vec<Vec<Player>> = Vec::with_capacity(players.len() / 2);
    let mut rest = players.into_iter();
    loop {
        match (rest.next(), rest.next()) {
            (Some(a), Some(b)) => teams.push(vec![a, b]),
            (Some(odd), None) => {
                outcome.waiting.push(odd);
                break;
            }
            _ => break,
        }
    }

    // Comparing sums against twice the tolerance is the same test as
    // comparing averages against the tolerance, without rounding.
    let mut teams = teams.into_iter().peekable();
    while let Some(team) = teams.next() {
        if outcome.proposals.len() >= limit {
            outcome.waiting.extend(team);
            continue;
        }
        let gap = match teams.peek() {
            Some(next) => (team_total(next) - team_total(&team)).abs(),
            None => {
                outcome.waiting.extend(team);
                continue;
            }
        };
        if gap > params.skill_tolerance.saturating_mul(2) {
            outcome.waiting.extend(team);
            continue;
        }
        if let Some(opponents) = teams.next() {
            outcome.proposals.push(MatchProposal {
                mode: MatchMode::Doubles,
                slot1: team,
                slot2: opponents,
                rating_gap: gap as f64 / 2.0,
            });
        }
    }

    sort_players(&mut outcome.waiting);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::models::{PlayerOrigin, PlayerRef};

    fn player(id: i64, rating: i32) -> Player {
        Player {
            id: PlayerRef::User(id),
            origin: PlayerOrigin::Registered,
            name: format!("p{id}"),
            skill_rating: rating,
            matches_played: 0,
        }
    }

    fn params(mode: MatchMode, max_courts: i64, skill_tolerance: i64) -> PairingParams {
        PairingParams {
            mode,
            max_courts,
            skill_tolerance,
        }
    }

    fn ratings(players: &[Player]) -> Vec<i32> {
        players.iter().map(|p| p.skill_rating).collect()
    }

    fn four() -> Vec<Player> {
        vec![
            player(3, 1200),
            player(1, 1000),
            player(4, 1300),
            player(2, 1100),
        ]
    }

    #[test]
    fn test_singles_pairs_adjacent_within_tolerance() {
        let outcome = generate_matches(four(), &params(MatchMode::Singles, 2, 200)).unwrap();
        assert_eq!(outcome.proposals.len(), 2);
        assert_eq!(ratings(&outcome.proposals[0].slot1), vec![1000]);
        assert_eq!(ratings(&outcome.proposals[0].slot2), vec![1100]);
        assert_eq!(ratings(&outcome.proposals[1].slot1), vec![1200]);
        assert_eq!(ratings(&outcome.proposals[1].slot2), vec![1300]);
        assert!(outcome.waiting.is_empty());
    }

    #[test]
    fn test_singles_tight_tolerance_leaves_everyone_waiting() {
        let outcome = generate_matches(four(), &params(MatchMode::Singles, 2, 50)).unwrap();
        assert!(outcome.proposals.is_empty());
        assert_eq!(ratings(&outcome.waiting), vec![1000, 1100, 1200, 1300]);
    }

    #[test]
    fn test_singles_skips_outlier_and_keeps_pairing() {
        let players = vec![player(1, 800), player(2, 1200), player(3, 1250), player(4, 1290)];
        let outcome = generate_matches(players, &params(MatchMode::Singles, 5, 100)).unwrap();
        assert_eq!(outcome.proposals.len(), 1);
        assert_eq!(ratings(&outcome.proposals[0].slot1), vec![1200]);
        assert_eq!(outcome.proposals[0].rating_gap, 50.0);
        assert_eq!(ratings(&outcome.waiting), vec![800, 1290]);
    }

    #[test]
    fn test_court_limit_sends_pairable_players_to_waiting() {
        let outcome = generate_matches(four(), &params(MatchMode::Singles, 1, 500)).unwrap();
        assert_eq!(outcome.proposals.len(), 1);
        assert_eq!(ratings(&outcome.waiting), vec![1200, 1300]);
    }

    #[test]
    fn test_ties_broken_by_matches_played_then_id() {
        let mut a = player(9, 1000);
        a.matches_played = 3;
        let b = player(5, 1000);
        let c = player(2, 1000);
        let mut players = vec![a, b, c];
        sort_players(&mut players);
        let ids: Vec<PlayerRef> = players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PlayerRef::User(2), PlayerRef::User(5), PlayerRef::User(9)]);
    }

    #[test]
    fn test_insufficient_participants() {
        let err = generate_matches(vec![player(1, 1000)], &params(MatchMode::Singles, 2, 200))
            .unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::InsufficientParticipants { needed: 2, available: 1 }
        ));

        let err = generate_matches(
            vec![player(1, 1000), player(2, 1000), player(3, 1000)],
            &params(MatchMode::Doubles, 2, 200),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MatchmakingError::InsufficientParticipants { needed: 4, available: 3 }
        ));
    }

    #[test]
    fn test_parameters_checked_before_pool_size() {
        let err = generate_matches(vec![], &params(MatchMode::Singles, 0, 200)).unwrap_err();
        assert!(matches!(err, MatchmakingError::InvalidParameter { name: "max_courts", .. }));
    }

    #[test]
    fn test_doubles_pairs_adjacent_teams_by_average() {
        let players = (1..=9).map(|id| player(id, 1000 + id as i32 * 10)).collect();
        let outcome = generate_matches(players, &params(MatchMode::Doubles, 4, 50)).unwrap();
        assert_eq!(outcome.proposals.len(), 2);
        assert_eq!(ratings(&outcome.proposals[0].slot1), vec![1010, 1020]);
        assert_eq!(ratings(&outcome.proposals[0].slot2), vec![1030, 1040]);
        assert_eq!(outcome.proposals[0].rating_gap, 20.0);
        // Odd player out
        assert_eq!(ratings(&outcome.waiting), vec![1090]);
    }

    #[test]
    fn test_doubles_unbalanced_teams_wait() {
        let players = vec![player(1, 1000), player(2, 1000), player(3, 1600), player(4, 1600)];
        let outcome = generate_matches(players, &params(MatchMode::Doubles, 2, 200)).unwrap();
        assert!(outcome.proposals.is_empty());
        assert_eq!(outcome.waiting.len(), 4);
    }

    #[test]
    fn test_doubles_accepts_maximum_tolerance() {
        let players = vec![player(1, 1000), player(2, 1000), player(3, 1010), player(4, 1010)];
        let outcome =
            generate_matches(players, &params(MatchMode::Doubles, 2, i64::MAX)).unwrap();
        assert_eq!(outcome.proposals.len(), 1);
        assert!(outcome.waiting.is_empty());
        assert_eq!(outcome.proposals[0].rating_gap, 10.0);
    }

    #[test]
    fn test_singles_accepts_maximum_tolerance() {
        let outcome = generate_matches(four(), &params(MatchMode::Singles, 2, i64::MAX)).unwrap();
        assert_eq!(outcome.proposals.len(), 2);
        assert!(outcome.waiting.is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let p = params(MatchMode::Singles, 3, 150);
        let first = generate_matches(four(), &p).unwrap();
        let mut reversed = four();
        reversed.reverse();
        let second = generate_matches(reversed, &p).unwrap();
        assert_eq!(first, second);
    }
}
