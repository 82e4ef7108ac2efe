use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};

/// Shuffle `names` and group them into consecutive pairs.
///
/// The returned list is ordered by team number, starting at 1. With an odd roster the last
/// shuffled name is left out; it only happens in previews sent while players are gathering.
pub fn pair_players<R: Rng + ?Sized>(names: &[String], rng: &mut R) -> Vec<Vec<String>> {
    let mut shuffled = names.to_vec();
    shuffled.shuffle(rng);
    shuffled
        .chunks_exact(2)
        .map(|pair| pair.to_vec())
        .collect()
}

/// Map every paired player to its 1-based team number.
pub fn team_assignments(teams: &[Vec<String>]) -> IndexMap<String, u32> {
    teams
        .iter()
        .zip(1u32..)
        .flat_map(|(members, team)| members.iter().map(move |name| (name.clone(), team)))
        .collect()
}

/// Members of `team` other than `player`.
pub fn teammates(teams: &[Vec<String>], team: u32, player: &str) -> Vec<String> {
    team.checked_sub(1)
        .and_then(|index| teams.get(index as usize))
        .map(|members| {
            members
                .iter()
                .filter(|name| name.as_str() != player)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn even_roster_is_fully_paired() {
        let roster = names(&["Ana", "Beto", "Caro", "Dani"]);
        let teams = pair_players(&roster, &mut StdRng::seed_from_u64(3));

        assert_eq!(teams.len(), 2);
        assert!(teams.iter().all(|team| team.len() == 2));

        let mut seen: Vec<String> = teams.concat();
        seen.sort();
        assert_eq!(seen, roster);
    }

    #[test]
    fn odd_leftover_has_no_team() {
        let roster = names(&["Ana", "Beto", "Caro"]);
        let teams = pair_players(&roster, &mut StdRng::seed_from_u64(11));
        let assignments = team_assignments(&teams);

        assert_eq!(teams.len(), 1);
        assert_eq!(assignments.len(), 2);
        let leftover = roster
            .iter()
            .find(|name| !assignments.contains_key(*name))
            .unwrap();
        assert!(!teams.concat().contains(leftover));
    }

    #[test]
    fn teams_are_numbered_from_one() {
        let teams = vec![names(&["Ana", "Beto"]), names(&["Caro", "Dani"])];
        let assignments = team_assignments(&teams);

        assert_eq!(assignments["Ana"], 1);
        assert_eq!(assignments["Beto"], 1);
        assert_eq!(assignments["Caro"], 2);
        assert_eq!(assignments["Dani"], 2);
        assert_eq!(teammates(&teams, 2, "Dani"), names(&["Caro"]));
        assert!(teammates(&teams, 0, "Ana").is_empty());
        assert!(teammates(&teams, 3, "Ana").is_empty());
    }

    #[test]
    fn empty_roster_yields_no_teams() {
        assert!(pair_players(&[], &mut StdRng::seed_from_u64(0)).is_empty());
    }
}
