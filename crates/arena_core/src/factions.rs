//! Team definitions and per-team storage.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the two symmetric factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    /// The western kingdom.
    Blue,
    /// The eastern kingdom.
    Red,
}

impl Team {
    /// Both teams, in a stable order.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Red];

    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }

    /// Get the display name for this team.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Blue => "Blue Team",
            Self::Red => "Red Team",
        }
    }

    /// Get the short name for this team.
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// One value per team, indexable by [`Team`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerTeam<T> {
    /// Blue team's value.
    pub blue: T,
    /// Red team's value.
    pub red: T,
}

impl<T> PerTeam<T> {
    /// Create from both values.
    pub const fn new(blue: T, red: T) -> Self {
        Self { blue, red }
    }

    /// Iterate `(team, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Team, &T)> {
        [(Team::Blue, &self.blue), (Team::Red, &self.red)].into_iter()
    }
}

impl<T> Index<Team> for PerTeam<T> {
    type Output = T;

    fn index(&self, team: Team) -> &Self::Output {
        match team {
            Team::Blue => &self.blue,
            Team::Red => &self.red,
        }
    }
}

impl<T> IndexMut<Team> for PerTeam<T> {
    fn index_mut(&mut self, team: Team) -> &mut Self::Output {
        match team {
            Team::Blue => &mut self.blue,
            Team::Red => &mut self.red,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        for team in Team::ALL {
            assert_ne!(team, team.opponent());
            assert_eq!(team, team.opponent().opponent());
        }
    }

    #[test]
    fn test_per_team_indexing() {
        let mut counts = PerTeam::new(1, 2);
        counts[Team::Red] += 5;
        assert_eq!(counts[Team::Blue], 1);
        assert_eq!(counts[Team::Red], 7);
        assert_eq!(counts.iter().map(|(_, c)| *c).sum::<i32>(), 8);
    }
}
