use std::fmt;

/// One of the two sides on the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    A,
    B,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => write!(f, "A"),
            Team::B => write!(f, "B"),
        }
    }
}

/// Goal counters for both teams. Independent of the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub team_a: u32,
    pub team_b: u32,
}

impl Scores {
    /// Applies `delta` to `team`'s score, clamping at zero.
    pub fn change(&mut self, team: Team, delta: i32) {
        let score = match team {
            Team::A => &mut self.team_a,
            Team::B => &mut self.team_b,
        };
        *score = score.saturating_add_signed(delta);
        tracing::info!(%team, score = *score, "score changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_start_at_zero() {
        let s = Scores::default();
        assert_eq!(s, Scores { team_a: 0, team_b: 0 });
    }

    #[test]
    fn change_only_touches_one_team() {
        let mut s = Scores::default();
        s.change(Team::A, 1);
        s.change(Team::A, 1);
        s.change(Team::B, 1);
        assert_eq!(s, Scores { team_a: 2, team_b: 1 });
    }

    #[test]
    fn change_clamps_at_zero() {
        let mut s = Scores::default();
        s.change(Team::B, -1);
        assert_eq!(s.team_b, 0);

        s.change(Team::A, 2);
        s.change(Team::A, -5);
        assert_eq!(s.team_a, 0);
    }
}
