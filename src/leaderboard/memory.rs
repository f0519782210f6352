//! In-process leaderboard

use chrono::{DateTime, Utc};

use super::{
    LeaderboardEntry, LeaderboardError, LeaderboardService, MAX_LEVEL, MAX_SCORE, PlayerBest,
    SubmitOutcome,
};
use crate::persistence::MAX_PLAYER_NAME_LEN;

#[derive(Debug, Clone)]
struct Stored {
    entry: LeaderboardEntry,
    /// Insertion order, breaks timestamp ties
    seq: u64,
}

impl Stored {
    /// True if `self` ranks strictly above `other`
    fn beats(&self, other: &Stored) -> bool {
        (self.entry.score, std::cmp::Reverse((self.entry.timestamp, self.seq)))
            > (other.entry.score, std::cmp::Reverse((other.entry.timestamp, other.seq)))
    }
}

/// Leaderboard kept in memory, ranked by score then submission time
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaderboard {
    entries: Vec<Stored>,
    next_seq: u64,
}

impl InMemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert with an explicit timestamp
    pub fn submit_at(
        &mut self,
        player_name: &str,
        score: u64,
        level: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        let name = player_name.trim();
        if name.is_empty() {
            return Err(LeaderboardError::Rejected("Player name is required".into()));
        }
        if score > MAX_SCORE {
            return Err(LeaderboardError::Rejected(
                "Score exceeds maximum allowed value".into(),
            ));
        }
        if level == 0 {
            return Err(LeaderboardError::Rejected("Valid level is required".into()));
        }
        if level > MAX_LEVEL {
            return Err(LeaderboardError::Rejected(
                "Level exceeds maximum allowed value".into(),
            ));
        }

        let stored = Stored {
            entry: LeaderboardEntry {
                player_name: name.chars().take(MAX_PLAYER_NAME_LEN).collect(),
                score,
                level,
                timestamp,
            },
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let better = self.entries.iter().filter(|e| e.beats(&stored)).count();
        self.entries.push(stored);
        Ok(SubmitOutcome {
            rank: better as u32 + 1,
        })
    }

    fn sorted(&self) -> Vec<&Stored> {
        let mut rows: Vec<&Stored> = self.entries.iter().collect();
        rows.sort_by(|a, b| {
            b.entry
                .score
                .cmp(&a.entry.score)
                .then(a.entry.timestamp.cmp(&b.entry.timestamp))
                .then(a.seq.cmp(&b.seq))
        });
        rows
    }
}

impl LeaderboardService for InMemoryLeaderboard {
    fn submit_score(
        &mut self,
        player_name: &str,
        score: u64,
        level: u32,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        self.submit_at(player_name, score, level, Utc::now())
    }

    fn get_leaderboard(&mut self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self
            .sorted()
            .into_iter()
            .take(limit)
            .map(|s| s.entry.clone())
            .collect())
    }

    fn get_player_best(&mut self, player_name: &str) -> Result<Option<PlayerBest>, LeaderboardError> {
        let name = player_name.trim();
        let best = self
            .sorted()
            .into_iter()
            .find(|s| s.entry.player_name == name);
        Ok(best.map(|s| PlayerBest {
            rank: self
                .entries
                .iter()
                .filter(|e| e.entry.score > s.entry.score)
                .count() as u32
                + 1,
            entry: s.entry.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_rank_and_ordering() {
        let mut lb = InMemoryLeaderboard::new();
        assert_eq!(lb.submit_at("a", 100, 1, at(0)).unwrap().rank, 1);
        assert_eq!(lb.submit_at("b", 300, 3, at(1)).unwrap().rank, 1);
        assert_eq!(lb.submit_at("c", 200, 2, at(2)).unwrap().rank, 2);
        // Equal score, later timestamp ranks below
        assert_eq!(lb.submit_at("d", 200, 2, at(3)).unwrap().rank, 3);

        let names: Vec<_> = lb
            .get_leaderboard(10)
            .unwrap()
            .into_iter()
            .map(|e| e.player_name)
            .collect();
        assert_eq!(names, vec!["b", "c", "d", "a"]);
        assert_eq!(lb.get_leaderboard(2).unwrap().len(), 2);
    }

    #[test]
    fn test_same_timestamp_uses_submission_order() {
        let mut lb = InMemoryLeaderboard::new();
        lb.submit_at("first", 50, 1, at(0)).unwrap();
        assert_eq!(lb.submit_at("second", 50, 1, at(0)).unwrap().rank, 2);
    }

    #[test]
    fn test_validation() {
        let mut lb = InMemoryLeaderboard::new();
        assert!(matches!(
            lb.submit_at("   ", 1, 1, at(0)),
            Err(LeaderboardError::Rejected(_))
        ));
        assert!(lb.submit_at("x", MAX_SCORE + 1, 1, at(0)).is_err());
        assert!(lb.submit_at("x", 1, 0, at(0)).is_err());
        assert!(lb.submit_at("x", 1, MAX_LEVEL + 1, at(0)).is_err());
        assert!(lb.is_empty());

        lb.submit_at("  A Name Much Longer Than Twenty  ", 1, 1, at(0))
            .unwrap();
        let entry = &lb.get_leaderboard(1).unwrap()[0];
        assert_eq!(entry.player_name, "A Name Much Longer T");
    }

    #[test]
    fn test_player_best() {
        let mut lb = InMemoryLeaderboard::new();
        lb.submit_at("ace", 100, 1, at(0)).unwrap();
        lb.submit_at("ace", 400, 4, at(1)).unwrap();
        lb.submit_at("bob", 500, 5, at(2)).unwrap();
        lb.submit_at("cat", 400, 4, at(0)).unwrap();

        let best = lb.get_player_best(" ace ").unwrap().unwrap();
        assert_eq!(best.entry.score, 400);
        // Only strictly higher scores count
        assert_eq!(best.rank, 2);
        assert_eq!(lb.get_player_best("nobody").unwrap(), None);
    }
}
