//! Achievement catalog and unlock rules
//!
//! The [`AchievementBook`] is the persisted record of what has been unlocked.
//! [`AchievementBook::evaluate`] is polled after state-affecting events with a
//! snapshot of the session and lifetime counters; unlocking is idempotent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::Metrics;
use crate::sim::{AttackPattern, SessionStats};

/// Every achievement the game knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AchievementId {
    Score500,
    Score1000,
    Score1500,
    Score2000,
    Score5000,
    /// Final score is a positive multiple of 100
    PerfectRun,
    /// Survived a boss level using this pattern without losing a life
    Boss(AttackPattern),
    AllBosses,
    ShieldSaved,
    Powerups3,
    Games100,
    TotalScore50000,
    LeaderboardRanked,
    LeaderboardTop1,
}

/// Score milestones in ascending order
const SCORE_MILESTONES: [(u64, AchievementId); 5] = [
    (500, AchievementId::Score500),
    (1000, AchievementId::Score1000),
    (1500, AchievementId::Score1500),
    (2000, AchievementId::Score2000),
    (5000, AchievementId::Score5000),
];

impl AchievementId {
    /// Storage key
    pub fn key(&self) -> &'static str {
        match self {
            AchievementId::Score500 => "score_500",
            AchievementId::Score1000 => "score_1000",
            AchievementId::Score1500 => "score_1500",
            AchievementId::Score2000 => "score_2000",
            AchievementId::Score5000 => "score_5000",
            AchievementId::PerfectRun => "perfect_run",
            AchievementId::Boss(pattern) => match pattern {
                AttackPattern::Spikes => "boss_spikes",
                AttackPattern::DoubleSpikes => "boss_double_spikes",
                AttackPattern::Wall => "boss_wall",
                AttackPattern::MovingSafe => "boss_moving_safe",
                AttackPattern::GiantObstacle => "boss_giant_obstacle",
                AttackPattern::DoubleObstacles => "boss_double_obstacles",
                AttackPattern::Gravity => "boss_gravity",
            },
            AchievementId::AllBosses => "all_bosses",
            AchievementId::ShieldSaved => "shield_saved",
            AchievementId::Powerups3 => "powerups_3",
            AchievementId::Games100 => "games_100",
            AchievementId::TotalScore50000 => "total_score_50000",
            AchievementId::LeaderboardRanked => "leaderboard_ranked",
            AchievementId::LeaderboardTop1 => "leaderboard_top1",
        }
    }

    /// Display name
    pub fn name(&self) -> String {
        match self {
            AchievementId::Score500 => "Reach 500 points".into(),
            AchievementId::Score1000 => "Reach 1000 points".into(),
            AchievementId::Score1500 => "Reach 1500 points".into(),
            AchievementId::Score2000 => "Reach 2000 points".into(),
            AchievementId::Score5000 => "Reach 5000 points".into(),
            AchievementId::PerfectRun => "Perfect Run (Score divisible by 100)".into(),
            AchievementId::Boss(pattern) => format!("Defeat {} Boss", pattern.display_name()),
            AchievementId::AllBosses => "Complete All Boss Types".into(),
            AchievementId::ShieldSaved => "Survived by Shield at 1 Life".into(),
            AchievementId::Powerups3 => "Get 3 Power-ups in One Game".into(),
            AchievementId::Games100 => "Play 100 Games".into(),
            AchievementId::TotalScore50000 => "Total 50,000 Points Earned".into(),
            AchievementId::LeaderboardRanked => "Get a Result on Global Leaderboard".into(),
            AchievementId::LeaderboardTop1 => "Get Top 1 on Global Leaderboard".into(),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AchievementId::Score500
            | AchievementId::Score1000
            | AchievementId::Score1500
            | AchievementId::Score2000
            | AchievementId::Score5000 => "⭐",
            AchievementId::PerfectRun => "✨",
            AchievementId::Boss(_) => "👾",
            AchievementId::AllBosses | AchievementId::LeaderboardTop1 => "👑",
            AchievementId::ShieldSaved => "🛡️",
            AchievementId::Powerups3 => "💎",
            AchievementId::Games100 => "🎮",
            AchievementId::TotalScore50000 => "🏅",
            AchievementId::LeaderboardRanked => "🌐",
        }
    }

    /// All achievements in display order
    pub fn catalog() -> Vec<AchievementId> {
        let mut all: Vec<AchievementId> = SCORE_MILESTONES.iter().map(|(_, id)| *id).collect();
        all.push(AchievementId::PerfectRun);
        all.extend(AttackPattern::ALL.iter().map(|p| AchievementId::Boss(*p)));
        all.extend([
            AchievementId::AllBosses,
            AchievementId::ShieldSaved,
            AchievementId::Powerups3,
            AchievementId::Games100,
            AchievementId::TotalScore50000,
            AchievementId::LeaderboardRanked,
            AchievementId::LeaderboardTop1,
        ]);
        all
    }
}

/// A stored achievement value. Older saves stored a bare `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AchievementEntry {
    Flag(bool),
    #[serde(rename_all = "camelCase")]
    Record {
        unlocked: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unlocked_at: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl AchievementEntry {
    pub fn is_unlocked(&self) -> bool {
        match self {
            AchievementEntry::Flag(unlocked) => *unlocked,
            AchievementEntry::Record { unlocked, .. } => *unlocked,
        }
    }
}

/// Counters the unlock rules read
#[derive(Debug, Clone, Copy)]
pub struct AchievementSnapshot<'a> {
    pub score: u64,
    pub session: &'a SessionStats,
    pub lifetime: &'a Metrics,
}

/// Persisted unlock record, keyed by achievement key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementBook {
    entries: BTreeMap<String, AchievementEntry>,
}

impl AchievementBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.entries
            .get(id.key())
            .is_some_and(AchievementEntry::is_unlocked)
    }

    /// Unlock `id`. Returns true only the first time.
    pub fn unlock(&mut self, id: AchievementId, now_ms: i64) -> bool {
        if self.is_unlocked(id) {
            return false;
        }
        let name = id.name();
        log::info!("Achievement unlocked: {name}");
        self.entries.insert(
            id.key().to_string(),
            AchievementEntry::Record {
                unlocked: true,
                unlocked_at: Some(now_ms),
                name: Some(name),
            },
        );
        true
    }

    pub fn unlocked_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_unlocked()).count()
    }

    pub fn entry(&self, id: AchievementId) -> Option<&AchievementEntry> {
        self.entries.get(id.key())
    }

    /// Apply every polled rule, returning the achievements newly unlocked
    pub fn evaluate(&mut self, snapshot: &AchievementSnapshot<'_>, now_ms: i64) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        let mut try_unlock = |book: &mut Self, id: AchievementId| {
            if book.unlock(id, now_ms) {
                unlocked.push(id);
            }
        };

        for (threshold, id) in SCORE_MILESTONES {
            if snapshot.score >= threshold {
                try_unlock(self, id);
            }
        }

        for pattern in &snapshot.session.boss_patterns_defeated {
            try_unlock(self, AchievementId::Boss(*pattern));
        }
        if AttackPattern::ALL
            .iter()
            .all(|p| self.is_unlocked(AchievementId::Boss(*p)))
        {
            try_unlock(self, AchievementId::AllBosses);
        }

        if snapshot.session.shield_saved_life {
            try_unlock(self, AchievementId::ShieldSaved);
        }
        if snapshot.session.powerups_collected >= 3 {
            try_unlock(self, AchievementId::Powerups3);
        }
        if snapshot.lifetime.total_games_played >= 100 {
            try_unlock(self, AchievementId::Games100);
        }
        if snapshot.lifetime.total_score_earned >= 50_000 {
            try_unlock(self, AchievementId::TotalScore50000);
        }

        unlocked
    }
}

/// True for a final score that earns the perfect-run achievement
pub fn is_perfect_run(score: u64) -> bool {
    score > 0 && score % 100 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot<'a>(score: u64, session: &'a SessionStats, lifetime: &'a Metrics) -> AchievementSnapshot<'a> {
        AchievementSnapshot {
            score,
            session,
            lifetime,
        }
    }

    #[test]
    fn test_catalog_keys_unique() {
        let catalog = AchievementId::catalog();
        assert_eq!(catalog.len(), 20);
        let keys: std::collections::BTreeSet<_> = catalog.iter().map(|id| id.key()).collect();
        assert_eq!(keys.len(), 20);
        assert_eq!(
            AchievementId::Boss(AttackPattern::Wall).name(),
            "Defeat Wall Restriction Boss"
        );
    }

    #[test]
    fn test_score_milestones() {
        let session = SessionStats::default();
        let metrics = Metrics::default();
        let mut book = AchievementBook::new();

        assert!(book.evaluate(&snapshot(499, &session, &metrics), 0).is_empty());
        let unlocked = book.evaluate(&snapshot(1200, &session, &metrics), 1);
        assert_eq!(
            unlocked,
            vec![AchievementId::Score500, AchievementId::Score1000]
        );
        // Idempotent
        assert!(book.evaluate(&snapshot(1200, &session, &metrics), 2).is_empty());
    }

    #[test]
    fn test_boss_achievements_and_all_bosses() {
        let mut session = SessionStats::default();
        let metrics = Metrics::default();
        let mut book = AchievementBook::new();

        session.boss_patterns_defeated.insert(AttackPattern::Wall);
        let unlocked = book.evaluate(&snapshot(0, &session, &metrics), 0);
        assert_eq!(unlocked, vec![AchievementId::Boss(AttackPattern::Wall)]);
        assert!(!book.is_unlocked(AchievementId::AllBosses));

        session.boss_patterns_defeated.extend(AttackPattern::ALL);
        let unlocked = book.evaluate(&snapshot(0, &session, &metrics), 0);
        assert_eq!(unlocked.len(), 7);
        assert_eq!(unlocked.last(), Some(&AchievementId::AllBosses));
    }

    #[test]
    fn test_session_and_lifetime_rules() {
        let session = SessionStats {
            powerups_collected: 3,
            shield_saved_life: true,
            ..Default::default()
        };
        let metrics = Metrics {
            total_games_played: 100,
            total_score_earned: 50_000,
            ..Default::default()
        };
        let mut book = AchievementBook::new();
        let unlocked = book.evaluate(&snapshot(0, &session, &metrics), 0);
        for id in [
            AchievementId::ShieldSaved,
            AchievementId::Powerups3,
            AchievementId::Games100,
            AchievementId::TotalScore50000,
        ] {
            assert!(unlocked.contains(&id), "{id:?} missing");
        }
    }

    #[test]
    fn test_legacy_flag_entries() {
        let json = r#"{"score_500":true,"boss_wall":{"unlocked":true,"unlockedAt":1700000000000,"name":"Defeat Wall Restriction Boss"},"games_100":false}"#;
        let mut book: AchievementBook = serde_json::from_str(json).unwrap();
        assert!(book.is_unlocked(AchievementId::Score500));
        assert!(book.is_unlocked(AchievementId::Boss(AttackPattern::Wall)));
        assert!(!book.is_unlocked(AchievementId::Games100));
        assert_eq!(book.unlocked_count(), 2);

        assert!(!book.unlock(AchievementId::Score500, 5));
        assert!(book.unlock(AchievementId::Games100, 5));

        let out = serde_json::to_string(&book).unwrap();
        assert!(out.contains(r#""score_500":true"#));
        assert!(out.contains(r#""unlockedAt":5"#));
    }

    #[test]
    fn test_perfect_run() {
        assert!(!is_perfect_run(0));
        assert!(is_perfect_run(300));
        assert!(!is_perfect_run(301));
    }
}
