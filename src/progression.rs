use serde::{Deserialize, Serialize};

use crate::stats::{SessionRecord, Stats};

pub const EXP_PER_STUDY_HOUR: u64 = 100;
pub const CENTURION_STUDY_HOURS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Achievement {
    Centurion,
}

impl Achievement {
    /// Identifier used in the persisted achievement set.
    pub fn id(&self) -> &'static str {
        match self {
            Achievement::Centurion => "centurion",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::Centurion => "Centurion",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::Centurion => "Logged 100 total study hours.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum Rank {
    #[strum(serialize = "Novice Scholar")]
    NoviceScholar,
    #[strum(serialize = "Adept Learner")]
    AdeptLearner,
    #[strum(serialize = "Disciplined Mind")]
    DisciplinedMind,
    #[strum(serialize = "Elite Thinker")]
    EliteThinker,
    #[strum(serialize = "Master Mind")]
    MasterMind,
}

impl Rank {
    pub fn for_level(level: u32) -> Self {
        match level {
            20.. => Rank::MasterMind,
            15..=19 => Rank::EliteThinker,
            10..=14 => Rank::DisciplinedMind,
            5..=9 => Rank::AdeptLearner,
            _ => Rank::NoviceScholar,
        }
    }
}

/// Something worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionEvent {
    LevelUp { level: u32 },
    AchievementUnlocked(Achievement),
}

/// Experience needed to clear `level`: floor(1000 * level^1.5).
pub fn experience_required(level: u32) -> u64 {
    (1000.0 * f64::from(level).powf(1.5)).floor() as u64
}

/// Credit study hours and apply every level-up they pay for.
pub fn award_experience(stats: &mut Stats, study_hours: u32) -> Vec<ProgressionEvent> {
    let gained = u64::from(study_hours) * EXP_PER_STUDY_HOUR;
    stats.current_exp = stats.current_exp.saturating_add(gained);
    tracing::debug!(gained, current_exp = stats.current_exp, "experience awarded");
    apply_level_ups(stats)
}

/// Spend banked experience on every level it covers, leaving
/// `current_exp < experience_required(level)`.
pub fn apply_level_ups(stats: &mut Stats) -> Vec<ProgressionEvent> {
    let mut events = Vec::new();
    let mut needed = experience_required(stats.level);
    while stats.current_exp >= needed && stats.level < u32::MAX {
        stats.current_exp -= needed;
        stats.level += 1;
        tracing::info!(level = stats.level, "level up");
        events.push(ProgressionEvent::LevelUp { level: stats.level });
        needed = experience_required(stats.level);
    }
    events
}

/// Update records and unlock achievements for a finished session.
///
/// Expects the session's hours to already be folded into the lifetime totals.
pub fn record_performance(stats: &mut Stats, record: &SessionRecord) -> Vec<ProgressionEvent> {
    stats.longest_session = stats.longest_session.max(record.total_hours());

    let mut events = Vec::new();
    if stats.total_study_hours >= CENTURION_STUDY_HOURS
        && unlock(stats, Achievement::Centurion)
    {
        events.push(ProgressionEvent::AchievementUnlocked(Achievement::Centurion));
    }
    events
}

fn unlock(stats: &mut Stats, achievement: Achievement) -> bool {
    let added = stats.achievements.insert(achievement.id().to_string());
    if added {
        tracing::info!(achievement = achievement.id(), "achievement unlocked");
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(study: u32, game: u32) -> SessionRecord {
        SessionRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            study_hours: study,
            game_hours: game,
        }
    }

    #[test]
    fn test_experience_required_values() {
        assert_eq!(experience_required(1), 1000);
        assert_eq!(experience_required(2), 2828);
        assert_eq!(experience_required(3), 5196);
        assert_eq!(experience_required(10), 31622);
    }

    #[test]
    fn test_experience_required_strictly_increasing() {
        for level in 1..500 {
            assert!(experience_required(level + 1) > experience_required(level));
        }
    }

    #[test]
    fn test_award_exactly_one_level() {
        let mut stats = Stats::default();
        let events = award_experience(&mut stats, 10);

        assert_eq!(stats.level, 2);
        assert_eq!(stats.current_exp, 0);
        assert_eq!(events, vec![ProgressionEvent::LevelUp { level: 2 }]);
    }

    #[test]
    fn test_award_below_threshold() {
        let mut stats = Stats::default();
        let events = award_experience(&mut stats, 9);

        assert_eq!(stats.level, 1);
        assert_eq!(stats.current_exp, 900);
        assert!(events.is_empty());
    }

    #[test]
    fn test_award_multi_level_jump() {
        let mut stats = Stats::default();
        // 1000 + 2828 + 5196 = 9024 to reach level 4
        let events = award_experience(&mut stats, 91);

        assert_eq!(stats.level, 4);
        assert_eq!(stats.current_exp, 9100 - 9024);
        assert_eq!(
            events,
            vec![
                ProgressionEvent::LevelUp { level: 2 },
                ProgressionEvent::LevelUp { level: 3 },
                ProgressionEvent::LevelUp { level: 4 },
            ]
        );
    }

    #[test]
    fn test_award_never_leaves_exp_above_requirement() {
        let mut stats = Stats::default();
        for hours in [1, 7, 24, 3, 24, 24, 0, 13, 24, 24, 24] {
            award_experience(&mut stats, hours);
            assert!(stats.current_exp < experience_required(stats.level));
        }
    }

    #[test]
    fn test_apply_level_ups_spends_banked_exp() {
        let mut stats = Stats {
            level: 1,
            current_exp: 5000,
            ..Stats::default()
        };
        let events = apply_level_ups(&mut stats);

        // 5000 - 1000 - 2828
        assert_eq!(stats.level, 3);
        assert_eq!(stats.current_exp, 1172);
        assert_eq!(events.len(), 2);
        assert!(apply_level_ups(&mut stats).is_empty());
    }

    #[test]
    fn test_award_saturates_at_counter_limits() {
        let mut stats = Stats {
            level: u32::MAX - 1,
            current_exp: u64::MAX - 50,
            ..Stats::default()
        };
        let events = award_experience(&mut stats, 24);

        assert_eq!(stats.level, u32::MAX);
        assert_eq!(events, vec![ProgressionEvent::LevelUp { level: u32::MAX }]);
        assert_eq!(
            stats.current_exp,
            u64::MAX - experience_required(u32::MAX - 1)
        );
    }

    #[test]
    fn test_longest_session_tracks_maximum() {
        let mut stats = Stats::default();
        record_performance(&mut stats, &record(3, 2));
        assert_eq!(stats.longest_session, 5);
        record_performance(&mut stats, &record(1, 1));
        assert_eq!(stats.longest_session, 5);
        record_performance(&mut stats, &record(6, 2));
        assert_eq!(stats.longest_session, 8);
    }

    #[test]
    fn test_centurion_unlocks_once() {
        let mut stats = Stats::default();

        stats.total_study_hours += 60;
        let events = record_performance(&mut stats, &record(60, 0));
        assert!(events.is_empty());
        assert!(!stats.has_achievement(Achievement::Centurion));

        stats.total_study_hours += 60;
        let events = record_performance(&mut stats, &record(60, 0));
        assert_eq!(
            events,
            vec![ProgressionEvent::AchievementUnlocked(Achievement::Centurion)]
        );
        assert!(stats.has_achievement(Achievement::Centurion));

        stats.total_study_hours += 5;
        let events = record_performance(&mut stats, &record(5, 0));
        assert!(events.is_empty());
        assert_eq!(stats.achievements.len(), 1);
    }

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(Rank::for_level(1), Rank::NoviceScholar);
        assert_eq!(Rank::for_level(4), Rank::NoviceScholar);
        assert_eq!(Rank::for_level(5), Rank::AdeptLearner);
        assert_eq!(Rank::for_level(9), Rank::AdeptLearner);
        assert_eq!(Rank::for_level(10), Rank::DisciplinedMind);
        assert_eq!(Rank::for_level(15), Rank::EliteThinker);
        assert_eq!(Rank::for_level(19), Rank::EliteThinker);
        assert_eq!(Rank::for_level(20), Rank::MasterMind);
        assert_eq!(Rank::for_level(99), Rank::MasterMind);
    }

    #[test]
    fn test_rank_display() {
        assert_eq!(Rank::NoviceScholar.to_string(), "Novice Scholar");
        assert_eq!(Rank::MasterMind.to_string(), "Master Mind");
        assert_eq!(Rank::for_level(12).to_string(), "Disciplined Mind");
    }

    #[test]
    fn test_achievement_ids() {
        assert_eq!(Achievement::Centurion.id(), "centurion");
        assert_eq!(Achievement::Centurion.title(), "Centurion");
    }
}
