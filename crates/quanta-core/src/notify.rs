//! Notification planning.
//!
//! Maps domain [`Event`]s and per-user rollups to [`Nudge`]s. Planning is
//! pure; delivering a nudge over its channel is somebody else's job.

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::habit::Channel;
use crate::rollup::UserProgress;
use crate::storage::NotificationsConfig;

/// Minutes to wait before a recovery nudge goes out.
pub const STREAK_RECOVERY_DELAY_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeKind {
    FirstWeekMilestone,
    LevelUp,
    StreakRecovery,
    ComeBackHero,
    WeMissYou,
    ComebackSpecial,
    BadgeUnlock,
}

impl NudgeKind {
    pub fn subject(&self) -> &'static str {
        match self {
            NudgeKind::FirstWeekMilestone => "🔥 7 Days Strong - You're On Fire!",
            NudgeKind::LevelUp => "⚡ LEVEL UP! You've Unlocked New Powers!",
            NudgeKind::StreakRecovery => "💪 Every Hero Has Setbacks - Let's Bounce Back!",
            NudgeKind::ComeBackHero => "🌟 Your Quests are Waiting for You!",
            NudgeKind::WeMissYou => "💔 We Miss Our Hero - Come Back to Your Journey!",
            NudgeKind::ComebackSpecial => "🎁 Special Powers Await - Welcome Back, Hero!",
            NudgeKind::BadgeUnlock => "🏆 Achievement Unlocked - You Earned a Badge!",
        }
    }

    /// Re-engagement nudge for exactly this many idle days.
    pub fn for_days_inactive(days: u32) -> Option<Self> {
        match days {
            3 => Some(NudgeKind::ComeBackHero),
            7 => Some(NudgeKind::WeMissYou),
            14 => Some(NudgeKind::ComebackSpecial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "streak_7")]
    Streak7,
    #[serde(rename = "streak_30")]
    Streak30,
    #[serde(rename = "comeback")]
    Comeback,
}

impl Badge {
    pub fn key(&self) -> &'static str {
        match self {
            Badge::Streak7 => "streak_7",
            Badge::Streak30 => "streak_30",
            Badge::Comeback => "comeback",
        }
    }

    pub fn for_streak(streak: u32) -> Option<Self> {
        match streak {
            7 => Some(Badge::Streak7),
            30 => Some(Badge::Streak30),
            _ => None,
        }
    }
}

/// A message to send, not yet sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nudge {
    pub kind: NudgeKind,
    pub habit_id: Option<String>,
    pub channel: Channel,
    pub subject: String,
    pub delay_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
}

pub struct NotificationPlanner {
    config: NotificationsConfig,
}

impl NotificationPlanner {
    pub fn new(config: NotificationsConfig) -> Self {
        Self { config }
    }

    fn nudge(&self, kind: NudgeKind, habit_id: Option<&str>) -> Nudge {
        Nudge {
            kind,
            habit_id: habit_id.map(str::to_string),
            channel: self.config.channel,
            subject: kind.subject().to_string(),
            delay_minutes: 0,
            badge: None,
        }
    }

    fn badge(&self, badge: Badge, habit_id: &str) -> Nudge {
        Nudge {
            badge: Some(badge),
            ..self.nudge(NudgeKind::BadgeUnlock, Some(habit_id))
        }
    }

    /// Nudges triggered by a batch of events, in event order.
    pub fn plan_for_events(&self, events: &[Event]) -> Vec<Nudge> {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut nudges = Vec::new();
        for event in events {
            match event {
                Event::StreakMilestone {
                    habit_id, streak, ..
                } => {
                    let kind = if *streak == 7 {
                        NudgeKind::FirstWeekMilestone
                    } else {
                        NudgeKind::LevelUp
                    };
                    nudges.push(self.nudge(kind, Some(habit_id)));
                    if let Some(badge) = Badge::for_streak(*streak) {
                        nudges.push(self.badge(badge, habit_id));
                    }
                }
                Event::StreakBroken {
                    habit_id,
                    previous_streak,
                    ..
                } if *previous_streak >= self.config.streak_broken_threshold => {
                    nudges.push(Nudge {
                        delay_minutes: STREAK_RECOVERY_DELAY_MINUTES,
                        ..self.nudge(NudgeKind::StreakRecovery, Some(habit_id))
                    });
                }
                Event::ComebackMade { habit_id, .. } => {
                    nudges.push(self.badge(Badge::Comeback, habit_id));
                }
                _ => {}
            }
        }
        nudges
    }

    pub fn plan_reengagement(&self, days_inactive: u32) -> Option<Nudge> {
        if !self.config.enabled {
            return None;
        }
        NudgeKind::for_days_inactive(days_inactive).map(|kind| self.nudge(kind, None))
    }

    /// Re-engagement for a user, keyed on days since their newest check-in.
    pub fn plan_for_user(&self, progress: &UserProgress) -> Vec<Nudge> {
        progress
            .days_inactive()
            .and_then(|days| self.plan_reengagement(days))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn planner() -> NotificationPlanner {
        NotificationPlanner::new(NotificationsConfig::default())
    }

    fn milestone(streak: u32) -> Event {
        Event::StreakMilestone {
            habit_id: "h1".into(),
            streak,
            at: Utc::now(),
        }
    }

    fn broken(previous_streak: u32) -> Event {
        Event::StreakBroken {
            habit_id: "h1".into(),
            previous_streak,
            at: Utc::now(),
        }
    }

    #[test]
    fn first_week_gets_milestone_and_badge() {
        let nudges = planner().plan_for_events(&[milestone(7)]);
        assert_eq!(nudges.len(), 2);
        assert_eq!(nudges[0].kind, NudgeKind::FirstWeekMilestone);
        assert_eq!(nudges[0].subject, "🔥 7 Days Strong - You're On Fire!");
        assert_eq!(nudges[1].badge, Some(Badge::Streak7));
    }

    #[test]
    fn later_milestones_level_up() {
        for streak in [14, 21, 60, 100] {
            let nudges = planner().plan_for_events(&[milestone(streak)]);
            assert_eq!(nudges.len(), 1, "streak {streak}");
            assert_eq!(nudges[0].kind, NudgeKind::LevelUp);
        }
        let thirty = planner().plan_for_events(&[milestone(30)]);
        assert_eq!(thirty[1].badge.map(|b| b.key()), Some("streak_30"));
    }

    #[test]
    fn short_broken_streak_is_ignored() {
        assert!(planner().plan_for_events(&[broken(6)]).is_empty());
        let nudges = planner().plan_for_events(&[broken(7)]);
        assert_eq!(nudges[0].kind, NudgeKind::StreakRecovery);
        assert_eq!(nudges[0].delay_minutes, 1440);
    }

    #[test]
    fn reengagement_on_exact_days() {
        let p = planner();
        assert_eq!(p.plan_reengagement(3).unwrap().kind, NudgeKind::ComeBackHero);
        assert_eq!(p.plan_reengagement(7).unwrap().kind, NudgeKind::WeMissYou);
        assert_eq!(p.plan_reengagement(14).unwrap().kind, NudgeKind::ComebackSpecial);
        assert!(p.plan_reengagement(4).is_none());
        assert!(p.plan_reengagement(0).is_none());
    }

    #[test]
    fn disabled_plans_nothing() {
        let p = NotificationPlanner::new(NotificationsConfig {
            enabled: false,
            ..NotificationsConfig::default()
        });
        assert!(p.plan_for_events(&[milestone(7)]).is_empty());
        assert!(p.plan_reengagement(3).is_none());
    }

    #[test]
    fn user_without_checkins_gets_nothing() {
        let progress = UserProgress::build(
            "u1",
            "Lee",
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            Vec::new(),
        );
        assert!(planner().plan_for_user(&progress).is_empty());
    }

    #[test]
    fn nudges_use_configured_channel() {
        let p = NotificationPlanner::new(NotificationsConfig {
            channel: Channel::Telegram,
            ..NotificationsConfig::default()
        });
        let nudges = p.plan_for_events(&[milestone(14)]);
        assert_eq!(nudges[0].channel, Channel::Telegram);
    }
}
