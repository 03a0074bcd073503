mod comeback;
mod engine;

pub use comeback::{streak_message, ComebackLevel, ComebackStatus, COMEBACK_WINDOW_DAYS};
pub use engine::{
    completion_rate, MissingToday, StreakEngine, StreakSnapshot, StreakStats, StreakWalk,
    DAYS_PER_INSURANCE, WALK_INSURANCE_CAP,
};
