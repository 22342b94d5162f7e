//! Gamification collaborator and XP math.
//!
//! The orchestrator only emits events; XP, badges and streak bookkeeping
//! live behind `GamificationNotifier`. Notification failures are logged
//! and swallowed; they never affect session state. The XP curve helpers
//! are pure and shared with whatever presentation layer renders progress.

use async_trait::async_trait;
use tracing::debug;

/// Receives engagement events. Fire-and-forget from the orchestrator's
/// perspective; implementations must tolerate replays.
#[async_trait]
pub trait GamificationNotifier: Send + Sync {
    async fn on_answer_submitted(&self, user_id: &str);
    async fn on_interview_completed(&self, user_id: &str);
    async fn on_streak_touch(&self, user_id: &str);
}

/// Notifier that only logs, for deployments without gamification.
pub struct NoopNotifier;

#[async_trait]
impl GamificationNotifier for NoopNotifier {
    async fn on_answer_submitted(&self, user_id: &str) {
        debug!(%user_id, "answer submitted");
    }

    async fn on_interview_completed(&self, user_id: &str) {
        debug!(%user_id, "interview completed");
    }

    async fn on_streak_touch(&self, user_id: &str) {
        debug!(%user_id, "streak touched");
    }
}

/// XP required to clear `level` (1-based): `100 * 1.5^(level-1)`.
pub fn xp_for_level(level: u32) -> u64 {
    (100.0 * 1.5f64.powi(level as i32 - 1)).floor() as u64
}

/// Level reached with `xp` total experience points.
pub fn level_from_xp(xp: u64) -> u32 {
    let mut level = 1;
    let mut total = 0u64;
    while total + xp_for_level(level) <= xp {
        total += xp_for_level(level);
        level += 1;
    }
    level
}

/// Progress within the current level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XpProgress {
    pub current: u64,
    pub required: u64,
    pub percentage: f64,
}

pub fn xp_progress(xp: u64) -> XpProgress {
    let level = level_from_xp(xp);
    let spent: u64 = (1..level).map(xp_for_level).sum();
    let current = xp - spent;
    let required = xp_for_level(level);
    XpProgress {
        current,
        required,
        percentage: (current as f64 / required as f64) * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_curve_grows_geometrically() {
        assert_eq!(xp_for_level(1), 100);
        assert_eq!(xp_for_level(2), 150);
        assert_eq!(xp_for_level(3), 225);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(99), 1);
        assert_eq!(level_from_xp(100), 2);
        assert_eq!(level_from_xp(249), 2);
        assert_eq!(level_from_xp(250), 3);
    }

    #[test]
    fn progress_is_relative_to_current_level() {
        let progress = xp_progress(175);
        // Level 2 spans 100..250, so 75 of 150 into it.
        assert_eq!(progress.current, 75);
        assert_eq!(progress.required, 150);
        assert!((progress.percentage - 50.0).abs() < 1e-9);
    }
}
