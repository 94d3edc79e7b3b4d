//! Frame step clamping shared by every simulation engine.

/// Shortest simulated step, in milliseconds.
pub const MIN_STEP_MS: i64 = 1;
/// Longest simulated step, in milliseconds.
pub const MAX_STEP_MS: i64 = 33;

/// Seconds to simulate between `last` and `now`, clamped to
/// `[MIN_STEP_MS, MAX_STEP_MS]` so a stall never blows up velocities.
pub fn clamped_step_seconds(last: i64, now: i64) -> f32 {
    now.saturating_sub(last).clamp(MIN_STEP_MS, MAX_STEP_MS) as f32 * 0.001
}
