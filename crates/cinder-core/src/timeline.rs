//! Color/opacity timeline shared by particles and hulls.
//!
//! A timeline is an ordered list of [`ColorTimelineNode`]s. Each effect
//! instance carries a [`ColorChangeState`] that walks forward through the
//! nodes as the instance ages. Whenever the current node's change interval
//! has elapsed, its rule is applied to every still-visible color:
//!
//! ```text
//! for each color with alpha > 0:
//!     with drop_chance          → alpha = 0
//!     else with replacement_chance → pick a palette entry,
//!                                    take it only if strictly more transparent
//! ```
//!
//! Colors therefore only ever lose opacity over an effect's life.

use crate::color::{is_transparent, Rgba8, ALPHA};
use crate::rng::RandomGenerator;

/// One step of a color timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorTimelineNode {
    /// Lifetime fraction at which this node becomes current.
    pub activate_at_lifetime_fraction: f32,
    /// Colors a vertex/particle may be replaced with; may be empty.
    pub replacement_palette: &'static [Rgba8],
    /// Chance per application that a color is dropped to transparent.
    pub drop_chance: f32,
    /// Chance per application that a color is replaced from the palette.
    pub replacement_chance: f32,
    /// Minimum time between two applications of this node.
    pub color_change_interval_ms: u32,
}

/// Progress of one instance through a timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorChangeState {
    /// Index of the current node; `>= timeline.len()` once finished.
    pub last_node_index: usize,
    /// Timestamp of the last application.
    pub last_color_change_at: i64,
}

impl ColorChangeState {
    /// Fresh state for an instance spawned at `spawn_time`.
    pub fn new(spawn_time: i64) -> Self {
        Self {
            last_node_index: 0,
            last_color_change_at: spawn_time,
        }
    }

    /// Whether the state machine has run past its last node.
    pub fn is_finished(&self, timeline: &[ColorTimelineNode]) -> bool {
        self.last_node_index >= timeline.len()
    }
}

/// Advance `state` to `current_time` and apply the current node to `colors`.
///
/// Returns whether any color changed. Calling this again with the same
/// `current_time` is a no-op.
pub fn advance_color_timeline(
    timeline: &[ColorTimelineNode],
    state: &mut ColorChangeState,
    colors: &mut [Rgba8],
    current_time: i64,
    lifetime_fraction: f32,
    rng: &mut RandomGenerator,
) -> bool {
    advance_color_timeline_with(timeline, state, colors, current_time, lifetime_fraction, rng, |_| {})
}

/// Like [`advance_color_timeline`], but reports the index of every color
/// the current node drops or replaces to `on_change`.
pub fn advance_color_timeline_with(
    timeline: &[ColorTimelineNode],
    state: &mut ColorChangeState,
    colors: &mut [Rgba8],
    current_time: i64,
    lifetime_fraction: f32,
    rng: &mut RandomGenerator,
    mut on_change: impl FnMut(usize),
) -> bool {
    if state.is_finished(timeline) {
        return false;
    }

    while state.last_node_index + 1 < timeline.len()
        && timeline[state.last_node_index + 1].activate_at_lifetime_fraction <= lifetime_fraction
    {
        state.last_node_index += 1;
    }

    let node = &timeline[state.last_node_index];
    if node.activate_at_lifetime_fraction > lifetime_fraction {
        return false;
    }
    if current_time <= state.last_color_change_at {
        return false;
    }
    if current_time - state.last_color_change_at < i64::from(node.color_change_interval_ms) {
        return false;
    }

    let changed = apply_node(node, colors, rng, &mut on_change);
    state.last_color_change_at = current_time;
    if lifetime_fraction >= 1.0 && state.last_node_index + 1 == timeline.len() {
        state.last_node_index = timeline.len();
    }
    changed
}

fn apply_node(
    node: &ColorTimelineNode,
    colors: &mut [Rgba8],
    rng: &mut RandomGenerator,
    on_change: &mut impl FnMut(usize),
) -> bool {
    let palette = node.replacement_palette;
    let mut changed = false;
    for (i, color) in colors.iter_mut().enumerate() {
        if is_transparent(color) {
            continue;
        }
        if rng.try_with_chance(node.drop_chance) {
            color[ALPHA] = 0;
            on_change(i);
            changed = true;
        } else if !palette.is_empty() && rng.try_with_chance(node.replacement_chance) {
            let candidate = palette[rng.next_bounded(palette.len() as u32) as usize];
            if candidate[ALPHA] < color[ALPHA] {
                *color = candidate;
                on_change(i);
                changed = true;
            }
        }
    }
    changed
}
