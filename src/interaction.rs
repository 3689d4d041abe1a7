//! Hover state per region and the styles/labels the rendering layer draws from it.
//!
//! Styles are derived, never stored: the renderer asks [`style_for`] on every
//! pointer transition, so the base color computed at join time cannot be lost.

use crate::color::Rgb8;
use crate::models::JoinedRegion;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum VisualState {
    #[default]
    Default,
    Hovered,
}

/// Effective drawing parameters for one region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Style {
    pub stroke_width: u32,
    pub stroke_color: Rgb8,
    pub fill_color: Rgb8,
    pub fill_opacity: f64,
}

pub const DEFAULT_STROKE_WIDTH: u32 = 2;
pub const DEFAULT_FILL_OPACITY: f64 = 0.45;
pub const HOVER_STROKE_WIDTH: u32 = 3;
pub const HOVER_FILL_OPACITY: f64 = 0.6;

/// Style of a base color in a given state. Only width and opacity vary.
pub fn style_from_base(base: Rgb8, state: VisualState) -> Style {
    let (stroke_width, fill_opacity) = match state {
        VisualState::Default => (DEFAULT_STROKE_WIDTH, DEFAULT_FILL_OPACITY),
        VisualState::Hovered => (HOVER_STROKE_WIDTH, HOVER_FILL_OPACITY),
    };
    Style {
        stroke_width,
        stroke_color: base,
        fill_color: base,
        fill_opacity,
    }
}

pub fn style_for(region: &JoinedRegion, state: VisualState) -> Style {
    style_from_base(region.base_color, state)
}

/// Tooltip label and detail-panel text for a region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Detail {
    pub label: Option<String>,
    pub body: String,
}

/// Shown in the body when a feature carries no display name.
pub const UNNAMED: &str = "Unnamed region";

pub fn detail_for(region: &JoinedRegion) -> Detail {
    let label = region.name().map(str::to_string);
    let name = label.as_deref().unwrap_or(UNNAMED);

    let body = match (region.record, region.net) {
        (Some(rec), Some(net)) => format!(
            "{}\nInflow: {}\nOutflow: {}\nNet migration: {}",
            name,
            rec.positive,
            rec.negative,
            signed(net)
        ),
        _ => name.to_string(),
    };

    Detail { label, body }
}

/// `+` for zero and gains, `-` for losses.
pub fn signed(n: i64) -> String {
    if n >= 0 {
        format!("+{}", n)
    } else {
        n.to_string()
    }
}

/// Hover state for every region of a session, indexed like the region list.
///
/// Transitions are per region: entering one region leaves all others as they
/// are. All regions start in [`VisualState::Default`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionStates {
    states: Vec<VisualState>,
}

impl InteractionStates {
    pub fn new(region_count: usize) -> Self {
        Self {
            states: vec![VisualState::Default; region_count],
        }
    }

    pub fn state(&self, idx: usize) -> VisualState {
        self.states.get(idx).copied().unwrap_or_default()
    }

    /// Pointer entered region `idx`. Returns `true` if the state changed.
    pub fn pointer_enter(&mut self, idx: usize) -> bool {
        self.set(idx, VisualState::Hovered)
    }

    /// Pointer left region `idx`. Returns `true` if the state changed.
    pub fn pointer_leave(&mut self, idx: usize) -> bool {
        self.set(idx, VisualState::Default)
    }

    /// Move the pointer onto `target` (or off the map for `None`), leaving every
    /// other hovered region. Returns `true` if any state changed.
    pub fn pointer_move(&mut self, target: Option<usize>) -> bool {
        let mut changed = false;
        for idx in 0..self.states.len() {
            if Some(idx) != target && self.states[idx] == VisualState::Hovered {
                changed |= self.pointer_leave(idx);
            }
        }
        if let Some(idx) = target {
            changed |= self.pointer_enter(idx);
        }
        changed
    }

    pub fn hovered(&self) -> impl Iterator<Item = usize> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == VisualState::Hovered)
            .map(|(i, _)| i)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn set(&mut self, idx: usize, next: VisualState) -> bool {
        match self.states.get_mut(idx) {
            Some(s) if *s != next => {
                *s = next;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_independent() {
        let mut st = InteractionStates::new(3);
        assert!(st.pointer_enter(1));
        assert!(!st.pointer_enter(1));
        assert_eq!(st.state(0), VisualState::Default);
        assert_eq!(st.state(1), VisualState::Hovered);
        assert!(st.pointer_enter(2));
        assert_eq!(st.hovered().collect::<Vec<_>>(), vec![1, 2]);
        assert!(st.pointer_leave(1));
        assert_eq!(st.state(1), VisualState::Default);
        assert_eq!(st.state(2), VisualState::Hovered);
    }

    #[test]
    fn pointer_move_leaves_previous_region() {
        let mut st = InteractionStates::new(2);
        st.pointer_move(Some(0));
        assert!(st.pointer_move(Some(1)));
        assert_eq!(st.state(0), VisualState::Default);
        assert_eq!(st.state(1), VisualState::Hovered);
        assert!(st.pointer_move(None));
        assert_eq!(st.hovered().count(), 0);
        assert!(!st.pointer_move(None));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut st = InteractionStates::new(1);
        assert!(!st.pointer_enter(5));
        assert_eq!(st.state(5), VisualState::Default);
    }

    #[test]
    fn signed_net() {
        assert_eq!(signed(0), "+0");
        assert_eq!(signed(12), "+12");
        assert_eq!(signed(-4), "-4");
    }
}
