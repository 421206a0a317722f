//! Scene sequence controller.

use serde::{Deserialize, Serialize};

/// Minimum intersection ratio for a panel to count as in view.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// The fixed panels, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    Hero,
    Timer,
    Gallery,
    Reasons,
    Reveal,
}

impl Scene {
    /// Every panel in display order.
    pub const ALL: [Self; 5] = [
        Self::Hero,
        Self::Timer,
        Self::Gallery,
        Self::Reasons,
        Self::Reveal,
    ];

    /// Panel at `index`, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this panel in the sequence.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Hero => 0,
            Self::Timer => 1,
            Self::Gallery => 2,
            Self::Reasons => 3,
            Self::Reveal => 4,
        }
    }

    /// HTML `id` of the panel, used as the scroll anchor.
    #[must_use]
    pub const fn anchor(self) -> &'static str {
        match self {
            Self::Hero => "scene-hero",
            Self::Timer => "scene-timer",
            Self::Gallery => "scene-gallery",
            Self::Reasons => "scene-reasons",
            Self::Reveal => "scene-reveal",
        }
    }

    /// Label shown in the progress navigation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hero => "البداية",
            Self::Timer => "الوقت",
            Self::Gallery => "الذكريات",
            Self::Reasons => "الأسباب",
            Self::Reveal => "المفاجأة",
        }
    }
}

/// One visibility report from the page: panel index and intersection ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub index: usize,
    pub ratio: f64,
}

/// Tracks which panel is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneSequence {
    current: usize,
}

impl SceneSequence {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: 0 }
    }

    /// Resume at a stored index, clamped into range.
    #[must_use]
    pub fn resume(index: usize) -> Self {
        Self {
            current: index.min(Scene::ALL.len() - 1),
        }
    }

    #[must_use]
    pub fn current(&self) -> Scene {
        Scene::from_index(self.current).unwrap_or(Scene::Hero)
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// Apply a batch of visibility reports.
    ///
    /// The most visible panel at or above [`VISIBILITY_THRESHOLD`] becomes
    /// current; ties go to the earlier panel. Returns the new current panel
    /// if it changed.
    pub fn observe(&mut self, entries: &[Visibility]) -> Option<Scene> {
        let best = entries
            .iter()
            .filter(|e| e.index < Scene::ALL.len() && e.ratio >= VISIBILITY_THRESHOLD)
            .max_by(|a, b| a.ratio.total_cmp(&b.ratio).then(b.index.cmp(&a.index)))?;

        if best.index == self.current {
            return None;
        }
        self.current = best.index;
        Scene::from_index(self.current)
    }

    /// Jump to panel `n`. Out-of-range requests leave the sequence unchanged.
    pub fn navigate(&mut self, n: usize) -> Option<Scene> {
        let scene = Scene::from_index(n)?;
        self.current = n;
        Some(scene)
    }

    /// The panel after the current one, if any.
    #[must_use]
    pub fn next(&self) -> Option<Scene> {
        Scene::from_index(self.current + 1)
    }
}
