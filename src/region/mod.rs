//! Exclusion tracking for accepted detections.
//!
//! `RegionMask` is the candidate filter of the pipeline: it keeps the ordered
//! list of rectangles already accepted for one source image and answers
//! whether a new rectangle is still free. Acceptance is greedy and
//! first-come-first-served; a claim is never undone within a pass.

mod rect;

pub use rect::Rect;

/// Ordered list of claimed rectangles for a single source image.
#[derive(Clone, Debug)]
pub struct RegionMask {
    width: u32,
    height: u32,
    tolerance: i32,
    slack: i32,
    accepted: Vec<Rect>,
}

impl RegionMask {
    /// Creates an empty mask for an image of `width x height` pixels.
    ///
    /// `tolerance` is the overlap slack in pixels between accepted regions;
    /// `slack` is how far a rectangle may extend past the image border.
    pub fn new(width: u32, height: u32, tolerance: i32, slack: i32) -> Self {
        Self {
            width,
            height,
            tolerance: tolerance.max(0),
            slack: slack.max(0),
            accepted: Vec::new(),
        }
    }

    /// Returns true when `rect` is well-formed, inside the allowed bounds and
    /// not conflicting with any claimed region.
    pub fn is_free(&self, rect: &Rect) -> bool {
        if rect.is_degenerate() || !rect.within_bounds(self.width, self.height, self.slack) {
            return false;
        }
        !self
            .accepted
            .iter()
            .any(|existing| rect.conflicts_with(existing, self.tolerance))
    }

    /// Marks `rect` as occupied.
    pub fn claim(&mut self, rect: Rect) {
        self.accepted.push(rect);
    }

    /// Claims `rect` if it is free; returns whether it was accepted.
    pub fn try_claim(&mut self, rect: Rect) -> bool {
        if !self.is_free(&rect) {
            return false;
        }
        self.claim(rect);
        true
    }

    /// Rectangles accepted so far, in claim order.
    pub fn accepted(&self) -> &[Rect] {
        &self.accepted
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn tolerance(&self) -> i32 {
        self.tolerance
    }
}
