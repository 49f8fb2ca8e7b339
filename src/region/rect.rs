//! Axis-aligned rectangles in source-image pixel space.

/// Axis-aligned box given by its top-left corner and size.
///
/// Coordinates are signed so that padded rectangles may hang past the image
/// border; `right()` and `bottom()` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// True when either side is zero or negative.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Grows the rectangle by `margin` on every side (shifts the corner by `-margin`).
    pub fn padded(&self, margin: i32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }

    /// Returns the overlapping area of two rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Shrinks every edge inward by `amount`, never past the centre line.
    ///
    /// Each axis keeps at least one pixel so that a shrunk rectangle is never
    /// empty.
    pub fn shrunk(&self, amount: i32) -> Rect {
        let amount = amount.max(0);
        let dx = amount.min((self.width - 1).max(0) / 2);
        let dy = amount.min((self.height - 1).max(0) / 2);
        Rect::new(
            self.x + dx,
            self.y + dy,
            self.width - 2 * dx,
            self.height - 2 * dy,
        )
    }

    /// Tests whether `self` overlaps `accepted` beyond `tolerance` pixels of slack.
    ///
    /// `accepted` is shrunk by `tolerance` on each edge before an ordinary
    /// intersection test, so neighbouring detections may share a border strip
    /// up to `tolerance` pixels wide.
    pub fn conflicts_with(&self, accepted: &Rect, tolerance: i32) -> bool {
        if self.is_degenerate() || accepted.is_degenerate() {
            return false;
        }
        let core = accepted.shrunk(tolerance);
        self.left() < core.right()
            && self.right() > core.left()
            && self.top() < core.bottom()
            && self.bottom() > core.top()
    }

    /// True when the rectangle lies inside `width x height` grown by `slack`.
    pub fn within_bounds(&self, width: u32, height: u32, slack: i32) -> bool {
        let slack = slack.max(0);
        let max_x = i32::try_from(width).unwrap_or(i32::MAX).saturating_add(slack);
        let max_y = i32::try_from(height).unwrap_or(i32::MAX).saturating_add(slack);
        self.left() >= -slack && self.top() >= -slack && self.right() <= max_x && self.bottom() <= max_y
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn padded_shifts_and_grows_symmetrically() {
        let rect = Rect::new(10, 20, 30, 40).padded(5);
        assert_eq!(rect, Rect::new(5, 15, 40, 50));
    }

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(a.intersection(&b).is_none());
        let c = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&c), Some(Rect::new(5, 5, 5, 5)));
    }

    #[test]
    fn shrunk_keeps_centre_pixel() {
        let rect = Rect::new(0, 0, 11, 4).shrunk(30);
        assert_eq!(rect, Rect::new(5, 1, 1, 2));
    }

    #[test]
    fn conflicts_respect_tolerance_strip() {
        let accepted = Rect::new(100, 100, 100, 100);
        // Shares a 20 px strip on the left edge: inside the 30 px tolerance.
        assert!(!Rect::new(20, 100, 100, 100).conflicts_with(&accepted, 30));
        // Shares a 40 px strip: beyond tolerance.
        assert!(Rect::new(40, 100, 100, 100).conflicts_with(&accepted, 30));
        // Fully contained small box always conflicts.
        assert!(Rect::new(140, 140, 5, 5).conflicts_with(&accepted, 30));
    }

    #[test]
    fn bounds_check_allows_slack() {
        assert!(Rect::new(-5, -5, 50, 50).within_bounds(40, 40, 10));
        assert!(!Rect::new(-5, -5, 50, 50).within_bounds(40, 40, 0));
        assert!(!Rect::new(-11, 0, 10, 10).within_bounds(40, 40, 10));
    }
}
