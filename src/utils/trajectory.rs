use crate::config::Point;

/// Cubic ease-in-out curve mapping `t` in `[0, 1]` onto `[0, 1]`.
///
/// Accelerates over the first half and decelerates over the second, with
/// `f(0) = 0`, `f(0.5) = 0.5` and `f(1) = 1`.
pub fn cubic_ease_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = 2.0 * t - 2.0;
        0.5 * f * f * f + 1.0
    }
}

/// Number of points synthesized for a travel of `distance` pixels.
///
/// Always at least one, so a zero-length travel still lands on the target.
pub fn step_count(distance: f64, factor: f64) -> usize {
    (distance * factor / 100.0).floor() as usize + 1
}

/// Eased path from `from` to `to`.
///
/// Yields exactly [`step_count`] points. Point `i` (1-based) sits at
/// `cubic_ease_out(i / n)` along the segment, so the last point is `to` and
/// the first is a tiny step away from `from`. The iterator is a pure function
/// of its inputs and can be cloned to restart it.
///
/// `factor` must be positive; callers validate it.
#[derive(Debug, Clone)]
pub struct Trajectory {
    from: Point,
    to: Point,
    steps: usize,
    next: usize,
}

impl Iterator for Trajectory {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.next >= self.steps {
            return None;
        }
        self.next += 1;
        if self.next == self.steps {
            return Some(self.to);
        }
        let t = self.next as f64 / self.steps as f64;
        Some(self.from.lerp(self.to, cubic_ease_out(t)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.steps - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Trajectory {}

/// Build the eased path from `from` to `to` for a cubic `factor`.
pub fn synthesize(from: Point, to: Point, factor: f64) -> Trajectory {
    Trajectory {
        from,
        to,
        steps: step_count(from.distance(to), factor),
        next: 0,
    }
}
