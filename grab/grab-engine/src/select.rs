//! Best-candidate selection.
//!
//! Priority is the primary key and proximity to the hand breaks ties. The
//! selection is a pure fold over the candidates: showing or hiding
//! highlights is left to the caller.

use nalgebra::Point3;

use crate::attach_point::AttachPointId;

/// A resolved attach point, ready for arbitration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Attach point ID.
    pub id: AttachPointId,
    /// Arbitration priority.
    pub priority: i32,
    /// World attach position at resolution time.
    pub position: Point3<f64>,
}

impl Candidate {
    /// Create a candidate.
    #[must_use]
    pub fn new(id: AttachPointId, priority: i32, position: Point3<f64>) -> Self {
        Self {
            id,
            priority,
            position,
        }
    }

    /// Squared distance from the attach position to `point`.
    #[must_use]
    pub fn distance_squared(&self, point: &Point3<f64>) -> f64 {
        (self.position - point).norm_squared()
    }

    /// Whether this candidate should replace `current` as the best for a
    /// hand at `hand`.
    ///
    /// Equal priority and equal distance keep `current`.
    #[must_use]
    pub fn beats(&self, current: &Self, hand: &Point3<f64>) -> bool {
        if self.priority != current.priority {
            return self.priority > current.priority;
        }
        self.distance_squared(hand) < current.distance_squared(hand)
    }
}

/// Pick the best candidate for a hand at `hand`.
///
/// Returns `None` for an empty input. Exact ties resolve to the candidate
/// seen first, so the result is reproducible for a fixed iteration order.
///
/// # Example
///
/// ```
/// use grab_engine::{select_best, AttachPointId, Candidate};
/// use nalgebra::Point3;
///
/// let hand = Point3::origin();
/// let far_heavy = Candidate::new(AttachPointId(0), 10, Point3::new(100.0, 0.0, 0.0));
/// let near_light = Candidate::new(AttachPointId(1), 1, Point3::new(0.1, 0.0, 0.0));
///
/// let best = select_best([far_heavy, near_light], &hand).unwrap();
/// assert_eq!(best.id, AttachPointId(0));
/// ```
#[must_use]
pub fn select_best<I>(candidates: I, hand: &Point3<f64>) -> Option<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if !candidate.beats(&current, hand) => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn at(id: u64, priority: i32, x: f64) -> Candidate {
        Candidate::new(AttachPointId(id), priority, Point3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_empty() {
        assert!(select_best(Vec::new(), &Point3::origin()).is_none());
    }

    #[test]
    fn test_single() {
        let only = at(7, -4, 2.0);
        assert_eq!(select_best([only], &Point3::origin()), Some(only));
    }

    #[test]
    fn test_equal_priority_prefers_nearer() {
        let a = at(0, 5, 3.0);
        let b = at(1, 5, 1.0);
        assert_eq!(select_best([a, b], &Point3::origin()).unwrap().id, b.id);
        assert_eq!(select_best([b, a], &Point3::origin()).unwrap().id, b.id);
    }

    #[test]
    fn test_priority_beats_distance() {
        let a = at(0, 10, 100.0);
        let b = at(1, 1, 0.1);
        assert_eq!(select_best([a, b], &Point3::origin()).unwrap().id, a.id);
        assert_eq!(select_best([b, a], &Point3::origin()).unwrap().id, a.id);
    }

    #[test]
    fn test_negative_priority() {
        let a = at(0, -1, 0.0);
        let b = at(1, -5, 0.0);
        assert_eq!(select_best([b, a], &Point3::origin()).unwrap().id, a.id);
    }

    #[test]
    fn test_exact_tie_keeps_first_seen() {
        // Mirror images around the hand: same priority, same distance
        let a = at(0, 3, 1.0);
        let b = at(1, 3, -1.0);
        assert_eq!(select_best([a, b], &Point3::origin()).unwrap().id, a.id);
        assert_eq!(select_best([b, a], &Point3::origin()).unwrap().id, b.id);
    }

    #[test]
    fn test_distance_is_measured_from_hand() {
        let a = at(0, 2, 0.0);
        let b = at(1, 2, 5.0);
        let hand = Point3::new(4.0, 0.0, 0.0);
        assert_eq!(select_best([a, b], &hand).unwrap().id, b.id);
        assert_eq!(b.distance_squared(&hand), 1.0);
    }
}
