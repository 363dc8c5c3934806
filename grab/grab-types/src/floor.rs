//! Floor height access.
//!
//! The floor height is written by a calibration routine and read by every
//! grab controller. Readers go through [`FloorHeight`] and poll it; there is
//! no change notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read-only accessor for the current floor height (world Y).
pub trait FloorHeight {
    /// Current floor height.
    fn floor_height(&self) -> f64;

    /// Whether `height` clears the floor by at least `margin`.
    fn is_above(&self, height: f64, margin: f64) -> bool {
        is_above_floor(height, self.floor_height(), margin)
    }
}

/// `height >= floor + margin`.
///
/// Monotonic in `floor`: raising the floor can only turn `true` into
/// `false`.
#[must_use]
pub fn is_above_floor(height: f64, floor: f64, margin: f64) -> bool {
    height >= floor + margin
}

impl FloorHeight for f64 {
    fn floor_height(&self) -> f64 {
        *self
    }
}

impl FloorHeight for fn() -> f64 {
    fn floor_height(&self) -> f64 {
        self()
    }
}

impl<T: FloorHeight + ?Sized> FloorHeight for Arc<T> {
    fn floor_height(&self) -> f64 {
        (**self).floor_height()
    }
}

/// Floor height and clearance margin captured for one evaluation pass.
///
/// Sampled once per tick so that every eligibility check in that tick agrees,
/// and discarded afterwards so a recalibrated floor is picked up next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorGate {
    /// Floor height at sampling time.
    pub floor: f64,
    /// Required clearance above the floor.
    pub margin: f64,
}

impl FloorGate {
    /// Gate with an explicit floor height.
    #[must_use]
    pub const fn new(floor: f64, margin: f64) -> Self {
        Self { floor, margin }
    }

    /// Read the provider once and capture the result.
    #[must_use]
    pub fn sample<P: FloorHeight + ?Sized>(provider: &P, margin: f64) -> Self {
        Self {
            floor: provider.floor_height(),
            margin,
        }
    }

    /// Whether `height` clears the floor.
    #[must_use]
    pub fn admits(&self, height: f64) -> bool {
        is_above_floor(height, self.floor, self.margin)
    }
}

/// Shared, cheaply clonable floor height cell.
///
/// All clones observe the same value. The calibrator holds one clone and
/// writes it; controllers hold others and only read.
///
/// # Example
///
/// ```
/// use grab_types::{FloorHeight, SharedFloorHeight};
///
/// let floor = SharedFloorHeight::new(0.0);
/// let reader = floor.clone();
///
/// floor.set(-0.35);
/// assert_eq!(reader.floor_height(), -0.35);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedFloorHeight {
    bits: Arc<AtomicU64>,
}

impl SharedFloorHeight {
    /// Create a cell holding `height`.
    #[must_use]
    pub fn new(height: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(height.to_bits())),
        }
    }

    /// Overwrite the floor height.
    pub fn set(&self, height: f64) {
        self.bits.store(height.to_bits(), Ordering::Release);
    }

    /// Read the floor height.
    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl FloorHeight for SharedFloorHeight {
    fn floor_height(&self) -> f64 {
        self.get()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_floor_clones_observe_writes() {
        let floor = SharedFloorHeight::new(0.0);
        let reader = floor.clone();
        assert_eq!(reader.floor_height(), 0.0);

        floor.set(1.5);
        assert_eq!(reader.floor_height(), 1.5);
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(SharedFloorHeight::default().get(), 0.0);
    }

    #[test]
    fn test_constant_and_fn_providers() {
        assert_eq!(0.25_f64.floor_height(), 0.25);

        fn sunken_floor() -> f64 {
            -0.5
        }
        let provider: fn() -> f64 = sunken_floor;
        assert_eq!(provider.floor_height(), -0.5);

        let shared: Arc<dyn FloorHeight> = Arc::new(2.0_f64);
        assert_eq!(shared.floor_height(), 2.0);
    }

    #[test]
    fn test_is_above_margin() {
        let floor = 0.0_f64;
        assert!(floor.is_above(0.02, 0.02));
        assert!(!floor.is_above(0.019, 0.02));
    }

    #[test]
    fn test_gate_samples_once() {
        let floor = SharedFloorHeight::new(0.0);
        let gate = FloorGate::sample(&floor, 0.02);

        floor.set(10.0);
        assert!(gate.admits(0.5));
        assert!(!FloorGate::sample(&floor, 0.02).admits(0.5));
    }

    #[test]
    fn test_is_above_floor_monotonic() {
        let height = 1.0;
        let mut was_above = true;
        for step in 0..40 {
            let floor = -1.0 + f64::from(step) * 0.1;
            let above = is_above_floor(height, floor, 0.02);
            assert!(was_above || !above, "eligibility regained at floor {floor}");
            was_above = above;
        }
        assert!(!was_above);
    }
}
