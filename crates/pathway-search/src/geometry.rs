//! Positions and cost models.

/// A point in the editor plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite (not NaN or infinite).
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Straight-line distance to `other`, in `f64` so that any two finite
    /// positions have a finite distance.
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Cost evaluation between two positions.
///
/// `cost` is the exact cost of traversing an edge; `estimate` is the search
/// heuristic towards the goal. A* only returns optimal paths when `estimate`
/// never exceeds the true remaining cost.
pub trait CostModel: Send + Sync {
    /// Exact cost of moving from `from` to `to` along an edge.
    fn cost(&self, from: Position, to: Position) -> f64;

    /// Heuristic estimate of the remaining cost from `from` to `goal`.
    fn estimate(&self, from: Position, goal: Position) -> f64 {
        self.cost(from, goal)
    }
}

/// Euclidean distance. Symmetric, non-negative, and satisfies the triangle
/// inequality, so it is admissible and consistent as its own heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl CostModel for Euclidean {
    fn cost(&self, from: Position, to: Position) -> f64 {
        from.distance(to)
    }
}
