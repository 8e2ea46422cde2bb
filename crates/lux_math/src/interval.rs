/// A closed parametric range `[min, max]` along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The range a fresh ray may hit in: `[EPSILON, t_max]`.
    pub fn ray(t_max: f32) -> Self {
        Self::new(crate::EPSILON, t_max)
    }

    /// True when the interval contains no value.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}
