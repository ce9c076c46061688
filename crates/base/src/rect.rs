use {
    crate::Vec2,
    std::ops::{Div, Sub},
};

/// Axis-aligned rectangle stored as top-left origin plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<T> {
    pub origin: Vec2<T>,
    pub size: Vec2<T>,
}

impl<T: Sub<Output = T> + Div<Output = T> + Copy + From<u8>> Rect<T> {
    /// Build a rectangle from its center point, the layout detection models emit.
    pub fn from_center(center: Vec2<T>, size: Vec2<T>) -> Self {
        let half = size / T::from(2u8);
        Self {
            origin: center - half,
            size,
        }
    }
}
