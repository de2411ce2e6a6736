use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::misc::FloatingPoint;

/// A sample on a curve: its parameter, the arc length from the start of the domain, and the point.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveSample<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    parameter: T,
    length: T,
    point: OPoint<T, D>,
}

impl<T: FloatingPoint, D: DimName> CurveSample<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn new(parameter: T, length: T, point: OPoint<T, D>) -> Self {
        Self {
            parameter,
            length,
            point,
        }
    }

    pub fn parameter(&self) -> T {
        self.parameter
    }

    pub fn length(&self) -> T {
        self.length
    }

    pub fn point(&self) -> &OPoint<T, D> {
        &self.point
    }
}
