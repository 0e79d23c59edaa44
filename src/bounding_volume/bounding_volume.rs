/// Trait of bounding volumes accumulated while partitioning primitives.
///
/// Two bounding volumes can always be merged into a bigger one, and the result contains both.
pub trait BoundingVolume {
    /// Checks if this bounding volume contains another one.
    fn contains(&self, _: &Self) -> bool;

    /// Merges this bounding volume with another one. The merge is done in-place.
    fn merge(&mut self, _: &Self);

    /// Merges this bounding volume with another one.
    fn merged(&self, _: &Self) -> Self;
}
