/// Errors raised while configuring the builder or registering geometry.
///
/// The partitioning operations themselves never fail: once a bag of primitive references
/// exists, splitting it is a total operation.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// The block allocator needs at least one per-thread pool.
    #[error("the block allocator must be created with at least one thread pool.")]
    ZeroThreads,
    /// A primitive block must be able to hold at least one primitive reference.
    #[error("the capacity of a primitive block must be at least 1.")]
    ZeroBlockCapacity,
    /// A triangle references a vertex that does not exist.
    #[error("the triangle {triangle} of geometry {geom_id} references the vertex {index} but only {num_vertices} vertices exist.")]
    IndexOutOfBounds {
        /// The geometry the triangle was added to.
        geom_id: u32,
        /// The faulty triangle.
        triangle: u32,
        /// The out-of-bounds vertex index.
        index: u32,
        /// The number of vertices of the geometry.
        num_vertices: usize,
    },
}
