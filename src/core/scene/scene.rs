/// Read-only scene description shared by every render thread.
///
/// Geometry, materials and lights are opaque to the sampling core; only the
/// light transport and photon tracer implementations look inside.
pub trait Scene: Send + Sync {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn std::any::Any;
}
