use crate::core::photongi::CacheSnapshot;
use crate::core::sampler::*;
use crate::core::scene::Scene;

/// Read-only inputs of one traced path.
pub struct TraceContext<'a> {
    pub scene: &'a dyn Scene,
    pub photon_gi: Option<&'a CacheSnapshot>,
    pub thread_index: usize,
}

/// Turns primary samples into radiance. Implementations own the scene
/// intersection and shading code and draw every random number from the
/// sampler they are given.
pub trait LightTransport: Send + Sync {
    /// Number of sample dimensions of an eye path, including the two film
    /// dimensions at index 0 and 1.
    fn eye_sample_size(&self) -> usize;

    /// Number of sample dimensions of a light path. 0 when light paths are
    /// not supported.
    fn light_sample_size(&self) -> usize {
        return 0;
    }

    /// Traces the path through `result.film_x`, `result.film_y` and fills the
    /// radiance groups and AOVs of `result`.
    fn trace_eye_path(
        &self,
        ctx: &TraceContext,
        sampler: &mut dyn Sampler,
        result: &mut SampleResult,
    );

    /// Traces a path from a light and pushes one screen normalized result per
    /// camera connection.
    fn trace_light_path(
        &self,
        _ctx: &TraceContext,
        _sampler: &mut dyn Sampler,
        _results: &mut Vec<SampleResult>,
    ) {
    }
}
