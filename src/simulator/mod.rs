pub mod melts;
#[cfg(test)]
pub mod mock;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::composition::Composition;
use crate::error::TapatiteError;
use crate::trace::CoolingTrace;

/// Async trait for running one cooling-path simulation (MELTS or mock).
/// Uses boxed future for dyn compatibility.
pub trait Simulator: Send + Sync {
    /// Simulate cooling of `composition`, using `scratch` as the working
    /// directory. The directory exists and belongs to the caller.
    fn simulate<'a>(
        &'a self,
        composition: &'a Composition,
        scratch: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CoolingTrace, TapatiteError>> + Send + 'a>>;
}
