use std::path::{Path, PathBuf};

use crate::composition::Composition;
use crate::pipeline::WorkerId;

/// Working directory owned by one worker for the duration of one task.
#[derive(Debug)]
pub struct Scratch {
    path: PathBuf,
}

impl Scratch {
    /// Create `<root>/out<worker>_<Kv>/`
    pub async fn create(
        root: &Path,
        worker: WorkerId,
        composition: &Composition,
    ) -> Result<Self, std::io::Error> {
        let path = root.join(format!("out{worker}_{:.0}", composition.kv()));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything the simulator left in it
    pub async fn remove(self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            tracing::warn!("failed to remove scratch {}: {e}", self.path.display());
        }
    }
}
