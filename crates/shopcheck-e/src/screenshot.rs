use shopcheck_engine::{Driver, Resolver};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Save a PNG of the current viewport as `<dir>/<prefix>_<millis>.png`.
///
/// Failure diagnostics must never fail the caller, so errors are logged and
/// reported as `None`.
pub async fn capture_screenshot<D: Driver>(
    resolver: &mut Resolver<D>,
    dir: &Path,
    prefix: &str,
) -> Option<PathBuf> {
    let bytes = match resolver.driver_mut().screenshot().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Screenshot '{}' not captured: {}", prefix, e);
            return None;
        }
    };

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let path = dir.join(format!("{}_{}.png", prefix, millis));

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Cannot create screenshot directory {}: {}", dir.display(), e);
        return None;
    }
    match tokio::fs::write(&path, &bytes).await {
        Ok(()) => {
            info!("Screenshot saved to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Cannot write screenshot {}: {}", path.display(), e);
            None
        }
    }
}
