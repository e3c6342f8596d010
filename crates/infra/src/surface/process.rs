//! Browser-process authorization surface
//!
//! Each surface is a dedicated browser process pointed at the consent page.
//! The process exiting is what "the user closed the window" looks like from
//! here, so every launch gets its own throwaway profile directory to keep
//! Chromium-family browsers from handing the URL to an already running
//! instance and exiting immediately.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use smartcal_core::{ExternalSurface, SurfaceBlocked, SurfaceLauncher};
use smartcal_domain::BrowserConfig;
use tracing::{debug, info, warn};
use uuid::Uuid;

const URL_PLACEHOLDER: &str = "{url}";
const PROFILE_PLACEHOLDER: &str = "{profile}";

/// One launched browser window
pub struct ProcessSurface {
    child: Mutex<Child>,
    closed: AtomicBool,
    profile: PathBuf,
}

impl ExternalSurface for ProcessSurface {
    fn is_closed(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return true;
        }

        let exited = match self.child.lock().try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "authorization window exited");
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!(error = %err, "cannot observe authorization window; treating as closed");
                true
            }
        };
        if exited {
            self.closed.store(true, Ordering::SeqCst);
        }
        exited
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut child = self.child.lock();
        if let Err(err) = child.kill() {
            debug!(error = %err, "authorization window already gone");
        }
        // Reap so the process does not linger as a zombie.
        match child.wait() {
            Ok(status) => debug!(%status, "authorization window closed"),
            Err(err) => warn!(error = %err, "could not reap authorization window"),
        }
    }
}

impl Drop for ProcessSurface {
    fn drop(&mut self) {
        if self.profile.exists() {
            if let Err(err) = std::fs::remove_dir_all(&self.profile) {
                debug!(
                    path = %self.profile.display(),
                    error = %err,
                    "could not remove browser profile"
                );
            }
        }
    }
}

/// Launches authorization windows as browser processes and owns them.
pub struct ProcessSurfaceLauncher {
    program: String,
    args: Vec<String>,
    surfaces: Mutex<Vec<Arc<ProcessSurface>>>,
}

impl ProcessSurfaceLauncher {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            surfaces: Mutex::new(Vec::new()),
        }
    }

    /// Number of windows still being tracked.
    pub fn open_surfaces(&self) -> usize {
        self.surfaces.lock().iter().filter(|surface| !surface.is_closed()).count()
    }

    fn command_args(&self, url: &str, profile: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(URL_PLACEHOLDER, url).replace(PROFILE_PLACEHOLDER, profile))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(URL_PLACEHOLDER)) {
            args.push(url.to_string());
        }
        args
    }
}

impl SurfaceLauncher for ProcessSurfaceLauncher {
    fn open(&self, url: &str) -> Result<Weak<dyn ExternalSurface>, SurfaceBlocked> {
        if self.program.trim().is_empty() {
            return Err(SurfaceBlocked("no browser configured".into()));
        }

        let profile = std::env::temp_dir().join(format!("smartcal-auth-{}", Uuid::new_v4()));
        let args = self.command_args(url, &profile.display().to_string());

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| SurfaceBlocked(format!("failed to launch {}: {err}", self.program)))?;

        info!(program = %self.program, pid = child.id(), "authorization window launched");

        let surface = Arc::new(ProcessSurface {
            child: Mutex::new(child),
            closed: AtomicBool::new(false),
            profile,
        });

        let mut surfaces = self.surfaces.lock();
        surfaces.retain(|tracked| !tracked.is_closed());
        surfaces.push(surface.clone());
        drop(surfaces);

        let handle: Arc<dyn ExternalSurface> = surface;
        Ok(Arc::downgrade(&handle))
    }
}

impl Drop for ProcessSurfaceLauncher {
    fn drop(&mut self) {
        for surface in self.surfaces.get_mut().drain(..) {
            surface.close();
        }
    }
}
