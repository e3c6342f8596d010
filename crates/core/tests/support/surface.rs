use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use smartcal_core::{ExternalSurface, SurfaceBlocked, SurfaceLauncher};
use tokio::time::Instant;

/// What the user does with the next window
#[derive(Debug, Clone, Copy)]
pub enum SurfacePlan {
    /// Popup blocker wins
    Blocked,
    /// User closes the window after this long
    CloseAfter(Duration),
    /// User walks away
    LeaveOpen,
}

pub struct ScriptedSurface {
    closes_at: Option<Instant>,
    closed: AtomicBool,
    force_closed: AtomicBool,
}

impl ScriptedSurface {
    pub fn was_force_closed(&self) -> bool {
        self.force_closed.load(Ordering::SeqCst)
    }
}

impl ExternalSurface for ScriptedSurface {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
            || self.closes_at.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn close(&self) {
        self.force_closed.store(true, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Launcher fake that owns its windows like a real one would.
pub struct ScriptedLauncher {
    plan: Mutex<SurfacePlan>,
    opened: Mutex<Vec<(String, Arc<ScriptedSurface>)>>,
}

impl ScriptedLauncher {
    pub fn new(plan: SurfacePlan) -> Arc<Self> {
        Arc::new(Self { plan: Mutex::new(plan), opened: Mutex::new(Vec::new()) })
    }

    pub fn set_plan(&self, plan: SurfacePlan) {
        *self.plan.lock() = plan;
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn last_surface(&self) -> Option<Arc<ScriptedSurface>> {
        self.opened.lock().last().map(|(_, surface)| surface.clone())
    }

    /// Simulate the user closing the most recent window right now.
    pub fn user_closes_window(&self) {
        if let Some(surface) = self.last_surface() {
            surface.closed.store(true, Ordering::SeqCst);
        }
    }
}

impl SurfaceLauncher for ScriptedLauncher {
    fn open(&self, url: &str) -> Result<Weak<dyn ExternalSurface>, SurfaceBlocked> {
        let closes_at = match *self.plan.lock() {
            SurfacePlan::Blocked => return Err(SurfaceBlocked("popup blocked".into())),
            SurfacePlan::CloseAfter(after) => Some(Instant::now() + after),
            SurfacePlan::LeaveOpen => None,
        };

        let surface = Arc::new(ScriptedSurface {
            closes_at,
            closed: AtomicBool::new(false),
            force_closed: AtomicBool::new(false),
        });
        self.opened.lock().push((url.to_string(), surface.clone()));

        let handle: Arc<dyn ExternalSurface> = surface;
        Ok(Arc::downgrade(&handle))
    }
}
