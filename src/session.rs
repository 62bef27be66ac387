//! RAII guard for a single-invocation browser session.
//!
//! This module provides [`BrowserSession`], which owns the one browser
//! process an invocation launches and shuts it down when dropped.
//!
//! # Overview
//!
//! Teardown is guaranteed on every exit path:
//! - the pipeline releases explicitly once the artifact is produced,
//! - an early `?` return drops the session,
//! - a panic unwinds through it,
//! - a caller enforcing a deadline closes it through a [`TeardownHandle`]
//!   while the blocking task is still inside a page call.
//!
//! Release is idempotent: the page is taken out of an `Option` and
//! [`PageDriver::close`] itself only tears down once, so the browser is
//! closed exactly once no matter how many of those paths run.
//! Teardown failures are logged and swallowed; they never replace the error
//! that caused the pipeline to exit.
//!
//! # Usage Pattern
//!
//! ```rust,ignore
//! use html2pdf_render::session::BrowserSession;
//!
//! let mut session = BrowserSession::acquire(&launcher)?;
//! if let Some(page) = session.page() {
//!     page.navigate("https://example.com")?;   // early return still closes Chrome
//!     page.wait_until_navigated()?;
//! }
//! session.release();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::browser::{BrowserLauncher, PageDriver};
use crate::error::Result;

/// Owner of one browser process and its page.
///
/// A session belongs to one invocation and is never shared. The only thing
/// that leaves it is a [`TeardownHandle`].
pub struct BrowserSession {
    /// Monotonic ID for log correlation.
    id: u64,

    /// `None` once released.
    page: Option<Arc<dyn PageDriver>>,

    created_at: Instant,
}

impl BrowserSession {
    /// Launch a browser through `launcher` and take ownership of its page.
    ///
    /// # Errors
    ///
    /// Propagates the launcher's
    /// [`RenderServiceError::BrowserLaunch`](crate::RenderServiceError::BrowserLaunch).
    /// Nothing needs releasing in that case.
    pub fn acquire(launcher: &dyn BrowserLauncher) -> Result<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        let started = Instant::now();
        let page = launcher.launch()?;
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);

        log::debug!(
            "Browser session {} acquired in {:?}",
            id,
            started.elapsed()
        );

        Ok(Self {
            id,
            page: Some(Arc::from(page)),
            created_at: Instant::now(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The live page, or `None` after [`release`](Self::release).
    pub fn page(&self) -> Option<&dyn PageDriver> {
        self.page.as_deref()
    }

    /// A handle that can close this session's browser from another thread.
    ///
    /// `None` after [`release`](Self::release).
    pub fn teardown_handle(&self) -> Option<TeardownHandle> {
        self.page.as_ref().map(|page| TeardownHandle {
            session_id: self.id,
            page: Arc::clone(page),
        })
    }

    pub fn is_released(&self) -> bool {
        self.page.is_none()
    }

    /// Time since the browser was launched.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Close the browser. Safe to call more than once.
    pub fn release(&mut self) {
        let Some(page) = self.page.take() else {
            log::trace!("Browser session {} already released", self.id);
            return;
        };

        log::debug!("Closing browser session {}...", self.id);
        close_page(self.id, page.as_ref());
        log::trace!(
            "Browser session {} released after {:?}",
            self.id,
            self.created_at.elapsed()
        );
    }
}

fn close_page(session_id: u64, page: &dyn PageDriver) {
    match page.close() {
        Ok(()) => log::debug!("Browser session {} closed", session_id),
        Err(e) => log::warn!(
            "⚠️ Failed to close browser session {} cleanly (ignored): {}",
            session_id,
            e
        ),
    }
}

/// Closes a session's browser from outside the thread driving it.
///
/// Closing through the handle and releasing the session are the same
/// teardown; whichever runs first does it and the other is a no-op.
#[derive(Clone)]
pub struct TeardownHandle {
    session_id: u64,
    page: Arc<dyn PageDriver>,
}

impl TeardownHandle {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Close the browser now. Blocks until the driver has shut it down.
    pub fn teardown(&self) {
        log::debug!(
            "Tearing down browser session {} from outside",
            self.session_id
        );
        close_page(self.session_id, self.page.as_ref());
    }
}

impl std::fmt::Debug for TeardownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeardownHandle")
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.is_released() {
            log::debug!(
                "Browser session {} dropped without explicit release, closing",
                self.id
            );
        }
        self.release();
    }
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .field("age", &self.age())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
