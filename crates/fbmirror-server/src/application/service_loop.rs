//! ServiceLoop: alternates transport event processing with frame diffing.
//!
//! # One cycle (for beginners)
//!
//! ```text
//!            ┌──────────────── no viewer connected ────────────────┐
//!            │  process_events(100 ms)                             │
//!            └─────────────────────────────────────────────────────┘
//!            ┌──────────────── at least one viewer ────────────────┐
//!            │  process_events(frame budget: 330 ms or 50 ms)      │
//!            │      └─ callbacks: auth / key / pointer / disconnect│
//!            │  diff_and_transcode → publish dirty rect            │
//!            │  if something changed: process_events(10 ms)        │
//!            └─────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on one thread.  The only place the loop waits is inside
//! the transport's `process_events`, and that is also where viewer input is
//! delivered.  A held key asks for a refresh from inside its callback; the
//! callback diffs through [`Mirror::refresh`] and publishes through the
//! publisher the transport lends it.
//!
//! The loop exits when the shared `running` flag is cleared.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fbmirror_core::{
    ClientId, DirtyRect, FormatError, FrameDiffer, KeyOutcome, PointerOutcome, RemoteBuffer,
    ShadowBuffer,
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::session::SessionHandler;
use crate::infrastructure::framebuffer::DisplaySource;
use crate::infrastructure::transport::{
    AuthVerdict, FramePublisher, RemoteDisplayTransport, SessionCallbacks, TransportError,
};

/// Event budget while nobody is connected.
pub const IDLE_BUDGET: Duration = Duration::from_millis(100);

/// Event budget right after a changed frame was published.
pub const FLUSH_BUDGET: Duration = Duration::from_millis(10);

/// How often the frame rate is logged.
pub const FPS_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("frame diff failed: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ── Mirror ────────────────────────────────────────────────────────────────────

/// A display source together with the differ and the two buffers it keeps.
#[derive(Debug)]
pub struct Mirror<S> {
    source: S,
    differ: FrameDiffer,
    shadow: ShadowBuffer,
    remote: RemoteBuffer,
}

impl<S: DisplaySource> Mirror<S> {
    /// Selects a transcoding strategy for `source`'s geometry.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Unsupported`] if no strategy handles the
    /// surface's depth and rotation.
    pub fn new(source: S) -> Result<Self, FormatError> {
        let differ = FrameDiffer::new(*source.geometry())?;
        info!(
            "mirroring {}x{} as {}x{} using the {} strategy",
            differ.geometry().width,
            differ.geometry().height,
            differ.geometry().remote_width(),
            differ.geometry().remote_height(),
            differ.strategy_name()
        );
        Ok(Self {
            shadow: differ.new_shadow(),
            remote: differ.new_remote(),
            differ,
            source,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn remote(&self) -> &RemoteBuffer {
        &self.remote
    }

    /// Diffs the current frame and publishes the dirty rectangle, if any.
    ///
    /// The padded rectangle is clipped to the remote surface before it is
    /// published and returned.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::LengthMismatch`] if the source's frame does
    /// not match its reported geometry.
    pub fn refresh(&mut self, publisher: &mut dyn FramePublisher) -> Result<DirtyRect, FormatError> {
        let geometry = self.differ.geometry();
        let rect = self
            .differ
            .diff_and_transcode(self.source.frame(), &mut self.shadow, &mut self.remote)?
            .clipped(geometry.remote_width(), geometry.remote_height());
        if !rect.is_empty() {
            trace!("dirty {rect:?}");
            publisher.publish(&self.remote, rect);
        }
        Ok(rect)
    }

    /// Brings the remote buffer up to date and publishes all of it.
    ///
    /// # Errors
    ///
    /// As for [`Mirror::refresh`].
    pub fn publish_full(&mut self, publisher: &mut dyn FramePublisher) -> Result<(), FormatError> {
        self.differ
            .diff_and_transcode(self.source.frame(), &mut self.shadow, &mut self.remote)?;
        let geometry = self.differ.geometry();
        publisher.publish(
            &self.remote,
            DirtyRect::full(geometry.remote_width(), geometry.remote_height()),
        );
        Ok(())
    }
}

// ── FPS accounting ────────────────────────────────────────────────────────────

/// Counts published frames and reports a rate once per period.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    period: Duration,
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            window_start: now,
            frames: 0,
        }
    }

    /// Counts one frame.  Returns the rate when a period has elapsed.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.period {
            return None;
        }
        let fps = f64::from(self.frames) / elapsed.as_secs_f64();
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }
}

// ── Callback dispatch ─────────────────────────────────────────────────────────

/// Routes transport callbacks to the session handler and, for held keys,
/// back into the mirror.
struct Dispatch<'a, S> {
    session: &'a mut SessionHandler,
    mirror: &'a mut Mirror<S>,
}

impl<S: DisplaySource> SessionCallbacks for Dispatch<'_, S> {
    fn on_authenticate(
        &mut self,
        client: ClientId,
        verifies: &mut dyn FnMut(&str) -> bool,
    ) -> AuthVerdict {
        self.session.authenticate(client, verifies)
    }

    fn on_key(&mut self, client: ClientId, symbol: u32, down: bool, frame: &mut dyn FramePublisher) {
        let outcome = self.session.key(client, symbol, down, Instant::now());
        trace!("key {symbol:#x} down={down} from {client}: {outcome:?}");
        if outcome.wants_refresh() {
            if let Err(e) = self.mirror.refresh(frame) {
                warn!("refresh during held key failed: {e}");
            }
        }
        if let KeyOutcome::Gesture { gesture, .. } = outcome {
            debug!("client {client} played {gesture:?}");
        }
    }

    fn on_pointer(&mut self, client: ClientId, button_mask: u8, x: i32, y: i32) {
        let outcome = self.session.pointer(client, button_mask, x, y);
        if let PointerOutcome::Dropped(reason) = outcome {
            trace!("pointer from {client} dropped: {reason:?}");
        }
    }

    fn on_disconnect(&mut self, client: ClientId) {
        self.session.disconnect(client);
    }
}

// ── ServiceLoop ───────────────────────────────────────────────────────────────

/// What one [`ServiceLoop::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nobody connected; only events were processed.
    Idle,
    /// A diff ran and produced this rectangle (possibly empty).
    Diffed(DirtyRect),
}

#[derive(Debug)]
pub struct ServiceLoop<T, S> {
    transport: T,
    mirror: Mirror<S>,
    session: SessionHandler,
    frame_budget: Duration,
    running: Arc<AtomicBool>,
    fps: FpsCounter,
}

impl<T: RemoteDisplayTransport, S: DisplaySource> ServiceLoop<T, S> {
    pub fn new(
        transport: T,
        mirror: Mirror<S>,
        session: SessionHandler,
        frame_budget: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            mirror,
            session,
            frame_budget,
            running,
            fps: FpsCounter::new(FPS_PERIOD, Instant::now()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn mirror_mut(&mut self) -> &mut Mirror<S> {
        &mut self.mirror
    }

    pub fn session(&self) -> &SessionHandler {
        &self.session
    }

    /// Publishes the whole surface once, then steps until `running` clears.
    ///
    /// # Errors
    ///
    /// Returns the first [`ServiceError`] a step raises.
    pub fn run(&mut self) -> Result<(), ServiceError> {
        self.mirror.publish_full(&mut self.transport)?;
        info!("service loop started (frame budget {:?})", self.frame_budget);
        while self.running.load(Ordering::Relaxed) {
            self.step()?;
        }
        info!("service loop stopped");
        Ok(())
    }

    /// Runs one cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the transport fails or the frame cannot
    /// be diffed.
    pub fn step(&mut self) -> Result<Step, ServiceError> {
        if self.transport.client_count() == 0 {
            self.process(IDLE_BUDGET)?;
            return Ok(Step::Idle);
        }

        self.process(self.frame_budget)?;
        let rect = self.mirror.refresh(&mut self.transport)?;
        if !rect.is_empty() {
            if let Some(fps) = self.fps.record(Instant::now()) {
                info!("fps: {fps:.1}");
            }
            self.process(FLUSH_BUDGET)?;
        }
        Ok(Step::Diffed(rect))
    }

    fn process(&mut self, budget: Duration) -> Result<(), TransportError> {
        let mut dispatch = Dispatch {
            session: &mut self.session,
            mirror: &mut self.mirror,
        };
        self.transport.process_events(budget, &mut dispatch)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use fbmirror_core::{
        Credential, CredentialSet, DisplayGeometry, InjectorConfig, InputInjector,
        PixelFormatDescriptor, RightsTier, Rotation,
    };
    use uuid::Uuid;

    use crate::infrastructure::framebuffer::MemoryDisplay;
    use crate::infrastructure::transport::{ScriptedEvent, ScriptedTransport};

    const STANDARD: Duration = Duration::from_millis(330);

    fn geometry() -> DisplayGeometry {
        DisplayGeometry::new(16, 8, PixelFormatDescriptor::rgb565(), Rotation::None)
    }

    fn make_loop() -> ServiceLoop<ScriptedTransport, MemoryDisplay> {
        let mirror = Mirror::new(MemoryDisplay::new(geometry())).unwrap();
        let session = SessionHandler::new(
            InputInjector::new(InjectorConfig::default()),
            CredentialSet::new(vec![Credential {
                password: "use".into(),
                tier: RightsTier::Operate,
            }]),
            4,
        );
        ServiceLoop::new(
            ScriptedTransport::new(),
            mirror,
            session,
            STANDARD,
            Arc::new(AtomicBool::new(true)),
        )
    }

    // ── FpsCounter ────────────────────────────────────────────────────────────

    #[test]
    fn test_fps_counter_reports_once_per_period() {
        // Arrange
        let t0 = Instant::now();
        let mut fps = FpsCounter::new(Duration::from_secs(5), t0);

        // Act
        let mut reports = Vec::new();
        for i in 1..=10u64 {
            reports.push(fps.record(t0 + Duration::from_secs(i)));
        }

        // Assert: 5 frames in the first 5 s, 5 more in the next.
        assert_eq!(reports.iter().flatten().count(), 2);
        assert_eq!(reports[4], Some(1.0));
        assert_eq!(reports[9], Some(1.0));
    }

    // ── Mirror ────────────────────────────────────────────────────────────────

    #[test]
    fn test_mirror_refresh_publishes_only_changes() {
        // Arrange
        let mut mirror = Mirror::new(MemoryDisplay::new(geometry())).unwrap();
        let mut transport = ScriptedTransport::new();

        // Act: unchanged, then one pixel set.
        let unchanged = mirror.refresh(&mut transport).unwrap();
        mirror.source_mut().pixels_mut()[0] = 0xFF;
        let changed = mirror.refresh(&mut transport).unwrap();

        // Assert
        assert!(unchanged.is_empty());
        assert!(changed.contains(0, 0));
        assert_eq!(transport.frames().len(), 1);
        assert_eq!(transport.frames()[0].dirty, changed);
    }

    #[test]
    fn test_publish_full_covers_remote_surface() {
        let mut mirror = Mirror::new(MemoryDisplay::new(geometry())).unwrap();
        let mut transport = ScriptedTransport::new();

        mirror.publish_full(&mut transport).unwrap();

        assert_eq!(transport.frames()[0].dirty, DirtyRect::full(16, 8));
        assert_eq!(transport.frames()[0].pixels, mirror.remote().as_bytes());
    }

    // ── ServiceLoop ───────────────────────────────────────────────────────────

    #[test]
    fn test_step_without_clients_idles_with_short_budget() {
        let mut service = make_loop();

        let step = service.step().unwrap();

        assert_eq!(step, Step::Idle);
        assert_eq!(service.transport().budgets(), &[IDLE_BUDGET]);
    }

    #[test]
    fn test_step_with_client_uses_frame_budget_and_flushes_changes() {
        // Arrange
        let mut service = make_loop();
        let client = Uuid::new_v4();
        service
            .transport_mut()
            .push_batch(vec![ScriptedEvent::Connect { client, password: "use".into() }]);
        service.step().unwrap();
        service.mirror_mut().source_mut().pixels_mut()[40] = 0x12;

        // Act
        let step = service.step().unwrap();

        // Assert
        assert!(matches!(step, Step::Diffed(rect) if !rect.is_empty()));
        assert_eq!(
            service.transport().budgets(),
            &[IDLE_BUDGET, STANDARD, FLUSH_BUDGET]
        );
    }

    #[test]
    fn test_unchanged_frame_skips_flush() {
        let mut service = make_loop();
        let client = Uuid::new_v4();
        service
            .transport_mut()
            .push_batch(vec![ScriptedEvent::Connect { client, password: "use".into() }]);
        service.step().unwrap();

        let step = service.step().unwrap();

        assert_eq!(step, Step::Diffed(DirtyRect::EMPTY));
        assert_eq!(service.transport().budgets(), &[IDLE_BUDGET, STANDARD]);
    }

    #[test]
    fn test_run_publishes_full_frame_then_stops_when_flag_cleared() {
        // Arrange
        let mut service = make_loop();
        service.running.store(false, Ordering::Relaxed);

        // Act
        service.run().unwrap();

        // Assert
        assert_eq!(service.transport().frames().len(), 1);
        assert_eq!(service.transport().frames()[0].dirty, DirtyRect::full(16, 8));
        assert!(service.transport().budgets().is_empty());
    }
}
