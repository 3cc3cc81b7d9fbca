#![forbid(unsafe_code)]

//! Continuously rendered blur surface for platforms without compositor blur.
//!
//! The surface owns one render thread. Lifecycle signals are sent to that
//! thread as requests and the caller blocks until the thread acknowledges
//! with its new [`SurfaceLifecycleState`]. While `Rendering`, the thread
//! produces a frame every [`SurfaceSettings::frame_interval`]: sample the
//! backdrop, blur it through the native processor, composite the dim
//! overlay, publish. In every other state it blocks on the request channel.
//!
//! `destroy` (and `Detach`) stop the thread and join it before returning, so
//! no frame is published afterwards.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use frost_blur::{BlurRequest, PixelImage};
use frost_core::{Argb, Size};

use crate::config::EngineConfig;
use crate::debug_trace;
use crate::lifecycle::{SurfaceLifecycleState, SurfaceSignal, TransitionError};
use crate::{SharedProcessor, default_processor};

/// Supplies the pixels currently behind the dialog.
pub trait BackdropSource: Send + Sync {
    /// Capture at `bounds`, or `None` when nothing is available yet.
    fn capture(&self, bounds: Size) -> Option<PixelImage>;
}

impl<F> BackdropSource for F
where
    F: Fn(Size) -> Option<PixelImage> + Send + Sync,
{
    fn capture(&self, bounds: Size) -> Option<PixelImage> {
        self(bounds)
    }
}

/// Receives every published frame on the render thread.
pub trait FrameSink: Send + Sync {
    fn present(&self, frame: &Arc<PixelImage>);
}

impl<F> FrameSink for F
where
    F: Fn(&Arc<PixelImage>) + Send + Sync,
{
    fn present(&self, frame: &Arc<PixelImage>) {
        self(frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSettings {
    pub radius: u32,
    pub resize_ratio: f64,
    pub frame_interval: Duration,
}

impl SurfaceSettings {
    /// Settings for a behind-blur `intensity` (0-100).
    ///
    /// Radius is `intensity / 100 * surface_max_radius`, truncated.
    #[must_use]
    pub fn from_config(config: &EngineConfig, intensity: u8) -> Self {
        Self {
            radius: crate::dispatcher::scaled_radius(intensity, f64::from(config.surface_max_radius)),
            resize_ratio: config.surface_resize_ratio,
            frame_interval: config.frame_interval(),
        }
    }
}

#[derive(Debug)]
struct SharedState {
    /// Last state acknowledged by the render thread.
    lifecycle: SurfaceLifecycleState,
    bounds: Size,
    overlay: Argb,
    latest: Option<Arc<PixelImage>>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SharedState>,
    frames: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Host-side handle for sizing the surface and reading its output.
#[derive(Debug, Clone)]
pub struct SurfaceLayoutHandle {
    shared: Arc<Shared>,
}

impl SurfaceLayoutHandle {
    /// Match the surface to the dialog content bounds, in px.
    pub fn set_bounds(&self, bounds: Size) {
        self.shared.lock().bounds = bounds;
    }

    pub fn bounds(&self) -> Size {
        self.shared.lock().bounds
    }

    /// Lifecycle state of the renderer behind this handle.
    pub fn state(&self) -> SurfaceLifecycleState {
        self.shared.lock().lifecycle
    }

    /// Most recently published frame.
    pub fn latest_frame(&self) -> Option<Arc<PixelImage>> {
        self.shared.lock().latest.clone()
    }
}

struct Request {
    signal: SurfaceSignal,
    ack: mpsc::SyncSender<SurfaceLifecycleState>,
}

/// Builder for [`SurfaceBlurRenderer`].
pub struct SurfaceRendererBuilder {
    settings: SurfaceSettings,
    processor: SharedProcessor,
    sink: Option<Arc<dyn FrameSink>>,
    bounds: Size,
}

impl SurfaceRendererBuilder {
    #[must_use]
    pub fn processor(mut self, processor: SharedProcessor) -> Self {
        self.processor = processor;
        self
    }

    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn bounds(mut self, bounds: Size) -> Self {
        self.bounds = bounds;
        self
    }

    /// Start the render thread in `Detached`.
    pub fn spawn(self, source: Arc<dyn BackdropSource>) -> Result<SurfaceBlurRenderer, TransitionError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SharedState {
                lifecycle: SurfaceLifecycleState::Detached,
                bounds: self.bounds,
                overlay: Argb::TRANSPARENT,
                latest: None,
            }),
            frames: AtomicU64::new(0),
        });
        let (tx, rx) = mpsc::channel();
        let worker = RenderWorker {
            settings: self.settings,
            shared: Arc::clone(&shared),
            source,
            processor: self.processor,
            sink: self.sink,
        };
        let thread = thread::Builder::new()
            .name("frost-surface".into())
            .spawn(move || worker.run(rx))
            .map_err(|e| TransitionError::Spawn(e.to_string()))?;

        tracing::debug!(
            radius = self.settings.radius,
            ratio = self.settings.resize_ratio,
            "surface render thread started"
        );
        Ok(SurfaceBlurRenderer {
            settings: self.settings,
            shared,
            requests: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(thread)),
        })
    }
}

/// Blur surface driven by host lifecycle signals.
///
/// All methods take `&self`; the renderer can be shared with the host's
/// lifecycle listener through an `Arc`.
pub struct SurfaceBlurRenderer {
    settings: SurfaceSettings,
    shared: Arc<Shared>,
    requests: Mutex<Option<mpsc::Sender<Request>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SurfaceBlurRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceBlurRenderer")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .field("frames_rendered", &self.frames_rendered())
            .finish()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SurfaceBlurRenderer {
    #[must_use]
    pub fn builder(settings: SurfaceSettings) -> SurfaceRendererBuilder {
        SurfaceRendererBuilder {
            settings,
            processor: default_processor(),
            sink: None,
            bounds: Size::default(),
        }
    }

    pub fn settings(&self) -> SurfaceSettings {
        self.settings
    }

    /// Last state acknowledged by the render thread.
    pub fn state(&self) -> SurfaceLifecycleState {
        self.shared.lock().lifecycle
    }

    /// Deliver `signal` and wait for the render thread's acknowledgement.
    ///
    /// Signals that do not apply in the current state are ignored and return
    /// the unchanged state. Reaching `Destroyed` joins the render thread.
    pub fn signal(&self, signal: SurfaceSignal) -> Result<SurfaceLifecycleState, TransitionError> {
        let mut requests = lock(&self.requests);
        let Some(tx) = requests.as_ref() else {
            tracing::debug!(%signal, "signal after destroy ignored");
            return Ok(SurfaceLifecycleState::Destroyed);
        };

        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        let delivered = tx
            .send(Request {
                signal,
                ack: ack_tx,
            })
            .is_ok();
        let acked = if delivered { ack_rx.recv().ok() } else { None };

        let Some(next) = acked else {
            tracing::warn!(%signal, "surface render thread lost");
            requests.take();
            self.join_thread();
            self.shared.lock().lifecycle = SurfaceLifecycleState::Destroyed;
            return Err(TransitionError::RenderThreadLost { signal });
        };

        self.shared.lock().lifecycle = next;
        if next.is_terminal() {
            requests.take();
            self.join_thread();
            tracing::debug!(frames = self.frames_rendered(), "surface destroyed");
        }
        Ok(next)
    }

    pub fn attach(&self) -> Result<SurfaceLifecycleState, TransitionError> {
        self.signal(SurfaceSignal::Attach)
    }

    pub fn set_visible(&self, visible: bool) -> Result<SurfaceLifecycleState, TransitionError> {
        self.signal(if visible {
            SurfaceSignal::Visible
        } else {
            SurfaceSignal::Hidden
        })
    }

    pub fn detach(&self) -> Result<SurfaceLifecycleState, TransitionError> {
        self.signal(SurfaceSignal::Detach)
    }

    /// Stop rendering for good. The render thread has exited when this returns.
    pub fn destroy(&self) {
        // A lost thread still ends in Destroyed and is joined by `signal`.
        let _ = self.signal(SurfaceSignal::Destroy);
    }

    /// Dim overlay composited over every frame.
    pub fn set_background_color(&self, color: Argb) {
        self.shared.lock().overlay = color;
    }

    pub fn background_color(&self) -> Argb {
        self.shared.lock().overlay
    }

    pub fn layout_handle(&self) -> SurfaceLayoutHandle {
        SurfaceLayoutHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn latest_frame(&self) -> Option<Arc<PixelImage>> {
        self.shared.lock().latest.clone()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    fn join_thread(&self) {
        if let Some(handle) = lock(&self.thread).take()
            && handle.join().is_err()
        {
            tracing::warn!("surface render thread panicked");
        }
    }
}

impl Drop for SurfaceBlurRenderer {
    fn drop(&mut self) {
        // Closing the channel stops the thread; don't block in drop.
        lock(&self.requests).take();
    }
}

struct RenderWorker {
    settings: SurfaceSettings,
    shared: Arc<Shared>,
    source: Arc<dyn BackdropSource>,
    processor: SharedProcessor,
    sink: Option<Arc<dyn FrameSink>>,
}

impl RenderWorker {
    fn run(self, requests: mpsc::Receiver<Request>) {
        let mut state = SurfaceLifecycleState::Detached;
        loop {
            let request = if state.produces_frames() {
                match requests.recv_timeout(self.settings.frame_interval) {
                    Ok(request) => Some(request),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                // Parked: no CPU until the next request.
                match requests.recv() {
                    Ok(request) => Some(request),
                    Err(_) => break,
                }
            };

            let Some(Request { signal, ack }) = request else {
                self.render_frame();
                continue;
            };

            let previous = state;
            match state.on(signal) {
                Some(next) => {
                    tracing::debug!(from = %state, to = %next, %signal, "surface transition");
                    state = next;
                }
                None => tracing::debug!(%state, %signal, "surface signal ignored"),
            }
            let _ = ack.send(state);

            if state.is_terminal() {
                break;
            }
            if state.produces_frames() && !previous.produces_frames() {
                self.render_frame();
            }
        }
        debug_trace!(
            "surface render thread exit: frames={}",
            self.shared.frames.load(Ordering::Relaxed)
        );
    }

    fn render_frame(&self) {
        let (bounds, overlay) = {
            let s = self.shared.lock();
            (s.bounds, s.overlay)
        };
        if bounds.is_empty() {
            debug_trace!("surface frame skipped: no bounds");
            return;
        }
        let Some(backdrop) = self.source.capture(bounds) else {
            debug_trace!("surface frame skipped: no backdrop");
            return;
        };

        let request = match BlurRequest::new(backdrop, self.settings.radius, self.settings.resize_ratio) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "surface frame skipped");
                return;
            }
        };
        let mut frame = match self.processor.blur(&request) {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(error = %err, "surface frame left unblurred");
                request.into_image()
            }
        };
        frame.overlay(overlay);

        let frame = Arc::new(frame);
        self.shared.lock().latest = Some(Arc::clone(&frame));
        let n = self.shared.frames.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(sink) = &self.sink {
            sink.present(&frame);
        }
        debug_trace!("surface frame {} published ({}x{})", n, bounds.width, bounds.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn settings(radius: u32) -> SurfaceSettings {
        SurfaceSettings {
            radius,
            resize_ratio: 0.5,
            frame_interval: Duration::from_millis(2),
        }
    }

    fn white_source() -> Arc<dyn BackdropSource> {
        Arc::new(|size: Size| Some(PixelImage::filled(size, Argb::WHITE)))
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn settings_scale_with_intensity() {
        let config = EngineConfig::default();
        assert_eq!(SurfaceSettings::from_config(&config, 40).radius, 10);
        assert_eq!(SurfaceSettings::from_config(&config, 100).radius, 25);
        assert_eq!(SurfaceSettings::from_config(&config, 0).radius, 0);
    }

    #[test]
    fn ignores_signals_outside_the_graph() {
        let r = SurfaceBlurRenderer::builder(settings(2)).spawn(white_source()).unwrap();
        assert_eq!(r.set_visible(true), Ok(SurfaceLifecycleState::Detached));
        assert_eq!(r.attach(), Ok(SurfaceLifecycleState::Attached));
        assert_eq!(r.attach(), Ok(SurfaceLifecycleState::Attached));
        r.destroy();
    }

    #[test]
    fn renders_only_while_visible() {
        let r = SurfaceBlurRenderer::builder(settings(2))
            .bounds(Size::new(16, 16))
            .spawn(white_source())
            .unwrap();
        r.attach().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(r.frames_rendered(), 0);

        assert_eq!(r.set_visible(true), Ok(SurfaceLifecycleState::Rendering));
        assert!(wait_for(|| r.frames_rendered() >= 3));

        assert_eq!(r.set_visible(false), Ok(SurfaceLifecycleState::Paused));
        let paused_at = r.frames_rendered();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(r.frames_rendered(), paused_at);

        assert_eq!(r.set_visible(true), Ok(SurfaceLifecycleState::Rendering));
        assert!(wait_for(|| r.frames_rendered() > paused_at));
        r.destroy();
    }

    #[test]
    fn overlay_is_composited_into_frames() {
        let r = SurfaceBlurRenderer::builder(settings(0))
            .bounds(Size::new(4, 4))
            .spawn(white_source())
            .unwrap();
        let dim = Argb::argb(128, 0, 0, 0);
        r.set_background_color(dim);
        r.attach().unwrap();
        r.set_visible(true).unwrap();
        assert!(wait_for(|| r.latest_frame().is_some()));
        let frame = r.latest_frame().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(dim.over(Argb::WHITE)));
        r.destroy();
    }

    #[test]
    fn no_bounds_means_no_frames() {
        let r = SurfaceBlurRenderer::builder(settings(2)).spawn(white_source()).unwrap();
        r.attach().unwrap();
        r.set_visible(true).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(r.frames_rendered(), 0);

        r.layout_handle().set_bounds(Size::new(8, 8));
        assert!(wait_for(|| r.frames_rendered() > 0));
        assert_eq!(r.layout_handle().latest_frame().unwrap().size(), Size::new(8, 8));
        r.destroy();
    }

    #[test]
    fn drop_without_destroy_does_not_hang() {
        let r = SurfaceBlurRenderer::builder(settings(2))
            .bounds(Size::new(8, 8))
            .spawn(white_source())
            .unwrap();
        r.attach().unwrap();
        r.set_visible(true).unwrap();
        drop(r);
    }

    #[test]
    fn failed_blur_still_publishes_unblurred_frame() {
        use frost_blur::{FnBackend, NativeBlur, NativeOutcome};

        let backend: Arc<dyn NativeBlur> =
            Arc::new(FnBackend::new("null", |_, _, _, _, _| NativeOutcome::Null));
        let r = SurfaceBlurRenderer::builder(settings(4))
            .processor(SharedProcessor::with_backend(backend))
            .bounds(Size::new(6, 6))
            .spawn(white_source())
            .unwrap();
        r.attach().unwrap();
        r.set_visible(true).unwrap();
        assert!(wait_for(|| r.frames_rendered() > 0));
        r.destroy();

        let frame = r.latest_frame().unwrap();
        assert!(frame.pixels().iter().all(|&p| p == Argb::WHITE.0));
    }

    #[test]
    fn sink_sees_every_published_frame() {
        let seen = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seen);
        let sink: Arc<dyn FrameSink> = Arc::new(move |frame: &Arc<PixelImage>| {
            assert_eq!(frame.size(), Size::new(5, 5));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let r = SurfaceBlurRenderer::builder(settings(1))
            .bounds(Size::new(5, 5))
            .sink(sink)
            .spawn(white_source())
            .unwrap();
        r.attach().unwrap();
        r.set_visible(true).unwrap();
        assert!(wait_for(|| r.frames_rendered() >= 3));
        r.destroy();
        assert_eq!(seen.load(Ordering::SeqCst), r.frames_rendered());
    }
}
