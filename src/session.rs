//! Tracking session: a single consumer thread that owns the [`HeadTracker`].
//!
//! The orientation source pushes [`SourceEvent`]s through a bounded channel
//! via a [`SessionHandle`]; the worker handles them strictly in arrival
//! order, so filter and calibration state only ever have one writer.
//! Calibration commands and tracking toggles travel through the same
//! channel and therefore take effect before the next queued sample.
//!
//! Configuration lives behind a [`ConfigHandle`] and is snapshotted once per
//! sample. Recognized gestures are dispatched fire-and-forget and also
//! published on [`TrackingSession::events`]. That channel is bounded: when
//! nobody drains it, newer events are dropped and counted in
//! [`SessionStats::events_dropped`].

use crate::{
    action::{Dispatch, Dispatcher, GestureAction},
    calibration::CaptureResult,
    constants::{DEFAULT_ACTION_DRAIN_SECS, DEFAULT_CHANNEL_CAPACITY, DEFAULT_EVENT_CAPACITY},
    gesture::{GestureConfig, GestureEvent, GestureKind, Sensitivity},
    orientation::Quaternion,
    tracker::HeadTracker,
    Error, Result,
};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// Shared, updatable gesture configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<GestureConfig>>,
}

impl ConfigHandle {
    /// Wrap an initial configuration
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current configuration
    #[must_use]
    pub fn snapshot(&self) -> GestureConfig {
        *self.inner.read()
    }

    /// Replace the whole configuration
    pub fn replace(&self, config: GestureConfig) {
        *self.inner.write() = config;
    }

    /// Change the sensitivity profile
    pub fn set_sensitivity(&self, sensitivity: Sensitivity) {
        self.inner.write().sensitivity = sensitivity;
    }

    /// Rebind one gesture
    pub fn set_binding(&self, kind: GestureKind, action: GestureAction) {
        self.inner.write().bindings.set(kind, action);
    }
}

/// Optional rate limiter in front of the recognition pipeline.
///
/// Accepts a sample when at least `1 / rate_hz` seconds have passed since
/// the last accepted one. Disabled when no rate is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleThrottle {
    min_interval: Option<f64>,
    last_accepted: Option<f64>,
}

impl SampleThrottle {
    /// Create a throttle; `None` or a non-positive rate disables it
    #[must_use]
    pub fn new(rate_hz: Option<f64>) -> Self {
        Self {
            min_interval: rate_hz.filter(|hz| hz.is_finite() && *hz > 0.0).map(|hz| 1.0 / hz),
            last_accepted: None,
        }
    }

    /// Whether the sample at `now` may pass
    pub fn accept(&mut self, now: f64) -> bool {
        let Some(interval) = self.min_interval else {
            return true;
        };
        match self.last_accepted {
            Some(last) if now - last < interval => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }

    /// Forget the last accepted sample
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

/// Session tuning
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Rate limit applied before recognition, in Hz
    pub throttle_hz: Option<f64>,
    /// Bound of the source to worker channel
    pub channel_capacity: usize,
    /// Bound of the gesture event channel
    pub event_capacity: usize,
    /// How long shutdown waits for dispatched actions to finish
    pub action_drain_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            throttle_hz: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            action_drain_timeout: Duration::from_secs(DEFAULT_ACTION_DRAIN_SECS),
        }
    }
}

/// Counters reported when the session stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    /// Samples received from the source
    pub samples_received: u64,
    /// Samples that went through the pipeline
    pub samples_processed: u64,
    /// Samples discarded as unusable
    pub samples_rejected: u64,
    /// Samples dropped by the throttle
    pub samples_throttled: u64,
    /// Gestures recognized
    pub gestures: u64,
    /// Actions handed to the executor
    pub actions_dispatched: u64,
    /// Gestures with no bound action
    pub gestures_unbound: u64,
    /// Events not published because the event channel was full
    pub events_dropped: u64,
    /// Actions still running when shutdown stopped waiting
    pub actions_unfinished: u64,
}

/// Message from the source or control side to the worker
#[derive(Debug)]
pub enum SourceEvent {
    /// Raw device-frame orientation, optionally with its own timestamp
    Sample {
        /// Raw orientation
        quaternion: Quaternion,
        /// Seconds; `None` stamps the sample on arrival
        timestamp: Option<f64>,
    },
    /// Begin a calibration capture
    StartCalibration(Sender<Result<()>>),
    /// Complete the calibration capture
    FinishCalibration(Sender<Result<CaptureResult>>),
    /// Drop the calibration offset and smoothing state
    ResetOrientation,
    /// Pause or resume recognition
    SetTracking(bool),
    /// Stop the worker
    Shutdown,
}

/// Cloneable sender side of a session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: Sender<SourceEvent>,
    connected: Arc<AtomicBool>,
}

impl SessionHandle {
    fn send(&self, event: SourceEvent) -> Result<()> {
        self.sender.send(event).map_err(|_| Error::SessionClosed)
    }

    /// Push a sample stamped by the worker on arrival
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after shutdown.
    pub fn push_sample(&self, quaternion: Quaternion) -> Result<()> {
        self.send(SourceEvent::Sample {
            quaternion,
            timestamp: None,
        })
    }

    /// Push a sample with an explicit timestamp in seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after shutdown.
    pub fn push_sample_at(&self, quaternion: Quaternion, timestamp: f64) -> Result<()> {
        self.send(SourceEvent::Sample {
            quaternion,
            timestamp: Some(timestamp),
        })
    }

    /// Report the source's connectivity
    pub fn set_connected(&self, connected: bool) {
        if self.connected.swap(connected, Ordering::SeqCst) != connected {
            info!("Orientation source {}", if connected { "connected" } else { "disconnected" });
        }
    }

    /// Last reported connectivity
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Begin calibration, after all previously queued samples
    ///
    /// # Errors
    ///
    /// Returns [`Error::CalibrationAlreadyInProgress`] while capturing, or
    /// [`Error::SessionClosed`] after shutdown.
    pub fn start_calibration(&self) -> Result<()> {
        let (reply, response) = bounded(1);
        self.send(SourceEvent::StartCalibration(reply))?;
        response.recv().map_err(|_| Error::SessionClosed)?
    }

    /// Complete calibration, after all previously queued samples
    ///
    /// # Errors
    ///
    /// See [`crate::calibration::Calibration::finish`]; also
    /// [`Error::SessionClosed`] after shutdown.
    pub fn finish_calibration(&self) -> Result<CaptureResult> {
        let (reply, response) = bounded(1);
        self.send(SourceEvent::FinishCalibration(reply))?;
        response.recv().map_err(|_| Error::SessionClosed)?
    }

    /// Reset the orientation before the next sample is processed
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after shutdown.
    pub fn reset_orientation(&self) -> Result<()> {
        self.send(SourceEvent::ResetOrientation)
    }

    /// Pause or resume recognition for subsequent samples
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] after shutdown.
    pub fn set_tracking(&self, enabled: bool) -> Result<()> {
        self.send(SourceEvent::SetTracking(enabled))
    }
}

/// A running tracking session
pub struct TrackingSession {
    handle: SessionHandle,
    events: Receiver<GestureEvent>,
    config: ConfigHandle,
    dispatcher: Dispatcher,
    action_drain_timeout: Duration,
    worker: Option<JoinHandle<SessionStats>>,
}

impl TrackingSession {
    /// Start the worker thread
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the thread cannot be spawned and
    /// [`Error::InvalidInput`] for a zero channel or event capacity.
    pub fn spawn(
        tracker: HeadTracker,
        config: ConfigHandle,
        dispatcher: Dispatcher,
        options: SessionOptions,
    ) -> Result<Self> {
        if options.channel_capacity == 0 {
            return Err(Error::InvalidInput("Channel capacity must be greater than 0".to_string()));
        }
        if options.event_capacity == 0 {
            return Err(Error::InvalidInput("Event capacity must be greater than 0".to_string()));
        }

        let (sender, receiver) = bounded(options.channel_capacity);
        let (events_tx, events) = bounded(options.event_capacity);
        let worker = Worker {
            tracker,
            config: config.clone(),
            dispatcher: dispatcher.clone(),
            throttle: SampleThrottle::new(options.throttle_hz),
            events: events_tx,
            stats: SessionStats::default(),
            started: Instant::now(),
        };

        info!(
            "Starting tracking session (executor: {}, throttle: {:?} Hz)",
            worker.dispatcher.executor_name(),
            options.throttle_hz
        );
        let worker = thread::Builder::new()
            .name("gesture-session".to_string())
            .spawn(move || worker.run(&receiver))?;

        Ok(Self {
            handle: SessionHandle {
                sender,
                connected: Arc::new(AtomicBool::new(true)),
            },
            events,
            config,
            dispatcher,
            action_drain_timeout: options.action_drain_timeout,
            worker: Some(worker),
        })
    }

    /// Sender side for the orientation source and controls
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Recognized gestures, in order. Drain it; a full channel drops events.
    #[must_use]
    pub const fn events(&self) -> &Receiver<GestureEvent> {
        &self.events
    }

    /// Live configuration
    #[must_use]
    pub const fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Process everything queued so far, stop the worker, wait for running
    /// actions and return the counters
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the worker already stopped or panicked.
    pub fn shutdown(mut self) -> Result<SessionStats> {
        self.stop()
    }

    fn stop(&mut self) -> Result<SessionStats> {
        let worker = self.worker.take().ok_or(Error::SessionClosed)?;
        // The worker may already be gone; joining reports that
        let _ = self.handle.send(SourceEvent::Shutdown);
        let mut stats = worker.join().map_err(|_| Error::SessionClosed)?;

        if !self.dispatcher.wait_idle(self.action_drain_timeout) {
            let unfinished = self.dispatcher.in_flight();
            warn!("{unfinished} actions still running at shutdown");
            stats.actions_unfinished = unfinished as u64;
        }
        Ok(stats)
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.stop() {
                warn!("Tracking session did not stop cleanly: {e}");
            }
        }
    }
}

struct Worker {
    tracker: HeadTracker,
    config: ConfigHandle,
    dispatcher: Dispatcher,
    throttle: SampleThrottle,
    events: Sender<GestureEvent>,
    stats: SessionStats,
    started: Instant,
}

impl Worker {
    fn run(mut self, receiver: &Receiver<SourceEvent>) -> SessionStats {
        for event in receiver {
            match event {
                SourceEvent::Sample { quaternion, timestamp } => self.on_sample(quaternion, timestamp),
                SourceEvent::StartCalibration(reply) => {
                    let _ = reply.send(self.tracker.start_calibration());
                }
                SourceEvent::FinishCalibration(reply) => {
                    let _ = reply.send(self.tracker.finish_calibration());
                }
                SourceEvent::ResetOrientation => {
                    self.tracker.reset_orientation();
                    self.throttle.reset();
                }
                SourceEvent::SetTracking(enabled) => {
                    self.tracker.set_tracking(enabled);
                    self.throttle.reset();
                }
                SourceEvent::Shutdown => break,
            }
        }

        info!("Tracking session stopped: {:?}", self.stats);
        self.stats
    }

    fn on_sample(&mut self, quaternion: Quaternion, timestamp: Option<f64>) {
        self.stats.samples_received += 1;
        let now = timestamp.unwrap_or_else(|| self.started.elapsed().as_secs_f64());

        if !self.throttle.accept(now) {
            self.stats.samples_throttled += 1;
            return;
        }

        let config = self.config.snapshot();
        match self.tracker.handle_sample(quaternion, now, &config) {
            Ok(Some(event)) => {
                self.stats.samples_processed += 1;
                self.stats.gestures += 1;
                match self.dispatcher.dispatch(&event, &config.bindings) {
                    Dispatch::Dispatched(_) => self.stats.actions_dispatched += 1,
                    Dispatch::Unbound(_) => self.stats.gestures_unbound += 1,
                    Dispatch::Dropped(_) => {}
                }
                match self.events.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        self.stats.events_dropped += 1;
                        debug!("Event channel full, dropped {} at {:.3}s", event.kind, event.timestamp);
                    }
                    // Nobody listening is fine
                    Err(TrySendError::Disconnected(_)) => {}
                }
            }
            Ok(None) => self.stats.samples_processed += 1,
            Err(e) => {
                self.stats.samples_rejected += 1;
                debug!("Rejected sample at {now:.3}s: {e}");
            }
        }
    }
}
