//! Gesture to action mapping and fire-and-forget dispatch.
//!
//! The recognition engine never performs side effects. A [`Dispatcher`]
//! looks the recognized gesture up in the current [`ActionBindings`] and
//! hands the resulting [`GestureAction`] to an [`ActionExecutor`] on its own
//! thread. The caller does not wait for the executor and never sees its
//! failures; those are only logged. Actions still running can be awaited
//! with [`Dispatcher::wait_idle`] before the process exits.

use crate::{
    gesture::{GestureEvent, GestureKind},
    Error, Result,
};
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    process::Command,
    str::FromStr,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

/// Action vocabulary a gesture can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureAction {
    /// Toggle playback
    #[serde(rename = "Play/Pause", alias = "play_pause")]
    PlayPause,
    /// Skip to the next track
    #[serde(rename = "Next Track", alias = "next_track")]
    NextTrack,
    /// Go back to the previous track
    #[serde(rename = "Previous Track", alias = "previous_track")]
    PreviousTrack,
    /// Raise the volume one step
    #[serde(rename = "Volume Up", alias = "volume_up")]
    VolumeUp,
    /// Lower the volume one step
    #[serde(rename = "Volume Down", alias = "volume_down")]
    VolumeDown,
    /// Bound to nothing
    #[serde(rename = "Disabled", alias = "disabled")]
    Disabled,
}

impl GestureAction {
    /// Every action, `Disabled` last
    pub const ALL: [Self; 6] = [
        Self::PlayPause,
        Self::NextTrack,
        Self::PreviousTrack,
        Self::VolumeUp,
        Self::VolumeDown,
        Self::Disabled,
    ];

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PlayPause => "Play/Pause",
            Self::NextTrack => "Next Track",
            Self::PreviousTrack => "Previous Track",
            Self::VolumeUp => "Volume Up",
            Self::VolumeDown => "Volume Down",
            Self::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for GestureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GestureAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "playpause" => Ok(Self::PlayPause),
            "nexttrack" | "next" => Ok(Self::NextTrack),
            "previoustrack" | "previous" | "prev" => Ok(Self::PreviousTrack),
            "volumeup" => Ok(Self::VolumeUp),
            "volumedown" => Ok(Self::VolumeDown),
            "disabled" | "none" => Ok(Self::Disabled),
            _ => Err(Error::InvalidInput(format!("Unknown action: {s}"))),
        }
    }
}

/// Gesture to action table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionBindings {
    /// Action for [`GestureKind::LeftFlick`]
    pub left_flick: GestureAction,
    /// Action for [`GestureKind::RightFlick`]
    pub right_flick: GestureAction,
    /// Action for [`GestureKind::Nod`]
    pub nod: GestureAction,
}

impl Default for ActionBindings {
    fn default() -> Self {
        Self {
            left_flick: GestureAction::PreviousTrack,
            right_flick: GestureAction::NextTrack,
            nod: GestureAction::PlayPause,
        }
    }
}

impl ActionBindings {
    /// Bindings with every gesture disabled
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            left_flick: GestureAction::Disabled,
            right_flick: GestureAction::Disabled,
            nod: GestureAction::Disabled,
        }
    }

    /// Configured entry for `kind`, `Disabled` included
    #[must_use]
    pub const fn get(&self, kind: GestureKind) -> GestureAction {
        match kind {
            GestureKind::LeftFlick => self.left_flick,
            GestureKind::RightFlick => self.right_flick,
            GestureKind::Nod => self.nod,
        }
    }

    /// Rebind `kind`
    pub fn set(&mut self, kind: GestureKind, action: GestureAction) {
        match kind {
            GestureKind::LeftFlick => self.left_flick = action,
            GestureKind::RightFlick => self.right_flick = action,
            GestureKind::Nod => self.nod = action,
        }
    }

    /// Action to run for `kind`, or `None` when the gesture is disabled
    #[must_use]
    pub fn action_for(&self, kind: GestureKind) -> Option<GestureAction> {
        match self.get(kind) {
            GestureAction::Disabled => None,
            action => Some(action),
        }
    }
}

/// Performs the real-world effect of an action
pub trait ActionExecutor: Send + Sync {
    /// Carry out `action`
    ///
    /// # Errors
    ///
    /// Implementations report their own failures; the dispatcher only logs them.
    fn execute(&self, action: GestureAction) -> Result<()>;

    /// Executor name
    fn name(&self) -> &str;
}

/// Executor that only logs the action
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExecutor;

impl ActionExecutor for LogExecutor {
    fn execute(&self, action: GestureAction) -> Result<()> {
        info!("Action: {action}");
        Ok(())
    }

    fn name(&self) -> &str {
        "LogExecutor"
    }
}

/// Command lines run by [`CommandExecutor`], one argv per action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCommands {
    /// Command for Play/Pause
    pub play_pause: Vec<String>,
    /// Command for Next Track
    pub next_track: Vec<String>,
    /// Command for Previous Track
    pub previous_track: Vec<String>,
    /// Command for Volume Up
    pub volume_up: Vec<String>,
    /// Command for Volume Down
    pub volume_down: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

impl Default for ActionCommands {
    fn default() -> Self {
        Self {
            play_pause: argv(&["playerctl", "play-pause"]),
            next_track: argv(&["playerctl", "next"]),
            previous_track: argv(&["playerctl", "previous"]),
            volume_up: argv(&["playerctl", "volume", "0.1+"]),
            volume_down: argv(&["playerctl", "volume", "0.1-"]),
        }
    }
}

impl ActionCommands {
    /// Argv configured for `action`; empty for `Disabled`
    #[must_use]
    pub fn command_for(&self, action: GestureAction) -> &[String] {
        match action {
            GestureAction::PlayPause => &self.play_pause,
            GestureAction::NextTrack => &self.next_track,
            GestureAction::PreviousTrack => &self.previous_track,
            GestureAction::VolumeUp => &self.volume_up,
            GestureAction::VolumeDown => &self.volume_down,
            GestureAction::Disabled => &[],
        }
    }
}

/// Executor that runs an external command per action
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    commands: ActionCommands,
}

impl CommandExecutor {
    /// Create an executor over the given command table
    #[must_use]
    pub const fn new(commands: ActionCommands) -> Self {
        Self { commands }
    }
}

impl ActionExecutor for CommandExecutor {
    fn execute(&self, action: GestureAction) -> Result<()> {
        let Some((program, args)) = self.commands.command_for(action).split_first() else {
            return Err(Error::ActionFailed(format!("No command configured for {action}")));
        };

        debug!("Running {program} {args:?} for {action}");
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| Error::ActionFailed(format!("Failed to run {program}: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::ActionFailed(format!("{program} exited with {status}")))
        }
    }

    fn name(&self) -> &str {
        "CommandExecutor"
    }
}

/// Outcome of handing one gesture to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The action was handed to the executor
    Dispatched(GestureAction),
    /// No action bound (or explicitly disabled); nothing ran
    Unbound(GestureKind),
    /// The worker thread could not be started
    Dropped(GestureAction),
}

/// Count of action threads that have not finished yet
#[derive(Debug, Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

/// Held by one action thread; releases its slot even if the executor panics
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn acquire(in_flight: &Arc<InFlight>) -> Self {
        *in_flight.count.lock() += 1;
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut count = self.0.count.lock();
        *count -= 1;
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

/// Maps gestures to actions and runs them without blocking the caller
#[derive(Clone)]
pub struct Dispatcher {
    executor: Arc<dyn ActionExecutor>,
    in_flight: Arc<InFlight>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("executor", &self.executor.name())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher around `executor`
    pub fn new(executor: Arc<dyn ActionExecutor>) -> Self {
        Self {
            executor,
            in_flight: Arc::default(),
        }
    }

    /// Name of the wrapped executor
    pub fn executor_name(&self) -> &str {
        self.executor.name()
    }

    /// Actions handed out that have not finished yet
    pub fn in_flight(&self) -> usize {
        *self.in_flight.count.lock()
    }

    /// Block until every dispatched action has finished or `timeout` passes.
    ///
    /// Returns `true` when nothing is left running.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.in_flight.count.lock();
        while *count > 0 {
            if self.in_flight.idle.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }

    /// Dispatch the action bound to `event`, at most once
    pub fn dispatch(&self, event: &GestureEvent, bindings: &ActionBindings) -> Dispatch {
        let Some(action) = bindings.action_for(event.kind) else {
            debug!("{} has no bound action", event.kind);
            return Dispatch::Unbound(event.kind);
        };

        let executor = Arc::clone(&self.executor);
        let guard = InFlightGuard::acquire(&self.in_flight);
        let spawned = thread::Builder::new()
            .name(format!("action-{}", action.label()))
            .spawn(move || {
                let _guard = guard;
                if let Err(e) = executor.execute(action) {
                    warn!("{} failed to run {action}: {e}", executor.name());
                }
            });

        match spawned {
            Ok(_) => Dispatch::Dispatched(action),
            Err(e) => {
                warn!("Failed to start action thread for {action}: {e}");
                Dispatch::Dropped(action)
            }
        }
    }
}
