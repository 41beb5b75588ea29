//! Configuration of a [Store](crate::Store).

/// The level at which a [Store](crate::Store) logs the actions it
/// dispatches, and the states before and after each dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    /// Don't log dispatches.
    Off,
}

impl LogLevel {
    pub fn log<S: AsRef<str>>(&self, message: S) {
        match self {
            LogLevel::Trace => log::trace!("{}", message.as_ref()),
            LogLevel::Debug => log::debug!("{}", message.as_ref()),
            LogLevel::Info => log::info!("{}", message.as_ref()),
            LogLevel::Warn => log::warn!("{}", message.as_ref()),
            LogLevel::Off => {}
        }
    }

    /// Whether a message at this level would be emitted by the
    /// installed logger, so callers can skip formatting large states.
    pub fn enabled(&self) -> bool {
        let level = match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Off => return false,
        };
        log::log_enabled!(level)
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

/// Options used when constructing a [Store](crate::Store) with
/// [Store::with_config()](crate::Store::with_config()).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub(crate) log_level: LogLevel,
    pub(crate) reject_collisions: bool,
    pub(crate) isolate_listener_faults: bool,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level at which dispatched actions and state
    /// transitions are logged. Defaults to [LogLevel::Debug].
    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// When `true`, registering reducers for an action identifier
    /// which is already registered fails with
    /// [StoreError::ActionCollision](crate::StoreError::ActionCollision)
    /// and nothing from that registration is applied. When `false`
    /// (the default) the later reducer replaces the earlier one and a
    /// warning is logged.
    pub fn reject_collisions(mut self, reject_collisions: bool) -> Self {
        self.reject_collisions = reject_collisions;
        self
    }

    /// When `true` (the default), a listener which panics is logged
    /// and skipped, the remaining listeners are still notified and the
    /// dispatch returns
    /// [StoreError::ListenerPanicked](crate::StoreError::ListenerPanicked).
    /// When `false` the panic unwinds out of
    /// [Store::dispatch()](crate::Store::dispatch()).
    pub fn isolate_listener_faults(mut self, isolate_listener_faults: bool) -> Self {
        self.isolate_listener_faults = isolate_listener_faults;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            reject_collisions: false,
            isolate_listener_faults: true,
        }
    }
}
