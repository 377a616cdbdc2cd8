// Application state module
// Immutable per-process state shared by every connection task

use super::types::Config;
use crate::trigger::QueueTriggerHandler;

/// Application state
pub struct AppState {
    pub config: Config,
    pub trigger: QueueTriggerHandler,
    /// Precomputed request path of the trigger function
    pub trigger_route: String,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let trigger = QueueTriggerHandler::new(&config.trigger);
        let trigger_route = config.trigger.route();

        Self {
            config,
            trigger,
            trigger_route,
        }
    }
}
