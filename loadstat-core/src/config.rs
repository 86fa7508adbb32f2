use crate::constants::{DEFAULT_STAGE_PAUSE, DEFAULT_THINK_TIME, DEFAULT_TIMEOUT, DEFAULT_USERS};
use std::num::NonZeroUsize;
use std::time::Duration;

#[doc(hidden)]
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub name: String,
    pub users: NonZeroUsize,
    pub requests: Option<usize>,
    pub duration: Option<Duration>,
    pub think_time: Duration,
    pub timeout: Duration,
    pub stages: Vec<NonZeroUsize>,
    pub stage_pause: Duration,
}

/// Shape of the load a scenario applies, derived from its configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ScenarioKind {
    /// `requests` trials spread over `users` workers
    Batch {
        users: NonZeroUsize,
        requests: usize,
    },
    /// `users` workers repeating trials until `duration` has passed
    Sustained {
        users: NonZeroUsize,
        duration: Duration,
        think_time: Duration,
    },
    /// One batch per entry of `stages`, each with as many trials as users
    Progressive {
        stages: Vec<NonZeroUsize>,
        pause: Duration,
    },
}

impl ScenarioConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            users: NonZeroUsize::new(DEFAULT_USERS).unwrap_or(NonZeroUsize::MIN),
            requests: None,
            duration: None,
            think_time: DEFAULT_THINK_TIME,
            timeout: DEFAULT_TIMEOUT,
            stages: vec![],
            stage_pause: DEFAULT_STAGE_PAUSE,
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioConfig { stages, .. } if !stages.is_empty() => ScenarioKind::Progressive {
                stages: stages.clone(),
                pause: self.stage_pause,
            },

            ScenarioConfig {
                duration: Some(duration),
                ..
            } => ScenarioKind::Sustained {
                users: self.users,
                duration: *duration,
                think_time: self.think_time,
            },

            _ => ScenarioKind::Batch {
                users: self.users,
                requests: self.requests.unwrap_or(self.users.get()),
            },
        }
    }
}
