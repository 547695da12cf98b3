/// What to do when a round consumes no message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StuckPolicy {
    /// Stop with [`SchedulerError::Stuck`](crate::SchedulerError::Stuck).
    #[default]
    Fail,
    /// Stop quietly and hand the unconsumed messages back.
    Lenient,
}

/// Scheduler settings shared by the in-process and brokered schedulers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub policy: StuckPolicy,
    /// Maximum characters of a value shown in traces and reports.
    pub trace_width: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: StuckPolicy::Fail,
            trace_width: 60,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lenient(mut self, lenient: bool) -> Self {
        self.policy = if lenient {
            StuckPolicy::Lenient
        } else {
            StuckPolicy::Fail
        };
        self
    }

    pub fn with_policy(mut self, policy: StuckPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_trace_width(mut self, width: usize) -> Self {
        self.trace_width = width;
        self
    }
}
