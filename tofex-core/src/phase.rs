use serde::{Deserialize, Serialize};

/// Lifecycle of a single trial. Transitions only move forward.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialPhase {
    Idle,
    Running,
    Stopped,
}

impl Default for TrialPhase {
    fn default() -> Self {
        TrialPhase::Idle
    }
}

impl TrialPhase {
    pub fn next(&self) -> Option<Self> {
        use TrialPhase::*;
        Some(match self {
            Idle => Running,
            Running => Stopped,
            Stopped => return None,
        })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TrialPhase::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, TrialPhase::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TrialPhase::Stopped)
    }
}

impl std::fmt::Display for TrialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrialPhase::Idle => "Idle",
            TrialPhase::Running => "Running",
            TrialPhase::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_only_move_forward() {
        assert_eq!(TrialPhase::default(), TrialPhase::Idle);
        assert_eq!(TrialPhase::Idle.next(), Some(TrialPhase::Running));
        assert_eq!(TrialPhase::Running.next(), Some(TrialPhase::Stopped));
        assert_eq!(TrialPhase::Stopped.next(), None);
    }
}
