use serde::{Deserialize, Serialize};

/// Lifecycle of one adapter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Created,
    Validating,
    BuildingInvocation,
    Executing,
    Reporting,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (RunState::Created, RunState::Validating)
                | (RunState::Validating, RunState::BuildingInvocation)
                | (RunState::BuildingInvocation, RunState::Executing)
                | (RunState::Executing, RunState::Reporting)
                | (RunState::Reporting, RunState::Succeeded)
        ) || (!self.is_terminal() && next == RunState::Failed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Created => "CREATED",
            RunState::Validating => "VALIDATING",
            RunState::BuildingInvocation => "BUILDING_INVOCATION",
            RunState::Executing => "EXECUTING",
            RunState::Reporting => "REPORTING",
            RunState::Succeeded => "SUCCEEDED",
            RunState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
