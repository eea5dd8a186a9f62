//! Status returned by behavior nodes.

/// The result of evaluating a behavior node for one tick.
///
/// `Success` and `Failure` are terminal: the node's activation ends and it
/// will be re-initialized on its next execution. `Running` keeps the node
/// active so the same activation resumes on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum NodeState {
    /// The behavior completed successfully.
    Success,

    /// The behavior failed, or was guarded out by a decorator.
    Failure,

    /// The behavior needs more ticks to reach a verdict.
    Running,
}

impl NodeState {
    /// Returns `true` if this status is `Success`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, NodeState::Success)
    }

    /// Returns `true` if this status is `Failure`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, NodeState::Failure)
    }

    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, NodeState::Running)
    }

    /// Returns `true` for `Success` and `Failure`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Swaps Success and Failure. `Running` is returned unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            NodeState::Success => NodeState::Failure,
            NodeState::Failure => NodeState::Success,
            NodeState::Running => NodeState::Running,
        }
    }
}

impl From<bool> for NodeState {
    fn from(value: bool) -> Self {
        if value {
            NodeState::Success
        } else {
            NodeState::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_keeps_running() {
        assert_eq!(NodeState::Success.invert(), NodeState::Failure);
        assert_eq!(NodeState::Failure.invert(), NodeState::Success);
        assert_eq!(NodeState::Running.invert(), NodeState::Running);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(NodeState::Running.to_string(), "running");
        assert_eq!(NodeState::Success.as_ref(), "success");
    }
}
