//! Percent values for the gauge panels

/// Consensus round steps that have a fixed position on the round gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStep {
    Propose,
    Prevote,
    Precommit,
    Commit,
    NewHeight,
}

impl ProgressStep {
    /// Parse a node round-step label such as `RoundStepPrevote`
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "RoundStepNewHeight" => Some(ProgressStep::NewHeight),
            "RoundStepCommit" => Some(ProgressStep::Commit),
            "RoundStepPrecommit" => Some(ProgressStep::Precommit),
            "RoundStepPrevote" => Some(ProgressStep::Prevote),
            "RoundStepPropose" => Some(ProgressStep::Propose),
            _ => None,
        }
    }

    pub fn percent(self) -> u8 {
        match self {
            ProgressStep::NewHeight => 100,
            ProgressStep::Commit => 80,
            ProgressStep::Precommit => 60,
            ProgressStep::Prevote => 40,
            ProgressStep::Propose => 20,
        }
    }
}

/// Gauge value for a round-step label
///
/// `None` means "leave the gauge where it is"; unknown labels never reset it.
pub fn map_round_step(label: &str) -> Option<u8> {
    ProgressStep::from_label(label).map(ProgressStep::percent)
}

/// Sync catch-up progress as `current / max`, capped at 100
///
/// Returns `None` while the maximum height is unknown or zero.
pub fn sync_progress(current_height: u64, max_height: Option<u64>) -> Option<u8> {
    let max_height = max_height.filter(|max| *max > 0)?;
    let percent = (u128::from(current_height) * 100) / u128::from(max_height);
    Some(percent.min(100) as u8)
}
