//! Application lifecycle state machine.
//!
//!   applied → decision → offered → accepted → hard-pull → converted
//!
//! The decision stage resolves to `approved` or `rejected`. Every stage
//! after `applied` may resolve to `cancelled` instead. `rejected`,
//! `cancelled` and `converted` end the story.

use crate::catalog::ApplicationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelStage {
    Applied,
    Decision,
    Offered,
    Accepted,
    HardPull,
    Converted,
}

/// Outcome of the draws taken for one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageRoll {
    /// Only read at the decision stage.
    pub approved: bool,
    /// Ignored at the applied stage.
    pub cancelled: bool,
}

impl FunnelStage {
    pub const FIRST: FunnelStage = FunnelStage::Applied;

    /// Nominal successor, None after `converted`.
    pub fn next(self) -> Option<FunnelStage> {
        match self {
            Self::Applied => Some(Self::Decision),
            Self::Decision => Some(Self::Offered),
            Self::Offered => Some(Self::Accepted),
            Self::Accepted => Some(Self::HardPull),
            Self::HardPull => Some(Self::Converted),
            Self::Converted => None,
        }
    }

    pub fn needs_decision_roll(self) -> bool {
        self == Self::Decision
    }

    pub fn can_cancel(self) -> bool {
        self != Self::Applied
    }

    /// Status row emitted when the story reaches this stage.
    /// Cancellation overrides the decision outcome.
    pub fn resolve(self, roll: StageRoll) -> ApplicationStatus {
        if self.can_cancel() && roll.cancelled {
            return ApplicationStatus::Cancelled;
        }
        match self {
            Self::Applied => ApplicationStatus::Applied,
            Self::Decision if roll.approved => ApplicationStatus::Approved,
            Self::Decision => ApplicationStatus::Rejected,
            Self::Offered => ApplicationStatus::Offered,
            Self::Accepted => ApplicationStatus::Accepted,
            Self::HardPull => ApplicationStatus::HardPull,
            Self::Converted => ApplicationStatus::Converted,
        }
    }

    /// Stage to walk after emitting `status` here, None when the story ends.
    pub fn advance(self, status: ApplicationStatus) -> Option<FunnelStage> {
        if status.is_terminal() {
            None
        } else {
            self.next()
        }
    }
}

/// Statuses of one story driven by a fixed roll sequence.
/// Used to check the transition rules without a PRNG.
pub fn walk(rolls: impl IntoIterator<Item = StageRoll>) -> Vec<ApplicationStatus> {
    let mut statuses = Vec::new();
    let mut stage = Some(FunnelStage::FIRST);
    let mut rolls = rolls.into_iter();
    while let Some(current) = stage {
        let roll = rolls.next().unwrap_or_default();
        let status = current.resolve(roll);
        statuses.push(status);
        stage = current.advance(status);
    }
    statuses
}

/// True if `statuses` is a story the state machine can produce.
pub fn is_legal_story(statuses: &[ApplicationStatus]) -> bool {
    let mut stage = Some(FunnelStage::FIRST);
    for &status in statuses {
        let Some(current) = stage else {
            return false;
        };
        let reachable = [
            StageRoll { approved: true, cancelled: false },
            StageRoll { approved: false, cancelled: false },
            StageRoll { approved: false, cancelled: true },
        ]
        .into_iter()
        .any(|roll| current.resolve(roll) == status);
        if !reachable {
            return false;
        }
        stage = current.advance(status);
    }
    !statuses.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ApplicationStatus::*;

    const GO: StageRoll = StageRoll { approved: true, cancelled: false };
    const CANCEL: StageRoll = StageRoll { approved: true, cancelled: true };
    const REJECT: StageRoll = StageRoll { approved: false, cancelled: false };

    #[test]
    fn happy_path_converts_in_six_rows() {
        let story = walk([GO; 6]);
        assert_eq!(story, vec![Applied, Approved, Offered, Accepted, HardPull, Converted]);
    }

    #[test]
    fn cancel_right_after_applied_yields_two_rows() {
        let story = walk([GO, CANCEL]);
        assert_eq!(story, vec![Applied, Cancelled]);
    }

    #[test]
    fn applied_stage_cannot_cancel() {
        let story = walk([CANCEL, REJECT]);
        assert_eq!(story, vec![Applied, Rejected]);
    }

    #[test]
    fn rejection_is_terminal() {
        let story = walk([GO, REJECT, GO, GO]);
        assert_eq!(story, vec![Applied, Rejected]);
    }

    #[test]
    fn cancel_overrides_decision() {
        assert_eq!(
            FunnelStage::Decision.resolve(StageRoll { approved: false, cancelled: true }),
            Cancelled
        );
    }

    #[test]
    fn late_cancel_stops_story() {
        let story = walk([GO, GO, GO, GO, CANCEL, GO]);
        assert_eq!(story, vec![Applied, Approved, Offered, Accepted, Cancelled]);
    }

    #[test]
    fn legality_checks() {
        assert!(is_legal_story(&[Applied, Approved, Offered, Cancelled]));
        assert!(!is_legal_story(&[Applied, Cancelled, Offered]));
        assert!(!is_legal_story(&[Applied, Approved, Rejected]));
        assert!(!is_legal_story(&[Approved]));
        assert!(!is_legal_story(&[]));
    }
}
