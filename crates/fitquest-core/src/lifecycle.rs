//! User mission state machine.
//!
//! ```text
//! available --start--> ongoing --complete--> completed
//!     ^                   |
//!     +------cancel-------+
//! ```
//!
//! Each transition checks the current status and fails with a
//! [`TransitionError`] without touching the record when it does not apply.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MissionStatus, UserMission};

/// A user-initiated mission action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionAction {
    Start,
    Complete,
    Cancel,
}

impl MissionAction {
    /// Status the attempt must be in for this action.
    pub fn required_status(&self) -> MissionStatus {
        match self {
            MissionAction::Start => MissionStatus::Available,
            MissionAction::Complete | MissionAction::Cancel => MissionStatus::Ongoing,
        }
    }

    /// Status the attempt ends up in after this action.
    pub fn target_status(&self) -> MissionStatus {
        match self {
            MissionAction::Start => MissionStatus::Ongoing,
            MissionAction::Complete => MissionStatus::Completed,
            MissionAction::Cancel => MissionStatus::Available,
        }
    }
}

impl fmt::Display for MissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissionAction::Start => "start",
            MissionAction::Complete => "complete",
            MissionAction::Cancel => "cancel",
        })
    }
}

/// An action was attempted from a status that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a mission that is {from}")]
pub struct TransitionError {
    pub action: MissionAction,
    pub from: MissionStatus,
}

impl UserMission {
    fn check(&self, action: MissionAction) -> Result<(), TransitionError> {
        if self.status == action.required_status() {
            Ok(())
        } else {
            Err(TransitionError {
                action,
                from: self.status,
            })
        }
    }

    /// available → ongoing, recording the distance to the target place.
    pub fn start(&mut self, distance_km: f64, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.check(MissionAction::Start)?;
        self.status = MissionStatus::Ongoing;
        self.distance_from_user = Some(distance_km);
        self.started_at = Some(now);
        Ok(())
    }

    /// ongoing → completed, recording the reward. Returns the points earned.
    pub fn complete(&mut self, reward: i32, now: DateTime<Utc>) -> Result<i32, TransitionError> {
        self.check(MissionAction::Complete)?;
        self.status = MissionStatus::Completed;
        self.completed_at = Some(now);
        self.points_earned = reward;
        Ok(reward)
    }

    /// ongoing → available, clearing all progress.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.check(MissionAction::Cancel)?;
        self.status = MissionStatus::Available;
        self.distance_from_user = None;
        self.started_at = None;
        self.completed_at = None;
        self.points_earned = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn available() -> UserMission {
        UserMission::assign(Uuid::nil(), Uuid::nil(), Some(3.2), Utc::now())
    }

    #[test]
    fn test_start_from_available() {
        let mut um = available();
        let now = Utc::now();
        um.start(1.5, now).unwrap();
        assert_eq!(um.status, MissionStatus::Ongoing);
        assert_eq!(um.distance_from_user, Some(1.5));
        assert_eq!(um.started_at, Some(now));
    }

    #[test]
    fn test_start_twice_fails_without_mutation() {
        let mut um = available();
        um.start(1.5, Utc::now()).unwrap();
        let before = um.clone();

        let err = um.start(9.9, Utc::now()).unwrap_err();
        assert_eq!(err.action, MissionAction::Start);
        assert_eq!(err.from, MissionStatus::Ongoing);
        assert_eq!(um, before);
    }

    #[test]
    fn test_complete_requires_ongoing() {
        let mut um = available();
        let before = um.clone();
        let err = um.complete(460, Utc::now()).unwrap_err();
        assert_eq!(err.from, MissionStatus::Available);
        assert_eq!(um, before);
    }

    #[test]
    fn test_complete_records_reward() {
        let mut um = available();
        um.start(0.05, Utc::now()).unwrap();
        let now = Utc::now();
        assert_eq!(um.complete(460, now).unwrap(), 460);
        assert_eq!(um.status, MissionStatus::Completed);
        assert_eq!(um.completed_at, Some(now));
        assert_eq!(um.points_earned, 460);
    }

    #[test]
    fn test_complete_twice_second_call_fails_without_mutation() {
        let mut um = available();
        um.start(0.05, Utc::now()).unwrap();
        um.complete(460, Utc::now()).unwrap();
        let before = um.clone();

        assert!(um.complete(999, Utc::now()).is_err());
        assert_eq!(um, before);
    }

    #[test]
    fn test_cancel_resets_progress() {
        let mut um = available();
        um.start(1.0, Utc::now()).unwrap();
        um.cancel().unwrap();
        assert_eq!(um.status, MissionStatus::Available);
        assert_eq!(um.distance_from_user, None);
        assert_eq!(um.started_at, None);
        assert_eq!(um.completed_at, None);
        assert_eq!(um.points_earned, 0);
    }

    #[test]
    fn test_cancel_not_allowed_when_available_or_completed() {
        let mut um = available();
        assert!(um.cancel().is_err());

        um.start(0.0, Utc::now()).unwrap();
        um.complete(100, Utc::now()).unwrap();
        let err = um.cancel().unwrap_err();
        assert_eq!(err.from, MissionStatus::Completed);
        assert_eq!(um.status, MissionStatus::Completed);
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut um = available();
        um.start(0.0, Utc::now()).unwrap();
        um.complete(100, Utc::now()).unwrap();
        assert!(um.start(0.0, Utc::now()).is_err());
        assert!(um.complete(100, Utc::now()).is_err());
        assert!(um.cancel().is_err());
    }

    #[test]
    fn test_transition_error_message() {
        let err = TransitionError {
            action: MissionAction::Complete,
            from: MissionStatus::Available,
        };
        assert_eq!(err.to_string(), "cannot complete a mission that is available");
    }

    #[test]
    fn test_action_status_table() {
        assert_eq!(
            MissionAction::Start.required_status(),
            MissionStatus::Available
        );
        assert_eq!(
            MissionAction::Cancel.target_status(),
            MissionStatus::Available
        );
        assert_eq!(
            MissionAction::Complete.target_status(),
            MissionStatus::Completed
        );
    }
}
