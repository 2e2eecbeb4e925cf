//! Label of the pledge button on a reward card.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pledge_domain::reward_utils::{has_add_ons, is_available, is_backed};
use pledge_domain::{Project, Reward};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeButtonState {
    Select,
    Selected,
    Continue,
    NoLongerAvailable,
}

impl PledgeButtonState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::Selected => "Selected",
            Self::Continue => "Continue",
            Self::NoLongerAvailable => "No longer available",
        }
    }
}

/// Decide the button for `reward` given the viewer's backing of `project`.
///
/// The backed reward shows `Continue` when there are add-ons to revisit,
/// either offered by the reward or already on the backing. Any other reward
/// on a backed project, and any unavailable reward, is no longer available.
pub fn pledge_button_state(project: &Project, reward: &Reward, now: DateTime<Utc>) -> PledgeButtonState {
    match &project.backing {
        Some(backing) if is_backed(backing, reward) => {
            if has_add_ons(reward) || !backing.add_ons.is_empty() {
                PledgeButtonState::Continue
            } else {
                PledgeButtonState::Selected
            }
        }
        Some(_) => PledgeButtonState::NoLongerAvailable,
        None if is_available(project, reward, now) => PledgeButtonState::Select,
        None => PledgeButtonState::NoLongerAvailable,
    }
}
