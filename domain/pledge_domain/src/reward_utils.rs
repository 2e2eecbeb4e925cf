//! Reward predicates shared by the selection, add-ons and button logic.

use chrono::{DateTime, Utc};

use crate::types::{Backing, Project, Reward, ShippingPreference, NO_REWARD_ID};

pub fn is_no_reward(reward: &Reward) -> bool {
    reward.id == NO_REWARD_ID
}

pub fn has_add_ons(reward: &Reward) -> bool {
    reward.has_add_ons
}

/// Nothing ships for this reward.
pub fn is_digital(reward: &Reward) -> bool {
    matches!(
        reward.shipping_preference,
        ShippingPreference::None | ShippingPreference::Unknown
    ) && reward.shipping_rules.is_empty()
}

pub fn is_shippable(reward: &Reward) -> bool {
    matches!(
        reward.shipping_preference,
        ShippingPreference::Restricted | ShippingPreference::Unrestricted
    )
}

pub fn is_local_pickup(reward: &Reward) -> bool {
    reward.shipping_preference == ShippingPreference::Local
}

pub fn is_limit_reached(reward: &Reward) -> bool {
    reward.limit.is_some() && reward.remaining == Some(0)
}

pub fn is_expired(reward: &Reward, now: DateTime<Utc>) -> bool {
    reward.ends_at.is_some_and(|ends| ends <= now)
}

pub fn has_started(reward: &Reward, now: DateTime<Utc>) -> bool {
    reward.starts_at.map_or(true, |starts| starts <= now)
}

/// Whether the reward can be picked for a new pledge right now.
///
/// The no-reward tier is available whenever the project takes pledges.
pub fn is_available(project: &Project, reward: &Reward, now: DateTime<Utc>) -> bool {
    if !project.accepts_pledges() {
        return false;
    }
    if is_no_reward(reward) {
        return true;
    }
    reward.is_available
        && !is_limit_reached(reward)
        && !is_expired(reward, now)
        && has_started(reward, now)
}

/// Whether the reward can be delivered to `location_id`.
pub fn ships_to(reward: &Reward, location_id: Option<i64>) -> bool {
    match reward.shipping_preference {
        ShippingPreference::Restricted => location_id.is_some_and(|id| {
            reward
                .shipping_rules
                .iter()
                .any(|rule| rule.location_id() == Some(id))
        }),
        _ => true,
    }
}

/// Whether `backing` is for `reward`. A backing without a reward backs the
/// no-reward tier.
pub fn is_backed(backing: &Backing, reward: &Reward) -> bool {
    match backing.reward_id {
        Some(id) => id == reward.id,
        None => is_no_reward(reward),
    }
}
