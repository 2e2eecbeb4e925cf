//! Analytics events emitted by the pledge flow.
//!
//! Events are fire-and-forget: the flow never waits on, or reads back from,
//! the sink they are handed to.

use pledge_domain::{PledgeFlowContext, Project, Reward};
use serde::{Deserialize, Serialize};

/// All tracked event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsEvent {
    /// The reward carousel was shown with project data.
    RewardsCarouselViewed,
    /// The viewer tapped a reward's select button.
    SelectRewardCta,
    /// The add-ons page was shown for a base reward.
    AddOnsPageViewed,
    /// The viewer continued past the add-ons page.
    AddOnsContinueCta,
    /// The viewer reached the payment page.
    CheckoutPaymentPageViewed,
    /// A pledge was created or updated.
    PledgeSubmitted,
}

impl AnalyticsEvent {
    /// Return the stable event name sent to the analytics backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RewardsCarouselViewed => "rewards_carousel_viewed",
            Self::SelectRewardCta => "select_reward_cta",
            Self::AddOnsPageViewed => "add_ons_page_viewed",
            Self::AddOnsContinueCta => "add_ons_continue_cta",
            Self::CheckoutPaymentPageViewed => "checkout_payment_page_viewed",
            Self::PledgeSubmitted => "pledge_submitted",
        }
    }
}

/// A tracked event with its domain payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEvent {
    pub event: AnalyticsEvent,
    pub project_id: i64,
    pub reward_id: Option<i64>,
    pub context: PledgeFlowContext,
    pub add_on_count: u32,
    pub shipping_amount: Option<f64>,
}

impl TrackedEvent {
    pub fn new(event: AnalyticsEvent, project: &Project, context: PledgeFlowContext) -> Self {
        Self {
            event,
            project_id: project.id,
            reward_id: None,
            context,
            add_on_count: 0,
            shipping_amount: None,
        }
    }

    pub fn with_reward(mut self, reward: &Reward) -> Self {
        self.reward_id = Some(reward.id);
        self
    }

    pub fn with_add_ons(mut self, count: u32) -> Self {
        self.add_on_count = count;
        self
    }

    pub fn with_shipping_amount(mut self, amount: f64) -> Self {
        self.shipping_amount = Some(amount);
        self
    }
}
