//! Single-writer checkout session.
//!
//! One background task owns the carousel, add-ons and flow view models.
//! Hosts talk to it through a [`SessionHandle`]: intents go in over a bounded
//! queue and are applied strictly one at a time, snapshots come back out on
//! `watch` channels. Async work (shipping rules) is awaited inside the task,
//! so no other intent is applied while it runs. Shutting down cancels that
//! work; nothing is applied once the session token is cancelled.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use pledge_domain::reward_utils::has_add_ons;
use pledge_domain::{PledgeFlowContext, ProjectData, Reward, ShippingRule};

use crate::add_ons::{AddOnsUiState, AddOnsViewModel};
use crate::checkout_flow::{CheckoutFlowViewModel, CheckoutPage, FlowUiState, PledgeOutcome};
use crate::collaborators::{AnalyticsSink, Identity, ShippingRulesUseCase};
use crate::config::ViewerConfig;
use crate::errors::{CheckoutError, Result};
use crate::events::{AnalyticsEvent, TrackedEvent};
use crate::rewards_selection::{RewardSelectionUiState, RewardsSelectionViewModel};
use crate::shipping::{requires_shipping_selection, shipping_amount};

/// Everything a host can ask of the session.
#[derive(Debug, Clone)]
pub enum Intent {
    ProvideProjectData(ProjectData),
    RetryShippingRules,
    SelectReward(Reward),
    /// Answer to the "drop your add-ons?" dialog.
    AlertAnswered(bool),
    SelectShippingRule(ShippingRule),
    ChangeAddOnQuantity { reward_id: i64, quantity: u32 },
    AddOnsContinue,
    ConfirmDetailsContinue,
    BackPressed,
    PledgeCompleted(PledgeOutcome),
}

struct CheckoutSession<S> {
    shipping: S,
    identity: Arc<dyn Identity>,
    analytics: Arc<dyn AnalyticsSink>,
    flow: CheckoutFlowViewModel,
    rewards: RewardsSelectionViewModel,
    add_ons: AddOnsViewModel,
    selected_reward: Option<Reward>,
    selected_add_ons: Vec<(Reward, u32)>,
}

impl<S: ShippingRulesUseCase> CheckoutSession<S> {
    async fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::ProvideProjectData(data) => {
                self.selected_reward = None;
                self.selected_add_ons.clear();
                self.rewards.provide_project_data(data, &self.shipping).await;
            }
            Intent::RetryShippingRules => {
                self.rewards.reload_shipping_rules(&self.shipping).await;
            }
            Intent::SelectReward(reward) => {
                let page = self.flow.state().current_page;
                if page != CheckoutPage::RewardCarousel {
                    debug!("Ignoring reward {} picked on page {}", reward.id, page.index());
                } else if let Some(reward) = self.rewards.on_user_reward_selection(reward) {
                    self.advance_with(reward);
                }
            }
            Intent::AlertAnswered(positive) => {
                if let Some(reward) = self.rewards.on_reward_carousel_alert_clicked(positive) {
                    self.advance_with(reward);
                }
            }
            Intent::SelectShippingRule(rule) => {
                if self.flow.state().current_page == CheckoutPage::AddOns {
                    self.add_ons.select_shipping_rule(rule);
                } else {
                    self.rewards.select_shipping_rule(rule);
                }
            }
            Intent::ChangeAddOnQuantity {
                reward_id,
                quantity,
            } => {
                let page = self.flow.state().current_page;
                if page == CheckoutPage::AddOns {
                    self.add_ons.on_add_on_quantity_changed(reward_id, quantity);
                } else {
                    debug!("Ignoring add-on {reward_id} quantity on page {}", page.index());
                }
            }
            Intent::AddOnsContinue => {
                if self.flow.state().current_page == CheckoutPage::AddOns {
                    self.selected_add_ons = self.add_ons.on_continue_clicked();
                    self.flow.on_add_ons_continue_clicked();
                }
            }
            Intent::ConfirmDetailsContinue => {
                if self
                    .flow
                    .on_confirm_details_continue_clicked(&*self.identity)
                {
                    self.track(AnalyticsEvent::CheckoutPaymentPageViewed);
                }
            }
            Intent::BackPressed => {
                self.flow.on_back_pressed();
                if !self.flow.state().expanded {
                    self.discard_selection();
                }
            }
            Intent::PledgeCompleted(outcome) => {
                if outcome != PledgeOutcome::Canceled {
                    self.track(AnalyticsEvent::PledgeSubmitted);
                }
                self.discard_selection();
                self.flow.on_pledge_completed(outcome);
            }
        }
    }

    /// The sheet closed: nothing picked so far survives into the next pledge.
    fn discard_selection(&mut self) {
        if let Some(reward) = self.selected_reward.take() {
            debug!("Discarding selection of reward {}", reward.id);
        }
        self.selected_add_ons.clear();
        self.rewards.clear_selection();
        self.add_ons.reset();
    }

    fn advance_with(&mut self, reward: Reward) {
        self.selected_add_ons.clear();
        self.flow.on_reward_selected(&reward);
        if has_add_ons(&reward) {
            let carousel = self.rewards.state();
            self.add_ons.provide_selection(
                carousel.project.clone(),
                reward.clone(),
                carousel.shipping.shipping_rules.clone(),
                Some(carousel.shipping.selected_shipping_rule.clone()),
            );
        }
        self.selected_reward = Some(reward);
    }

    /// The rule the pledge ships with: the add-ons page's when it was shown,
    /// else the carousel's for rewards that ship.
    fn checkout_shipping_rule(&self, reward: &Reward) -> ShippingRule {
        if has_add_ons(reward) {
            self.add_ons.state().shipping_rule.clone()
        } else if requires_shipping_selection(reward) {
            self.rewards.state().shipping.selected_shipping_rule.clone()
        } else {
            ShippingRule::empty()
        }
    }

    fn track(&self, event: AnalyticsEvent) {
        let carousel = self.rewards.state();
        let context = PledgeFlowContext::for_pledge_reason(carousel.pledge_reason);
        let mut tracked = TrackedEvent::new(event, &carousel.project.project, context);
        if let Some(reward) = &self.selected_reward {
            let rule = self.checkout_shipping_rule(reward);
            let units: u32 = self.selected_add_ons.iter().map(|(_, q)| q).sum();
            tracked = tracked
                .with_reward(reward)
                .with_add_ons(units)
                .with_shipping_amount(shipping_amount(&rule, reward, &self.selected_add_ons));
        }
        self.analytics.track(tracked);
    }

    async fn run(mut self, mut intents: mpsc::Receiver<Intent>, cancel: CancellationToken) {
        info!("Checkout session started");

        loop {
            let intent = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                intent = intents.recv() => match intent {
                    Some(intent) => intent,
                    None => {
                        debug!("All session handles dropped");
                        break;
                    }
                },
            };

            debug!("Applying intent {intent:?}");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Checkout session cancelled mid-intent");
                    break;
                }
                _ = self.handle(intent) => {}
            }
        }

        info!("Checkout session stopped");
    }
}

/// Host-side handle to a running session.
pub struct SessionHandle {
    intents: mpsc::Sender<Intent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    flow: watch::Receiver<FlowUiState>,
    rewards: watch::Receiver<RewardSelectionUiState>,
    add_ons: watch::Receiver<AddOnsUiState>,
    completions: broadcast::Sender<PledgeOutcome>,
}

/// Start a session as a background [`tokio`] task.
pub fn spawn<S>(
    shipping: S,
    viewer: ViewerConfig,
    identity: Arc<dyn Identity>,
    analytics: Arc<dyn AnalyticsSink>,
    queue_depth: usize,
) -> SessionHandle
where
    S: ShippingRulesUseCase + 'static,
{
    let flow = CheckoutFlowViewModel::new();
    let rewards = RewardsSelectionViewModel::new(viewer.clone(), analytics.clone());
    let add_ons = AddOnsViewModel::new(viewer, analytics.clone());

    let (intents, rx) = mpsc::channel(queue_depth.max(1));
    let cancel = CancellationToken::new();

    let handle_flow = flow.subscribe();
    let handle_rewards = rewards.subscribe();
    let handle_add_ons = add_ons.subscribe();
    let completions = flow.completions();

    let session = CheckoutSession {
        shipping,
        identity,
        analytics,
        flow,
        rewards,
        add_ons,
        selected_reward: None,
        selected_add_ons: Vec::new(),
    };
    let task = tokio::spawn(session.run(rx, cancel.clone()));

    SessionHandle {
        intents,
        cancel,
        task: Some(task),
        flow: handle_flow,
        rewards: handle_rewards,
        add_ons: handle_add_ons,
        completions,
    }
}

impl SessionHandle {
    /// Queue an intent, waiting for room if the queue is full.
    pub async fn send(&self, intent: Intent) -> Result<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| CheckoutError::SessionClosed)
    }

    pub fn flow(&self) -> watch::Receiver<FlowUiState> {
        self.flow.clone()
    }

    pub fn rewards(&self) -> watch::Receiver<RewardSelectionUiState> {
        self.rewards.clone()
    }

    pub fn add_ons(&self) -> watch::Receiver<AddOnsUiState> {
        self.add_ons.clone()
    }

    pub fn subscribe_completions(&self) -> broadcast::Receiver<PledgeOutcome> {
        self.completions.subscribe()
    }

    /// Cancel in-flight work and wait for the session task to exit.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Checkout session task failed: {e}");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
