//! Reward carousel state: which rewards are shown, which one is picked, and
//! where the viewer wants it shipped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use pledge_domain::reward_utils::{is_available, is_backed, is_no_reward, ships_to};
use pledge_domain::{
    Backing, PledgeFlowContext, PledgeReason, Project, ProjectData, Reward, ShippingRule,
};

use crate::collaborators::{AnalyticsSink, ShippingRulesUseCase};
use crate::config::ViewerConfig;
use crate::events::{AnalyticsEvent, TrackedEvent};

/// Shipping-rule half of the carousel snapshot. `error` is kept apart from the
/// data so a failed reload does not blank the rules already shown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingRulesState {
    pub shipping_rules: Vec<ShippingRule>,
    pub selected_shipping_rule: ShippingRule,
    pub loading: bool,
    pub error: Option<String>,
}

/// Full carousel snapshot. Each one replaces the previous; none is a delta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardSelectionUiState {
    pub rewards: Vec<Reward>,
    pub selected_reward: Option<Reward>,
    /// Carousel position of the currently backed reward, 0 if none.
    pub initial_reward_index: usize,
    pub project: ProjectData,
    pub pledge_reason: PledgeReason,
    pub shipping: ShippingRulesState,
    /// Confirm dropping backed add-ons before switching rewards.
    pub show_alert_dialog: bool,
}

/// Rewards the carousel shows: the no-reward tier, the backed reward, and
/// every reward open for a new pledge that can reach `location_id`.
///
/// Unavailable rewards are dropped, not sorted to the end.
pub fn displayable_rewards(
    project: &Project,
    backing: Option<&Backing>,
    location_id: Option<i64>,
    now: DateTime<Utc>,
) -> Vec<Reward> {
    project
        .rewards
        .iter()
        .filter(|reward| {
            is_no_reward(reward)
                || backing.is_some_and(|b| is_backed(b, reward))
                || (is_available(project, reward, now)
                    && location_id.map_or(true, |id| ships_to(reward, Some(id))))
        })
        .cloned()
        .collect()
}

/// Index of the backed reward in `rewards`, 0 when nothing is backed.
pub fn index_of_backed_reward(rewards: &[Reward], backing: Option<&Backing>) -> usize {
    backing
        .and_then(|b| rewards.iter().position(|reward| is_backed(b, reward)))
        .unwrap_or(0)
}

/// Why the viewer is in the pledge flow. An explicit reason on the project
/// data wins; otherwise it follows from the backing and campaign phase.
pub fn pledge_reason_for(data: &ProjectData) -> PledgeReason {
    if let Some(reason) = data.pledge_reason {
        return reason;
    }
    match data.backing() {
        Some(_) => PledgeReason::UpdateReward,
        None if data.project.is_in_post_campaign_pledging_phase => PledgeReason::LatePledge,
        None => PledgeReason::Pledge,
    }
}

pub struct RewardsSelectionViewModel {
    viewer: ViewerConfig,
    analytics: Arc<dyn AnalyticsSink>,
    state: RewardSelectionUiState,
    previously_backed_reward: Option<Reward>,
    pending_reward: Option<Reward>,
    ui: watch::Sender<RewardSelectionUiState>,
}

impl RewardsSelectionViewModel {
    pub fn new(viewer: ViewerConfig, analytics: Arc<dyn AnalyticsSink>) -> Self {
        let (ui, _) = watch::channel(RewardSelectionUiState::default());
        Self {
            viewer,
            analytics,
            state: RewardSelectionUiState::default(),
            previously_backed_reward: None,
            pending_reward: None,
            ui,
        }
    }

    pub fn state(&self) -> &RewardSelectionUiState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<RewardSelectionUiState> {
        self.ui.subscribe()
    }

    fn emit(&self) {
        self.ui.send_replace(self.state.clone());
    }

    fn flow_context(&self) -> PledgeFlowContext {
        PledgeFlowContext::for_pledge_reason(self.state.pledge_reason)
    }

    /// Load a project into the carousel. Shipping rules are fetched before the
    /// first snapshot goes out.
    pub async fn provide_project_data<S: ShippingRulesUseCase>(
        &mut self,
        data: ProjectData,
        use_case: &S,
    ) {
        let backing = data.backing().cloned();
        self.previously_backed_reward = backing.as_ref().and_then(|b| {
            data.project
                .rewards
                .iter()
                .find(|r| is_backed(b, r))
                .cloned()
                .or_else(|| b.reward.clone())
        });
        self.pending_reward = None;

        self.state = RewardSelectionUiState {
            pledge_reason: pledge_reason_for(&data),
            project: data,
            ..RewardSelectionUiState::default()
        };

        info!(
            "Loading reward carousel for project {} ({:?})",
            self.state.project.project.id, self.state.pledge_reason
        );
        self.load_shipping_rules(use_case).await;

        self.analytics.track(TrackedEvent::new(
            AnalyticsEvent::RewardsCarouselViewed,
            &self.state.project.project,
            self.flow_context(),
        ));
    }

    /// Fetch shipping rules again after a failure. A success replaces the
    /// failed state entirely.
    pub async fn reload_shipping_rules<S: ShippingRulesUseCase>(&mut self, use_case: &S) {
        self.load_shipping_rules(use_case).await;
    }

    async fn load_shipping_rules<S: ShippingRulesUseCase>(&mut self, use_case: &S) {
        self.state.shipping.loading = true;
        let result = use_case
            .shipping_rules(&self.state.project.project, &self.viewer)
            .await;

        self.state.shipping = match result {
            Ok(rules) => ShippingRulesState {
                shipping_rules: rules.rules,
                selected_shipping_rule: rules.default_rule,
                loading: false,
                error: None,
            },
            Err(e) => {
                warn!("Shipping rules fetch failed: {e}");
                ShippingRulesState {
                    loading: false,
                    error: Some(e.to_string()),
                    ..std::mem::take(&mut self.state.shipping)
                }
            }
        };
        self.refresh_rewards();
        self.emit();
    }

    fn refresh_rewards(&mut self) {
        let project = &self.state.project;
        let backing = project.backing();
        let rewards = displayable_rewards(
            &project.project,
            backing,
            self.state.shipping.selected_shipping_rule.location_id(),
            Utc::now(),
        );
        self.state.initial_reward_index = index_of_backed_reward(&rewards, backing);

        let hidden = self
            .state
            .selected_reward
            .as_ref()
            .filter(|selected| !rewards.iter().any(|r| r.id == selected.id))
            .map(|selected| selected.id);
        if let Some(id) = hidden {
            debug!("Selected reward {id} no longer shown, clearing");
            self.state.selected_reward = None;
        }
        self.state.rewards = rewards;
    }

    /// The viewer tapped a reward.
    ///
    /// Returns the reward when the selection is committed and the flow should
    /// advance. Switching away from a backing that has add-ons asks for
    /// confirmation first and returns `None`.
    pub fn on_user_reward_selection(&mut self, reward: Reward) -> Option<Reward> {
        self.analytics.track(
            TrackedEvent::new(
                AnalyticsEvent::SelectRewardCta,
                &self.state.project.project,
                self.flow_context(),
            )
            .with_reward(&reward),
        );

        let has_backed_add_ons = self
            .state
            .project
            .backing()
            .is_some_and(|b| !b.add_ons.is_empty());
        let same_reward = self
            .previously_backed_reward
            .as_ref()
            .is_some_and(|r| r.id == reward.id);
        let new_pledge = matches!(
            self.state.pledge_reason,
            PledgeReason::Pledge | PledgeReason::LatePledge
        );

        if new_pledge || !has_backed_add_ons || same_reward {
            return Some(self.commit(reward));
        }

        debug!("Reward {} would drop backed add-ons, asking first", reward.id);
        self.pending_reward = Some(reward);
        self.state.show_alert_dialog = true;
        self.emit();
        None
    }

    /// Answer to the "drop your add-ons?" dialog.
    pub fn on_reward_carousel_alert_clicked(&mut self, positive: bool) -> Option<Reward> {
        self.state.show_alert_dialog = false;
        match self.pending_reward.take() {
            Some(reward) if positive => Some(self.commit(reward)),
            _ => {
                self.emit();
                None
            }
        }
    }

    fn commit(&mut self, reward: Reward) -> Reward {
        info!("Reward {} selected", reward.id);
        self.state.selected_reward = Some(reward.clone());
        self.emit();
        reward
    }

    /// Drop the picked reward and any unanswered alert. The loaded project
    /// and shipping rules stay.
    pub fn clear_selection(&mut self) {
        self.state.selected_reward = None;
        self.state.show_alert_dialog = false;
        self.pending_reward = None;
        self.emit();
    }

    pub fn select_shipping_rule(&mut self, rule: ShippingRule) {
        debug!("Carousel shipping rule → {:?}", rule.location_id());
        self.state.shipping.selected_shipping_rule = rule;
        self.refresh_rewards();
        self.emit();
    }
}
