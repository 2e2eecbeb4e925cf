//! Add-on picker for a chosen base reward.
//!
//! Holds the quantity picked per add-on and the shipping destination, and
//! re-emits a full [`AddOnsUiState`] after every mutation. Shipping is only
//! selectable when the base reward physically ships somewhere; digital and
//! local-pickup rewards pin the rule to [`ShippingRule::empty`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use pledge_domain::reward_utils::{is_available, is_backed, is_digital, ships_to};
use pledge_domain::{PledgeFlowContext, ProjectData, Reward, ShippingRule};

use crate::collaborators::AnalyticsSink;
use crate::config::ViewerConfig;
use crate::events::{AnalyticsEvent, TrackedEvent};
use crate::rewards_selection::pledge_reason_for;
use crate::shipping::{default_shipping_rule, requires_shipping_selection, shipping_amount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectedAddOn {
    pub reward_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOnsUiState {
    pub project: ProjectData,
    pub reward: Reward,
    pub shipping_rule: ShippingRule,
    pub shipping_rules: Vec<ShippingRule>,
    pub show_shipping_selector: bool,
    /// Add-ons the viewer can pick from, in project order.
    pub add_ons: Vec<Reward>,
    /// Non-zero picks, in the same order as `add_ons`.
    pub selections: Vec<SelectedAddOn>,
    pub total_count: u32,
    pub shipping_amount: f64,
    pub total_pledge_amount: f64,
}

/// Most units of `add_on` one backer can take, `None` if unbounded.
pub fn max_quantity(add_on: &Reward) -> Option<u32> {
    match (add_on.limit, add_on.remaining) {
        (Some(limit), Some(remaining)) => Some(limit.min(remaining)),
        (limit, remaining) => limit.or(remaining),
    }
}

/// Like [`max_quantity`], but units the backer already holds count as
/// available: `remaining` excludes them.
pub fn max_quantity_for_backer(add_on: &Reward, backed: u32) -> Option<u32> {
    let remaining = add_on.remaining.map(|r| r.saturating_add(backed));
    match (add_on.limit, remaining) {
        (Some(limit), Some(remaining)) => Some(limit.min(remaining)),
        (limit, remaining) => limit.or(remaining),
    }
}

pub struct AddOnsViewModel {
    viewer: ViewerConfig,
    analytics: Arc<dyn AnalyticsSink>,
    state: AddOnsUiState,
    quantities: HashMap<i64, u32>,
    /// Quantities already on the backing. These add-ons stay offered even
    /// when no longer available.
    backed_add_ons: HashMap<i64, u32>,
    ui: watch::Sender<AddOnsUiState>,
}

impl AddOnsViewModel {
    pub fn new(viewer: ViewerConfig, analytics: Arc<dyn AnalyticsSink>) -> Self {
        let (ui, _) = watch::channel(AddOnsUiState::default());
        Self {
            viewer,
            analytics,
            state: AddOnsUiState::default(),
            quantities: HashMap::new(),
            backed_add_ons: HashMap::new(),
            ui,
        }
    }

    pub fn state(&self) -> &AddOnsUiState {
        &self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<AddOnsUiState> {
        self.ui.subscribe()
    }

    fn flow_context(&self) -> PledgeFlowContext {
        PledgeFlowContext::for_pledge_reason(pledge_reason_for(&self.state.project))
    }

    /// Forget the reward, picks and shipping destination.
    pub fn reset(&mut self) {
        self.state = AddOnsUiState::default();
        self.quantities.clear();
        self.backed_add_ons.clear();
        self.ui.send_replace(self.state.clone());
    }

    /// Start picking add-ons for `reward`.
    ///
    /// `selected_rule` is the destination carried over from the carousel;
    /// without one the viewer's country picks the default.
    pub fn provide_selection(
        &mut self,
        project_data: ProjectData,
        reward: Reward,
        shipping_rules: Vec<ShippingRule>,
        selected_rule: Option<ShippingRule>,
    ) {
        let ships = requires_shipping_selection(&reward) && !is_digital(&reward);
        let shipping_rule = if ships {
            selected_rule
                .filter(|rule| !rule.is_empty())
                .or_else(|| default_shipping_rule(&shipping_rules, &self.viewer.country_code))
                .unwrap_or_else(ShippingRule::empty)
        } else {
            ShippingRule::empty()
        };

        // Updating the same reward starts from what was already bought.
        self.quantities = project_data
            .backing()
            .filter(|backing| is_backed(backing, &reward))
            .map(|backing| {
                backing
                    .add_ons
                    .iter()
                    .map(|add_on| (add_on.id, add_on.quantity.unwrap_or(1)))
                    .collect()
            })
            .unwrap_or_default();
        self.backed_add_ons = self.quantities.clone();

        info!(
            "Add-ons for reward {} ({} preselected, shipping to {:?})",
            reward.id,
            self.quantities.len(),
            shipping_rule.location_id()
        );

        self.state = AddOnsUiState {
            project: project_data,
            reward,
            shipping_rule,
            shipping_rules: if ships { shipping_rules } else { Vec::new() },
            show_shipping_selector: ships,
            ..AddOnsUiState::default()
        };
        self.recompute();

        self.analytics.track(
            TrackedEvent::new(
                AnalyticsEvent::AddOnsPageViewed,
                &self.state.project.project,
                self.flow_context(),
            )
            .with_reward(&self.state.reward),
        );
    }

    /// Set the quantity of one add-on. Clamped to what the add-on has left,
    /// plus what the backer already holds; zero removes it.
    pub fn on_add_on_quantity_changed(&mut self, reward_id: i64, quantity: u32) {
        let Some(add_on) = self.state.add_ons.iter().find(|a| a.id == reward_id) else {
            debug!("Ignoring quantity for unknown add-on {reward_id}");
            return;
        };
        let max = match self.backed_add_ons.get(&reward_id) {
            Some(&backed) => max_quantity_for_backer(add_on, backed),
            None => max_quantity(add_on),
        };
        let clamped = max.map_or(quantity, |max| quantity.min(max));
        if clamped == 0 {
            self.quantities.remove(&reward_id);
        } else {
            self.quantities.insert(reward_id, clamped);
        }
        self.recompute();
    }

    pub fn select_shipping_rule(&mut self, rule: ShippingRule) {
        if !self.state.show_shipping_selector {
            debug!("Reward does not ship, keeping empty shipping rule");
            return;
        }
        self.state.shipping_rule = rule;
        self.recompute();
    }

    /// Commit the picks. Returns each picked add-on with its quantity.
    pub fn on_continue_clicked(&mut self) -> Vec<(Reward, u32)> {
        let picked = self.picked();
        self.analytics.track(
            TrackedEvent::new(
                AnalyticsEvent::AddOnsContinueCta,
                &self.state.project.project,
                self.flow_context(),
            )
            .with_reward(&self.state.reward)
            .with_add_ons(self.state.total_count)
            .with_shipping_amount(self.state.shipping_amount),
        );
        picked
    }

    fn picked(&self) -> Vec<(Reward, u32)> {
        self.state
            .selections
            .iter()
            .filter_map(|s| {
                self.state
                    .add_ons
                    .iter()
                    .find(|a| a.id == s.reward_id)
                    .map(|a| (a.clone(), s.quantity))
            })
            .collect()
    }

    fn recompute(&mut self) {
        let now = Utc::now();
        let project = &self.state.project.project;
        let location = self.state.shipping_rule.location_id();
        let backed_add_ons = &self.backed_add_ons;

        let add_ons: Vec<Reward> = project
            .add_ons
            .iter()
            .filter(|a| {
                backed_add_ons.contains_key(&a.id)
                    || (is_available(project, a, now) && ships_to(a, location))
            })
            .cloned()
            .collect();

        // Picks for add-ons no longer offered are dropped.
        self.quantities
            .retain(|id, _| add_ons.iter().any(|a| a.id == *id));

        self.state.selections = add_ons
            .iter()
            .filter_map(|a| {
                self.quantities.get(&a.id).map(|&quantity| SelectedAddOn {
                    reward_id: a.id,
                    quantity,
                })
            })
            .collect();
        self.state.add_ons = add_ons;
        self.state.total_count = self.state.selections.iter().map(|s| s.quantity).sum();

        let picked = self.picked();
        self.state.shipping_amount =
            shipping_amount(&self.state.shipping_rule, &self.state.reward, &picked);
        let add_ons_total: f64 = picked
            .iter()
            .map(|(a, quantity)| a.minimum * f64::from(*quantity))
            .sum();
        self.state.total_pledge_amount =
            self.state.reward.minimum + add_ons_total + self.state.shipping_amount;

        self.ui.send_replace(self.state.clone());
    }
}
