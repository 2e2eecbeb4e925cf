//! # Checkout flow
//!
//! Page state machine of the pledge sheet.
//!
//! ```text
//!                  select (add-ons)        continue            continue + logged in
//! RewardCarousel ──────────────────► AddOns ────────► ConfirmDetails ──────────────────► Checkout
//!       │  └───────────────────────────────────────────────►┘ select (no add-ons)
//!       │ back                                                  │ back
//!       ▼                                                       ▼
//!   collapsed                                 AddOns if the reward has add-ons, else RewardCarousel
//! ```
//!
//! `expanded` is orthogonal to the page: it says whether the sheet is shown at
//! all. Completing a pledge is not a page; it is reported on a separate
//! completion channel and resets the flow.

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use pledge_domain::reward_utils::has_add_ons;
use pledge_domain::Reward;

use crate::collaborators::Identity;

/// Wizard page, in display order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPage {
    #[default]
    RewardCarousel,
    AddOns,
    ConfirmDetails,
    Checkout,
}

impl CheckoutPage {
    pub fn index(self) -> usize {
        match self {
            Self::RewardCarousel => 0,
            Self::AddOns => 1,
            Self::ConfirmDetails => 2,
            Self::Checkout => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::RewardCarousel),
            1 => Some(Self::AddOns),
            2 => Some(Self::ConfirmDetails),
            3 => Some(Self::Checkout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowUiState {
    pub current_page: CheckoutPage,
    pub expanded: bool,
}

/// How a pledge attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeOutcome {
    Created,
    Updated,
    Canceled,
}

/// Capacity of the completion channel; hosts read it promptly.
const COMPLETION_CAPACITY: usize = 8;

pub struct CheckoutFlowViewModel {
    state: FlowUiState,
    selected_reward_has_add_ons: bool,
    ui: watch::Sender<FlowUiState>,
    completions: broadcast::Sender<PledgeOutcome>,
}

impl Default for CheckoutFlowViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlowViewModel {
    pub fn new() -> Self {
        let (ui, _) = watch::channel(FlowUiState::default());
        let (completions, _) = broadcast::channel(COMPLETION_CAPACITY);
        Self {
            state: FlowUiState::default(),
            selected_reward_has_add_ons: false,
            ui,
            completions,
        }
    }

    pub fn state(&self) -> FlowUiState {
        self.state
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowUiState> {
        self.ui.subscribe()
    }

    pub fn completions(&self) -> broadcast::Sender<PledgeOutcome> {
        self.completions.clone()
    }

    fn emit(&mut self, current_page: CheckoutPage, expanded: bool) {
        self.state = FlowUiState {
            current_page,
            expanded,
        };
        debug!(
            "Checkout flow → page {} (expanded={expanded})",
            current_page.index()
        );
        self.ui.send_replace(self.state);
    }

    /// A reward was committed on the carousel.
    pub fn on_reward_selected(&mut self, reward: &Reward) {
        self.selected_reward_has_add_ons = has_add_ons(reward);
        let next = if self.selected_reward_has_add_ons {
            CheckoutPage::AddOns
        } else {
            CheckoutPage::ConfirmDetails
        };
        self.emit(next, true);
    }

    pub fn on_add_ons_continue_clicked(&mut self) {
        if self.state.current_page != CheckoutPage::AddOns {
            debug!("Ignoring add-ons continue outside the add-ons page");
            return;
        }
        self.emit(CheckoutPage::ConfirmDetails, true);
    }

    /// Advance to payment if the viewer is logged in, otherwise ask the host to
    /// log them in and stay put. Reads the login signal once.
    ///
    /// Returns whether the flow advanced.
    pub fn on_confirm_details_continue_clicked(&mut self, identity: &dyn Identity) -> bool {
        if self.state.current_page != CheckoutPage::ConfirmDetails {
            debug!("Ignoring confirm continue outside the confirm page");
            return false;
        }
        let logged_in = *identity.logged_in().borrow();
        if logged_in {
            self.emit(CheckoutPage::Checkout, true);
            true
        } else {
            info!("Viewer not logged in, requesting login before checkout");
            identity.start_login();
            false
        }
    }

    pub fn on_back_pressed(&mut self) {
        match self.state.current_page {
            CheckoutPage::RewardCarousel => self.emit(CheckoutPage::RewardCarousel, false),
            CheckoutPage::AddOns => self.emit(CheckoutPage::RewardCarousel, true),
            CheckoutPage::ConfirmDetails => {
                let previous = if self.selected_reward_has_add_ons {
                    CheckoutPage::AddOns
                } else {
                    CheckoutPage::RewardCarousel
                };
                self.emit(previous, true);
            }
            CheckoutPage::Checkout => self.emit(CheckoutPage::ConfirmDetails, true),
        }
    }

    /// The host reports the pledge finished; collapse and notify listeners.
    pub fn on_pledge_completed(&mut self, outcome: PledgeOutcome) {
        info!("Pledge flow completed: {outcome:?}");
        self.selected_reward_has_add_ons = false;
        self.emit(CheckoutPage::RewardCarousel, false);
        // No listener is fine; the host may have gone away already.
        let _ = self.completions.send(outcome);
    }
}
