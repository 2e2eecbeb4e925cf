use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::time::timeout;

use pledge_domain::Reward;

use crate::add_ons::AddOnsUiState;
use crate::checkout_flow::{CheckoutPage, FlowUiState, PledgeOutcome};
use crate::config::ViewerConfig;
use crate::errors::CheckoutError;
use crate::events::AnalyticsEvent;
use crate::session::{spawn, Intent, SessionHandle};
use crate::testutil::*;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    session: SessionHandle,
    shipping: Arc<FakeShipping>,
    identity: Arc<FakeIdentity>,
    analytics: Arc<RecordingAnalytics>,
}

fn start(shipping: FakeShipping, logged_in: bool) -> Harness {
    let shipping = Arc::new(shipping);
    let identity = Arc::new(FakeIdentity::new(logged_in));
    let analytics = Arc::new(RecordingAnalytics::default());
    let session = spawn(
        shipping.clone(),
        ViewerConfig::default(),
        identity.clone(),
        analytics.clone(),
        8,
    );
    Harness {
        session,
        shipping,
        identity,
        analytics,
    }
}

async fn wait_for<T: Clone>(rx: &mut watch::Receiver<T>, f: impl FnMut(&T) -> bool) -> T {
    timeout(WAIT, rx.wait_for(f))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session dropped its snapshot channel")
        .clone()
}

async fn eventually(mut f: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !f() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

async fn wait_page(flow: &mut watch::Receiver<FlowUiState>, page: CheckoutPage, expanded: bool) {
    wait_for(flow, |s| s.current_page == page && s.expanded == expanded).await;
}

fn reward_with_add_ons() -> Reward {
    with_add_ons(digital_reward(1))
}

async fn load(h: &Harness, rewards: Vec<Reward>, add_ons: Vec<Reward>) {
    let mut carousel = h.session.rewards();
    h.session
        .send(Intent::ProvideProjectData(project_data(live_project(rewards, add_ons))))
        .await
        .unwrap();
    wait_for(&mut carousel, |s| !s.rewards.is_empty()).await;
}

#[tokio::test]
async fn test_full_walk_through_session() {
    let mut h = start(FakeShipping::with_rules(vec![rule(1, "US", 5.0)]), false);
    let mut flow = h.session.flow();
    load(&h, vec![reward_with_add_ons()], vec![add_on(50)]).await;
    assert_eq!(*flow.borrow(), FlowUiState::default());

    h.session
        .send(Intent::SelectReward(reward_with_add_ons()))
        .await
        .unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;

    h.session
        .send(Intent::ChangeAddOnQuantity {
            reward_id: 50,
            quantity: 2,
        })
        .await
        .unwrap();
    let mut add_ons = h.session.add_ons();
    wait_for(&mut add_ons, |s| s.total_count == 2).await;

    h.session.send(Intent::AddOnsContinue).await.unwrap();
    wait_page(&mut flow, CheckoutPage::ConfirmDetails, true).await;

    h.session.send(Intent::ConfirmDetailsContinue).await.unwrap();
    let identity = h.identity.clone();
    eventually(|| identity.login_requests() == 1).await;
    assert_eq!(flow.borrow().current_page, CheckoutPage::ConfirmDetails);

    h.identity.log_in();
    h.session.send(Intent::ConfirmDetailsContinue).await.unwrap();
    wait_page(&mut flow, CheckoutPage::Checkout, true).await;
    assert_eq!(h.identity.login_requests(), 1);

    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::ConfirmDetails, true).await;
    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;
    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::RewardCarousel, true).await;
    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::RewardCarousel, false).await;

    assert_eq!(
        h.analytics.kinds(),
        vec![
            AnalyticsEvent::RewardsCarouselViewed,
            AnalyticsEvent::SelectRewardCta,
            AnalyticsEvent::AddOnsPageViewed,
            AnalyticsEvent::AddOnsContinueCta,
            AnalyticsEvent::CheckoutPaymentPageViewed,
        ]
    );
    let payment_viewed = h.analytics.events.lock().unwrap()[4].clone();
    assert_eq!(payment_viewed.reward_id, Some(1));
    assert_eq!(payment_viewed.add_on_count, 2);

    h.session.shutdown().await;
}

#[tokio::test]
async fn test_completion_is_broadcast_and_resets_flow() {
    let mut h = start(FakeShipping::default(), true);
    let mut flow = h.session.flow();
    let mut completions = h.session.subscribe_completions();
    load(&h, vec![digital_reward(1)], vec![]).await;

    h.session
        .send(Intent::SelectReward(digital_reward(1)))
        .await
        .unwrap();
    wait_page(&mut flow, CheckoutPage::ConfirmDetails, true).await;
    h.session.send(Intent::ConfirmDetailsContinue).await.unwrap();
    wait_page(&mut flow, CheckoutPage::Checkout, true).await;

    h.session
        .send(Intent::PledgeCompleted(PledgeOutcome::Created))
        .await
        .unwrap();
    let outcome = timeout(WAIT, completions.recv()).await.unwrap().unwrap();
    assert_eq!(outcome, PledgeOutcome::Created);
    wait_page(&mut flow, CheckoutPage::RewardCarousel, false).await;
    assert_eq!(
        h.analytics.kinds().last(),
        Some(&AnalyticsEvent::PledgeSubmitted)
    );

    h.session.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_cancels_pending_shipping_fetch() {
    let gate = Arc::new(Notify::new());
    let mut h = start(
        FakeShipping {
            gate: Some(gate.clone()),
            ..FakeShipping::with_rules(vec![rule(1, "US", 5.0)])
        },
        false,
    );
    let carousel = h.session.rewards();

    h.session
        .send(Intent::ProvideProjectData(project_data(live_project(
            vec![digital_reward(1)],
            vec![],
        ))))
        .await
        .unwrap();
    let shipping = h.shipping.clone();
    eventually(|| shipping.calls.load(Ordering::SeqCst) == 1).await;

    h.session.shutdown().await;
    gate.notify_one();

    assert!(carousel.borrow().rewards.is_empty());
    assert!(h.analytics.kinds().is_empty());
    assert!(matches!(
        h.session.send(Intent::BackPressed).await,
        Err(CheckoutError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_intents_wait_for_pending_fetch() {
    let gate = Arc::new(Notify::new());
    let mut h = start(
        FakeShipping {
            gate: Some(gate.clone()),
            ..FakeShipping::with_rules(vec![rule(1, "US", 5.0)])
        },
        true,
    );
    let mut flow = h.session.flow();
    let mut carousel = h.session.rewards();

    h.session
        .send(Intent::ProvideProjectData(project_data(live_project(
            vec![digital_reward(1)],
            vec![],
        ))))
        .await
        .unwrap();
    h.session
        .send(Intent::SelectReward(digital_reward(1)))
        .await
        .unwrap();
    let shipping = h.shipping.clone();
    eventually(|| shipping.calls.load(Ordering::SeqCst) == 1).await;
    assert_eq!(flow.borrow().current_page, CheckoutPage::RewardCarousel);

    gate.notify_one();
    let loaded = wait_for(&mut carousel, |s| s.selected_reward.is_some()).await;
    assert_eq!(loaded.shipping.selected_shipping_rule.id, 1);
    wait_page(&mut flow, CheckoutPage::ConfirmDetails, true).await;

    h.session.shutdown().await;
}

#[tokio::test]
async fn test_shipping_rule_routes_to_active_page() {
    let mut h = start(
        FakeShipping::with_rules(vec![rule(1, "US", 5.0), rule(2, "FR", 4.0)]),
        false,
    );
    let rules = vec![rule(1, "US", 5.0), rule(2, "FR", 4.0)];
    let reward = with_add_ons(shippable_reward(1, rules));
    let mut flow = h.session.flow();
    let mut carousel = h.session.rewards();
    let mut add_ons = h.session.add_ons();
    load(&h, vec![reward.clone()], vec![]).await;

    h.session
        .send(Intent::SelectShippingRule(rule(2, "FR", 4.0)))
        .await
        .unwrap();
    wait_for(&mut carousel, |s| s.shipping.selected_shipping_rule.id == 2).await;

    h.session.send(Intent::SelectReward(reward)).await.unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;
    let state = wait_for(&mut add_ons, |s| s.shipping_rule.id == 2).await;
    assert_eq!(state.shipping_amount, 4.0);

    h.session
        .send(Intent::SelectShippingRule(rule(1, "US", 5.0)))
        .await
        .unwrap();
    wait_for(&mut add_ons, |s| s.shipping_rule.id == 1).await;
    assert_eq!(carousel.borrow().shipping.selected_shipping_rule.id, 2);

    h.session.shutdown().await;
}

#[tokio::test]
async fn test_abandoning_sheet_discards_selection() {
    let mut h = start(FakeShipping::default(), true);
    let mut flow = h.session.flow();
    let mut carousel = h.session.rewards();
    let mut add_ons = h.session.add_ons();
    load(&h, vec![reward_with_add_ons()], vec![add_on(50)]).await;

    h.session
        .send(Intent::SelectReward(reward_with_add_ons()))
        .await
        .unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;
    h.session
        .send(Intent::ChangeAddOnQuantity {
            reward_id: 50,
            quantity: 2,
        })
        .await
        .unwrap();
    wait_for(&mut add_ons, |s| s.total_count == 2).await;

    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::RewardCarousel, true).await;
    assert!(carousel.borrow().selected_reward.is_some());

    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::RewardCarousel, false).await;

    let shown = wait_for(&mut carousel, |s| s.selected_reward.is_none()).await;
    assert!(!shown.show_alert_dialog);
    assert_eq!(shown.rewards.len(), 2);
    wait_for(&mut add_ons, |s| *s == AddOnsUiState::default()).await;

    // Coming back starts from nothing picked.
    h.session
        .send(Intent::SelectReward(reward_with_add_ons()))
        .await
        .unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;
    let reopened = wait_for(&mut add_ons, |s| s.reward.id == 1).await;
    assert_eq!(reopened.total_count, 0);
    h.session.send(Intent::AddOnsContinue).await.unwrap();
    wait_page(&mut flow, CheckoutPage::ConfirmDetails, true).await;
    h.session.send(Intent::ConfirmDetailsContinue).await.unwrap();
    wait_page(&mut flow, CheckoutPage::Checkout, true).await;

    let payment_viewed = h.analytics.events.lock().unwrap().last().cloned().unwrap();
    assert_eq!(payment_viewed.event, AnalyticsEvent::CheckoutPaymentPageViewed);
    assert_eq!(payment_viewed.add_on_count, 0);

    h.session.shutdown().await;
}

#[tokio::test]
async fn test_picks_outside_their_page_are_ignored() {
    let mut h = start(FakeShipping::default(), true);
    let mut flow = h.session.flow();
    let carousel = h.session.rewards();
    let mut add_ons = h.session.add_ons();
    load(&h, vec![reward_with_add_ons(), digital_reward(2)], vec![add_on(50)]).await;

    h.session
        .send(Intent::ChangeAddOnQuantity {
            reward_id: 50,
            quantity: 1,
        })
        .await
        .unwrap();
    h.session
        .send(Intent::SelectReward(reward_with_add_ons()))
        .await
        .unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;
    h.session
        .send(Intent::ChangeAddOnQuantity {
            reward_id: 50,
            quantity: 2,
        })
        .await
        .unwrap();
    wait_for(&mut add_ons, |s| s.total_count == 2).await;
    h.session.send(Intent::AddOnsContinue).await.unwrap();
    wait_page(&mut flow, CheckoutPage::ConfirmDetails, true).await;

    h.session
        .send(Intent::ChangeAddOnQuantity {
            reward_id: 50,
            quantity: 1,
        })
        .await
        .unwrap();
    h.session
        .send(Intent::SelectReward(digital_reward(2)))
        .await
        .unwrap();
    h.session.send(Intent::BackPressed).await.unwrap();
    wait_page(&mut flow, CheckoutPage::AddOns, true).await;

    assert_eq!(add_ons.borrow().total_count, 2);
    assert_eq!(
        carousel.borrow().selected_reward.as_ref().map(|r| r.id),
        Some(1)
    );
    let selections = h
        .analytics
        .kinds()
        .into_iter()
        .filter(|k| *k == AnalyticsEvent::SelectRewardCta)
        .count();
    assert_eq!(selections, 1);

    h.session.shutdown().await;
}
