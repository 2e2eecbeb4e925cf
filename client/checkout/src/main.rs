//! Pledge flow replay.
//!
//! Loads a project fragment from disk, runs it through the transformation
//! layer, and walks a checkout session through a scripted pledge: pick a
//! reward, pick an add-on, confirm, then back out of the sheet. Every
//! snapshot is logged. With `COMMENTS_FIXTURE` set, the comment thread is
//! paged through as well.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use checkout::button_state::pledge_button_state;
use checkout::checkout_flow::CheckoutPage;
use checkout::collaborators::{Identity, LocalIdentity, LoggingAnalytics};
use checkout::comments::{CommentsPager, InMemoryComments, LoadOutcome};
use checkout::config::Config;
use checkout::events::AnalyticsEvent;
use checkout::fixtures;
use checkout::shipping::{shipping_amount, ProjectShippingRules};
use checkout::{Intent, SessionHandle};
use pledge_domain::mutations::{trigger_third_party_event_mutation, CheckoutLineItems};
use pledge_domain::reward_utils::{has_add_ons, is_no_reward};
use pledge_domain::{Project, ProjectData, Reward};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let project = fixtures::load_project(&config.project_fixture).await?;
    info!(
        "Loaded project {} ({}) with {} rewards and {} add-ons",
        project.id,
        project.slug,
        project.rewards.len().saturating_sub(1),
        project.add_ons.len()
    );

    let now = Utc::now();
    for reward in &project.rewards {
        info!(
            reward_id = reward.id,
            minimum = reward.minimum,
            button = pledge_button_state(&project, reward, now).label(),
            "Reward card"
        );
    }

    // ─── Checkout session ─────────────────────────────────
    let identity = Arc::new(LocalIdentity::new(config.logged_in, true));
    let mut session = checkout::spawn(
        ProjectShippingRules,
        config.viewer.clone(),
        identity.clone(),
        Arc::new(LoggingAnalytics),
        config.session_queue_depth,
    );

    let mut flow = session.flow();
    tokio::spawn(async move {
        while flow.changed().await.is_ok() {
            let state = *flow.borrow_and_update();
            info!(
                page = state.current_page.index(),
                expanded = state.expanded,
                "Flow snapshot"
            );
        }
    });

    replay(&session, identity.as_ref(), project.clone()).await?;
    session.shutdown().await;

    // ─── Comments ─────────────────────────────────────────
    if let Some(path) = &config.comments_fixture {
        page_comments(path, &project.slug, config.comments_page_size).await?;
    }

    Ok(())
}

async fn replay(
    session: &SessionHandle,
    identity: &dyn Identity,
    project: Project,
) -> anyhow::Result<()> {
    let mut carousel = session.rewards();
    let mut add_ons = session.add_ons();
    let mut flow = session.flow();

    session
        .send(Intent::ProvideProjectData(ProjectData::new(project)))
        .await?;
    let shown = carousel.wait_for(|s| !s.rewards.is_empty()).await?.clone();
    info!(
        "Carousel shows rewards {:?}, shipping to {:?} (error: {:?})",
        shown.rewards.iter().map(|r| r.id).collect::<Vec<_>>(),
        shown.shipping.selected_shipping_rule.location_id(),
        shown.shipping.error
    );

    let priced = shown.rewards.iter().filter(|r| !is_no_reward(r));
    let Some(reward) = priced
        .clone()
        .find(|r| has_add_ons(r))
        .or_else(|| priced.clone().next())
        .cloned()
    else {
        info!("Project offers no rewards to pick, nothing to replay");
        return Ok(());
    };

    session.send(Intent::SelectReward(reward.clone())).await?;

    if has_add_ons(&reward) {
        flow.wait_for(|s| s.current_page == CheckoutPage::AddOns)
            .await?;
        let offered = add_ons
            .wait_for(|s| s.reward.id == reward.id)
            .await?
            .add_ons
            .first()
            .map(|a| a.id);
        if let Some(reward_id) = offered {
            session
                .send(Intent::ChangeAddOnQuantity {
                    reward_id,
                    quantity: 1,
                })
                .await?;
            let picked = add_ons.wait_for(|s| s.total_count > 0).await?.clone();
            info!(
                "Picked add-on {reward_id}: shipping {:.2}, total {:.2}",
                picked.shipping_amount, picked.total_pledge_amount
            );
        }
        session.send(Intent::AddOnsContinue).await?;
    }

    flow.wait_for(|s| s.current_page == CheckoutPage::ConfirmDetails)
        .await?;
    let mut logged_in = identity.logged_in();
    let was_logged_in = *logged_in.borrow_and_update();
    session.send(Intent::ConfirmDetailsContinue).await?;

    // A logged-out viewer is sent to login first and has to confirm again.
    if !was_logged_in {
        logged_in.wait_for(|v| *v).await?;
        session.send(Intent::ConfirmDetailsContinue).await?;
    }
    flow.wait_for(|s| s.current_page == CheckoutPage::Checkout)
        .await?;

    let picked = add_ons.borrow().clone();
    let chosen: Vec<(Reward, u32)> = if has_add_ons(&reward) {
        picked
            .selections
            .iter()
            .filter_map(|s| {
                picked
                    .add_ons
                    .iter()
                    .find(|a| a.id == s.reward_id)
                    .map(|a| (a.clone(), s.quantity))
            })
            .collect()
    } else {
        Vec::new()
    };
    let (pledge_amount, shipping_total) = if has_add_ons(&reward) {
        (picked.total_pledge_amount, picked.shipping_amount)
    } else {
        let shipping = shipping_amount(&shown.shipping.selected_shipping_rule, &reward, &[]);
        (reward.minimum + shipping, shipping)
    };
    let input = trigger_third_party_event_mutation(
        "replay",
        AnalyticsEvent::CheckoutPaymentPageViewed.as_str(),
        &shown.project.project,
        &CheckoutLineItems {
            reward: Some(&reward),
            add_ons: &chosen,
        },
        Some(pledge_amount),
        Some(shipping_total),
        None,
    );
    info!("Third-party event input: {}", serde_json::to_string(&input)?);

    loop {
        let current = *flow.borrow_and_update();
        if !current.expanded {
            break;
        }
        session.send(Intent::BackPressed).await?;
        flow.changed().await?;
    }

    Ok(())
}

async fn page_comments(path: &Path, project_slug: &str, page_size: u32) -> anyhow::Result<()> {
    let thread = fixtures::load_comments(path).await?;

    let pager = CommentsPager::new(
        InMemoryComments::new(thread.comments),
        project_slug,
        page_size,
    );
    let mut outcome = pager.refresh().await;
    while outcome == LoadOutcome::Loaded && pager.state().has_more {
        outcome = pager.load_more().await;
    }

    let state = pager.state();
    info!(
        "Paged {} of {} comments (last outcome {outcome:?}, error: {:?})",
        state.comments.len(),
        thread.total_count,
        state.error
    );
    Ok(())
}
