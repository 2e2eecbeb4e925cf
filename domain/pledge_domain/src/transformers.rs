//! Fragment → domain transformers.
//!
//! Every transformer takes an optional fragment and always returns an entity:
//! a missing fragment yields the default entity, a malformed field degrades to
//! its default. Nothing here performs I/O or returns an error.

use std::collections::HashMap;

use tracing::debug;

use crate::fragments::{
    BackingFragment, CategoryFragment, CommentConnectionFragment, CommentFragment, Connection,
    LocationFragment, MoneyFragment, PaymentSourceFragment, PostFragment, ProjectCardFragment,
    ProjectFragment, RewardFragment, RewardItemFragment, ShippingRuleFragment, UserFragment,
    VideoFragment,
};
use crate::relay::decode_relay_id;
use crate::types::{
    Backing, Category, Comment, CommentsPage, Location, PaymentSource, Project, ProjectPermission,
    ProjectState, Reward, RewardItem, ShippingPreference, ShippingRule, Update, User, Video,
    DEFAULT_MINIMUM_PLEDGE, UNRESOLVED_ID,
};

// ─────────────────────────────────────────────────────────
// Scalar helpers
// ─────────────────────────────────────────────────────────

/// Parse a money fragment's decimal string; absent or malformed → `0.0`.
pub fn money_amount(money: Option<&MoneyFragment>) -> f64 {
    let Some(raw) = money.and_then(|m| m.amount.as_deref()) else {
        return 0.0;
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            debug!("Ignoring malformed amount {raw:?}");
            0.0
        }
    }
}

fn decode_id(id: Option<&str>) -> i64 {
    id.and_then(decode_relay_id).unwrap_or(UNRESOLVED_ID)
}

/// Negative counts from the API mean "not set".
fn non_negative(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

// ─────────────────────────────────────────────────────────
// Leaf entities
// ─────────────────────────────────────────────────────────

pub fn location_transformer(fragment: Option<&LocationFragment>) -> Location {
    let Some(f) = fragment else {
        return Location::default();
    };
    let name = f.name.clone().unwrap_or_default();
    Location {
        id: decode_id(f.id.as_deref()),
        displayable_name: f.displayable_name.clone().unwrap_or_else(|| name.clone()),
        name,
        country: f.country.clone().unwrap_or_default(),
        expanded_country: f.country_name.clone(),
    }
}

pub fn shipping_rule_transformer(fragment: Option<&ShippingRuleFragment>) -> ShippingRule {
    let Some(f) = fragment else {
        return ShippingRule::default();
    };
    ShippingRule {
        id: decode_id(f.id.as_deref()),
        cost: money_amount(f.cost.as_ref()),
        estimated_min: money_amount(f.estimated_min.as_ref()),
        estimated_max: money_amount(f.estimated_max.as_ref()),
        location: f.location.as_ref().map(|l| location_transformer(Some(l))),
    }
}

pub fn shipping_rules_transformer(fragments: &[ShippingRuleFragment]) -> Vec<ShippingRule> {
    fragments
        .iter()
        .map(|f| shipping_rule_transformer(Some(f)))
        .collect()
}

pub fn reward_item_transformer(fragment: Option<&RewardItemFragment>) -> RewardItem {
    let Some(f) = fragment else {
        return RewardItem::default();
    };
    let item = f.item.as_ref();
    RewardItem {
        id: decode_id(item.and_then(|i| i.id.as_deref())),
        name: item.and_then(|i| i.name.clone()).unwrap_or_default(),
        quantity: f.quantity.unwrap_or(0),
    }
}

pub fn reward_items_transformer(items: Option<&Connection<RewardItemFragment>>) -> Vec<RewardItem> {
    items
        .map(|c| {
            c.nodes
                .iter()
                .map(|n| reward_item_transformer(Some(n)))
                .collect()
        })
        .unwrap_or_default()
}

pub fn user_transformer(fragment: Option<&UserFragment>) -> User {
    let Some(f) = fragment else {
        return User::default();
    };
    User {
        id: decode_id(f.id.as_deref()),
        name: f.name.clone().unwrap_or_default(),
        avatar_url: f.image_url.clone(),
        email: f.email.clone(),
        chosen_currency: f.chosen_currency.clone(),
        is_creator: f.is_creator.unwrap_or(false),
        is_email_verified: f.is_email_verified.unwrap_or(false),
    }
}

pub fn payment_source_transformer(fragment: Option<&PaymentSourceFragment>) -> PaymentSource {
    let Some(f) = fragment else {
        return PaymentSource::default();
    };
    PaymentSource {
        id: f.id.clone().unwrap_or_default(),
        payment_type: f.payment_type.clone().unwrap_or_default(),
        card_type: f.card_type.clone().unwrap_or_default(),
        last_four: f.last_four.clone(),
        expiration_date: f.expiration_date,
        state: f.state.clone().unwrap_or_default(),
    }
}

/// Build a category with at most one parent level.
///
/// The parent is materialised only when its decoded id is positive, and it
/// never carries a parent of its own.
pub fn category_transformer(fragment: Option<&CategoryFragment>) -> Category {
    let Some(f) = fragment else {
        return Category::default();
    };
    let parent_fragment = f.parent_category.as_ref();
    let parent_id = f
        .parent_id
        .as_deref()
        .or_else(|| parent_fragment.and_then(|p| p.id.as_deref()))
        .and_then(decode_relay_id)
        .filter(|id| *id > 0);

    let parent = parent_id.map(|id| {
        Box::new(Category {
            id,
            name: parent_fragment
                .and_then(|p| p.name.clone())
                .unwrap_or_default(),
            slug: parent_fragment
                .and_then(|p| p.slug.clone())
                .unwrap_or_default(),
            analytics_name: parent_fragment
                .and_then(|p| p.analytics_name.clone())
                .unwrap_or_default(),
            parent_id: None,
            parent: None,
        })
    });

    Category {
        id: decode_id(f.id.as_deref()),
        name: f.name.clone().unwrap_or_default(),
        slug: f.slug.clone().unwrap_or_default(),
        analytics_name: f.analytics_name.clone().unwrap_or_default(),
        parent_id,
        parent,
    }
}

pub fn video_transformer(fragment: Option<&VideoFragment>) -> Video {
    let Some(f) = fragment else {
        return Video::default();
    };
    let sources = f.video_sources.as_ref();
    Video {
        id: decode_id(f.id.as_deref()),
        base: sources
            .and_then(|s| s.base.as_ref())
            .and_then(|s| s.src.clone()),
        high: sources
            .and_then(|s| s.high.as_ref())
            .and_then(|s| s.src.clone()),
        hls: sources
            .and_then(|s| s.hls.as_ref())
            .and_then(|s| s.src.clone()),
        frame: f.preview_image_url.clone(),
    }
}

pub fn comment_transformer(fragment: Option<&CommentFragment>) -> Comment {
    let Some(f) = fragment else {
        return Comment::default();
    };
    Comment {
        id: decode_id(f.id.as_deref()),
        body: f.body.clone().unwrap_or_default(),
        author: f.author.as_ref().map(|a| user_transformer(Some(a))),
        author_badges: f.author_badges.clone(),
        created_at: f.created_at,
        deleted: f.deleted.unwrap_or(false),
        has_flaggings: f.has_flaggings.unwrap_or(false),
        sustained: f.sustained.unwrap_or(false),
        replies_count: f.replies_count.unwrap_or(0),
        parent_id: f.parent_id.as_deref().and_then(decode_relay_id),
        cursor: None,
    }
}

/// Flatten a comments connection into a page, attaching each edge's cursor.
pub fn comments_page_transformer(fragment: Option<&CommentConnectionFragment>) -> CommentsPage {
    let Some(f) = fragment else {
        return CommentsPage::default();
    };
    let comments = f
        .edges
        .iter()
        .filter_map(|edge| {
            let node = edge.node.as_ref()?;
            Some(Comment {
                cursor: edge.cursor.clone(),
                ..comment_transformer(Some(node))
            })
        })
        .collect::<Vec<_>>();
    let page_info = f.page_info.clone().unwrap_or_default();

    CommentsPage {
        total_count: f.total_count.unwrap_or(comments.len() as u32),
        end_cursor: page_info
            .end_cursor
            .or_else(|| comments.last().and_then(|c| c.cursor.clone())),
        has_next_page: page_info.has_next_page,
        comments,
    }
}

/// Updates take their body from the nested freeform post, not the post itself.
pub fn update_transformer(fragment: Option<&PostFragment>) -> Update {
    let Some(f) = fragment else {
        return Update::default();
    };
    Update {
        id: decode_id(f.id.as_deref()),
        project_id: decode_id(f.project_id.as_deref()),
        title: f.title.clone().unwrap_or_default(),
        body: f.freeform_post.as_ref().and_then(|p| p.body.clone()),
        sequence: f.number.unwrap_or(0),
        published_at: f.published_at,
        comments_count: f.comments_count.unwrap_or(0),
        likes_count: f.likes_count.unwrap_or(0),
        is_public: f.is_public.unwrap_or(false),
        has_liked: f.is_liked.unwrap_or(false),
    }
}

// ─────────────────────────────────────────────────────────
// Rewards
// ─────────────────────────────────────────────────────────

/// Pick the effective limit of an add-on.
///
/// Absent or negative values mean "no limit" and defer to the other bound;
/// when both are set the more restrictive one wins. `None` means unlimited.
pub fn choose_limit(limit_reward: Option<i32>, limit_per_backer: Option<i32>) -> Option<u32> {
    match (non_negative(limit_reward), non_negative(limit_per_backer)) {
        (Some(reward), Some(backer)) => Some(reward.min(backer)),
        (Some(reward), None) => Some(reward),
        (None, Some(backer)) => Some(backer),
        (None, None) => None,
    }
}

/// Transform a reward fragment.
///
/// A non-empty `shipping_rules_expanded` replaces the fragment's embedded
/// rules entirely.
pub fn reward_transformer(
    fragment: Option<&RewardFragment>,
    shipping_rules_expanded: &[ShippingRule],
    allowed_add_ons: bool,
    reward_items: Vec<RewardItem>,
    add_on_items: Vec<RewardItem>,
) -> Reward {
    let Some(f) = fragment else {
        return Reward::default();
    };

    let is_add_on = f.is_add_on();
    let limit = if is_add_on {
        choose_limit(f.limit, f.limit_per_backer)
    } else {
        non_negative(f.limit)
    };

    let shipping_rules = if shipping_rules_expanded.is_empty() {
        shipping_rules_transformer(&f.shipping_rules)
    } else {
        shipping_rules_expanded.to_vec()
    };

    Reward {
        id: decode_id(f.id.as_deref()),
        title: f.name.clone(),
        description: f.description.clone(),
        minimum: money_amount(f.amount.as_ref()),
        converted_minimum: money_amount(f.converted_amount.as_ref()),
        pledge_amount: money_amount(f.pledge_amount.as_ref()),
        late_pledge_amount: money_amount(f.late_pledge_amount.as_ref()),
        limit,
        remaining: non_negative(f.remaining_quantity),
        backers_count: f.backers_count.unwrap_or(0),
        starts_at: f.starts_at,
        ends_at: f.ends_at,
        estimated_delivery_on: f.estimated_delivery_on,
        shipping_preference: f
            .shipping_preference
            .as_deref()
            .map(ShippingPreference::from_wire)
            .unwrap_or_default(),
        shipping_rules,
        local_receipt_location: f
            .local_receipt_location
            .as_ref()
            .map(|l| location_transformer(Some(l))),
        is_add_on,
        has_add_ons: allowed_add_ons,
        is_available: f.is_available.unwrap_or(false),
        reward_items,
        add_on_items,
        quantity: None,
    }
}

/// Transform a reward using only what its own fragment carries.
pub fn reward_from_fragment(fragment: &RewardFragment) -> Reward {
    let items = reward_items_transformer(fragment.items.as_ref());
    if fragment.is_add_on() {
        reward_transformer(Some(fragment), &[], false, Vec::new(), items)
    } else {
        reward_transformer(
            Some(fragment),
            &[],
            fragment.allowed_addons.unwrap_or(false),
            items,
            Vec::new(),
        )
    }
}

/// Collapse a per-unit add-on list into one entry per reward id.
///
/// The API repeats an add-on once for every purchased unit; the result holds
/// each distinct add-on once with `quantity` set to its occurrence count.
/// Output follows first-appearance order.
pub fn get_add_ons_list(nodes: &[RewardFragment]) -> Vec<Reward> {
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut collapsed: Vec<Reward> = Vec::new();

    for node in nodes {
        let id = decode_id(node.id.as_deref());
        match positions.get(&id) {
            Some(&pos) => {
                let entry = &mut collapsed[pos];
                entry.quantity = Some(entry.quantity.unwrap_or(0) + 1);
            }
            None => {
                positions.insert(id, collapsed.len());
                collapsed.push(Reward {
                    quantity: Some(1),
                    ..reward_from_fragment(node)
                });
            }
        }
    }

    collapsed
}

// ─────────────────────────────────────────────────────────
// Aggregates
// ─────────────────────────────────────────────────────────

pub fn backing_transformer(fragment: Option<&BackingFragment>) -> Backing {
    let Some(f) = fragment else {
        return Backing::default();
    };

    let reward = f.reward.as_ref().map(reward_from_fragment);
    let backer = f.backer.as_ref().map(|b| user_transformer(Some(b)));
    let location = f.location.as_ref().map(|l| location_transformer(Some(l)));
    let add_ons = f
        .add_ons
        .as_ref()
        .map(|c| get_add_ons_list(&c.nodes))
        .unwrap_or_default();

    Backing {
        id: decode_id(f.id.as_deref()),
        amount: money_amount(f.amount.as_ref()),
        bonus_amount: money_amount(f.bonus_amount.as_ref()),
        shipping_amount: money_amount(f.shipping_amount.as_ref()),
        sequence: f.sequence.unwrap_or(0),
        status: f.status.clone().unwrap_or_default(),
        cancelable: f.cancelable.unwrap_or(false),
        project_id: decode_id(f.project_id.as_deref()),
        reward_id: reward.as_ref().map(|r| r.id),
        reward,
        add_ons,
        payment_source: f
            .payment_source
            .as_ref()
            .map(|p| payment_source_transformer(Some(p))),
        backer_id: backer.as_ref().map(|b| b.id).unwrap_or(UNRESOLVED_ID),
        backer,
        location_id: location.as_ref().map(|l| l.id),
        location_name: location.as_ref().map(|l| l.displayable_name.clone()),
        location,
        pledged_at: f.pledged_on,
        backer_completed_at: if f.backer_completed.unwrap_or(false) {
            f.pledged_on
        } else {
            None
        },
    }
}

/// Prefix the no-reward tier to a transformed reward list.
fn with_no_reward(minimum_pledge: f64, rewards: impl IntoIterator<Item = Reward>) -> Vec<Reward> {
    std::iter::once(Reward::no_reward(minimum_pledge))
        .chain(rewards)
        .collect()
}

fn rewards_from(connection: Option<&Connection<RewardFragment>>) -> Vec<Reward> {
    connection
        .map(|c| c.nodes.iter().map(reward_from_fragment).collect())
        .unwrap_or_default()
}

/// Full project detail transform.
///
/// `rewards[0]` is always the no-reward tier priced at the project's minimum
/// pledge.
pub fn project_transformer(fragment: Option<&ProjectFragment>) -> Project {
    let Some(f) = fragment else {
        return Project {
            rewards: with_no_reward(DEFAULT_MINIMUM_PLEDGE, []),
            minimum_pledge: DEFAULT_MINIMUM_PLEDGE,
            ..Project::default()
        };
    };

    let minimum_pledge = f.minimum_pledge.unwrap_or(DEFAULT_MINIMUM_PLEDGE);
    let backing = f.backing.as_ref().map(|b| backing_transformer(Some(b)));
    let id = f
        .pid
        .or_else(|| f.id.as_deref().and_then(decode_relay_id))
        .unwrap_or(UNRESOLVED_ID);

    Project {
        id,
        slug: f.slug.clone().unwrap_or_default(),
        name: f.name.clone().unwrap_or_default(),
        blurb: f.description.clone().unwrap_or_default(),
        state: f
            .state
            .as_deref()
            .map(ProjectState::from_wire)
            .unwrap_or_default(),
        is_backing: f.is_backing.unwrap_or(backing.is_some()),
        backing,
        category: f.category.as_ref().map(|c| category_transformer(Some(c))),
        creator: f.creator.as_ref().map(|u| user_transformer(Some(u))),
        location: f.location.as_ref().map(|l| location_transformer(Some(l))),
        video: f.video.as_ref().map(|v| video_transformer(Some(v))),
        rewards: with_no_reward(minimum_pledge, rewards_from(f.rewards.as_ref())),
        add_ons: rewards_from(f.add_ons.as_ref()),
        minimum_pledge,
        goal: money_amount(f.goal.as_ref()),
        pledged: money_amount(f.pledged.as_ref()),
        backers_count: f.backers_count.unwrap_or(0),
        currency: f.currency.clone().unwrap_or_default(),
        currency_symbol: f
            .goal
            .as_ref()
            .and_then(|g| g.symbol.clone())
            .unwrap_or_default(),
        current_currency: f.pledged.as_ref().and_then(|p| p.currency.clone()),
        country: f
            .country
            .as_ref()
            .and_then(|c| c.country.clone())
            .unwrap_or_default(),
        fx_rate: f.fx_rate.unwrap_or(1.0),
        static_usd_rate: f
            .static_usd_rate
            .or(f.project_usd_exchange_rate)
            .unwrap_or(1.0),
        usd_exchange_rate: f.usd_exchange_rate.unwrap_or(1.0),
        launched_at: f.launched_at,
        deadline: f.deadline_at,
        state_changed_at: f.state_changed_at,
        comments_count: f.comments_count.unwrap_or(0),
        updates_count: f.posts.as_ref().and_then(|p| p.total_count).unwrap_or(0),
        watches_count: f.watches_count.unwrap_or(0),
        is_watched: f.is_watched.unwrap_or(false),
        staff_pick: f.is_project_we_love.unwrap_or(false),
        is_flagged: f.flagging.is_some(),
        display_prelaunch: !f.is_launched.unwrap_or(false),
        is_in_post_campaign_pledging_phase: f.is_in_post_campaign_pledging_phase.unwrap_or(false),
        post_campaign_pledging_enabled: f.post_campaign_pledging_enabled.unwrap_or(false),
        permissions: f
            .collaborator_permissions
            .iter()
            .map(|p| ProjectPermission::from_wire(p))
            .collect(),
        available_card_types: f.available_card_types.clone(),
    }
}

/// Discovery-card transform. Cards carry no reward list, so `rewards` holds
/// only the no-reward tier.
pub fn project_card_transformer(fragment: Option<&ProjectCardFragment>) -> Project {
    let Some(f) = fragment else {
        return project_transformer(None);
    };

    let minimum_pledge = f.minimum_pledge.unwrap_or(DEFAULT_MINIMUM_PLEDGE);

    Project {
        id: decode_id(f.id.as_deref()),
        slug: f.slug.clone().unwrap_or_default(),
        name: f.name.clone().unwrap_or_default(),
        blurb: f.description.clone().unwrap_or_default(),
        state: f
            .state
            .as_deref()
            .map(ProjectState::from_wire)
            .unwrap_or_default(),
        category: f.category.as_ref().map(|c| category_transformer(Some(c))),
        location: f.location.as_ref().map(|l| location_transformer(Some(l))),
        rewards: with_no_reward(minimum_pledge, []),
        minimum_pledge,
        goal: money_amount(f.goal.as_ref()),
        pledged: money_amount(f.pledged.as_ref()),
        backers_count: f.backers_count.unwrap_or(0),
        currency: f.currency.clone().unwrap_or_default(),
        currency_symbol: f
            .goal
            .as_ref()
            .and_then(|g| g.symbol.clone())
            .unwrap_or_default(),
        fx_rate: f.fx_rate.unwrap_or(1.0),
        usd_exchange_rate: f.usd_exchange_rate.unwrap_or(1.0),
        static_usd_rate: 1.0,
        launched_at: f.launched_at,
        deadline: f.deadline_at,
        is_watched: f.is_watched.unwrap_or(false),
        staff_pick: f.is_project_we_love.unwrap_or(false),
        display_prelaunch: !f.is_launched.unwrap_or(false),
        is_in_post_campaign_pledging_phase: f.is_in_post_campaign_pledging_phase.unwrap_or(false),
        post_campaign_pledging_enabled: f.post_campaign_pledging_enabled.unwrap_or(false),
        ..Project::default()
    }
}
