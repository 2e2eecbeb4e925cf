use serde_json::{json, Value};

use crate::fragments::{
    BackingFragment, CategoryFragment, CommentConnectionFragment, CommentFragment, PostFragment,
    ProjectCardFragment, ProjectFragment, RewardFragment,
};
use crate::invariants::{assert_add_ons_collapsed, assert_all_project_invariants};
use crate::relay::encode_relay_id_parts;
use crate::transformers::*;
use crate::types::{
    Backing, Category, Comment, Location, ProjectPermission, ProjectState, Reward,
    ShippingPreference, ShippingRule, Update, User, Video, NO_REWARD_ID, UNRESOLVED_ID,
};

fn gid(type_name: &str, id: i64) -> String {
    encode_relay_id_parts(type_name, id)
}

fn parse<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("fixture should deserialize")
}

fn add_on_node(id: i64) -> Value {
    json!({
        "id": gid("Reward", id),
        "name": format!("Add-on {id}"),
        "amount": { "amount": "5.0", "currency": "USD", "symbol": "$" },
        "rewardType": "addon",
        "limit": 10,
        "limitPerBacker": 3,
        "isAvailable": true
    })
}

fn full_project_fixture() -> Value {
    json!({
        "id": gid("Project", 1_234),
        "pid": 1_234,
        "slug": "super-widget",
        "name": "Super Widget",
        "description": "A widget, but super",
        "state": "LIVE",
        "isLaunched": true,
        "minimumPledge": 5.0,
        "goal": { "amount": "10000.0", "currency": "USD", "symbol": "$" },
        "pledged": { "amount": "2500.5", "currency": "USD", "symbol": "$" },
        "backersCount": 40,
        "currency": "USD",
        "fxRate": 1.0,
        "commentsCount": 7,
        "posts": { "totalCount": 3 },
        "watchesCount": 12,
        "flagging": { "kind": "prohibited" },
        "collaboratorPermissions": ["EDIT_PROJECT", "VIEW_PLEDGES", "SOMETHING_NEW"],
        "category": {
            "id": gid("Category", 52),
            "name": "Hardware",
            "parentCategory": { "id": gid("Category", 16), "name": "Technology" }
        },
        "rewards": {
            "nodes": [
                {
                    "id": gid("Reward", 10),
                    "name": "Early bird",
                    "amount": { "amount": "20.0" },
                    "convertedAmount": { "amount": "18.4" },
                    "limit": 100,
                    "remainingQuantity": 20,
                    "shippingPreference": "restricted",
                    "allowedAddons": true,
                    "isAvailable": true,
                    "shippingRules": [
                        {
                            "id": gid("ShippingRule", 1),
                            "cost": { "amount": "7.5" },
                            "location": { "id": gid("Location", 23_424_977), "name": "United States", "country": "US" }
                        }
                    ]
                },
                {
                    "id": gid("Reward", 11),
                    "name": "Digital copy",
                    "amount": { "amount": "not-a-number" },
                    "shippingPreference": "teleport"
                }
            ]
        },
        "backing": {
            "id": gid("Backing", 900),
            "amount": { "amount": "40.0" },
            "status": "pledged",
            "cancelable": true,
            "reward": { "id": gid("Reward", 10), "allowedAddons": true },
            "addOns": {
                "nodes": [add_on_node(30), add_on_node(30), add_on_node(31)]
            }
        }
    })
}

// ── Limit choice ─────────────────────────────────────────────────────

#[test]
fn test_choose_limit_rule() {
    assert_eq!(choose_limit(None, None), None);
    assert_eq!(choose_limit(Some(5), None), Some(5));
    assert_eq!(choose_limit(None, Some(3)), Some(3));
    assert_eq!(choose_limit(Some(5), Some(3)), Some(3));
    assert_eq!(choose_limit(Some(3), Some(5)), Some(3));
}

#[test]
fn test_choose_limit_negative_means_no_limit() {
    assert_eq!(choose_limit(Some(-1), Some(4)), Some(4));
    assert_eq!(choose_limit(Some(6), Some(-1)), Some(6));
    assert_eq!(choose_limit(Some(-1), Some(-1)), None);
}

// ── Rewards ──────────────────────────────────────────────────────────

#[test]
fn test_reward_money_defaults_and_unknown_preference() {
    let fragment: RewardFragment = parse(json!({
        "id": gid("Reward", 11),
        "amount": { "amount": "oops" },
        "shippingPreference": "teleport"
    }));

    let reward = reward_transformer(Some(&fragment), &[], false, vec![], vec![]);

    assert_eq!(reward.id, 11);
    assert_eq!(reward.minimum, 0.0);
    assert_eq!(reward.converted_minimum, 0.0);
    assert_eq!(reward.late_pledge_amount, 0.0);
    assert_eq!(reward.shipping_preference, ShippingPreference::Unknown);
}

#[test]
fn test_add_on_limit_uses_smaller_bound_but_base_reward_does_not() {
    let add_on: RewardFragment = parse(add_on_node(30));
    let reward = reward_from_fragment(&add_on);
    assert!(reward.is_add_on);
    assert_eq!(reward.limit, Some(3));

    let base: RewardFragment = parse(json!({
        "id": gid("Reward", 1),
        "limit": 10,
        "limitPerBacker": 3
    }));
    assert_eq!(reward_from_fragment(&base).limit, Some(10));
}

#[test]
fn test_expanded_shipping_rules_replace_embedded_rules() {
    let fragment: RewardFragment = parse(json!({
        "id": gid("Reward", 2),
        "shippingRules": [ { "id": gid("ShippingRule", 1), "cost": { "amount": "3.0" } } ]
    }));
    let expanded = vec![ShippingRule {
        id: 99,
        cost: 12.0,
        ..ShippingRule::default()
    }];

    let embedded = reward_transformer(Some(&fragment), &[], false, vec![], vec![]);
    assert_eq!(embedded.shipping_rules.len(), 1);
    assert_eq!(embedded.shipping_rules[0].cost, 3.0);

    let replaced = reward_transformer(Some(&fragment), &expanded, false, vec![], vec![]);
    assert_eq!(replaced.shipping_rules, expanded);
}

#[test]
fn test_shipping_rule_cost_defaults_to_zero() {
    let rule = shipping_rule_transformer(Some(&parse(json!({ "id": gid("ShippingRule", 4) }))));
    assert_eq!(rule.cost, 0.0);
    assert_eq!(rule.id, 4);

    let rule = shipping_rule_transformer(Some(&parse(json!({ "cost": { "amount": "" } }))));
    assert_eq!(rule.cost, 0.0);
    assert_eq!(rule.id, UNRESOLVED_ID);
}

#[test]
fn test_reward_items_transform() {
    let fragment: RewardFragment = parse(json!({
        "id": gid("Reward", 3),
        "items": { "nodes": [
            { "quantity": 2, "item": { "id": gid("RewardItem", 7), "name": "Sticker" } },
            { "quantity": 1, "item": { "id": gid("RewardItem", 8), "name": "Poster" } }
        ] }
    }));
    let reward = reward_from_fragment(&fragment);

    assert_eq!(reward.reward_items.len(), 2);
    assert_eq!(reward.reward_items[0].name, "Sticker");
    assert_eq!(reward.reward_items[0].quantity, 2);
    assert!(reward.add_on_items.is_empty());
}

// ── Add-on collapsing ────────────────────────────────────────────────

#[test]
fn test_get_add_ons_list_counts_repeats() {
    let nodes: Vec<RewardFragment> = [1, 1, 1, 2, 3, 3]
        .into_iter()
        .map(|id| parse(add_on_node(id)))
        .collect();

    let add_ons = get_add_ons_list(&nodes);

    let summary: Vec<(i64, Option<u32>)> = add_ons.iter().map(|r| (r.id, r.quantity)).collect();
    assert_eq!(summary, vec![(1, Some(3)), (2, Some(1)), (3, Some(2))]);
}

#[test]
fn test_get_add_ons_list_fixed_point_on_distinct_input() {
    let nodes: Vec<RewardFragment> = [4, 5, 6]
        .into_iter()
        .map(|id| parse(add_on_node(id)))
        .collect();

    let add_ons = get_add_ons_list(&nodes);

    assert_eq!(add_ons.len(), 3);
    assert!(add_ons.iter().all(|r| r.quantity == Some(1)));
    assert_eq!(
        add_ons.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![4, 5, 6]
    );
}

// ── Backing ──────────────────────────────────────────────────────────

#[test]
fn test_backing_transform_collapses_add_ons() {
    let fragment: BackingFragment = parse(full_project_fixture()["backing"].clone());
    let backing = backing_transformer(Some(&fragment));

    assert_eq!(backing.id, 900);
    assert_eq!(backing.amount, 40.0);
    assert_eq!(backing.reward_id, Some(10));
    assert!(backing.cancelable);
    assert_eq!(backing.add_ons.len(), 2);
    assert_eq!(backing.add_ons[0].quantity, Some(2));
    assert_add_ons_collapsed(&backing);
}

// ── Project ──────────────────────────────────────────────────────────

#[test]
fn test_project_transform_full_fragment() {
    let fragment: ProjectFragment = parse(full_project_fixture());
    let project = project_transformer(Some(&fragment));

    assert_all_project_invariants(&project);
    assert_eq!(project.id, 1_234);
    assert_eq!(project.state, ProjectState::Live);
    assert_eq!(project.rewards.len(), 3);
    assert_eq!(project.rewards[0].id, NO_REWARD_ID);
    assert_eq!(project.rewards[0].minimum, 5.0);
    assert_eq!(project.rewards[1].converted_minimum, 18.4);
    assert!(project.rewards[1].has_add_ons);
    assert_eq!(project.rewards[2].minimum, 0.0);
    assert_eq!(project.pledged, 2500.5);
    assert_eq!(project.updates_count, 3);
    assert!(project.is_flagged);
    assert!(!project.display_prelaunch);
    assert!(project.is_backing);
    assert_eq!(
        project.permissions,
        vec![
            ProjectPermission::EditProject,
            ProjectPermission::ViewPledges,
            ProjectPermission::Unknown
        ]
    );
}

#[test]
fn test_project_minimum_pledge_defaults_to_one() {
    let fragment: ProjectFragment = parse(json!({ "id": gid("Project", 8) }));
    let project = project_transformer(Some(&fragment));

    assert_eq!(project.minimum_pledge, 1.0);
    assert_eq!(project.rewards.len(), 1);
    assert_eq!(project.rewards[0].minimum, 1.0);
    assert!(!project.is_flagged);
    assert!(project.display_prelaunch);
}

#[test]
fn test_absent_fragments_yield_defaults() {
    let project = project_transformer(None);
    assert_all_project_invariants(&project);

    assert_eq!(backing_transformer(None), Backing::default());
    assert_eq!(comment_transformer(None), Comment::default());
    assert_eq!(update_transformer(None), Update::default());
    assert_eq!(category_transformer(None), Category::default());
    assert_eq!(video_transformer(None), Video::default());
    assert_eq!(user_transformer(None), User::default());
    assert_eq!(location_transformer(None), Location::default());
    assert_eq!(
        reward_transformer(None, &[], true, vec![], vec![]),
        Reward::default()
    );
}

#[test]
fn test_project_card_transform_prepends_no_reward() {
    let fragment: ProjectCardFragment = parse(json!({
        "id": gid("Project", 77),
        "name": "Card project",
        "minimumPledge": 3.0,
        "isLaunched": false
    }));
    let project = project_card_transformer(Some(&fragment));

    assert_all_project_invariants(&project);
    assert_eq!(project.id, 77);
    assert_eq!(project.rewards[0].minimum, 3.0);
    assert!(project.display_prelaunch);
}

// ── Category / comment / update ──────────────────────────────────────

#[test]
fn test_category_parent_only_when_positive() {
    let with_parent: CategoryFragment = parse(full_project_fixture()["category"].clone());
    let category = category_transformer(Some(&with_parent));
    let parent = category.parent.as_ref().expect("parent should be built");
    assert_eq!(category.parent_id, Some(16));
    assert_eq!(parent.name, "Technology");
    assert!(parent.parent.is_none());

    let zero_parent: CategoryFragment = parse(json!({
        "id": gid("Category", 16),
        "parentId": gid("Category", 0)
    }));
    let category = category_transformer(Some(&zero_parent));
    assert!(category.parent.is_none());
    assert_eq!(category.parent_id, None);
}

#[test]
fn test_comment_parent_is_optional() {
    let root: CommentFragment = parse(json!({ "id": gid("Comment", 1), "body": "First!" }));
    assert_eq!(comment_transformer(Some(&root)).parent_id, None);

    let reply: CommentFragment = parse(json!({
        "id": gid("Comment", 2),
        "parentId": gid("Comment", 1),
        "repliesCount": 0
    }));
    assert_eq!(comment_transformer(Some(&reply)).parent_id, Some(1));
}

#[test]
fn test_comments_page_keeps_edge_cursors() {
    let fragment: CommentConnectionFragment = parse(json!({
        "edges": [
            { "cursor": "c1", "node": { "id": gid("Comment", 1), "body": "a" } },
            { "cursor": "c2", "node": { "id": gid("Comment", 2), "body": "b" } },
            { "cursor": "c3" }
        ],
        "pageInfo": { "hasNextPage": true }
    }));
    let page = comments_page_transformer(Some(&fragment));

    assert_eq!(page.comments.len(), 2);
    assert_eq!(page.comments[1].cursor.as_deref(), Some("c2"));
    assert_eq!(page.end_cursor.as_deref(), Some("c2"));
    assert!(page.has_next_page);
    assert_eq!(page.total_count, 2);
}

#[test]
fn test_update_body_comes_from_freeform_post() {
    let fragment: PostFragment = parse(json!({
        "id": gid("FreeformPost", 5),
        "title": "Shipping news",
        "number": 4,
        "freeformPost": { "body": "<p>We shipped!</p>" }
    }));
    let update = update_transformer(Some(&fragment));

    assert_eq!(update.id, 5);
    assert_eq!(update.sequence, 4);
    assert_eq!(update.body.as_deref(), Some("<p>We shipped!</p>"));

    let no_body: PostFragment = parse(json!({ "title": "Empty" }));
    assert_eq!(update_transformer(Some(&no_body)).body, None);
}
