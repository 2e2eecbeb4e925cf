//! GraphQL response fragments as they arrive on the wire.
//!
//! Every field is optional so that partial or degraded payloads still
//! deserialize; the transformers decide the defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A `{ nodes: [...] }` connection, optionally with a `totalCount`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default)]
    pub nodes: Vec<T>,
    #[serde(default)]
    pub total_count: Option<u32>,
}

/// A `{ totalCount }` counter wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Count {
    pub total_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoneyFragment {
    /// Decimal string, e.g. `"12.50"`.
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub displayable_name: Option<String>,
    pub country: Option<String>,
    pub country_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingRuleFragment {
    pub id: Option<String>,
    pub cost: Option<MoneyFragment>,
    pub estimated_min: Option<MoneyFragment>,
    pub estimated_max: Option<MoneyFragment>,
    pub location: Option<LocationFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemFragment {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardItemFragment {
    pub quantity: Option<u32>,
    pub item: Option<ItemFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<MoneyFragment>,
    pub converted_amount: Option<MoneyFragment>,
    pub pledge_amount: Option<MoneyFragment>,
    pub late_pledge_amount: Option<MoneyFragment>,
    pub limit: Option<i32>,
    pub limit_per_backer: Option<i32>,
    pub remaining_quantity: Option<i32>,
    pub backers_count: Option<u32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub estimated_delivery_on: Option<DateTime<Utc>>,
    pub shipping_preference: Option<String>,
    pub shipping_rules: Vec<ShippingRuleFragment>,
    pub local_receipt_location: Option<LocationFragment>,
    pub is_available: Option<bool>,
    pub allowed_addons: Option<bool>,
    pub items: Option<Connection<RewardItemFragment>>,
    /// Present only on add-on rewards.
    pub reward_type: Option<String>,
}

impl RewardFragment {
    pub fn is_add_on(&self) -> bool {
        self.reward_type.as_deref() == Some("addon")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentSourceFragment {
    pub id: Option<String>,
    pub payment_type: Option<String>,
    #[serde(rename = "type")]
    pub card_type: Option<String>,
    pub last_four: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub email: Option<String>,
    pub chosen_currency: Option<String>,
    pub is_creator: Option<bool>,
    pub is_email_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParentCategoryFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub analytics_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub analytics_name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_category: Option<ParentCategoryFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSource {
    pub src: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSources {
    pub base: Option<VideoSource>,
    pub high: Option<VideoSource>,
    pub hls: Option<VideoSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoFragment {
    pub id: Option<String>,
    pub preview_image_url: Option<String>,
    pub video_sources: Option<VideoSources>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackingFragment {
    pub id: Option<String>,
    pub amount: Option<MoneyFragment>,
    pub bonus_amount: Option<MoneyFragment>,
    pub shipping_amount: Option<MoneyFragment>,
    pub sequence: Option<i64>,
    pub status: Option<String>,
    pub cancelable: Option<bool>,
    pub pledged_on: Option<DateTime<Utc>>,
    pub backer_completed: Option<bool>,
    pub project_id: Option<String>,
    pub reward: Option<RewardFragment>,
    /// Raw list where each add-on repeats once per purchased unit.
    pub add_ons: Option<Connection<RewardFragment>>,
    pub payment_source: Option<PaymentSourceFragment>,
    pub backer: Option<UserFragment>,
    pub location: Option<LocationFragment>,
}

/// Full project detail fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectFragment {
    pub id: Option<String>,
    pub pid: Option<i64>,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub is_launched: Option<bool>,
    pub minimum_pledge: Option<f64>,
    pub goal: Option<MoneyFragment>,
    pub pledged: Option<MoneyFragment>,
    pub backers_count: Option<u32>,
    pub currency: Option<String>,
    pub country: Option<LocationFragment>,
    pub fx_rate: Option<f64>,
    pub static_usd_rate: Option<f64>,
    pub usd_exchange_rate: Option<f64>,
    pub project_usd_exchange_rate: Option<f64>,
    pub launched_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub state_changed_at: Option<DateTime<Utc>>,
    pub category: Option<CategoryFragment>,
    pub creator: Option<UserFragment>,
    pub location: Option<LocationFragment>,
    pub video: Option<VideoFragment>,
    pub backing: Option<BackingFragment>,
    pub is_backing: Option<bool>,
    pub rewards: Option<Connection<RewardFragment>>,
    pub add_ons: Option<Connection<RewardFragment>>,
    pub comments_count: Option<u32>,
    pub posts: Option<Count>,
    pub watches_count: Option<u32>,
    pub is_watched: Option<bool>,
    pub is_project_we_love: Option<bool>,
    /// Moderation record; only its presence matters.
    pub flagging: Option<Value>,
    pub collaborator_permissions: Vec<String>,
    pub is_in_post_campaign_pledging_phase: Option<bool>,
    pub post_campaign_pledging_enabled: Option<bool>,
    pub available_card_types: Vec<String>,
}

/// Summary fragment used by discovery cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectCardFragment {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub is_launched: Option<bool>,
    pub minimum_pledge: Option<f64>,
    pub goal: Option<MoneyFragment>,
    pub pledged: Option<MoneyFragment>,
    pub backers_count: Option<u32>,
    pub currency: Option<String>,
    pub fx_rate: Option<f64>,
    pub usd_exchange_rate: Option<f64>,
    pub launched_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub category: Option<CategoryFragment>,
    pub location: Option<LocationFragment>,
    pub is_watched: Option<bool>,
    pub is_project_we_love: Option<bool>,
    pub is_in_post_campaign_pledging_phase: Option<bool>,
    pub post_campaign_pledging_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentFragment {
    pub id: Option<String>,
    pub body: Option<String>,
    pub author: Option<UserFragment>,
    pub author_badges: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted: Option<bool>,
    pub has_flaggings: Option<bool>,
    pub sustained: Option<bool>,
    pub replies_count: Option<u32>,
    pub parent_id: Option<String>,
}

/// Edge of a comments connection; the cursor drives pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentEdge {
    pub cursor: Option<String>,
    pub node: Option<CommentFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FreeformPostFragment {
    pub body: Option<String>,
}

/// Top-level post fragment; the body lives on the nested freeform post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostFragment {
    pub id: Option<String>,
    pub title: Option<String>,
    pub number: Option<u32>,
    pub published_at: Option<DateTime<Utc>>,
    pub comments_count: Option<u32>,
    pub likes_count: Option<u32>,
    pub is_public: Option<bool>,
    pub is_liked: Option<bool>,
    pub project_id: Option<String>,
    pub freeform_post: Option<FreeformPostFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentConnectionFragment {
    pub edges: Vec<CommentEdge>,
    pub page_info: Option<PageInfo>,
    pub total_count: Option<u32>,
}
