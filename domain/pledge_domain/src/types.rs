//! # Types
//!
//! Domain model shared by the transformers and the checkout state machines.
//!
//! ## Design decisions
//!
//! ### Plain values instead of builders
//!
//! Every entity is an immutable value struct constructed with named fields.
//! `Default` yields the "empty" entity that transformers fall back to when a
//! fragment is missing, so partial API responses render as blank UI instead
//! of failing.
//!
//! ### Identifiers
//!
//! Ids are decoded from relay ids (see [`crate::relay`]). An id that cannot be
//! decoded resolves to [`UNRESOLVED_ID`]. The synthetic no-reward tier always
//! carries [`NO_REWARD_ID`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel id for a field whose relay id could not be decoded.
pub const UNRESOLVED_ID: i64 = -1;

/// Id reserved for the client-side "pledge without a reward" tier.
pub const NO_REWARD_ID: i64 = 0;

/// Minimum pledge used when a project does not declare one.
pub const DEFAULT_MINIMUM_PLEDGE: f64 = 1.0;

/// How a reward reaches its backers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingPreference {
    /// Digital reward, nothing ships.
    None,
    /// Ships only to the locations listed in the shipping rules.
    Restricted,
    /// Ships anywhere.
    Unrestricted,
    /// Picked up at a local receipt location.
    Local,
    #[default]
    Unknown,
}

impl ShippingPreference {
    /// Map the GraphQL `ShippingPreference` enum value.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "none" | "NONE" => Self::None,
            "restricted" | "RESTRICTED" => Self::Restricted,
            "unrestricted" | "UNRESTRICTED" => Self::Unrestricted,
            "local" | "LOCAL" => Self::Local,
            _ => Self::Unknown,
        }
    }
}

/// Collaborator permission granted on a project.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPermission {
    EditProject,
    EditFaq,
    Post,
    Comment,
    ViewPledges,
    Fulfillment,
    Unknown,
}

impl ProjectPermission {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "edit_project" | "EDIT_PROJECT" => Self::EditProject,
            "edit_faq" | "EDIT_FAQ" => Self::EditFaq,
            "post" | "POST" => Self::Post,
            "comment" | "COMMENT" => Self::Comment,
            "view_pledges" | "VIEW_PLEDGES" => Self::ViewPledges,
            "fulfillment" | "FULFILLMENT" => Self::Fulfillment,
            _ => Self::Unknown,
        }
    }
}

/// Lifecycle state of a project as reported by the API.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    Started,
    Submitted,
    Live,
    Canceled,
    Suspended,
    Purged,
    Successful,
    Failed,
    #[default]
    Unknown,
}

impl ProjectState {
    pub fn from_wire(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "started" => Self::Started,
            "submitted" => Self::Submitted,
            "live" => Self::Live,
            "canceled" => Self::Canceled,
            "suspended" => Self::Suspended,
            "purged" => Self::Purged,
            "successful" => Self::Successful,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// Why the viewer opened the pledge flow.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeReason {
    #[default]
    Pledge,
    UpdateReward,
    UpdatePledge,
    UpdatePayment,
    FixPledge,
    LatePledge,
}

/// Flow context reported to analytics, derived from [`PledgeReason`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PledgeFlowContext {
    #[default]
    NewPledge,
    ChangeReward,
    ManagePledge,
    FixErroredPledge,
    LatePledge,
}

impl PledgeFlowContext {
    pub fn for_pledge_reason(reason: PledgeReason) -> Self {
        match reason {
            PledgeReason::Pledge => Self::NewPledge,
            PledgeReason::UpdateReward => Self::ChangeReward,
            PledgeReason::UpdatePledge | PledgeReason::UpdatePayment => Self::ManagePledge,
            PledgeReason::FixPledge => Self::FixErroredPledge,
            PledgeReason::LatePledge => Self::LatePledge,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewPledge => "new_pledge",
            Self::ChangeReward => "change_reward",
            Self::ManagePledge => "manage_reward",
            Self::FixErroredPledge => "fix_errored_pledge",
            Self::LatePledge => "late_pledge",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub displayable_name: String,
    /// ISO country code, e.g. `US`.
    pub country: String,
    pub expanded_country: Option<String>,
}

/// Price and delivery estimate for shipping a reward to one location.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingRule {
    pub id: i64,
    pub cost: f64,
    pub estimated_min: f64,
    pub estimated_max: f64,
    pub location: Option<Location>,
}

impl ShippingRule {
    /// The sentinel rule used when shipping selection does not apply.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.id == 0
    }

    pub fn location_id(&self) -> Option<i64> {
        self.location.as_ref().map(|l| l.id)
    }
}

/// A physical or digital item bundled inside a reward.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Minimum pledge in the project's currency.
    pub minimum: f64,
    /// Minimum converted to the viewer's currency.
    pub converted_minimum: f64,
    pub pledge_amount: f64,
    pub late_pledge_amount: f64,
    /// `None` means unlimited.
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub backers_count: u32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub estimated_delivery_on: Option<DateTime<Utc>>,
    pub shipping_preference: ShippingPreference,
    pub shipping_rules: Vec<ShippingRule>,
    pub local_receipt_location: Option<Location>,
    pub is_add_on: bool,
    /// Whether add-ons may be combined with this base reward.
    pub has_add_ons: bool,
    pub is_available: bool,
    pub reward_items: Vec<RewardItem>,
    pub add_on_items: Vec<RewardItem>,
    /// Purchased units, only set on add-ons attached to a backing.
    pub quantity: Option<u32>,
}

impl Reward {
    /// The synthetic "pledge without a reward" tier.
    pub fn no_reward(minimum: f64) -> Self {
        Self {
            id: NO_REWARD_ID,
            title: Some("Pledge without a reward".to_string()),
            minimum,
            converted_minimum: minimum,
            shipping_preference: ShippingPreference::None,
            is_available: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSource {
    pub id: String,
    pub payment_type: String,
    pub card_type: String,
    pub last_four: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub state: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub chosen_currency: Option<String>,
    pub is_creator: bool,
    pub is_email_verified: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub analytics_name: String,
    pub parent_id: Option<i64>,
    /// At most one level deep; a parent never carries its own parent.
    pub parent: Option<Box<Category>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub base: Option<String>,
    pub high: Option<String>,
    pub hls: Option<String>,
    pub frame: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Backing {
    pub id: i64,
    pub amount: f64,
    pub bonus_amount: f64,
    pub shipping_amount: f64,
    pub sequence: i64,
    pub status: String,
    pub cancelable: bool,
    pub project_id: i64,
    pub reward_id: Option<i64>,
    pub reward: Option<Reward>,
    /// One entry per distinct add-on, with `quantity` set.
    pub add_ons: Vec<Reward>,
    pub payment_source: Option<PaymentSource>,
    pub backer_id: i64,
    pub backer: Option<User>,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub location: Option<Location>,
    pub pledged_at: Option<DateTime<Utc>>,
    pub backer_completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub blurb: String,
    pub state: ProjectState,
    pub backing: Option<Backing>,
    pub is_backing: bool,
    pub category: Option<Category>,
    pub creator: Option<User>,
    pub location: Option<Location>,
    pub video: Option<Video>,
    /// Always starts with the no-reward tier.
    pub rewards: Vec<Reward>,
    pub add_ons: Vec<Reward>,
    pub minimum_pledge: f64,
    pub goal: f64,
    pub pledged: f64,
    pub backers_count: u32,
    pub currency: String,
    pub currency_symbol: String,
    pub current_currency: Option<String>,
    pub country: String,
    pub fx_rate: f64,
    pub static_usd_rate: f64,
    pub usd_exchange_rate: f64,
    pub launched_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub state_changed_at: Option<DateTime<Utc>>,
    pub comments_count: u32,
    pub updates_count: u32,
    pub watches_count: u32,
    pub is_watched: bool,
    pub staff_pick: bool,
    pub is_flagged: bool,
    pub display_prelaunch: bool,
    pub is_in_post_campaign_pledging_phase: bool,
    pub post_campaign_pledging_enabled: bool,
    pub permissions: Vec<ProjectPermission>,
    pub available_card_types: Vec<String>,
}

impl Project {
    pub fn is_live(&self) -> bool {
        self.state == ProjectState::Live
    }

    /// Whether new pledges are accepted, either live or in a late-pledge window.
    pub fn accepts_pledges(&self) -> bool {
        self.is_live()
            || (self.is_in_post_campaign_pledging_phase && self.post_campaign_pledging_enabled)
    }

    pub fn has_add_ons(&self) -> bool {
        !self.add_ons.is_empty()
    }
}

/// Project plus the context the pledge flow was opened with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub project: Project,
    /// Backing fetched separately from the project, takes precedence.
    pub backing: Option<Backing>,
    pub ref_tag: Option<String>,
    pub pledge_reason: Option<PledgeReason>,
}

impl ProjectData {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    /// The viewer's existing backing, if any.
    pub fn backing(&self) -> Option<&Backing> {
        self.backing.as_ref().or(self.project.backing.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub author: Option<User>,
    pub author_badges: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted: bool,
    pub has_flaggings: bool,
    pub sustained: bool,
    pub replies_count: u32,
    /// `None` for a root-level comment.
    pub parent_id: Option<i64>,
    pub cursor: Option<String>,
}

/// A creator post ("update").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub body: Option<String>,
    pub sequence: u32,
    pub published_at: Option<DateTime<Utc>>,
    pub comments_count: u32,
    pub likes_count: u32,
    pub is_public: bool,
    pub has_liked: bool,
}

/// One page of a project's comment thread.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentsPage {
    pub comments: Vec<Comment>,
    /// Cursor to request the page after this one.
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub total_count: u32,
}
