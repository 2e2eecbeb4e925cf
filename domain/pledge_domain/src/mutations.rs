//! Input objects for the GraphQL mutations the pledge flow sends.
//!
//! Ids are relay-encoded here so callers only ever handle domain ids.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::relay::encode_relay_id;
use crate::types::{Backing, Project, Reward};

/// One purchased line item reported to third-party attribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyEventItem {
    pub item_id: String,
    pub item_name: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerThirdPartyEventInput {
    pub device_id: String,
    pub event_name: String,
    pub project_id: String,
    pub pledge_amount: Option<f64>,
    pub shipping_amount: Option<f64>,
    pub items: Vec<ThirdPartyEventItem>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttributionEventInput {
    pub event_name: String,
    pub event_properties: Value,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrUpdateBackingAddressInput {
    pub backing_id: String,
    pub address_id: String,
}

/// Reward plus selected add-ons, as the checkout reports them.
#[derive(Debug, Clone, Default)]
pub struct CheckoutLineItems<'a> {
    pub reward: Option<&'a Reward>,
    /// Add-ons with their selected quantity.
    pub add_ons: &'a [(Reward, u32)],
}

fn line_item(reward: &Reward, quantity: u32) -> ThirdPartyEventItem {
    ThirdPartyEventItem {
        item_id: encode_relay_id(reward),
        item_name: reward.title.clone().unwrap_or_default(),
        price: reward.minimum,
        quantity,
    }
}

pub fn trigger_third_party_event_mutation(
    device_id: &str,
    event_name: &str,
    project: &Project,
    line_items: &CheckoutLineItems<'_>,
    pledge_amount: Option<f64>,
    shipping_amount: Option<f64>,
    user_id: Option<i64>,
) -> TriggerThirdPartyEventInput {
    let items = line_items
        .reward
        .map(|r| line_item(r, 1))
        .into_iter()
        .chain(
            line_items
                .add_ons
                .iter()
                .filter(|(_, qty)| *qty > 0)
                .map(|(r, qty)| line_item(r, *qty)),
        )
        .collect();

    TriggerThirdPartyEventInput {
        device_id: device_id.to_string(),
        event_name: event_name.to_string(),
        project_id: encode_relay_id(project),
        pledge_amount,
        shipping_amount,
        items,
        user_id: user_id.map(|id| id.to_string()),
    }
}

pub fn create_attribution_event_mutation(
    event_name: &str,
    project: &Project,
    properties: Map<String, Value>,
) -> CreateAttributionEventInput {
    CreateAttributionEventInput {
        event_name: event_name.to_string(),
        event_properties: Value::Object(properties),
        project_id: encode_relay_id(project),
    }
}

pub fn create_or_update_backing_address_mutation(
    backing: &Backing,
    address_id: &str,
) -> CreateOrUpdateBackingAddressInput {
    CreateOrUpdateBackingAddressInput {
        backing_id: encode_relay_id(backing),
        address_id: address_id.to_string(),
    }
}
