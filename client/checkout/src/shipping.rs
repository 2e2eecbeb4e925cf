//! Shipping rule selection and pricing.

use std::collections::HashSet;

use pledge_domain::reward_utils::{is_local_pickup, is_shippable};
use pledge_domain::{Project, Reward, ShippingRule};
use tracing::debug;

use crate::collaborators::{ShippingRulesResult, ShippingRulesUseCase};
use crate::config::ViewerConfig;
use crate::errors::Result;

/// Pick the rule for the viewer's country, else the first rule.
pub fn default_shipping_rule(rules: &[ShippingRule], country_code: &str) -> Option<ShippingRule> {
    rules
        .iter()
        .find(|rule| {
            rule.location
                .as_ref()
                .is_some_and(|l| l.country.eq_ignore_ascii_case(country_code))
        })
        .or_else(|| rules.first())
        .cloned()
}

/// Whether picking a shipping destination makes sense for `reward`.
pub fn requires_shipping_selection(reward: &Reward) -> bool {
    is_shippable(reward) && !is_local_pickup(reward)
}

/// Cost of shipping `reward` to the rule's location, `0.0` when it does not
/// ship there.
pub fn rule_cost_for(reward: &Reward, rule: &ShippingRule) -> f64 {
    if !requires_shipping_selection(reward) || rule.is_empty() {
        return 0.0;
    }
    let location = rule.location_id();
    reward
        .shipping_rules
        .iter()
        .find(|r| r.location_id() == location)
        .map(|r| r.cost)
        .unwrap_or(0.0)
}

/// Shipping for the base reward plus every unit of each selected add-on.
pub fn shipping_amount(rule: &ShippingRule, reward: &Reward, add_ons: &[(Reward, u32)]) -> f64 {
    let add_on_shipping: f64 = add_ons
        .iter()
        .map(|(add_on, quantity)| rule_cost_for(add_on, rule) * f64::from(*quantity))
        .sum();
    rule_cost_for(reward, rule) + add_on_shipping
}

/// Shipping rules derived from the project's own rewards.
///
/// Rules are deduplicated by location; the first rule seen for a location
/// wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectShippingRules;

impl ProjectShippingRules {
    pub fn collect(project: &Project) -> Vec<ShippingRule> {
        let mut seen = HashSet::new();
        project
            .rewards
            .iter()
            .filter(|r| requires_shipping_selection(r))
            .flat_map(|r| r.shipping_rules.iter())
            .filter(|rule| rule.location_id().is_some_and(|id| seen.insert(id)))
            .cloned()
            .collect()
    }
}

impl ShippingRulesUseCase for ProjectShippingRules {
    async fn shipping_rules(
        &self,
        project: &Project,
        viewer: &ViewerConfig,
    ) -> Result<ShippingRulesResult> {
        let rules = Self::collect(project);
        let default_rule =
            default_shipping_rule(&rules, &viewer.country_code).unwrap_or_else(ShippingRule::empty);
        debug!(
            "Collected {} shipping rules for project {} (default location {:?})",
            rules.len(),
            project.id,
            default_rule.location_id()
        );
        Ok(ShippingRulesResult {
            rules,
            default_rule,
        })
    }
}
