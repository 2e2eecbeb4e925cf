#![allow(dead_code)]

use std::collections::HashSet;

use crate::reward_utils::is_no_reward;
use crate::types::{Backing, Category, Project};

/// INV-1: the first reward is the no-reward tier priced at the project minimum.
pub fn assert_no_reward_first(project: &Project) {
    let first = project
        .rewards
        .first()
        .expect("INV-1 violated: project has no rewards at all");
    assert!(
        is_no_reward(first),
        "INV-1 violated: project {} starts with reward {}",
        project.id,
        first.id
    );
    assert_eq!(
        first.minimum, project.minimum_pledge,
        "INV-1 violated: no-reward minimum {} != project minimum {}",
        first.minimum, project.minimum_pledge
    );
}

/// INV-2: exactly one no-reward tier per project.
pub fn assert_single_no_reward(project: &Project) {
    let count = project.rewards.iter().filter(|r| is_no_reward(r)).count();
    assert_eq!(
        count, 1,
        "INV-2 violated: project {} has {} no-reward tiers",
        project.id, count
    );
}

/// INV-3: categories nest at most one level.
pub fn assert_category_depth(category: &Category) {
    if let Some(parent) = &category.parent {
        assert!(
            parent.parent.is_none(),
            "INV-3 violated: category {} has a grandparent",
            category.id
        );
        assert!(parent.id > 0, "INV-3 violated: parent id {} <= 0", parent.id);
    }
}

/// INV-4: collapsed add-ons are unique by id and carry a positive quantity.
pub fn assert_add_ons_collapsed(backing: &Backing) {
    let mut seen = HashSet::new();
    for add_on in &backing.add_ons {
        assert!(
            seen.insert(add_on.id),
            "INV-4 violated: add-on {} listed twice",
            add_on.id
        );
        assert!(
            add_on.quantity.unwrap_or(0) > 0,
            "INV-4 violated: add-on {} has no quantity",
            add_on.id
        );
    }
}

/// Run every stateless project invariant.
pub fn assert_all_project_invariants(project: &Project) {
    assert_no_reward_first(project);
    assert_single_no_reward(project);
    if let Some(category) = &project.category {
        assert_category_depth(category);
    }
    if let Some(backing) = &project.backing {
        assert_add_ons_collapsed(backing);
    }
}
