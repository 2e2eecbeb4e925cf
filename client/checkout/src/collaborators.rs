//! Seams to the collaborators the pledge flow depends on but does not own.

use std::future::Future;
use std::sync::Arc;

use pledge_domain::{CommentsPage, Project, ShippingRule};
use tokio::sync::watch;
use tracing::info;

use crate::config::ViewerConfig;
use crate::errors::Result;
use crate::events::TrackedEvent;

/// Shipping rules for a project plus the one to preselect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingRulesResult {
    pub rules: Vec<ShippingRule>,
    pub default_rule: ShippingRule,
}

/// Fetches the shipping rules the viewer can choose from.
pub trait ShippingRulesUseCase: Send + Sync {
    fn shipping_rules(
        &self,
        project: &Project,
        viewer: &ViewerConfig,
    ) -> impl Future<Output = Result<ShippingRulesResult>> + Send;
}

impl<T: ShippingRulesUseCase> ShippingRulesUseCase for Arc<T> {
    fn shipping_rules(
        &self,
        project: &Project,
        viewer: &ViewerConfig,
    ) -> impl Future<Output = Result<ShippingRulesResult>> + Send {
        (**self).shipping_rules(project, viewer)
    }
}

/// Fire-and-forget analytics.
pub trait AnalyticsSink: Send + Sync {
    fn track(&self, event: TrackedEvent);
}

/// The signed-in identity of the viewer.
pub trait Identity: Send + Sync {
    /// Observable login state.
    fn logged_in(&self) -> watch::Receiver<bool>;

    /// Ask the host to start its login flow.
    fn start_login(&self);
}

/// Pages through a project's comment thread.
pub trait CommentsSource: Send + Sync {
    fn fetch_page(
        &self,
        project_slug: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> impl Future<Output = Result<CommentsPage>> + Send;
}

/// Analytics sink that writes each event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAnalytics;

impl AnalyticsSink for LoggingAnalytics {
    fn track(&self, event: TrackedEvent) {
        info!(
            event = event.event.as_str(),
            project_id = event.project_id,
            reward_id = ?event.reward_id,
            context = event.context.as_str(),
            "Tracked analytics event"
        );
    }
}

/// In-process identity backed by a watch channel.
///
/// With `auto_login` set, a login request succeeds immediately, which is what
/// the replay binary wants.
#[derive(Debug)]
pub struct LocalIdentity {
    state: watch::Sender<bool>,
    auto_login: bool,
}

impl LocalIdentity {
    pub fn new(logged_in: bool, auto_login: bool) -> Self {
        let (state, _) = watch::channel(logged_in);
        Self { state, auto_login }
    }

    pub fn set_logged_in(&self, logged_in: bool) {
        self.state.send_replace(logged_in);
    }
}

impl Identity for LocalIdentity {
    fn logged_in(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    fn start_login(&self) {
        info!("Login requested");
        if self.auto_login {
            self.set_logged_in(true);
        }
    }
}
