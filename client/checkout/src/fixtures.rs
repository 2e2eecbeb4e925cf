//! Project and comment fragments read from disk.
//!
//! Files hold the raw GraphQL fragment JSON; the transformers turn them into
//! models exactly as a live response would be.

use std::path::Path;

use tracing::debug;

use pledge_domain::fragments::{CommentConnectionFragment, ProjectFragment};
use pledge_domain::transformers::{comments_page_transformer, project_transformer};
use pledge_domain::{CommentsPage, Project};

use crate::errors::Result;

pub fn parse_project(raw: &str) -> Result<Project> {
    let fragment: ProjectFragment = serde_json::from_str(raw)?;
    Ok(project_transformer(Some(&fragment)))
}

pub fn parse_comments(raw: &str) -> Result<CommentsPage> {
    let fragment: CommentConnectionFragment = serde_json::from_str(raw)?;
    Ok(comments_page_transformer(Some(&fragment)))
}

pub async fn load_project(path: &Path) -> Result<Project> {
    debug!("Reading project fixture {}", path.display());
    let raw = tokio::fs::read_to_string(path).await?;
    parse_project(&raw)
}

pub async fn load_comments(path: &Path) -> Result<CommentsPage> {
    debug!("Reading comments fixture {}", path.display());
    let raw = tokio::fs::read_to_string(path).await?;
    parse_comments(&raw)
}
