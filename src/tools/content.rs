// src/tools/content.rs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::blockchain::models::{Content, DiscussionQuery};
use crate::config::Config;
use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::AppState;

/// Sort orders for tag listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TagCategory {
    Active,
    Cashout,
    Children,
    Comments,
    Created,
    Hot,
    Promoted,
    Trending,
    Votes,
}

impl From<TagCategory> for DiscussionQuery {
    fn from(category: TagCategory) -> Self {
        match category {
            TagCategory::Active => DiscussionQuery::Active,
            TagCategory::Cashout => DiscussionQuery::Cashout,
            TagCategory::Children => DiscussionQuery::Children,
            TagCategory::Comments => DiscussionQuery::Comments,
            TagCategory::Created => DiscussionQuery::Created,
            TagCategory::Hot => DiscussionQuery::Hot,
            TagCategory::Promoted => DiscussionQuery::Promoted,
            TagCategory::Trending => DiscussionQuery::Trending,
            TagCategory::Votes => DiscussionQuery::Votes,
        }
    }
}

/// blog = posts by the user, feed = posts from accounts they follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserCategory {
    Blog,
    Feed,
}

impl From<UserCategory> for DiscussionQuery {
    fn from(category: UserCategory) -> Self {
        match category {
            UserCategory::Blog => DiscussionQuery::Blog,
            UserCategory::Feed => DiscussionQuery::Feed,
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetPostContentParams {
    /// Author of the post
    #[validate(length(min = 1))]
    pub author: String,
    /// Permlink of the post
    #[validate(length(min = 1))]
    pub permlink: String,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetPostsByTagParams {
    /// Sorting category for posts
    pub category: TagCategory,
    /// The tag to filter posts by
    #[validate(length(min = 1))]
    pub tag: String,
    /// Number of posts to return
    #[serde(default = "default_post_limit")]
    #[validate(range(min = 1, max = 20))]
    pub limit: u32,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct GetPostsByUserParams {
    /// Type of posts to fetch
    pub category: UserCategory,
    /// Hive username to fetch posts for
    #[validate(length(min = 1))]
    pub username: String,
    /// Number of posts to return
    #[serde(default = "default_post_limit")]
    #[validate(range(min = 1, max = 20))]
    pub limit: u32,
}

fn default_post_limit() -> u32 {
    10
}

/// A post as it appears in a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub author: String,
    pub permlink: String,
    pub created: String,
    pub votes: i64,
    pub payout: String,
    pub url: String,
}

impl PostSummary {
    fn from_content(config: &Config, post: Content) -> Self {
        Self {
            url: config.post_url(&post.author, &post.permlink),
            title: post.title,
            author: post.author,
            permlink: post.permlink,
            created: post.created,
            votes: post.net_votes,
            payout: post.pending_payout_value,
        }
    }
}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_post_content",
            "Retrieves a specific Hive blog post identified by author and permlink, including the post title, content, and metadata.",
            get_post_content,
        ),
        ToolDescriptor::new(
            "get_posts_by_tag",
            "Retrieves Hive posts filtered by a specific tag and sorted by a category like trending, hot, or created.",
            get_posts_by_tag,
        ),
        ToolDescriptor::new(
            "get_posts_by_user",
            "Retrieves posts authored by or in the feed of a specific Hive user.",
            get_posts_by_user,
        ),
    ]
}

pub async fn get_post_content(
    state: AppState,
    params: GetPostContentParams,
) -> Result<ToolOutput, ToolError> {
    let content = state
        .hive
        .get_content(&params.author, &params.permlink)
        .await?;
    if content.author.is_empty() {
        return Err(ToolError::NotFound(format!(
            "Error: Post not found: {}/{}",
            params.author, params.permlink
        )));
    }

    Ok(ToolOutput::Json(json!({
        "title": content.title,
        "author": content.author,
        "body": content.body,
        "created": content.created,
        "last_update": content.last_update,
        "category": content.category,
        "tags": content.tags(),
        "url": state.config.post_url(&params.author, &params.permlink),
    })))
}

pub async fn get_posts_by_tag(
    state: AppState,
    params: GetPostsByTagParams,
) -> Result<ToolOutput, ToolError> {
    let posts = state
        .hive
        .get_discussions(params.category.into(), &params.tag, params.limit)
        .await?;
    summarize(&state.config, posts)
}

pub async fn get_posts_by_user(
    state: AppState,
    params: GetPostsByUserParams,
) -> Result<ToolOutput, ToolError> {
    let posts = state
        .hive
        .get_discussions(params.category.into(), &params.username, params.limit)
        .await?;
    summarize(&state.config, posts)
}

fn summarize(config: &Config, posts: Vec<Content>) -> Result<ToolOutput, ToolError> {
    let summaries: Vec<PostSummary> = posts
        .into_iter()
        .map(|post| PostSummary::from_content(config, post))
        .collect();
    ToolOutput::json(&summaries)
}
