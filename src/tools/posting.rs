// src/tools/posting.rs

//! Publishing: top-level posts and replies, optionally carrying payout
//! options and beneficiaries in the same transaction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use validator::{Validate, ValidationError};

use super::{broadcast_result, default_true, validate_tags};
use crate::blockchain::models::TransactionConfirmation;
use crate::blockchain::operations::{
    Asset, AssetSymbol, Beneficiary, CommentOperation, CommentOptionsOperation,
};
use crate::blockchain::PrivateKey;
use crate::credentials::KeyRole;
use crate::mcp::registry::{ToolDescriptor, ToolError, ToolOutput};
use crate::utils::{comment_permlink, dedupe, normalize_list, post_permlink, ListInput, ListKind, DEFAULT_TAG};
use crate::AppState;

/// Full weight in basis points.
const FULL_WEIGHT: u32 = 10_000;
/// `1000000.000 HBD`
const DEFAULT_MAX_PAYOUT: Asset = Asset {
    amount: 1_000_000_000,
    symbol: AssetSymbol::Hbd,
};

/// A share of the author rewards, weight in basis points.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BeneficiaryParam {
    pub account: String,
    #[schemars(range(min = 1, max = 10000))]
    pub weight: u16,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreatePostParams {
    /// Title of the blog post
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Content of the blog post, can include Markdown formatting
    #[validate(length(min = 1))]
    pub body: String,
    /// Tags for the post, as an array or a comma-separated list
    #[serde(default)]
    #[validate(custom = "validate_tags")]
    pub tags: ListInput,
    /// Accounts that receive a share of the author rewards (weights in basis points)
    #[serde(default)]
    #[validate(custom = "validate_beneficiaries")]
    pub beneficiaries: Option<Vec<BeneficiaryParam>>,
    /// Custom permalink. Generated when omitted.
    #[serde(default)]
    pub permalink: Option<String>,
    /// Maximum accepted payout, e.g. '1000.000 HBD'
    #[serde(default)]
    #[validate(custom = "validate_max_payout")]
    pub max_accepted_payout: Option<String>,
    /// Percent of the payout paid in HBD, in basis points
    #[serde(default)]
    #[validate(range(max = 10000))]
    pub percent_hbd: Option<u16>,
    /// Whether votes are allowed
    #[serde(default = "default_true")]
    pub allow_votes: bool,
    /// Whether curation rewards are allowed
    #[serde(default = "default_true")]
    pub allow_curation_rewards: bool,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreateCommentParams {
    /// Username of the post author or comment you're replying to
    #[validate(length(min = 1))]
    pub parent_author: String,
    /// Permlink of the post or comment you're replying to
    #[validate(length(min = 1))]
    pub parent_permlink: String,
    /// Content of the comment, can include Markdown formatting
    #[validate(length(min = 1))]
    pub body: String,
    /// Custom permalink. Generated when omitted.
    #[serde(default)]
    pub permalink: Option<String>,
    /// Accounts that receive a share of the author rewards (weights in basis points)
    #[serde(default)]
    #[validate(custom = "validate_beneficiaries")]
    pub beneficiaries: Option<Vec<BeneficiaryParam>>,
    /// Maximum accepted payout, e.g. '1000.000 HBD'
    #[serde(default)]
    #[validate(custom = "validate_max_payout")]
    pub max_accepted_payout: Option<String>,
    /// Percent of the payout paid in HBD, in basis points
    #[serde(default)]
    #[validate(range(max = 10000))]
    pub percent_hbd: Option<u16>,
    /// Whether votes are allowed
    #[serde(default = "default_true")]
    pub allow_votes: bool,
    /// Whether curation rewards are allowed
    #[serde(default = "default_true")]
    pub allow_curation_rewards: bool,
}

fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

#[allow(clippy::ptr_arg)]
fn validate_beneficiaries(list: &Vec<BeneficiaryParam>) -> Result<(), ValidationError> {
    let mut total = 0u32;
    for (i, b) in list.iter().enumerate() {
        if b.account.trim().is_empty() {
            return Err(validation_error(
                "beneficiary",
                format!("beneficiary {i} has an empty account"),
            ));
        }
        if b.weight == 0 || u32::from(b.weight) > FULL_WEIGHT {
            return Err(validation_error(
                "beneficiary",
                format!("weight for {} must be between 1 and 10000", b.account),
            ));
        }
        if list[..i].iter().any(|other| other.account == b.account) {
            return Err(validation_error(
                "beneficiary",
                format!("{} is listed more than once", b.account),
            ));
        }
        total += u32::from(b.weight);
    }
    if total > FULL_WEIGHT {
        return Err(validation_error(
            "beneficiary",
            format!("total weight {total} exceeds 10000"),
        ));
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn validate_max_payout(raw: &String) -> Result<(), ValidationError> {
    match raw.parse::<Asset>() {
        Ok(asset) if asset.symbol == AssetSymbol::Hbd && asset.amount >= 0 => Ok(()),
        _ => Err(validation_error(
            "asset",
            format!("{raw} is not an HBD amount such as \"1000.000 HBD\""),
        )),
    }
}

/// Payout settings shared by posts and comments.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutOptions {
    pub max_accepted_payout: Option<Asset>,
    pub percent_hbd: Option<u16>,
    pub allow_votes: bool,
    pub allow_curation_rewards: bool,
    pub beneficiaries: Vec<Beneficiary>,
}

impl PayoutOptions {
    fn new(
        max_accepted_payout: Option<&str>,
        percent_hbd: Option<u16>,
        allow_votes: bool,
        allow_curation_rewards: bool,
        beneficiaries: Option<Vec<BeneficiaryParam>>,
    ) -> Result<Self, ToolError> {
        let max_accepted_payout = max_accepted_payout
            .map(|raw| {
                raw.parse::<Asset>()
                    .map_err(|e| ToolError::Invalid(format!("Error: {e}")))
            })
            .transpose()?;
        let mut beneficiaries: Vec<Beneficiary> = beneficiaries
            .unwrap_or_default()
            .into_iter()
            .map(|b| Beneficiary {
                account: b.account,
                weight: b.weight,
            })
            .collect();
        // the chain rejects unsorted beneficiary lists
        beneficiaries.sort_by(|a, b| a.account.cmp(&b.account));
        Ok(Self {
            max_accepted_payout,
            percent_hbd,
            allow_votes,
            allow_curation_rewards,
            beneficiaries,
        })
    }

    /// `comment_options` to broadcast alongside the comment, if any setting
    /// differs from what the chain assumes.
    pub fn to_operation(&self, author: &str, permlink: &str) -> Option<CommentOptionsOperation> {
        let customized = self.max_accepted_payout.is_some()
            || self.percent_hbd.is_some()
            || !self.beneficiaries.is_empty()
            || !self.allow_votes
            || !self.allow_curation_rewards;
        customized.then(|| CommentOptionsOperation {
            author: author.to_string(),
            permlink: permlink.to_string(),
            max_accepted_payout: self.max_accepted_payout.unwrap_or(DEFAULT_MAX_PAYOUT),
            percent_hbd: self.percent_hbd.unwrap_or(FULL_WEIGHT as u16),
            allow_votes: self.allow_votes,
            allow_curation_rewards: self.allow_curation_rewards,
            beneficiaries: self.beneficiaries.clone(),
        })
    }
}

/// Normalized, deduplicated tags; never empty.
pub fn post_tags(input: &ListInput) -> Result<Vec<String>, ToolError> {
    let tags = dedupe(normalize_list(input, ListKind::Tags)?);
    if tags.is_empty() {
        Ok(vec![DEFAULT_TAG.to_string()])
    } else {
        Ok(tags)
    }
}

fn chosen_permlink(permalink: Option<String>, generate: impl FnOnce() -> String) -> String {
    match permalink {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => generate(),
    }
}

async fn publish(
    state: &AppState,
    comment: CommentOperation,
    options: &PayoutOptions,
    key: &PrivateKey,
) -> Result<TransactionConfirmation, ToolError> {
    let confirmation = match options.to_operation(&comment.author, &comment.permlink) {
        Some(op) => state.hive.comment_with_options(comment, op, key).await?,
        None => state.hive.comment(comment, key).await?,
    };
    Ok(confirmation)
}

pub(crate) fn tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "create_post",
            "Create a new blog post on the Hive blockchain using the configured account credentials.",
            create_post,
        ),
        ToolDescriptor::new(
            "create_comment",
            "Create a comment on an existing Hive post or reply to another comment.",
            create_comment,
        ),
    ]
}

pub async fn create_post(state: AppState, params: CreatePostParams) -> Result<ToolOutput, ToolError> {
    let (author, key) = state.credentials.account_key(KeyRole::Posting)?;

    let tags = post_tags(&params.tags)?;
    let title = params.title;
    let permlink = chosen_permlink(params.permalink, || post_permlink(&title));
    let options = PayoutOptions::new(
        params.max_accepted_payout.as_deref(),
        params.percent_hbd,
        params.allow_votes,
        params.allow_curation_rewards,
        params.beneficiaries,
    )?;

    let comment = CommentOperation {
        parent_author: String::new(),
        // first tag is the category
        parent_permlink: tags[0].clone(),
        author: author.clone(),
        permlink: permlink.clone(),
        title: title.clone(),
        body: params.body,
        json_metadata: json!({ "tags": tags, "app": state.config.app_name }).to_string(),
    };
    let confirmation = publish(&state, comment, &options, &key).await?;
    info!(author = %author, permlink = %permlink, trx_id = %confirmation.id, "Post published");

    Ok(ToolOutput::Json(broadcast_result(
        &state.config,
        &confirmation,
        json!({
            "author": author,
            "permlink": permlink,
            "title": title,
            "tags": tags,
            "url": state.config.post_url(&author, &permlink),
        }),
    )))
}

pub async fn create_comment(
    state: AppState,
    params: CreateCommentParams,
) -> Result<ToolOutput, ToolError> {
    let (author, key) = state.credentials.account_key(KeyRole::Posting)?;

    let parent_permlink = params.parent_permlink;
    let permlink = chosen_permlink(params.permalink, || comment_permlink(&parent_permlink));
    let options = PayoutOptions::new(
        params.max_accepted_payout.as_deref(),
        params.percent_hbd,
        params.allow_votes,
        params.allow_curation_rewards,
        params.beneficiaries,
    )?;

    let comment = CommentOperation {
        parent_author: params.parent_author.clone(),
        parent_permlink: parent_permlink.clone(),
        author: author.clone(),
        permlink: permlink.clone(),
        title: String::new(),
        body: params.body,
        json_metadata: json!({ "app": state.config.app_name }).to_string(),
    };
    let confirmation = publish(&state, comment, &options, &key).await?;
    info!(author = %author, permlink = %permlink, trx_id = %confirmation.id, "Comment published");

    let url = format!(
        "{}#@{}/{}",
        state.config.post_url(&params.parent_author, &parent_permlink),
        author,
        permlink
    );
    Ok(ToolOutput::Json(broadcast_result(
        &state.config,
        &confirmation,
        json!({
            "parent_author": params.parent_author,
            "parent_permlink": parent_permlink,
            "author": author,
            "permlink": permlink,
            "url": url,
        }),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PayoutOptions {
        PayoutOptions::new(None, None, true, true, None).unwrap()
    }

    #[test]
    fn plain_posts_need_no_options() {
        assert_eq!(defaults().to_operation("alice", "hello"), None);
    }

    #[test]
    fn disabling_votes_alone_emits_options() {
        let options = PayoutOptions { allow_votes: false, ..defaults() };
        let op = options.to_operation("alice", "hello").unwrap();
        assert!(!op.allow_votes);
        assert_eq!(op.max_accepted_payout.to_string(), "1000000.000 HBD");
        assert_eq!(op.percent_hbd, 10000);
    }

    #[test]
    fn beneficiaries_are_sorted_by_account() {
        let options = PayoutOptions::new(
            Some("100.000 HBD"),
            None,
            true,
            true,
            Some(vec![
                BeneficiaryParam { account: "carol".into(), weight: 500 },
                BeneficiaryParam { account: "bob".into(), weight: 1000 },
            ]),
        )
        .unwrap();
        let op = options.to_operation("alice", "hello").unwrap();
        let accounts: Vec<&str> = op.beneficiaries.iter().map(|b| b.account.as_str()).collect();
        assert_eq!(accounts, vec!["bob", "carol"]);
        assert_eq!(op.max_accepted_payout.to_string(), "100.000 HBD");
    }

    #[test]
    fn tags_are_deduplicated_and_never_empty() {
        let tags = post_tags(&ListInput::Text("hive, Hive, dev".into())).unwrap();
        assert_eq!(tags, vec!["hive", "dev"]);
        assert_eq!(post_tags(&ListInput::List(vec![])).unwrap(), vec!["blog"]);
        assert_eq!(post_tags(&ListInput::Text(" , ".into())).unwrap(), vec!["blog"]);
    }

    #[test]
    fn beneficiary_weights_are_bounded() {
        let over = vec![
            BeneficiaryParam { account: "bob".into(), weight: 6000 },
            BeneficiaryParam { account: "carol".into(), weight: 6000 },
        ];
        assert!(validate_beneficiaries(&over).is_err());
        let zero = vec![BeneficiaryParam { account: "bob".into(), weight: 0 }];
        assert!(validate_beneficiaries(&zero).is_err());
        let twice = vec![
            BeneficiaryParam { account: "bob".into(), weight: 10 },
            BeneficiaryParam { account: "bob".into(), weight: 10 },
        ];
        assert!(validate_beneficiaries(&twice).is_err());
    }

    #[test]
    fn payout_must_be_hbd() {
        assert!(validate_max_payout(&"10.000 HBD".to_string()).is_ok());
        assert!(validate_max_payout(&"10.000 HIVE".to_string()).is_err());
        assert!(validate_max_payout(&"ten".to_string()).is_err());
    }

    #[test]
    fn explicit_permalink_wins() {
        assert_eq!(chosen_permlink(Some("mine".into()), || "gen".into()), "mine");
        assert_eq!(chosen_permlink(Some("  ".into()), || "gen".into()), "gen");
        assert_eq!(chosen_permlink(None, || "gen".into()), "gen");
    }
}
