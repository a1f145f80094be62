//! Tool behaviour against an in-memory node.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{
    account, alice_env, call, history_entry, key, payload, state_with, MockHive, TRX_ID,
};
use hive_mcp_server::blockchain::memo;
use hive_mcp_server::blockchain::models::{Content, DiscussionQuery, VestingDelegation};
use hive_mcp_server::blockchain::operations::Operation;
use hive_mcp_server::mcp::handler::handle_mcp_request;
use hive_mcp_server::mcp::protocol::{error_codes, Request};

#[tokio::test]
async fn missing_account_is_reported_as_error() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive, vec![]);

    let resp = call(&state, "get_account_info", json!({"username": "missing-user"})).await;

    assert!(resp.is_error);
    assert!(resp.text().contains("not found"));
    assert_eq!(resp.text(), "Error: Account missing-user not found");
}

#[tokio::test]
async fn account_info_returns_the_raw_account() {
    let hive = Arc::new(MockHive {
        accounts: vec![account("alice", &key("alice-memo"))],
        ..MockHive::default()
    });
    let state = state_with(hive, vec![]);

    let data = payload(&call(&state, "get_account_info", json!({"username": "alice"})).await);

    assert_eq!(data["name"], "alice");
    assert_eq!(data["memo_key"], key("alice-memo").public_key().to_string());
}

#[tokio::test]
async fn vote_without_posting_key_never_broadcasts() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), vec![("HIVE_USERNAME", "alice".to_string())]);

    let resp = call(
        &state,
        "vote_on_post",
        json!({"author": "bob", "permlink": "hello", "weight": 10000}),
    )
    .await;

    assert!(resp.is_error);
    assert!(resp.text().contains("HIVE_POSTING_KEY"));
    assert_eq!(hive.broadcast_count(), 0);
}

#[tokio::test]
async fn vote_broadcasts_a_single_vote() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), alice_env());

    let data = payload(
        &call(
            &state,
            "vote_on_post",
            json!({"author": "bob", "permlink": "hello", "weight": -2500}),
        )
        .await,
    );

    assert_eq!(data["success"], true);
    assert_eq!(data["voter"], "alice");
    assert_eq!(data["weight"], -2500);
    assert_eq!(data["transaction_id"], TRX_ID);
    assert_eq!(
        data["transaction_url"],
        format!("https://www.hiveblockexplorer.com/tx/{TRX_ID}")
    );
    match hive.last_broadcast().as_slice() {
        [Operation::Vote(vote)] => {
            assert_eq!(vote.voter, "alice");
            assert_eq!(vote.weight, -2500);
        }
        other => panic!("unexpected operations: {other:?}"),
    }
}

#[tokio::test]
async fn out_of_range_weight_is_a_validation_failure() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), alice_env());

    let failure = state
        .tools
        .get("vote_on_post")
        .unwrap()
        .call(
            state.clone(),
            json!({"author": "bob", "permlink": "hello", "weight": 20000}),
        )
        .await
        .unwrap_err();

    assert_eq!(failure.tool, "vote_on_post");
    assert_eq!(failure.issues[0].field, "weight");
    assert_eq!(hive.broadcast_count(), 0);
}

#[tokio::test]
async fn transfer_requires_an_active_key() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(
        hive.clone(),
        vec![
            ("HIVE_USERNAME", "alice".to_string()),
            ("HIVE_POSTING_KEY", common::wif("alice-posting")),
        ],
    );

    let resp = call(
        &state,
        "send_token",
        json!({"to": "bob", "amount": 1.5, "currency": "HIVE"}),
    )
    .await;

    assert!(resp.is_error);
    assert!(resp.text().contains("HIVE_ACTIVE_KEY"));
    assert!(resp.text().contains("active key"));
    assert_eq!(hive.broadcast_count(), 0);
}

#[tokio::test]
async fn transfer_formats_amount_and_memo() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), alice_env());

    let data = payload(
        &call(
            &state,
            "send_token",
            json!({"to": "bob", "amount": 1.5, "currency": "HBD"}),
        )
        .await,
    );

    assert_eq!(data["from"], "alice");
    assert_eq!(data["amount"], "1.500 HBD");
    assert_eq!(data["memo"], "(no memo)");
    match hive.last_broadcast().as_slice() {
        [Operation::Transfer(t)] => {
            assert_eq!(t.memo, "");
            assert_eq!(t.amount.to_string(), "1.500 HBD");
        }
        other => panic!("unexpected operations: {other:?}"),
    }
}

#[tokio::test]
async fn post_normalizes_tags_and_slugs_title() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), alice_env());

    let data = payload(
        &call(
            &state,
            "create_post",
            json!({
                "title": "Hello, Hive World!",
                "body": "first post",
                "tags": "blog, Life , writing, blog"
            }),
        )
        .await,
    );

    assert_eq!(data["permlink"], "hello-hive-world");
    assert_eq!(data["tags"], json!(["blog", "life", "writing"]));
    assert_eq!(data["url"], "https://hive.blog/@alice/hello-hive-world");
    match hive.last_broadcast().as_slice() {
        [Operation::Comment(c)] => {
            assert_eq!(c.parent_author, "");
            assert_eq!(c.parent_permlink, "blog");
            let meta: serde_json::Value = serde_json::from_str(&c.json_metadata).unwrap();
            assert_eq!(meta["tags"], json!(["blog", "life", "writing"]));
            assert!(meta["app"].as_str().unwrap().starts_with("hive-mcp-server/"));
        }
        other => panic!("unexpected operations: {other:?}"),
    }
}

#[tokio::test]
async fn post_with_payout_settings_adds_comment_options() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), alice_env());

    let data = payload(
        &call(
            &state,
            "create_post",
            json!({
                "title": "Split rewards",
                "body": "shared",
                "tags": ["dev"],
                "permalink": "split-rewards-2024",
                "allow_curation_rewards": false,
                "beneficiaries": [
                    {"account": "carol", "weight": 500},
                    {"account": "bob", "weight": 1000}
                ]
            }),
        )
        .await,
    );

    assert_eq!(data["permlink"], "split-rewards-2024");
    match hive.last_broadcast().as_slice() {
        [Operation::Comment(c), Operation::CommentOptions(o)] => {
            assert_eq!(c.permlink, "split-rewards-2024");
            assert_eq!(o.permlink, "split-rewards-2024");
            assert!(!o.allow_curation_rewards);
            assert!(o.allow_votes);
            assert_eq!(o.beneficiaries[0].account, "bob");
            assert_eq!(o.beneficiaries[1].account, "carol");
        }
        other => panic!("unexpected operations: {other:?}"),
    }
}

#[tokio::test]
async fn comment_links_below_the_parent() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), alice_env());

    let data = payload(
        &call(
            &state,
            "create_comment",
            json!({"parent_author": "bob", "parent_permlink": "hello", "body": "nice"}),
        )
        .await,
    );

    let permlink = data["permlink"].as_str().unwrap();
    assert!(permlink.starts_with("re-hello-"));
    assert_eq!(
        data["url"],
        format!("https://hive.blog/@bob/hello#@alice/{permlink}")
    );
    match hive.last_broadcast().as_slice() {
        [Operation::Comment(c)] => {
            assert_eq!(c.title, "");
            assert_eq!(c.parent_author, "bob");
        }
        other => panic!("unexpected operations: {other:?}"),
    }
}

#[tokio::test]
async fn history_filter_accepts_quoted_list() {
    let hive = Arc::new(MockHive {
        history: vec![
            history_entry(1, "vote", json!({"voter": "alice"})),
            history_entry(2, "comment", json!({"author": "alice"})),
            history_entry(3, "transfer", json!({"from": "alice", "to": "bob"})),
        ],
        ..MockHive::default()
    });
    let state = state_with(hive, vec![]);

    let data = payload(
        &call(
            &state,
            "get_account_history",
            json!({"username": "alice", "operation_filter": "['transfer','vote']"}),
        )
        .await,
    );

    assert_eq!(data["operations_count"], 2);
    let types: Vec<&str> = data["operations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|op| op["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["vote", "transfer"]);
    assert_eq!(data["operations"][1]["transaction_id"], "trx3");
}

#[tokio::test]
async fn tag_listing_maps_posts() {
    let hive = Arc::new(MockHive {
        discussions: vec![Content {
            author: "bob".into(),
            permlink: "rust-on-hive".into(),
            title: "Rust on Hive".into(),
            net_votes: 12,
            pending_payout_value: "3.210 HBD".into(),
            ..Content::default()
        }],
        ..MockHive::default()
    });
    let state = state_with(hive.clone(), vec![]);

    let data = payload(
        &call(
            &state,
            "get_posts_by_tag",
            json!({"category": "trending", "tag": "rust"}),
        )
        .await,
    );

    assert_eq!(data[0]["url"], "https://hive.blog/@bob/rust-on-hive");
    assert_eq!(data[0]["votes"], 12);
    let queries = hive.discussion_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![(DiscussionQuery::Trending, "rust".to_string(), 10)]);
}

#[tokio::test]
async fn user_listing_reads_blog_and_feed() {
    let hive = Arc::new(MockHive {
        discussions: vec![Content {
            author: "alice".into(),
            permlink: "my-day".into(),
            title: "My day".into(),
            ..Content::default()
        }],
        ..MockHive::default()
    });
    let state = state_with(hive.clone(), vec![]);

    let data = payload(
        &call(
            &state,
            "get_posts_by_user",
            json!({"category": "blog", "username": "alice", "limit": 3}),
        )
        .await,
    );
    call(
        &state,
        "get_posts_by_user",
        json!({"category": "feed", "username": "alice"}),
    )
    .await;

    assert_eq!(data[0]["url"], "https://hive.blog/@alice/my-day");
    let queries = hive.discussion_queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![
            (DiscussionQuery::Blog, "alice".to_string(), 3),
            (DiscussionQuery::Feed, "alice".to_string(), 10),
        ]
    );
}

#[tokio::test]
async fn user_listing_rejects_other_categories() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive.clone(), vec![]);

    let failure = state
        .tools
        .get("get_posts_by_user")
        .unwrap()
        .call(state.clone(), json!({"category": "hot", "username": "alice"}))
        .await
        .unwrap_err();

    assert_eq!(failure.tool, "get_posts_by_user");
    assert!(failure.issues[0].message.contains("unknown variant `hot`"));
    assert!(hive.discussion_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delegations_come_back_as_listed() {
    let hive = Arc::new(MockHive {
        delegations: vec![
            VestingDelegation {
                delegator: "alice".into(),
                delegatee: "bob".into(),
                vesting_shares: "1000.000000 VESTS".into(),
                min_delegation_time: "2024-01-01T00:00:00".into(),
            },
            VestingDelegation {
                delegator: "alice".into(),
                delegatee: "carol".into(),
                vesting_shares: "25.500000 VESTS".into(),
                min_delegation_time: "2024-02-01T00:00:00".into(),
            },
        ],
        ..MockHive::default()
    });
    let state = state_with(hive, vec![]);

    let data = payload(
        &call(&state, "get_vesting_delegations", json!({"username": "alice"})).await,
    );

    assert_eq!(data["account"], "alice");
    assert_eq!(data["delegations_count"], 2);
    assert_eq!(data["delegations"][1]["delegatee"], "carol");
    assert_eq!(data["delegations"][1]["vesting_shares"], "25.500000 VESTS");
    assert_eq!(
        data["delegations"][0]["min_delegation_time"],
        "2024-01-01T00:00:00"
    );
}

#[tokio::test]
async fn delegation_limit_is_bounded() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);

    let req = Request::new(
        json!(9),
        "tools/call",
        Some(json!({
            "name": "get_vesting_delegations",
            "arguments": {"username": "alice", "limit": 5000}
        })),
    );
    let resp = handle_mcp_request(req, state).await.unwrap();

    let error = resp.error.unwrap();
    assert_eq!(error.code, error_codes::INVALID_PARAMS);
    let data = error.data.unwrap();
    assert_eq!(data["tool"], "get_vesting_delegations");
    assert_eq!(data["issues"][0]["field"], "limit");
}

#[tokio::test]
async fn missing_post_and_node_errors_are_envelopes() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive, vec![]);
    let resp = call(
        &state,
        "get_post_content",
        json!({"author": "bob", "permlink": "nope"}),
    )
    .await;
    assert!(resp.is_error);
    assert_eq!(resp.text(), "Error: Post not found: bob/nope");

    let failing = Arc::new(MockHive {
        fail_reads: Some("node exploded".into()),
        ..MockHive::default()
    });
    let state = state_with(failing, vec![]);
    let resp = call(&state, "get_chain_properties", json!({})).await;
    assert!(resp.is_error);
    assert_eq!(
        resp.text(),
        "Error in get_chain_properties: RPC error -32000: node exploded"
    );
}

#[tokio::test]
async fn chain_properties_combine_three_calls() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);

    let data = payload(&call(&state, "get_chain_properties", serde_json::Value::Null).await);

    assert_eq!(data["dynamic_properties"]["head_block_number"], 90_000_000);
    assert_eq!(data["chain_properties"]["account_creation_fee"], "3.000 HIVE");
    assert_eq!(data["current_median_history_price"]["base"], "0.250 HBD");
    assert!(data["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn signed_messages_verify() {
    let state = state_with(Arc::new(MockHive::default()), alice_env());

    let signed = payload(&call(&state, "sign_message", json!({"message": "hello hive"})).await);
    assert_eq!(
        signed["public_key"],
        key("alice-posting").public_key().to_string()
    );

    let bare_key = signed["public_key"].as_str().unwrap().trim_start_matches("STM");
    let verified = payload(
        &call(
            &state,
            "verify_signature",
            json!({
                "message_hash": signed["message_hash"],
                "signature": signed["signature"],
                "public_key": bare_key,
            }),
        )
        .await,
    );
    assert_eq!(verified["is_valid"], true);

    let other = payload(
        &call(
            &state,
            "verify_signature",
            json!({
                "message_hash": signed["message_hash"],
                "signature": signed["signature"],
                "public_key": key("someone-else").public_key().to_string(),
            }),
        )
        .await,
    );
    assert_eq!(other["is_valid"], false);
}

#[tokio::test]
async fn verify_rejects_malformed_inputs_in_order() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);
    let good_key = key("k").public_key().to_string();

    let resp = call(
        &state,
        "verify_signature",
        json!({"message_hash": "00", "signature": "00", "public_key": "STMbogus"}),
    )
    .await;
    assert_eq!(resp.text(), "Error: Invalid public key format");

    let resp = call(
        &state,
        "verify_signature",
        json!({"message_hash": "00", "signature": "00", "public_key": good_key}),
    )
    .await;
    assert_eq!(resp.text(), "Error: Invalid signature format");
}

#[tokio::test]
async fn sign_with_missing_key_names_the_variable() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);
    let resp = call(
        &state,
        "sign_message",
        json!({"message": "hi", "key_type": "owner"}),
    )
    .await;
    assert!(resp.is_error);
    assert_eq!(resp.text(), "Error: HIVE_OWNER_KEY environment variable is not set");
}

#[tokio::test]
async fn encrypted_message_round_trip_between_accounts() {
    let hive = Arc::new(MockHive {
        accounts: vec![
            account("alice", &key("alice-memo")),
            account("bob", &key("bob-memo")),
        ],
        ..MockHive::default()
    });
    let alice = state_with(hive.clone(), alice_env());
    let bob = state_with(
        hive,
        vec![
            ("HIVE_USERNAME", "bob".to_string()),
            ("HIVE_MEMO_KEY", common::wif("bob-memo")),
        ],
    );

    let encrypted = payload(
        &call(
            &alice,
            "encrypt_message",
            json!({"message": "meet at noon", "recipient": "bob"}),
        )
        .await,
    );
    let text = encrypted["encrypted_message"].as_str().unwrap();
    assert!(text.starts_with('#'));

    let decrypted = payload(
        &call(
            &bob,
            "decrypt_message",
            json!({"encrypted_message": text, "sender": "alice"}),
        )
        .await,
    );
    assert_eq!(decrypted["decrypted_message"], "meet at noon");
}

#[tokio::test]
async fn encrypt_to_unknown_account_fails() {
    let hive = Arc::new(MockHive::default());
    let state = state_with(hive, alice_env());
    let resp = call(
        &state,
        "encrypt_message",
        json!({"message": "hi", "recipient": "ghost"}),
    )
    .await;
    assert!(resp.is_error);
    assert_eq!(
        resp.text(),
        "Error in encrypt_message: Error fetching memo key for ghost: User ghost not found"
    );
}

#[tokio::test]
async fn send_encrypted_message_transfers_with_encrypted_memo() {
    let hive = Arc::new(MockHive {
        accounts: vec![account("bob", &key("bob-memo"))],
        ..MockHive::default()
    });
    let state = state_with(hive.clone(), alice_env());

    let data = payload(
        &call(
            &state,
            "send_encrypted_message",
            json!({"message": "secret", "recipient": "bob"}),
        )
        .await,
    );

    assert_eq!(data["amount"], "0.001 HIVE");
    match hive.last_broadcast().as_slice() {
        [Operation::Transfer(t)] => {
            assert_eq!(t.to, "bob");
            assert_eq!(memo::decode(&key("bob-memo"), &t.memo).unwrap(), "secret");
        }
        other => panic!("unexpected operations: {other:?}"),
    }
}

#[tokio::test]
async fn encrypted_inbox_lists_and_decrypts_memos() {
    let to_alice = memo::encode(&key("bob-memo"), &key("alice-memo").public_key(), "hi alice").unwrap();
    let hive = Arc::new(MockHive {
        history: vec![
            history_entry(
                7,
                "transfer",
                json!({"from": "bob", "to": "alice", "amount": "0.001 HIVE", "memo": to_alice}),
            ),
            history_entry(
                8,
                "transfer",
                json!({"from": "alice", "to": "carol", "amount": "1.000 HIVE", "memo": "plain"}),
            ),
            history_entry(
                9,
                "transfer",
                json!({"from": "alice", "to": "dave", "amount": "0.001 HIVE", "memo": "#garbage"}),
            ),
        ],
        ..MockHive::default()
    });
    let state = state_with(hive, alice_env());

    let data = payload(&call(&state, "get_encrypted_messages", json!({"decrypt": true})).await);

    assert_eq!(data["account"], "alice");
    assert_eq!(data["messages_count"], 2);
    // newest first
    assert_eq!(data["messages"][0]["index"], 9);
    assert_eq!(data["messages"][0]["direction"], "sent");
    assert_eq!(data["messages"][0]["counterparty"], "dave");
    assert_eq!(data["messages"][0]["decrypted_message"], "[Decryption failed]");
    assert_eq!(data["messages"][1]["direction"], "received");
    assert_eq!(data["messages"][1]["counterparty"], "bob");
    assert_eq!(data["messages"][1]["decrypted_message"], "hi alice");
    assert_eq!(
        data["note"],
        "Messages were decrypted using your private memo key"
    );
}

#[tokio::test]
async fn encrypted_inbox_needs_some_username() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);
    let resp = call(&state, "get_encrypted_messages", json!({})).await;
    assert!(resp.is_error);
    assert!(resp.text().contains("HIVE_USERNAME"));
}
