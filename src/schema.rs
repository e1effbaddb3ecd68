// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use diesel::allow_tables_to_appear_in_same_query;
use diesel::joinable;
use diesel::table;

// Shared feed responses. `seq` preserves insertion order for equal timestamps.
table! {
    shared_responses (id) {
        seq -> Int8,
        id -> Varchar,
        response_content -> Text,
        original_content -> Nullable<Text>,
        preset_id -> Varchar,
        language_id -> Varchar,
        user_prompt -> Text,
        user_id -> Varchar,
        created_at -> Timestamptz,
    }
}

// One row per (response, user) like membership
table! {
    response_likes (response_id, user_id) {
        response_id -> Varchar,
        user_id -> Varchar,
        created_at -> Timestamptz,
    }
}

joinable!(response_likes -> shared_responses (response_id));

allow_tables_to_appear_in_same_query!(
    shared_responses,
    response_likes,
);

/// Idempotent DDL applied at startup, in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS shared_responses (
        seq BIGSERIAL NOT NULL,
        id VARCHAR PRIMARY KEY,
        response_content TEXT NOT NULL,
        original_content TEXT,
        preset_id VARCHAR NOT NULL,
        language_id VARCHAR NOT NULL,
        user_prompt TEXT NOT NULL DEFAULT '',
        user_id VARCHAR NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS shared_responses_dedup_idx
        ON shared_responses (md5(response_content), preset_id, language_id)",
    "CREATE INDEX IF NOT EXISTS shared_responses_created_at_idx
        ON shared_responses (created_at DESC, seq)",
    "CREATE TABLE IF NOT EXISTS response_likes (
        response_id VARCHAR NOT NULL REFERENCES shared_responses(id),
        user_id VARCHAR NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (response_id, user_id)
    )",
    "CREATE INDEX IF NOT EXISTS response_likes_user_idx ON response_likes (user_id)",
];
