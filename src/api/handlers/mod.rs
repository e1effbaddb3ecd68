// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

pub mod chat;
pub mod feed;
pub mod health;
pub mod metrics;
pub mod realtime;
