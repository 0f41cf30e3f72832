//! Command handlers grouped by concern.

pub(crate) mod apps;
pub(crate) mod auth;
pub(crate) mod config;
pub(crate) mod db;
pub(crate) mod deploy;
pub(crate) mod keys;
pub(crate) mod misc;
pub(crate) mod project;
pub(crate) mod storage;
pub(crate) mod webhooks;
