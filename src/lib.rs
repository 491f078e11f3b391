#![forbid(unsafe_code)]

pub mod ledger;
pub mod models;
pub mod parsing;
pub mod phase;
pub mod progress_service;
pub mod reconciler;
pub mod report;
pub mod repository;
pub mod requirements;
pub mod utils;
