//! Roster Core - reviewer assignment for pull requests
//!
//! Teams own users, users author pull requests, and every open pull request
//! carries up to two reviewers drawn from the author's team. This crate holds
//! the domain records, the assignment and lifecycle rules, and services that
//! apply them transactionally over any [`Store`] backend.

pub mod assignment;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{Entity, Error, ErrorKind, Result, ReviewerRejection};
pub use models::{PrStatus, PullRequest, Team, TeamMember, TeamWithMembers, User};
pub use service::{PullRequestService, TeamService, UserService};
pub use store::{Constraint, InMemoryStore, Store, StoreError, StoreTx};
