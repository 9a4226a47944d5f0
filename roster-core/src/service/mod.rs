//! Transactional operations over a [`Store`](crate::store::Store)

mod pull_requests;
mod teams;
mod users;

pub use pull_requests::PullRequestService;
pub use teams::TeamService;
pub use users::UserService;
