//! Reviewer selection and validation rules.
//!
//! Everything here is pure: callers load the records, these functions decide.
//! Reviewers must be active, must not be the author, and must share the
//! author's team. A pull request has at most [`MAX_REVIEWERS`] reviewers.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result, ReviewerRejection};
use crate::models::{PullRequest, User};

/// Maximum number of reviewers on one pull request
pub const MAX_REVIEWERS: usize = 2;

/// Pick reviewers for a pull request written by `author`.
///
/// Candidates are the active members of the author's team other than the
/// author, taken in ascending `user_id` order. Returns at most
/// [`MAX_REVIEWERS`] ids; fewer (even none) when the team is small.
pub fn pick_auto_reviewers(author: &User, team_members: &[User]) -> Vec<String> {
    let mut candidates: Vec<&User> = team_members
        .iter()
        .filter(|u| u.team_name == author.team_name)
        .filter(|u| u.user_id != author.user_id)
        .filter(|u| u.is_active)
        .collect();
    candidates.sort_by(|a, b| a.user_id.cmp(&b.user_id));

    candidates
        .into_iter()
        .take(MAX_REVIEWERS)
        .map(|u| u.user_id.clone())
        .collect()
}

fn ensure_active(user: &User) -> Result<()> {
    if user.is_active {
        Ok(())
    } else {
        Err(ReviewerRejection::Inactive {
            user_id: user.user_id.clone(),
        }
        .into())
    }
}

fn ensure_not_author(pr: &PullRequest, user: &User) -> Result<()> {
    if user.user_id == pr.author_id {
        Err(ReviewerRejection::IsAuthor {
            user_id: user.user_id.clone(),
        }
        .into())
    } else {
        Ok(())
    }
}

fn ensure_same_team(author: &User, user: &User) -> Result<()> {
    if user.team_name == author.team_name {
        Ok(())
    } else {
        Err(ReviewerRejection::WrongTeam {
            user_id: user.user_id.clone(),
            team_name: user.team_name.clone(),
            author_team: author.team_name.clone(),
        }
        .into())
    }
}

/// Compute the reviewer set after swapping `old` for `new`.
///
/// Checks run in a fixed order and the first failure wins: both users
/// active, `old` currently assigned, `new` not the author, `new` on the
/// author's team, `new` not already assigned. The other reviewer is kept, so
/// the set size does not change.
pub fn replace_reviewer(
    pr: &PullRequest,
    author: &User,
    old: &User,
    new: &User,
) -> Result<Vec<String>> {
    ensure_active(old)?;
    ensure_active(new)?;

    if !pr.has_reviewer(&old.user_id) {
        return Err(ReviewerRejection::NotAssigned {
            user_id: old.user_id.clone(),
            pr_id: pr.id.clone(),
        }
        .into());
    }

    ensure_not_author(pr, new)?;
    ensure_same_team(author, new)?;

    if pr.has_reviewer(&new.user_id) {
        return Err(ReviewerRejection::Duplicate {
            user_id: new.user_id.clone(),
            pr_id: pr.id.clone(),
        }
        .into());
    }

    let mut reviewers: Vec<String> = pr
        .assigned_reviewers
        .iter()
        .map(|r| {
            if *r == old.user_id {
                new.user_id.clone()
            } else {
                r.clone()
            }
        })
        .collect();
    reviewers.sort();
    Ok(reviewers)
}

/// Reject requests for more than [`MAX_REVIEWERS`] reviewers.
///
/// Runs before anything is looked up, so the ids need not be valid.
pub fn ensure_reviewer_count(requested: &[String]) -> Result<()> {
    if requested.len() > MAX_REVIEWERS {
        return Err(ReviewerRejection::TooMany {
            requested: requested.len(),
            max: MAX_REVIEWERS,
        }
        .into());
    }
    Ok(())
}

/// Validate an explicit reviewer list for `pr`.
///
/// `found` holds the users that exist among `requested`. Ids are checked in
/// the given order: exists, active, not the author. Then every reviewer must
/// be on the author's team. Returns the ids in ascending order.
pub fn validate_reviewer_set(
    pr: &PullRequest,
    author: &User,
    requested: &[String],
    found: &HashMap<String, User>,
) -> Result<Vec<String>> {
    ensure_reviewer_count(requested)?;

    let mut seen = HashSet::new();
    if let Some(dup) = requested.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(ReviewerRejection::Duplicate {
            user_id: dup.clone(),
            pr_id: pr.id.clone(),
        }
        .into());
    }

    let mut reviewers = Vec::with_capacity(requested.len());
    for user_id in requested {
        let user = found
            .get(user_id)
            .ok_or_else(|| Error::user_not_found(user_id))?;
        ensure_active(user)?;
        ensure_not_author(pr, user)?;
        reviewers.push(user);
    }

    for user in &reviewers {
        ensure_same_team(author, user)?;
    }

    let mut ids: Vec<String> = reviewers.into_iter().map(|u| u.user_id.clone()).collect();
    ids.sort();
    Ok(ids)
}
