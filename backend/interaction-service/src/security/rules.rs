//! Access rules evaluated before any mutation reaches the store
//!
//! | Path                              | Who may mutate                                  |
//! |-----------------------------------|-------------------------------------------------|
//! | `blogs/{b}/likes\|savesCount\|commentsCount` | signed-in callers, one step at a time |
//! | `blogs/{b}/views`                 | anyone, upward by one                           |
//! | `likes\|saves/{b}/{u}`             | the caller whose id is `u`                      |
//! | `comments/{b}` (push)             | signed-in callers                               |
//! | `comments/{b}/{c}`                | create: the named author; edit: the author with |
//! |                                   | `userId`/`createdAt` unchanged; delete: author  |
//! | everything else                   | admins only                                     |

use crate::domain::models::{count_of, CounterField, RelationKind};
use crate::domain::paths::{BLOGS, COMMENTS};
use crate::domain::Identity;
use document_store::{StoreError, StorePath};
use serde_json::Value;
use std::collections::HashSet;

/// A mutation as seen by the rules
#[derive(Debug, Clone, Copy)]
pub enum Change<'a> {
    /// Replace `current` with `next` (`None` meaning absent)
    Set {
        current: Option<&'a Value>,
        next: Option<&'a Value>,
    },
    Increment {
        delta: i64,
    },
    /// Allocate a child key under a collection
    Push,
}

impl Change<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Change::Set { next: None, .. } => "remove",
            Change::Set { current: None, .. } => "create",
            Change::Set { .. } => "write",
            Change::Increment { .. } => "increment",
            Change::Push => "push",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessRules {
    admin_emails: HashSet<String>,
}

impl AccessRules {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        identity.is_admin
            || identity
                .email
                .as_deref()
                .map(|e| self.admin_emails.contains(&e.to_lowercase()))
                .unwrap_or(false)
    }

    /// Decide whether `caller` may apply `change` at `path`.
    pub fn check(
        &self,
        caller: Option<&Identity>,
        path: &StorePath,
        change: Change<'_>,
    ) -> Result<(), StoreError> {
        if caller.map(|c| self.is_admin(c)).unwrap_or(false) {
            return Ok(());
        }

        let segments = path.segments();
        let root = segments.first().map(String::as_str).unwrap_or_default();

        let allowed = match segments.len() {
            3 if root == BLOGS => counter_rule(caller, &segments[2], change),
            3 if RelationKind::from_collection(root).is_some() => {
                relation_rule(caller, &segments[2], change)
            }
            2 if root == COMMENTS => matches!(change, Change::Push) && caller.is_some(),
            3 if root == COMMENTS => comment_rule(caller, change),
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            let who = caller.map(|c| c.user_id.as_str()).unwrap_or("anonymous");
            Err(StoreError::PermissionDenied(format!(
                "{} may not {} {}",
                who,
                change.describe(),
                path
            )))
        }
    }
}

fn counter_rule(caller: Option<&Identity>, key: &str, change: Change<'_>) -> bool {
    let Some(field) = CounterField::from_key(key) else {
        return false;
    };
    let upward_only = field == CounterField::Views;
    if !upward_only && caller.is_none() {
        return false;
    }

    let step_ok = |step: i64| {
        if upward_only {
            step == 1
        } else {
            step.abs() <= 1
        }
    };

    match change {
        Change::Increment { delta } => delta != 0 && step_ok(delta),
        Change::Set {
            current,
            next: Some(next),
        } => match next.as_i64() {
            Some(n) if n >= 0 => step_ok(n - current.map(count_of).unwrap_or(0)),
            _ => false,
        },
        _ => false,
    }
}

fn relation_rule(caller: Option<&Identity>, user_key: &str, change: Change<'_>) -> bool {
    let Some(caller) = caller else {
        return false;
    };
    if caller.user_id != user_key {
        return false;
    }

    match change {
        Change::Set {
            next: Some(next), ..
        } => user_id_of(next) == Some(user_key),
        Change::Set { next: None, .. } => true,
        _ => false,
    }
}

fn comment_rule(caller: Option<&Identity>, change: Change<'_>) -> bool {
    let Some(caller) = caller else {
        return false;
    };
    let caller_id = Some(caller.user_id.as_str());

    match change {
        Change::Set {
            current: None,
            next: Some(next),
        } => user_id_of(next) == caller_id,
        Change::Set {
            current: Some(current),
            next: Some(next),
        } => {
            user_id_of(current) == caller_id
                && user_id_of(next) == caller_id
                && current.get("createdAt") == next.get("createdAt")
        }
        Change::Set {
            current: Some(current),
            next: None,
        } => user_id_of(current) == caller_id,
        Change::Set {
            current: None,
            next: None,
        } => true,
        _ => false,
    }
}

fn user_id_of(record: &Value) -> Option<&str> {
    record.get("userId").and_then(Value::as_str)
}
