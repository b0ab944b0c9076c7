//! Permission gating for `open`
//!
//! Entries ending in `!` are mandatory and must all pass. The remaining entries are
//! optional: when any exist, at least one must pass.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::warn;

/// What a permission decision can look at
#[derive(Debug, Clone, Copy)]
pub struct PermissionContext<'a> {
    pub kind: Option<&'a str>,
    pub filters: &'a Value,
}

/// Host-supplied hooks. Both default to permissive no-ops.
pub trait Host: Send + Sync {
    fn can(&self, _permissions: &[&str], _ctx: &PermissionContext<'_>) -> bool {
        true
    }

    /// Receives session lifecycle messages
    fn log(&self, _message: &str) {}
}

/// Host that allows everything and logs nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Host for AllowAll {}

pub fn can_open(host: &dyn Host, permissions: &[String], ctx: &PermissionContext<'_>) -> bool {
    let (mandatory, optional): (Vec<&str>, Vec<&str>) = permissions
        .iter()
        .map(String::as_str)
        .partition(|p| p.ends_with('!'));

    let mandatory_ok = mandatory
        .iter()
        .all(|p| check(host, p.trim_end_matches('!'), ctx));
    if !mandatory_ok {
        return false;
    }

    optional.is_empty() || optional.iter().any(|p| check(host, p, ctx))
}

fn check(host: &dyn Host, permission: &str, ctx: &PermissionContext<'_>) -> bool {
    catch_unwind(AssertUnwindSafe(|| host.can(&[permission], ctx))).unwrap_or_else(|_| {
        warn!(permission, "permission check panicked; treating as denied");
        false
    })
}
