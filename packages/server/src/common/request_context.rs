//! Per-request caller information passed into domain actions.

use crate::common::UserId;

/// The authenticated caller of an action.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: UserId,
    /// Client IP as seen by the server, recorded in the audit log
    pub ip_address: Option<String>,
}

impl RequestContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ip_address: None,
        }
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }
}
