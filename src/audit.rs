/// Audit trail for session events
///
/// One structured log line per register/login/refresh/logout outcome.
/// Entries never carry passwords or tokens.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Register,
    Login,
    Refresh,
    Logout,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Register => "REGISTER",
            AuditAction::Login => "LOGIN",
            AuditAction::Refresh => "REFRESH",
            AuditAction::Logout => "LOGOUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Success => "SUCCESS",
            AuditStatus::Failure => "FAILURE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub status: AuditStatus,
    pub user_id: Option<String>,
    pub message: String,
}

impl AuditLog {
    pub fn new(action: AuditAction, status: AuditStatus, message: impl Into<String>) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            status,
            user_id: None,
            message: message.into(),
        }
    }

    pub fn success(action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Success, message)
    }

    pub fn failure(action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(action, AuditStatus::Failure, message)
    }

    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn emit(&self) {
        match self.status {
            AuditStatus::Failure => {
                tracing::warn!(
                    log_id = %self.log_id,
                    timestamp = %self.timestamp.to_rfc3339(),
                    action = self.action.as_str(),
                    user_id = ?self.user_id,
                    status = self.status.as_str(),
                    message = %self.message,
                    "Audit log entry"
                );
            }
            AuditStatus::Success => {
                tracing::info!(
                    log_id = %self.log_id,
                    timestamp = %self.timestamp.to_rfc3339(),
                    action = self.action.as_str(),
                    user_id = ?self.user_id,
                    status = self.status.as_str(),
                    message = %self.message,
                    "Audit log entry"
                );
            }
        }
    }
}
