// =============================================================================
// SkillSwap Backend - Report Domain (kinds, workflows, submission)
// =============================================================================
// Report kind is a tagged enum decided at construction time; nothing in the
// codebase infers it by probing record shapes.
// =============================================================================

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{SkillReport, UserReport};
use crate::error::ApiError;
use crate::AppState;

// -----------------------------------------------------------------------------
// Report kind
// -----------------------------------------------------------------------------

/// Which table a report row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    UserReport,
    SkillReport,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::UserReport => "user_report",
            ReportKind::SkillReport => "skill_report",
        }
    }

    /// Export row id prefix (UR-/SR-).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ReportKind::UserReport => "UR",
            ReportKind::SkillReport => "SR",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::UserReport => "User Report",
            ReportKind::SkillReport => "Skill Report",
        }
    }
}

// -----------------------------------------------------------------------------
// User report workflow
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserReportType {
    InappropriateContent,
    Spam,
    Harassment,
    FakeProfile,
    Other,
}

impl UserReportType {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "inappropriate_content" => Ok(Self::InappropriateContent),
            "spam" => Ok(Self::Spam),
            "harassment" => Ok(Self::Harassment),
            "fake_profile" => Ok(Self::FakeProfile),
            "other" => Ok(Self::Other),
            _ => Err(ApiError::BadRequest(format!("Invalid report type: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InappropriateContent => "inappropriate_content",
            Self::Spam => "spam",
            Self::Harassment => "harassment",
            Self::FakeProfile => "fake_profile",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserReportStatus {
    Pending,
    Investigating,
    Resolved,
    Dismissed,
}

impl UserReportStatus {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "pending" => Ok(Self::Pending),
            "investigating" => Ok(Self::Investigating),
            "resolved" => Ok(Self::Resolved),
            "dismissed" => Ok(Self::Dismissed),
            _ => Err(ApiError::BadRequest(format!("Invalid report status: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Terminal statuses stamp resolved_by/resolved_at and end the workflow.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }
}

// -----------------------------------------------------------------------------
// Skill report workflow
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillReportType {
    Inappropriate,
    Spam,
    Misleading,
    Offensive,
    Other,
}

impl SkillReportType {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "inappropriate" => Ok(Self::Inappropriate),
            "spam" => Ok(Self::Spam),
            "misleading" => Ok(Self::Misleading),
            "offensive" => Ok(Self::Offensive),
            "other" => Ok(Self::Other),
            _ => Err(ApiError::BadRequest(format!("Invalid report type: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inappropriate => "inappropriate",
            Self::Spam => "spam",
            Self::Misleading => "misleading",
            Self::Offensive => "offensive",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillReportStatus {
    Pending,
    Approved,
    Rejected,
    SkillRemoved,
}

impl SkillReportStatus {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "skill_removed" => Ok(Self::SkillRemoved),
            _ => Err(ApiError::BadRequest(format!("Invalid report status: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::SkillRemoved => "skill_removed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::SkillRemoved)
    }
}

// -----------------------------------------------------------------------------
// Submission handlers
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubmitUserReportRequest {
    pub reported_user_id: String,
    pub report_type: String,
    pub description: String,
    #[serde(default)]
    pub evidence: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitSkillReportRequest {
    pub skill_id: String,
    pub report_type: String,
    pub description: String,
}

/// File a report against another user.
pub async fn submit_user_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SubmitUserReportRequest>,
) -> Result<Json<UserReport>, ApiError> {
    let report_type = UserReportType::parse(&req.report_type)?;

    if req.reported_user_id == auth.user.id {
        return Err(ApiError::BadRequest("Cannot report yourself".into()));
    }
    state
        .db
        .find_user_by_id(&req.reported_user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let report = state
        .db
        .create_user_report(
            &auth.user.id,
            &req.reported_user_id,
            report_type.as_str(),
            &req.description,
            &req.evidence,
        )
        .await?;

    Ok(Json(report))
}

/// File a report against a skill description.
pub async fn submit_skill_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SubmitSkillReportRequest>,
) -> Result<Json<SkillReport>, ApiError> {
    let report_type = SkillReportType::parse(&req.report_type)?;

    state
        .db
        .find_skill_by_id(&req.skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Skill not found".into()))?;

    let report = state
        .db
        .create_skill_report(
            &auth.user.id,
            &req.skill_id,
            report_type.as_str(),
            &req.description,
        )
        .await?;

    Ok(Json(report))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_report_terminal_set() {
        assert!(!UserReportStatus::Pending.is_terminal());
        assert!(!UserReportStatus::Investigating.is_terminal());
        assert!(UserReportStatus::Resolved.is_terminal());
        assert!(UserReportStatus::Dismissed.is_terminal());
    }

    #[test]
    fn skill_report_terminal_set() {
        assert!(!SkillReportStatus::Pending.is_terminal());
        assert!(SkillReportStatus::Approved.is_terminal());
        assert!(SkillReportStatus::Rejected.is_terminal());
        assert!(SkillReportStatus::SkillRemoved.is_terminal());
    }

    #[test]
    fn invalid_enum_values_are_rejected() {
        assert!(UserReportStatus::parse("escalated").is_err());
        assert!(SkillReportStatus::parse("resolved").is_err());
        assert!(UserReportType::parse("").is_err());
        assert!(SkillReportType::parse("harassment").is_err());
    }

    #[test]
    fn kind_tags_and_prefixes() {
        assert_eq!(ReportKind::UserReport.as_str(), "user_report");
        assert_eq!(ReportKind::SkillReport.id_prefix(), "SR");
        assert_eq!(ReportKind::UserReport.label(), "User Report");
    }
}
