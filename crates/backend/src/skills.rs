// =============================================================================
// SkillSwap Backend - Skill Catalog & User Skills
// =============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::{Skill, SkillListing};
use crate::error::ApiError;
use crate::AppState;

// -----------------------------------------------------------------------------
// Skill type
// -----------------------------------------------------------------------------

/// Whether a user offers a skill or wants to learn it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillType {
    Offered,
    Wanted,
}

impl SkillType {
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "offered" => Ok(Self::Offered),
            "wanted" => Ok(Self::Wanted),
            _ => Err(ApiError::BadRequest(format!("Invalid skill type: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offered => "offered",
            Self::Wanted => "wanted",
        }
    }
}

// -----------------------------------------------------------------------------
// Request/Response Types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserSkillRequest {
    pub skill_id: String,
    pub skill_type: String,
    #[serde(default)]
    pub proficiency_level: String,
}

/// A user's skill link with the catalog entry resolved.
#[derive(Debug, Serialize)]
pub struct UserSkillResponse {
    pub id: String,
    pub skill_id: String,
    pub skill_name: String,
    pub category: String,
    pub skill_type: String,
    pub proficiency_level: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub skill_type: String,
}

/// One user under a discovered skill.
#[derive(Debug, Serialize)]
pub struct DiscoverUser {
    pub user_id: String,
    pub user_name: String,
    pub skill_type: String,
    pub proficiency_level: String,
    pub created_at: DateTime<Utc>,
}

/// A skill other users have, with everyone who lists it.
#[derive(Debug, Serialize)]
pub struct DiscoverSkill {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub users: Vec<DiscoverUser>,
    pub user_count: usize,
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// The skill catalog.
pub async fn list_skills(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Skill>>, ApiError> {
    Ok(Json(state.db.list_skills().await?))
}

/// Current user's skill links.
pub async fn my_skills(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserSkillResponse>>, ApiError> {
    let links = state.db.user_skills(&auth.user.id).await?;
    resolve_links(&state, links).await
}

/// Current user's skill links of one type.
pub async fn my_skills_by_type(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(skill_type): Path<String>,
) -> Result<Json<Vec<UserSkillResponse>>, ApiError> {
    let skill_type = SkillType::parse(&skill_type)?;
    let links = state
        .db
        .user_skills_by_type(&auth.user.id, skill_type.as_str())
        .await?;
    resolve_links(&state, links).await
}

async fn resolve_links(
    state: &AppState,
    links: Vec<crate::db::UserSkill>,
) -> Result<Json<Vec<UserSkillResponse>>, ApiError> {
    let mut out = Vec::with_capacity(links.len());
    for link in links {
        let skill = state
            .db
            .find_skill_by_id(&link.skill_id)
            .await?
            .ok_or_else(|| ApiError::Internal("Dangling skill link".into()))?;
        out.push(UserSkillResponse {
            id: link.id,
            skill_id: skill.id,
            skill_name: skill.name,
            category: skill.category,
            skill_type: link.skill_type,
            proficiency_level: link.proficiency_level,
            created_at: link.created_at,
        });
    }
    Ok(Json(out))
}

/// Add a skill to the current user's offered/wanted list.
pub async fn add_user_skill(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateUserSkillRequest>,
) -> Result<Json<UserSkillResponse>, ApiError> {
    let skill_type = SkillType::parse(&req.skill_type)?;

    let skill = state
        .db
        .find_skill_by_id(&req.skill_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Skill not found".into()))?;

    if state
        .db
        .find_user_skill(&auth.user.id, &skill.id, skill_type.as_str())
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Skill already listed".into()));
    }

    let link = state
        .db
        .create_user_skill(
            &auth.user.id,
            &skill.id,
            skill_type.as_str(),
            &req.proficiency_level,
        )
        .await?;

    Ok(Json(UserSkillResponse {
        id: link.id,
        skill_id: skill.id,
        skill_name: skill.name,
        category: skill.category,
        skill_type: link.skill_type,
        proficiency_level: link.proficiency_level,
        created_at: link.created_at,
    }))
}

/// Remove a skill link.
pub async fn remove_user_skill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_user_skill(&id, &auth.user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Skill link not found".into()))
    }
}

/// Discover skills that other users have, grouped per skill with the users
/// who list them, most popular first.
pub async fn discover_skills(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<Vec<DiscoverSkill>>, ApiError> {
    let listings = state.db.skill_listings(&auth.user.id).await?;
    Ok(Json(group_listings(listings, &query)))
}

/// Filter and group raw listings into the discovery feed.
fn group_listings(listings: Vec<SkillListing>, query: &DiscoverQuery) -> Vec<DiscoverSkill> {
    let search = query.search.to_lowercase();

    let mut grouped: Vec<DiscoverSkill> = Vec::new();
    for listing in listings {
        if !search.is_empty()
            && !listing.skill_name.to_lowercase().contains(&search)
            && !listing.description.to_lowercase().contains(&search)
            && !listing.user_name.to_lowercase().contains(&search)
        {
            continue;
        }
        if !query.category.is_empty()
            && query.category != "all"
            && listing.category != query.category
        {
            continue;
        }
        if !query.skill_type.is_empty() && listing.skill_type != query.skill_type {
            continue;
        }

        let idx = match grouped.iter().position(|s| s.id == listing.skill_id) {
            Some(idx) => idx,
            None => {
                grouped.push(DiscoverSkill {
                    id: listing.skill_id.clone(),
                    name: listing.skill_name.clone(),
                    category: listing.category.clone(),
                    description: listing.description.clone(),
                    users: Vec::new(),
                    user_count: 0,
                });
                grouped.len() - 1
            }
        };
        grouped[idx].users.push(DiscoverUser {
            user_id: listing.user_id,
            user_name: listing.user_name,
            skill_type: listing.skill_type,
            proficiency_level: listing.proficiency_level,
            created_at: listing.created_at,
        });
    }

    for skill in &mut grouped {
        skill.user_count = skill.users.len();
    }
    grouped.sort_by(|a, b| b.user_count.cmp(&a.user_count));
    grouped
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(skill: &str, user: &str, skill_type: &str, category: &str) -> SkillListing {
        SkillListing {
            skill_id: format!("skill-{skill}"),
            skill_name: skill.to_string(),
            category: category.to_string(),
            description: String::new(),
            user_id: format!("user-{user}"),
            user_name: user.to_string(),
            skill_type: skill_type.to_string(),
            proficiency_level: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn grouping_orders_by_popularity() {
        let listings = vec![
            listing("Guitar", "alice", "offered", "other"),
            listing("Cooking", "alice", "offered", "other"),
            listing("Cooking", "bob", "wanted", "other"),
        ];
        let grouped = group_listings(listings, &DiscoverQuery::default());

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].name, "Cooking");
        assert_eq!(grouped[0].user_count, 2);
        assert_eq!(grouped[1].user_count, 1);
    }

    #[test]
    fn filters_apply_before_grouping() {
        let listings = vec![
            listing("Guitar", "alice", "offered", "music"),
            listing("Guitar", "bob", "wanted", "music"),
            listing("Cooking", "carol", "offered", "other"),
        ];

        let by_type = group_listings(
            listings,
            &DiscoverQuery {
                skill_type: "offered".into(),
                ..Default::default()
            },
        );
        assert_eq!(by_type.len(), 2);
        assert!(by_type.iter().all(|s| s.users.iter().all(|u| u.skill_type == "offered")));
    }

    #[test]
    fn search_matches_skill_and_user_names() {
        let listings = vec![
            listing("Guitar", "alice", "offered", "music"),
            listing("Cooking", "bob", "offered", "other"),
        ];
        let found = group_listings(
            listings,
            &DiscoverQuery {
                search: "bob".into(),
                ..Default::default()
            },
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Cooking");
    }

    #[test]
    fn invalid_skill_type_is_rejected() {
        assert!(SkillType::parse("learning").is_err());
        assert_eq!(SkillType::parse("offered").unwrap().as_str(), "offered");
    }
}
