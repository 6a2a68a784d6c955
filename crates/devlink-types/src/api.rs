use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Education, Experience, ProfileFields, SocialLinks, parse_skills};

// -- JWT Claims --

/// Identity embedded in a token and handed to protected handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: Identity,
    pub iat: usize,
    pub exp: usize,
}

// -- Errors --

/// One entry of the `{ "errors": [...] }` envelope every failure returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub msg: String,
}

impl ErrorDetail {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { field: None, msg: msg.into() }
    }

    pub fn for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

// -- Users / Auth --

// Missing strings default to empty so they surface as validation errors
// rather than body rejections.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// -- Profile --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub github_username: Option<String>,
    pub skills: Option<String>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

impl ProfileRequest {
    /// Blank strings count as not supplied.
    pub fn into_fields(self) -> ProfileFields {
        ProfileFields {
            company: supplied(self.company),
            website: supplied(self.website),
            location: supplied(self.location),
            bio: supplied(self.bio),
            status: supplied(self.status),
            github_username: supplied(self.github_username),
            skills: supplied(self.skills).map(|s| parse_skills(&s)),
            social: SocialLinks {
                youtube: supplied(self.youtube),
                twitter: supplied(self.twitter),
                facebook: supplied(self.facebook),
                linkedin: supplied(self.linkedin),
                instagram: supplied(self.instagram),
            },
        }
    }
}

fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct ExperienceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    pub location: Option<String>,
    #[serde(default)]
    pub from: String,
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl ExperienceRequest {
    pub fn into_entry(self) -> Experience {
        Experience {
            id: Uuid::new_v4(),
            title: self.title,
            company: self.company,
            location: supplied(self.location),
            from: self.from,
            to: supplied(self.to),
            current: self.current,
            description: supplied(self.description),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationRequest {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field_of_study: String,
    #[serde(default)]
    pub from: String,
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: Option<String>,
}

impl EducationRequest {
    pub fn into_entry(self) -> Education {
        Education {
            id: Uuid::new_v4(),
            school: self.school,
            degree: self.degree,
            field_of_study: self.field_of_study,
            from: self.from,
            to: supplied(self.to),
            current: self.current,
            description: supplied(self.description),
        }
    }
}

// -- Posts --

/// Body of both post creation and comment creation.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}
