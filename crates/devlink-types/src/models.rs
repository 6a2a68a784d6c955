use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Rejected mutation of a profile or post document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("Post already liked")]
    AlreadyLiked,
    #[error("Post has not yet been liked")]
    NotYetLiked,
    #[error("Text is required")]
    TextRequired,
    #[error("Comment does not exist")]
    CommentNotFound,
    #[error("User not authorized")]
    NotCommentAuthor,
    #[error("Experience not found")]
    ExperienceNotFound,
    #[error("Education not found")]
    EducationNotFound,
}

// -- Users --

/// A registered user as exposed over the API. The password hash never
/// leaves the db crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

/// The slice of a user that gets joined into profile reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
}

// -- Profiles --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl SocialLinks {
    /// Overwrite only the links present in `other`.
    pub fn merge(&mut self, other: SocialLinks) {
        let SocialLinks { youtube, twitter, facebook, linkedin, instagram } = other;
        if youtube.is_some() {
            self.youtube = youtube;
        }
        if twitter.is_some() {
            self.twitter = twitter;
        }
        if facebook.is_some() {
            self.facebook = facebook;
        }
        if linkedin.is_some() {
            self.linkedin = linkedin;
        }
        if instagram.is_some() {
            self.instagram = instagram;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub field_of_study: String,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

/// Fields submitted on a profile upsert. `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub github_username: Option<String>,
    pub skills: Option<Vec<String>>,
    pub social: SocialLinks,
}

/// Extended profile, one per user.
///
/// `U` is the owner reference: a bare user id as stored, or a
/// [`UserSummary`] once populated for a read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile<U = Uuid> {
    pub id: Uuid,
    pub user: U,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub github_username: Option<String>,
    pub skills: Vec<String>,
    #[serde(default)]
    pub social: SocialLinks,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    pub date: DateTime<Utc>,
}

impl Profile {
    pub fn new(user: Uuid, fields: ProfileFields) -> Self {
        let mut profile = Self {
            id: Uuid::new_v4(),
            user,
            company: None,
            website: None,
            location: None,
            bio: None,
            status: String::new(),
            github_username: None,
            skills: Vec::new(),
            social: SocialLinks::default(),
            experience: Vec::new(),
            education: Vec::new(),
            date: Utc::now(),
        };
        profile.apply(fields);
        profile
    }

    /// Replace the owner id with its summary for a read response.
    pub fn populate(self, owner: UserSummary) -> Profile<UserSummary> {
        Profile {
            id: self.id,
            user: owner,
            company: self.company,
            website: self.website,
            location: self.location,
            bio: self.bio,
            status: self.status,
            github_username: self.github_username,
            skills: self.skills,
            social: self.social,
            experience: self.experience,
            education: self.education,
            date: self.date,
        }
    }
}

impl<U> Profile<U> {
    /// Partial update: only supplied fields change.
    pub fn apply(&mut self, fields: ProfileFields) {
        let ProfileFields {
            company,
            website,
            location,
            bio,
            status,
            github_username,
            skills,
            social,
        } = fields;

        if company.is_some() {
            self.company = company;
        }
        if website.is_some() {
            self.website = website;
        }
        if location.is_some() {
            self.location = location;
        }
        if bio.is_some() {
            self.bio = bio;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if github_username.is_some() {
            self.github_username = github_username;
        }
        if let Some(skills) = skills {
            self.skills = skills;
        }
        self.social.merge(social);
    }

    /// Most recent entries go first.
    pub fn add_experience(&mut self, entry: Experience) {
        self.experience.insert(0, entry);
    }

    pub fn remove_experience(&mut self, id: Uuid) -> Result<Experience, MutationError> {
        let index = self
            .experience
            .iter()
            .position(|e| e.id == id)
            .ok_or(MutationError::ExperienceNotFound)?;
        Ok(self.experience.remove(index))
    }

    pub fn add_education(&mut self, entry: Education) {
        self.education.insert(0, entry);
    }

    pub fn remove_education(&mut self, id: Uuid) -> Result<Education, MutationError> {
        let index = self
            .education
            .iter()
            .position(|e| e.id == id)
            .ok_or(MutationError::EducationNotFound)?;
        Ok(self.education.remove(index))
    }
}

/// Split a comma-separated skills string into trimmed, non-empty entries.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// -- Posts --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user: Uuid,
}

/// Comments carry the commenter's name and avatar as they were when the
/// comment was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

/// A post with its likes and comments embedded, newest first.
/// `name` and `avatar` are a snapshot of the author at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user: Uuid,
    pub text: String,
    pub name: String,
    pub avatar: String,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub date: DateTime<Utc>,
}

impl Post {
    pub fn new(author: &User, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: author.id,
            text,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            likes: Vec::new(),
            comments: Vec::new(),
            date: Utc::now(),
        }
    }

    pub fn is_authored_by(&self, user: Uuid) -> bool {
        self.user == user
    }

    pub fn is_liked_by(&self, user: Uuid) -> bool {
        self.likes.iter().any(|like| like.user == user)
    }

    pub fn like(&mut self, user: Uuid) -> Result<(), MutationError> {
        if self.is_liked_by(user) {
            return Err(MutationError::AlreadyLiked);
        }
        self.likes.insert(0, Like { user });
        Ok(())
    }

    pub fn unlike(&mut self, user: Uuid) -> Result<(), MutationError> {
        let index = self
            .likes
            .iter()
            .position(|like| like.user == user)
            .ok_or(MutationError::NotYetLiked)?;
        self.likes.remove(index);
        Ok(())
    }

    pub fn add_comment(&mut self, author: &User, text: &str) -> Result<&Comment, MutationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MutationError::TextRequired);
        }
        self.comments.insert(
            0,
            Comment {
                id: Uuid::new_v4(),
                user: author.id,
                text: text.to_string(),
                name: author.name.clone(),
                avatar: author.avatar.clone(),
                date: Utc::now(),
            },
        );
        Ok(&self.comments[0])
    }

    /// Remove the comment with `comment_id`. Only its author may do so.
    pub fn remove_comment(
        &mut self,
        comment_id: Uuid,
        requester: Uuid,
    ) -> Result<Comment, MutationError> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or(MutationError::CommentNotFound)?;
        if self.comments[index].user != requester {
            return Err(MutationError::NotCommentAuthor);
        }
        Ok(self.comments.remove(index))
    }
}
