//! One-shot status messages carried through redirects as `?notice=<code>&ref=<formatted id>`.

use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::error::{ConflictField, InvalidInput};

#[derive(Debug, Deserialize, Default)]
pub struct NoticeQuery {
    pub notice: Option<String>,
    #[serde(rename = "ref")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    AuthRequired,
    LoginFailed,
    LoggedIn,
    LoggedOut,
    ParticipantAdded,
    ParticipantUpdated,
    ParticipantDeleted,
    AchievementAdded,
    AchievementRecorded,
    StatusChanged,
    CallsignTaken,
    IdConflict,
    Invalid(InvalidInput),
}

impl Notice {
    pub fn code(self) -> &'static str {
        match self {
            Notice::AuthRequired => "auth_required",
            Notice::LoginFailed => "login_failed",
            Notice::LoggedIn => "logged_in",
            Notice::LoggedOut => "logged_out",
            Notice::ParticipantAdded => "participant_added",
            Notice::ParticipantUpdated => "participant_updated",
            Notice::ParticipantDeleted => "participant_deleted",
            Notice::AchievementAdded => "achievement_added",
            Notice::AchievementRecorded => "achievement_recorded",
            Notice::StatusChanged => "status_changed",
            Notice::CallsignTaken => "callsign_taken",
            Notice::IdConflict => "id_conflict",
            Notice::Invalid(InvalidInput::Callsign) => "invalid_callsign",
            Notice::Invalid(InvalidInput::Category) => "invalid_category",
            Notice::Invalid(InvalidInput::Subcategory) => "invalid_subcategory",
            Notice::Invalid(InvalidInput::PhotoUrl) => "invalid_photo",
            Notice::Invalid(InvalidInput::Description) => "invalid_description",
            Notice::Invalid(InvalidInput::Points) => "invalid_points",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        let notice = match code {
            "auth_required" => Notice::AuthRequired,
            "login_failed" => Notice::LoginFailed,
            "logged_in" => Notice::LoggedIn,
            "logged_out" => Notice::LoggedOut,
            "participant_added" => Notice::ParticipantAdded,
            "participant_updated" => Notice::ParticipantUpdated,
            "participant_deleted" => Notice::ParticipantDeleted,
            "achievement_added" => Notice::AchievementAdded,
            "achievement_recorded" => Notice::AchievementRecorded,
            "status_changed" => Notice::StatusChanged,
            "callsign_taken" => Notice::CallsignTaken,
            "id_conflict" => Notice::IdConflict,
            "invalid_callsign" => Notice::Invalid(InvalidInput::Callsign),
            "invalid_category" => Notice::Invalid(InvalidInput::Category),
            "invalid_subcategory" => Notice::Invalid(InvalidInput::Subcategory),
            "invalid_photo" => Notice::Invalid(InvalidInput::PhotoUrl),
            "invalid_description" => Notice::Invalid(InvalidInput::Description),
            "invalid_points" => Notice::Invalid(InvalidInput::Points),
            _ => return None,
        };
        Some(notice)
    }

    pub fn from_conflict(field: ConflictField) -> Self {
        match field {
            ConflictField::Callsign => Notice::CallsignTaken,
            _ => Notice::IdConflict,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(
            self,
            Notice::AuthRequired
                | Notice::LoginFailed
                | Notice::CallsignTaken
                | Notice::IdConflict
                | Notice::Invalid(_)
        )
    }

    pub fn message(self, subject: Option<&str>) -> String {
        let who = subject.unwrap_or("Member");
        match self {
            Notice::AuthRequired => {
                "Access denied. Please sign in to use the admin panel.".to_string()
            }
            Notice::LoginFailed => "Invalid username or password.".to_string(),
            Notice::LoggedIn => "Signed in.".to_string(),
            Notice::LoggedOut => "Signed out.".to_string(),
            Notice::ParticipantAdded => format!("{} added.", who),
            Notice::ParticipantUpdated => format!("{} updated.", who),
            Notice::ParticipantDeleted => format!("{} deleted.", who),
            Notice::AchievementAdded => format!("Achievement added for {}.", who),
            Notice::AchievementRecorded => format!(
                "Achievement recorded for {}. Points only count towards pilot totals.",
                who
            ),
            Notice::StatusChanged => format!("Status of {} changed.", who),
            Notice::CallsignTaken => "That callsign is already in use.".to_string(),
            Notice::IdConflict => {
                "Could not allocate a member ID. Please try again.".to_string()
            }
            Notice::Invalid(invalid) => {
                let text = invalid.to_string();
                let mut chars = text.chars();
                match chars.next() {
                    Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
                    None => text,
                }
            }
        }
    }
}

/// Only formatted IDs are echoed back into pages.
fn sanitize_subject(raw: &str) -> Option<&str> {
    let s = raw.trim();
    if s.is_empty() || s.len() > 20 {
        return None;
    }
    if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    Some(s)
}

/// Flash message ready for a template. Empty `message` means nothing to show.
#[derive(Debug, Clone, Default)]
pub struct NoticeView {
    pub message: String,
    pub is_error: bool,
}

impl NoticeView {
    pub fn from_query(query: &NoticeQuery) -> Self {
        let Some(notice) = query.notice.as_deref().and_then(Notice::parse) else {
            return Self::default();
        };
        let subject = query.subject.as_deref().and_then(sanitize_subject);
        Self {
            message: notice.message(subject),
            is_error: notice.is_error(),
        }
    }
}

pub fn redirect_with_notice(path: &str, notice: Notice, subject: Option<&str>) -> Response {
    let sep = if path.contains('?') { "&" } else { "?" };
    let target = match subject.and_then(sanitize_subject) {
        Some(s) => format!("{}{}notice={}&ref={}", path, sep, notice.code(), s),
        None => format!("{}{}notice={}", path, sep, notice.code()),
    };
    Redirect::to(&target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_parses_back() {
        let all = [
            Notice::AuthRequired,
            Notice::LoginFailed,
            Notice::LoggedIn,
            Notice::LoggedOut,
            Notice::ParticipantAdded,
            Notice::ParticipantUpdated,
            Notice::ParticipantDeleted,
            Notice::AchievementAdded,
            Notice::AchievementRecorded,
            Notice::StatusChanged,
            Notice::CallsignTaken,
            Notice::IdConflict,
            Notice::Invalid(InvalidInput::Points),
        ];
        for notice in all {
            assert_eq!(Notice::parse(notice.code()), Some(notice));
        }
    }

    #[test]
    fn view_ignores_unknown_codes_and_unsafe_subjects() {
        let view = NoticeView::from_query(&NoticeQuery {
            notice: Some("bogus".to_string()),
            subject: None,
        });
        assert!(view.message.is_empty());

        let view = NoticeView::from_query(&NoticeQuery {
            notice: Some("participant_added".to_string()),
            subject: Some("<script>".to_string()),
        });
        assert_eq!(view.message, "Member added.");

        let view = NoticeView::from_query(&NoticeQuery {
            notice: Some("participant_added".to_string()),
            subject: Some("UAV-0007".to_string()),
        });
        assert_eq!(view.message, "UAV-0007 added.");
        assert!(!view.is_error);
    }

    #[test]
    fn invalid_input_messages_are_capitalized() {
        let message = Notice::Invalid(InvalidInput::Points).message(None);
        assert!(message.starts_with("Points must be a whole number"));
        assert!(Notice::Invalid(InvalidInput::Points).is_error());
    }

    #[test]
    fn redirect_appends_to_existing_query() {
        let response = redirect_with_notice("/admin?q=orel", Notice::LoggedIn, None);
        let location = response.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/admin?q=orel&notice=logged_in");
    }
}
