use chrono::NaiveDateTime;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogRow {
    pub id: i64,
    pub action_type: String,
    pub participant_id: Option<i64>,
    pub participant_name: Option<String>,
    pub description: String,
    pub points_awarded: Option<i64>,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    AddParticipant,
    EditParticipant,
    DeleteParticipant,
    AddAchievement,
    ToggleActive,
    LegacyMigration,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::AddParticipant => "add_participant",
            ActionType::EditParticipant => "edit_participant",
            ActionType::DeleteParticipant => "delete_participant",
            ActionType::AddAchievement => "add_achievement",
            ActionType::ToggleActive => "toggle_active",
            ActionType::LegacyMigration => "legacy_migration",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionType::AddParticipant => "Member added",
            ActionType::EditParticipant => "Member edited",
            ActionType::DeleteParticipant => "Member deleted",
            ActionType::AddAchievement => "Achievement awarded",
            ActionType::ToggleActive => "Status changed",
            ActionType::LegacyMigration => "Legacy import",
        }
    }

    /// Accepts both current names and the pilot-era names found in legacy logs.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "add_participant" | "add_pilot" => Some(ActionType::AddParticipant),
            "edit_participant" | "edit_pilot" => Some(ActionType::EditParticipant),
            "delete_participant" | "delete_pilot" => Some(ActionType::DeleteParticipant),
            "add_achievement" => Some(ActionType::AddAchievement),
            "toggle_active" => Some(ActionType::ToggleActive),
            "legacy_migration" => Some(ActionType::LegacyMigration),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_action_names_map_to_current_ones() {
        assert_eq!(ActionType::parse("add_pilot"), Some(ActionType::AddParticipant));
        assert_eq!(ActionType::parse("edit_pilot"), Some(ActionType::EditParticipant));
        assert_eq!(ActionType::parse("delete_pilot"), Some(ActionType::DeleteParticipant));
        assert_eq!(ActionType::parse("add_achievement"), Some(ActionType::AddAchievement));
        assert_eq!(ActionType::parse("rename"), None);
    }
}
