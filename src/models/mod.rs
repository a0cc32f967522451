pub mod achievement;
pub mod activity_log;
pub mod participant;

pub use achievement::AchievementRow;
pub use activity_log::{ActionType, ActivityLogRow};
pub use participant::{Category, ParticipantRow, Subcategory};
