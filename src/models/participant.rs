use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

pub const DEFAULT_PHOTO: &str = "default-pilot.svg";
pub const PARTICIPANT_ID_PREFIX: &str = "UAV";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParticipantRow {
    pub id: i64,
    pub participant_id: String,
    pub callsign: String,
    pub photo_url: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub join_date: NaiveDateTime,
    pub points: i64,
    pub qr_code: String,
    pub is_active: bool,
}

impl ParticipantRow {
    pub fn category(&self) -> Option<Category> {
        Category::parse(&self.category)
    }

    pub fn subcategory(&self) -> Option<Subcategory> {
        self.subcategory.as_deref().and_then(Subcategory::parse)
    }

    /// Only pilots accumulate achievement points and appear on the leaderboard.
    pub fn is_pilot(&self) -> bool {
        self.category() == Some(Category::Pilot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pilot,
    Instructor,
    Technician,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Pilot, Category::Instructor, Category::Technician];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pilot => "pilot",
            Category::Instructor => "instructor",
            Category::Technician => "technician",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Pilot => "Pilot",
            Category::Instructor => "Instructor",
            Category::Technician => "Technician",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "pilot" => Some(Category::Pilot),
            "instructor" => Some(Category::Instructor),
            "technician" => Some(Category::Technician),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcategory {
    Strike,
    Reconnaissance,
}

impl Subcategory {
    pub const ALL: [Subcategory; 2] = [Subcategory::Strike, Subcategory::Reconnaissance];

    pub fn as_str(self) -> &'static str {
        match self {
            Subcategory::Strike => "strike",
            Subcategory::Reconnaissance => "reconnaissance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Subcategory::Strike => "Strike",
            Subcategory::Reconnaissance => "Reconnaissance",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "strike" => Some(Subcategory::Strike),
            "reconnaissance" | "recon" => Some(Subcategory::Reconnaissance),
            _ => None,
        }
    }
}

/// Human label for a stored category/subcategory pair, e.g. "Pilot · Strike".
pub fn role_label(category: &str, subcategory: Option<&str>) -> String {
    let category_label = Category::parse(category)
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| category.to_string());
    match subcategory.and_then(Subcategory::parse) {
        Some(sub) => format!("{} · {}", category_label, sub.label()),
        None => category_label,
    }
}
