use std::str::FromStr;

use serde::Deserialize;
use strum::EnumString;

/// Review verdict reported by the API. Statuses the server may add later
/// fall back to `Unknown` rather than failing the decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum HomeworkStatus {
    Reviewing,
    Rejected,
    Approved,
    Unknown,
}

/// One homework entry as the review API reports it. Both fields default to
/// the empty string so a partial record still decodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Homework {
    #[serde(default)]
    pub homework_name: String,
    #[serde(default)]
    pub status: String,
}

impl Homework {
    pub fn status(&self) -> HomeworkStatus {
        HomeworkStatus::from_str(&self.status).unwrap_or(HomeworkStatus::Unknown)
    }
}

/// Decoded body of one homework-statuses response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatusPage {
    #[serde(default)]
    pub homeworks: Vec<Homework>,
    #[serde(default)]
    pub current_date: Option<i64>,
}
