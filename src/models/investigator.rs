use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A researcher, linkable to any number of groups.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Investigator {
    #[serde(rename = "idInvestigador")]
    pub id: i32,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// An investigator together with the role they hold in one specific group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestigatorWithRole {
    #[serde(rename = "idInvestigador")]
    pub id: i32,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "rol")]
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
