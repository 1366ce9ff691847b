use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The many-to-many link between a group and an investigator, carrying the
/// role the investigator holds in that group (e.g. "Coordinador").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    #[serde(rename = "idGrupoInvestigador")]
    pub id: i32,
    #[serde(rename = "idGrupo")]
    pub group_id: i32,
    #[serde(rename = "idInvestigador")]
    pub investigator_id: i32,
    #[serde(rename = "rol")]
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMembership {
    #[serde(rename = "idGrupo")]
    pub group_id: i32,
    #[serde(rename = "idInvestigador")]
    pub investigator_id: i32,
    #[serde(rename = "rol")]
    pub role: String,
}
