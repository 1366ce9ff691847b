use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::investigator::InvestigatorWithRole;

/// A research group. The `attachment` column stores the opaque identifier of
/// the uploaded file; responses carry the resolved public URL instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    #[serde(rename = "idGrupo")]
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "numeroResolucion")]
    pub resolution_number: String,
    #[serde(rename = "lineaInvestigacion")]
    pub research_line: String,
    #[serde(rename = "tipoInvestigacion")]
    pub research_type: String,
    #[serde(rename = "fechaRegistro")]
    pub registered_on: NaiveDate,
    #[serde(rename = "archivo")]
    pub attachment: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a group; also the JSON shape of the composite
/// group-with-members creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "numeroResolucion")]
    pub resolution_number: String,
    #[serde(rename = "lineaInvestigacion")]
    pub research_line: String,
    #[serde(rename = "tipoInvestigacion")]
    pub research_type: String,
    #[serde(rename = "fechaRegistro")]
    pub registered_on: NaiveDate,
    #[serde(rename = "archivo", default)]
    pub attachment: Option<String>,
}

/// Read-only projection of a group with its full member list. Rebuilt on
/// every query from the link table; it has no independent lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct GroupWithInvestigators {
    #[serde(rename = "grupo")]
    pub group: Group,
    #[serde(rename = "investigadores")]
    pub investigators: Vec<InvestigatorWithRole>,
}

/// A group an investigator belongs to, carrying the whole member roster.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigatorGroup {
    #[serde(rename = "grupo")]
    pub group: Group,
    #[serde(rename = "integrantes")]
    pub members: Vec<InvestigatorWithRole>,
}

/// One flat row of the group ⟕ link ⟕ investigator join. Investigator columns
/// are NULL for groups without members.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberRow {
    pub id: i32,
    pub name: String,
    pub resolution_number: String,
    pub research_line: String,
    pub research_type: String,
    pub registered_on: NaiveDate,
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub investigator_id: Option<i32>,
    pub investigator_first_name: Option<String>,
    pub investigator_last_name: Option<String>,
    pub investigator_created_at: Option<DateTime<Utc>>,
    pub investigator_updated_at: Option<DateTime<Utc>>,
    pub role: Option<String>,
}

impl GroupMemberRow {
    pub fn group(&self) -> Group {
        Group {
            id: self.id,
            name: self.name.clone(),
            resolution_number: self.resolution_number.clone(),
            research_line: self.research_line.clone(),
            research_type: self.research_type.clone(),
            registered_on: self.registered_on,
            attachment: self.attachment.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// The joined member entry, when the left join matched one.
    pub fn member(&self) -> Option<InvestigatorWithRole> {
        let id = self.investigator_id?;
        Some(InvestigatorWithRole {
            id,
            first_name: self.investigator_first_name.clone().unwrap_or_default(),
            last_name: self.investigator_last_name.clone().unwrap_or_default(),
            role: self.role.clone().unwrap_or_default(),
            created_at: self.investigator_created_at.unwrap_or(self.created_at),
            updated_at: self.investigator_updated_at.unwrap_or(self.updated_at),
        })
    }
}
