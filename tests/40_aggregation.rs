//! Row collapsing and the Spanish wire format of the nested group responses.

use chrono::{NaiveDate, TimeZone, Utc};
use grupos_api::models::{GroupMemberRow, NewGroup};
use grupos_api::repository::groups::collapse_rows;
use grupos_api::repository::MemberSpec;

fn row(group_id: i32, name: &str, member: Option<(i32, &str, &str, &str)>) -> GroupMemberRow {
    let ts = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    GroupMemberRow {
        id: group_id,
        name: name.to_string(),
        resolution_number: format!("RES-{group_id:03}"),
        research_line: "Inteligencia artificial".to_string(),
        research_type: "Básica".to_string(),
        registered_on: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
        attachment: None,
        created_at: ts,
        updated_at: ts,
        investigator_id: member.map(|(id, ..)| id),
        investigator_first_name: member.map(|(_, first, ..)| first.to_string()),
        investigator_last_name: member.map(|(_, _, last, _)| last.to_string()),
        investigator_created_at: member.map(|_| ts),
        investigator_updated_at: member.map(|_| ts),
        role: member.map(|(.., role)| role.to_string()),
    }
}

#[test]
fn contiguous_rows_collapse_into_one_group_each() {
    let rows = vec![
        row(1, "Sistemas distribuidos", Some((7, "Ana", "López", "Coordinador"))),
        row(1, "Sistemas distribuidos", Some((8, "Luis", "Quispe", "Miembro"))),
        row(2, "Robótica", Some((9, "Rosa", "Huamán", "Coordinador"))),
        row(3, "Bioinformática", None),
    ];

    let collapsed = collapse_rows(rows);
    assert_eq!(collapsed.len(), 3);
    assert_eq!(collapsed[0].investigators.len(), 2);
    assert_eq!(collapsed[1].investigators.len(), 1);
    assert!(collapsed[2].investigators.is_empty());
}

#[test]
fn duplicate_member_rows_collapse_to_one_entry() {
    let rows = vec![
        row(1, "Sistemas", Some((7, "Ana", "López", "Coordinador"))),
        row(1, "Sistemas", Some((7, "Ana", "López", "Coordinador"))),
    ];
    let collapsed = collapse_rows(rows);
    assert_eq!(collapsed[0].investigators.len(), 1);
}

#[test]
fn nested_group_serializes_with_spanish_keys() {
    let collapsed = collapse_rows(vec![row(
        4,
        "Energías renovables",
        Some((11, "María", "Fernández", "Miembro")),
    )]);
    let v = serde_json::to_value(&collapsed[0]).unwrap();

    let grupo = v.get("grupo").unwrap();
    assert_eq!(grupo["idGrupo"], 4);
    assert_eq!(grupo["nombre"], "Energías renovables");
    assert_eq!(grupo["numeroResolucion"], "RES-004");
    assert_eq!(grupo["lineaInvestigacion"], "Inteligencia artificial");
    assert_eq!(grupo["tipoInvestigacion"], "Básica");
    assert_eq!(grupo["fechaRegistro"], "2023-08-01");
    assert!(grupo["archivo"].is_null());

    let investigadores = v.get("investigadores").unwrap().as_array().unwrap();
    assert_eq!(investigadores.len(), 1);
    assert_eq!(investigadores[0]["idInvestigador"], 11);
    assert_eq!(investigadores[0]["nombre"], "María");
    assert_eq!(investigadores[0]["apellido"], "Fernández");
    assert_eq!(investigadores[0]["rol"], "Miembro");
}

#[test]
fn composite_create_payload_deserializes_from_wire_names() {
    let payload = serde_json::json!({
        "nombre": "Nuevo grupo",
        "numeroResolucion": "RES-100",
        "lineaInvestigacion": "Redes",
        "tipoInvestigacion": "Aplicada",
        "fechaRegistro": "2024-02-20"
    });
    let group: NewGroup = serde_json::from_value(payload).unwrap();
    assert_eq!(group.name, "Nuevo grupo");
    assert_eq!(group.registered_on, NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
    // archivo is optional and defaults to none.
    assert!(group.attachment.is_none());

    let member: MemberSpec =
        serde_json::from_value(serde_json::json!({ "idInvestigador": 3, "tipoRelacion": "Coordinador" }))
            .unwrap();
    assert_eq!(member.investigator_id, 3);
    assert_eq!(member.role, "Coordinador");
}
