use crate::api::wire;
use crate::model::{ShiftAssignment, StaffId, StaffMember};
use anyhow::Context;
use csv::WriterBuilder;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Nom affiché ; l'identifiant sert de repli quand la personne n'est pas chargée.
fn display_name<'a>(id: &'a StaffId, staff: &'a [StaffMember]) -> &'a str {
    staff
        .iter()
        .find(|m| &m.id == id)
        .map(|m| m.full_name.as_str())
        .unwrap_or(id.as_str())
}

fn names<'a>(ids: &'a BTreeSet<StaffId>, staff: &'a [StaffMember]) -> Vec<&'a str> {
    ids.iter().map(|id| display_name(id, staff)).collect()
}

/// Export CSV des créneaux: header `id,title,shift,date,start,end,doctors,nurses,description`
/// (soignants séparés par `;`)
pub fn export_shifts_csv<P: AsRef<Path>>(
    path: P,
    shifts: &[&ShiftAssignment],
    staff: &[StaffMember],
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut w = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "id",
        "title",
        "shift",
        "date",
        "start",
        "end",
        "doctors",
        "nurses",
        "description",
    ])?;
    for s in shifts {
        let date = s.date().format("%Y-%m-%d").to_string();
        let start = wire::format_timestamp(s.start);
        let end = wire::format_timestamp(s.end);
        let doctors = names(&s.assigned_doctors, staff).join(";");
        let nurses = names(&s.assigned_nurses, staff).join(";");
        w.write_record([
            s.id.as_str(),
            s.title.as_str(),
            s.shift_type.as_str(),
            date.as_str(),
            start.as_str(),
            end.as_str(),
            doctors.as_str(),
            nurses.as_str(),
            s.description.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ShiftRow<'a> {
    id: &'a str,
    title: &'a str,
    shift: &'a str,
    start: String,
    end: String,
    doctors: Vec<&'a str>,
    nurses: Vec<&'a str>,
    description: &'a str,
}

/// Export JSON des créneaux (jolie mise en forme)
pub fn export_shifts_json<P: AsRef<Path>>(
    path: P,
    shifts: &[&ShiftAssignment],
    staff: &[StaffMember],
) -> anyhow::Result<()> {
    let rows: Vec<ShiftRow<'_>> = shifts
        .iter()
        .map(|s| ShiftRow {
            id: s.id.as_str(),
            title: s.title.as_str(),
            shift: s.shift_type.as_str(),
            start: wire::format_timestamp(s.start),
            end: wire::format_timestamp(s.end),
            doctors: names(&s.assigned_doctors, staff),
            nurses: names(&s.assigned_nurses, staff),
            description: s.description.as_str(),
        })
        .collect();
    let json = serde_json::to_string_pretty(&rows)?;
    let path = path.as_ref();
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
