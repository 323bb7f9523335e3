//! Résolution des horaires concrets d'une garde à partir de son type.
//!
//! | Garde   | Début    | Fin               |
//! |---------|----------|-------------------|
//! | Morning | 06:00:00 | 14:00:00          |
//! | Evening | 14:00:00 | 22:00:00          |
//! | Night   | 22:00:00 | 06:00:00 (J+1)    |
//!
//! Aucune conversion de fuseau : on travaille en heure « murale ».

use crate::model::{ShiftAssignment, ShiftType};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Début/fin concrets d'un créneau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTimes {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ShiftTimes {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

fn clock(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

impl ShiftType {
    /// Heures murales de début et de fin.
    pub fn window(self) -> (NaiveTime, NaiveTime) {
        match self {
            ShiftType::Morning => (clock(6), clock(14)),
            ShiftType::Evening => (clock(14), clock(22)),
            ShiftType::Night => (clock(22), clock(6)),
        }
    }

    pub fn crosses_midnight(self) -> bool {
        let (start, end) = self.window();
        end <= start
    }

    /// Nombre d'heures couvertes (8 pour chaque garde).
    pub fn hours(self) -> i64 {
        let (start, end) = self.window();
        let mut span = end.signed_duration_since(start);
        if span <= Duration::zero() {
            span += Duration::days(1);
        }
        span.num_hours()
    }

    /// Horaires concrets pour la date donnée ; la nuit se termine le lendemain.
    pub fn resolve(self, date: NaiveDate) -> ShiftTimes {
        let (start_time, end_time) = self.window();
        let end_date = if self.crosses_midnight() {
            date.succ_opt().unwrap_or(date)
        } else {
            date
        };
        ShiftTimes {
            start: date.and_time(start_time),
            end: end_date.and_time(end_time),
        }
    }
}

/// Résout un libellé de garde contre la date calendaire de `reference`.
///
/// L'heure de `reference` est ignorée. `None` si le libellé est inconnu.
pub fn resolve(label: &str, reference: NaiveDateTime) -> Option<ShiftTimes> {
    let shift: ShiftType = label.parse().ok()?;
    Some(shift.resolve(reference.date()))
}

/// Recalcule les horaires ; un libellé inconnu laisse `current` intact.
pub fn retime(label: &str, current: ShiftTimes) -> ShiftTimes {
    resolve(label, current.start).unwrap_or(current)
}

/// Nouveaux horaires d'un créneau déplacé à `new_date` (début et fin re-dérivés).
pub fn reschedule(shift: &ShiftAssignment, new_date: NaiveDate) -> ShiftTimes {
    shift.shift_type.resolve(new_date)
}

/// Fin de garde normalisée : une nuit enregistrée avec une fin « même jour »
/// (06:00 avant le début à 22:00) est reportée au lendemain.
pub fn normalize_end(shift: ShiftType, start: NaiveDateTime, end: NaiveDateTime) -> NaiveDateTime {
    if shift.crosses_midnight() && end <= start {
        end + Duration::days(1)
    } else {
        end
    }
}
