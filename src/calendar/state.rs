use crate::api::EventQuery;
use crate::model::RoleFilter;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mise en page du planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Week,
    Day,
    List,
}

impl ViewMode {
    /// Pas de navigation en jours.
    pub fn step_days(self) -> i64 {
        match self {
            ViewMode::Week => 7,
            ViewMode::Day | ViewMode::List => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Week => "week",
            ViewMode::Day => "day",
            ViewMode::List => "list",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(ViewMode::Week),
            "day" => Ok(ViewMode::Day),
            "list" => Ok(ViewMode::List),
            other => Err(format!("unknown view: {other} (expected week, day or list)")),
        }
    }
}

/// Les 7 jours de la semaine (dimanche en tête) contenant `date`.
///
/// Aux limites du calendrier, les jours hors plage sont ramenés à
/// `NaiveDate::MIN` / `NaiveDate::MAX`.
pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let back = Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    let sunday = date.checked_sub_signed(back).unwrap_or(NaiveDate::MIN);
    std::array::from_fn(|i| {
        sunday
            .checked_add_signed(Duration::days(i as i64))
            .unwrap_or(NaiveDate::MAX)
    })
}

/// Intervalle de dates visible, bornes incluses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 00:00:00 du premier jour.
    pub fn start_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// 23:59:59 du dernier jour.
    pub fn end_bound(&self) -> NaiveDateTime {
        let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        self.end.and_time(last)
    }
}

/// État transitoire de la vue planning (non persisté).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarViewState {
    pub current_date: NaiveDate,
    pub view_mode: ViewMode,
    pub search_query: String,
    pub role_filter: RoleFilter,
}

impl CalendarViewState {
    pub fn new(current_date: NaiveDate) -> Self {
        Self {
            current_date,
            view_mode: ViewMode::default(),
            search_query: String::new(),
            role_filter: RoleFilter::default(),
        }
    }

    pub fn with_view(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }

    pub fn with_search<S: Into<String>>(mut self, query: S) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_role(mut self, role_filter: RoleFilter) -> Self {
        self.role_filter = role_filter;
        self
    }

    pub fn week_days(&self) -> [NaiveDate; 7] {
        week_days(self.current_date)
    }

    /// Semaine entière en vue semaine, la seule journée courante sinon.
    pub fn period(&self) -> Period {
        match self.view_mode {
            ViewMode::Week => {
                let days = self.week_days();
                Period {
                    start: days[0],
                    end: days[6],
                }
            }
            ViewMode::Day | ViewMode::List => Period {
                start: self.current_date,
                end: self.current_date,
            },
        }
    }

    pub fn previous(&mut self) {
        let step = Duration::days(self.view_mode.step_days());
        if let Some(date) = self.current_date.checked_sub_signed(step) {
            self.current_date = date;
        }
    }

    pub fn next(&mut self) {
        let step = Duration::days(self.view_mode.step_days());
        if let Some(date) = self.current_date.checked_add_signed(step) {
            self.current_date = date;
        }
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.current_date = date;
    }

    /// Revient à la date du jour (horloge locale).
    pub fn today(&mut self) {
        self.current_date = Local::now().date_naive();
    }

    pub fn event_query(&self) -> EventQuery {
        let period = self.period();
        let search = self.search_query.trim();
        EventQuery {
            start: period.start_bound(),
            end: period.end_bound(),
            search: (!search.is_empty()).then(|| search.to_string()),
            role: self.role_filter.role(),
        }
    }
}
