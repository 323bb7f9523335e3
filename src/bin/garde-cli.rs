#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use garde::{
    calendar::{render, CalendarController, CalendarViewState, FetchOutcome, ViewMode},
    config::ClientConfig,
    io,
    model::{RoleFilter, ShiftDraft, ShiftId, ShiftType, StaffId},
    staffing,
    storage::{JsonStorage, Storage},
    HttpScheduleApi,
};
use std::path::PathBuf;
use tracing::warn;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Planning des gardes hospitalières (client de l'API REST)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier de configuration TOML (défaut: ~/.garde/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Racine de l'API REST
    #[arg(long, global = true, env = "GARDE_BASE_URL")]
    base_url: Option<String>,

    /// Jeton bearer
    #[arg(long, global = true, env = "GARDE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Lecture seule depuis le cache local, sans appel réseau
    #[arg(long, global = true)]
    offline: bool,

    /// Fichier JSON du cache hors ligne (défaut: ~/.garde/snapshot.json)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug, Clone)]
struct ViewArgs {
    /// Date de référence AAAA-MM-JJ (défaut: aujourd'hui)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Filtre sur le nom du soignant
    #[arg(long)]
    search: Option<String>,
    /// all, doctor ou nurse
    #[arg(long)]
    role: Option<RoleFilter>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Planning dans la vue par défaut (`default_view` de la configuration)
    Show(ViewArgs),

    /// Grille de la semaine (dimanche → samedi)
    Week(ViewArgs),

    /// Journée groupée par garde
    Day(ViewArgs),

    /// Créneaux du jour, par heure de début
    List(ViewArgs),

    /// Effectif du jour et répartition par garde
    Stats(ViewArgs),

    /// Affectations tombant sur un congé approuvé
    Leaves(ViewArgs),

    /// Planning personnel et charge horaire
    Mine {
        /// Identifiant du soignant (défaut: celui du jeton)
        #[arg(long)]
        staff_id: Option<String>,
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Créer un créneau
    Create {
        #[arg(long)]
        title: String,
        /// morning, evening ou night
        #[arg(long)]
        shift: ShiftType,
        #[arg(long)]
        date: NaiveDate,
        /// identifiants "id1,id2,..."
        #[arg(long, value_delimiter = ',')]
        doctors: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        nurses: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Déplacer un créneau à une autre date (horaires recalculés)
    Move {
        #[arg(long)]
        id: String,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Supprimer un créneau
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Affectation automatique de la semaine suivante (côté serveur)
    AutoSchedule,

    /// Export PDF (rendu serveur) et exports locaux optionnels
    Export {
        /// week ou day
        #[arg(long, default_value = "week")]
        view: ViewMode,
        /// Fichier PDF (défaut: nom proposé dans le répertoire courant)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        json: Option<PathBuf>,
        #[command(flatten)]
        filters: ViewArgs,
    },
}

fn view_state(args: &ViewArgs, view: ViewMode, config: &ClientConfig) -> CalendarViewState {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    CalendarViewState::new(date)
        .with_view(view)
        .with_search(args.search.clone().unwrap_or_default())
        .with_role(args.role.unwrap_or(config.default_role))
}

/// Charge la période visible ; en cas d'échec réseau, retombe sur le cache
/// s'il couvre la même période.
async fn load(ctl: &mut CalendarController, api: Option<&HttpScheduleApi>, storage: Option<&JsonStorage>) -> Result<()> {
    let period = ctl.state().period();
    let Some(api) = api else {
        let storage = storage.context("offline mode needs a snapshot file (--snapshot)")?;
        let snapshot = storage.load()?;
        if !snapshot.covers(period) {
            bail!(
                "snapshot covers {} to {}, not {} to {}",
                snapshot.period.start,
                snapshot.period.end,
                period.start,
                period.end
            );
        }
        ctl.restore(snapshot);
        return Ok(());
    };

    match ctl.refresh(api).await {
        FetchOutcome::Applied => {
            if let Some(storage) = storage {
                if let Err(err) = storage.save(&ctl.snapshot()) {
                    warn!(error = %err, path = %storage.path().display(), "could not cache schedule");
                }
            }
        }
        FetchOutcome::Failed => {
            let cached = storage
                .filter(|s| s.exists())
                .and_then(|s| s.load().ok())
                .filter(|snap| snap.covers(period));
            if let Some(snapshot) = cached {
                eprintln!("Showing cached schedule from {}", snapshot.fetched_at.format("%Y-%m-%d %H:%M"));
                ctl.restore(snapshot);
            }
        }
        FetchOutcome::Stale => {}
    }
    Ok(())
}

fn render_view(ctl: &CalendarController, today: NaiveDate) -> String {
    match ctl.state().view_mode {
        ViewMode::Week => render::render_week(&ctl.week_grid(today)),
        ViewMode::Day => render::render_day(&ctl.day_view()),
        ViewMode::List => render::render_list(&ctl.list_view()),
    }
}

fn online<'a>(api: &'a Option<HttpScheduleApi>, what: &str) -> Result<&'a HttpScheduleApi> {
    match api {
        Some(api) => Ok(api),
        None => bail!("{what} needs the server (drop --offline)"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = match &cli.config {
        Some(path) => ClientConfig::load_from(path).with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::load(),
    }
    .merge(cli.base_url.clone(), cli.token.clone());

    let storage = match cli.snapshot.clone().or_else(|| config.snapshot_path()) {
        Some(path) => Some(JsonStorage::open(path)?),
        None => None,
    };
    let api = if cli.offline {
        None
    } else {
        Some(HttpScheduleApi::new(config.session()?)?)
    };

    let today = Local::now().date_naive();
    let mut ctl = CalendarController::new(CalendarViewState::new(today).with_view(config.default_view));
    let mut code = 0;

    match cli.cmd {
        Commands::Show(args) => {
            ctl = CalendarController::new(view_state(&args, config.default_view, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;
            println!("{}", render_view(&ctl, today));
        }
        Commands::Week(args) => {
            ctl = CalendarController::new(view_state(&args, ViewMode::Week, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;
            println!("{}", render_view(&ctl, today));
        }
        Commands::Day(args) => {
            ctl = CalendarController::new(view_state(&args, ViewMode::Day, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;
            println!("{}", render_view(&ctl, today));
        }
        Commands::List(args) => {
            ctl = CalendarController::new(view_state(&args, ViewMode::List, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;
            println!("{}", render_view(&ctl, today));
        }
        Commands::Stats(args) => {
            ctl = CalendarController::new(view_state(&args, ViewMode::Day, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;
            println!(
                "{}",
                render::render_stats(ctl.staff_count(), &ctl.distribution(), ctl.approved_leave_count())
            );
        }
        Commands::Leaves(args) => {
            ctl = CalendarController::new(view_state(&args, ViewMode::Week, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;
            let conflicts = ctl.leave_conflicts();
            println!("{}", render::render_conflicts(&conflicts, ctl.data()));
            if !conflicts.is_empty() {
                eprintln!("Found {} assignment(s) on approved leave", conflicts.len());
                // Code 2 = WARNING
                code = 2;
            }
        }
        Commands::Mine { staff_id, view } => {
            let staff_id = match staff_id {
                Some(id) => StaffId::new(id),
                None => {
                    let claims = api.as_ref().and_then(|a| a.session().claims()).or_else(|| {
                        config.session().ok().and_then(|s| s.claims())
                    });
                    match claims.and_then(|c| c.user_id) {
                        Some(id) => StaffId::new(id),
                        None => bail!("no staff id: pass --staff-id or sign in with a token"),
                    }
                }
            };
            let mut state = view_state(&view, ViewMode::Week, &config);
            state.role_filter = RoleFilter::All;
            ctl = CalendarController::new(state);
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;

            let now = Local::now().naive_local();
            let shifts: Vec<_> = ctl
                .visible_shifts()
                .into_iter()
                .filter(|s| s.includes(&staff_id))
                .collect();
            let workload = staffing::workload(shifts.iter().copied(), &staff_id, now);
            let name = ctl
                .data()
                .find_staff(&staff_id)
                .map(|m| m.full_name.clone())
                .unwrap_or_else(|| staff_id.to_string());
            println!("{}", render::render_personal(&name, &shifts, &workload, now));
        }
        Commands::Create {
            title,
            shift,
            date,
            doctors,
            nurses,
            description,
        } => {
            let api = online(&api, "create")?;
            let draft = ShiftDraft::new(title, shift, date)
                .with_doctors(doctors.into_iter().map(StaffId::new))
                .with_nurses(nurses.into_iter().map(StaffId::new))
                .with_description(description);
            let created = ctl.create_shift(api, &draft).await?;
            println!(
                "Created shift {} ({}, {} to {})",
                created.id,
                created.title,
                created.start.format("%Y-%m-%d %H:%M"),
                created.end.format("%Y-%m-%d %H:%M")
            );
        }
        Commands::Move { id, date } => {
            let api = online(&api, "move")?;
            let moved = ctl.move_shift(api, &ShiftId::new(id), date).await?;
            println!(
                "Moved shift {} to {} to {}",
                moved.id,
                moved.start.format("%Y-%m-%d %H:%M"),
                moved.end.format("%Y-%m-%d %H:%M")
            );
        }
        Commands::Delete { id } => {
            let api = online(&api, "delete")?;
            let id = ShiftId::new(id);
            ctl.delete_shift(api, &id).await?;
            println!("Deleted shift {id}");
        }
        Commands::AutoSchedule => {
            let api = online(&api, "auto-schedule")?;
            let report = ctl.auto_schedule(api).await?;
            println!(
                "{} ({} shift(s) created)",
                report.message.as_deref().unwrap_or("Weekly schedule generated"),
                report.created_count.unwrap_or(0)
            );
            for line in report.log.as_deref().unwrap_or("").lines().filter(|l| !l.trim().is_empty()) {
                println!("  {line}");
            }
        }
        Commands::Export {
            view,
            out,
            csv,
            json,
            filters,
        } => {
            ctl = CalendarController::new(view_state(&filters, view, &config));
            load(&mut ctl, api.as_ref(), storage.as_ref()).await?;

            let period = ctl.state().clone().with_view(view).period();
            let shifts = ctl.shifts_in(period);
            if let Some(path) = csv {
                io::export_shifts_csv(&path, &shifts, &ctl.data().staff)?;
                println!("Wrote {} shift(s) to {}", shifts.len(), path.display());
            }
            if let Some(path) = json {
                io::export_shifts_json(&path, &shifts, &ctl.data().staff)?;
                println!("Wrote {} shift(s) to {}", shifts.len(), path.display());
            }

            if let Some(api) = api.as_ref() {
                let export = ctl.export_pdf(api, view).await?;
                let path = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
                std::fs::write(&path, &export.bytes).with_context(|| format!("writing {}", path.display()))?;
                println!("Exported {} shift(s) to {}", export.shift_count, path.display());
            } else if out.is_some() {
                bail!("PDF export needs the server (drop --offline)");
            }
        }
    }

    if let Some(banner) = ctl.banner() {
        eprintln!("error: {banner}");
        code = 2;
    }

    std::process::exit(code);
}
