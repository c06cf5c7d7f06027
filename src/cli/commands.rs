//! Ejecución de los subcomandos
//!
//! Cada subcomando abre la pestaña que le corresponde a través del
//! [`Router`], de modo que un rol sin acceso recibe el mismo error que vería
//! en la interfaz.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use chrono::{Local, NaiveDate};

use reservas_cliente::api::{AppError, AppResult, ErrorLogExt, ResultExt, TableQuery};
use reservas_cliente::models::NewBlock;
use reservas_cliente::storage::FileStore;
use reservas_cliente::views::blocks::{BlockFilters, BlockList};
use reservas_cliente::views::confirm::AlwaysConfirm;
use reservas_cliente::views::forms::{
    ActivationForm, FormStatus, LoginForm, NewReservationForm, ProfileForm, PublicReservationForm,
    RegisterForm,
};
use reservas_cliente::views::list::{self, Refreshable};
use reservas_cliente::views::reservations_panel::{ReservationSort, FILTERS_KEY};
use reservas_cliente::views::tables::TableSort;
use reservas_cliente::views::{
    ActionOutcome, AutoRefresh, CalendarView, Confirmer, FilterPrefs, MyReservations,
    ReservationsPanel, Router, Screen, Tab, TableManagement, UserManagement,
};
use reservas_cliente::{ApiClient, Config, SessionContext};

use super::render;
use super::{
    BlocksCommand, BookArgs, Cli, Command, MineCommand, NewArgs, ProfileCommand, RegisterArgs,
    ReservationsCommand, TablesCommand, UsersCommand,
};

/// Intervalo de `--watch` cuando no hay uno configurado
const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);

type Session = SessionContext<FileStore>;

/// Ejecuta el comando con la sesión persistida en `config.data_dir`
///
/// Un 401 del servidor limpia la sesión guardada antes de devolver el error.
pub async fn run(cli: Cli, config: Config) -> AppResult<()> {
    let store = FileStore::open(config.session_path())?;
    let mut session = SessionContext::hydrate(store, ApiClient::from_config(&config)?);

    let mut confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AlwaysConfirm)
    } else {
        Box::new(StdinConfirmer)
    };

    let result = dispatch(cli.command, &config, &mut session, confirmer.as_mut()).await;
    if let Err(error) = &result {
        session.handle_error(error);
    }
    result
}

async fn dispatch(
    command: Command,
    config: &Config,
    session: &mut Session,
    confirmer: &mut dyn Confirmer,
) -> AppResult<()> {
    match command {
        Command::Login { username, password } => login(session, username, password).await,
        Command::Register(args) => register(session, args).await,
        Command::Logout => {
            session.logout().await?;
            println!("Sesión cerrada");
            Ok(())
        }
        Command::Whoami => {
            render::session(session.current(), Router::tabs(session.current()));
            Ok(())
        }
        Command::Book(args) => book(session, args).await,
        Command::Activate {
            token,
            username,
            password,
        } => activate(session, token, username, password).await,
        Command::Reservations(command) => reservations(config, session, command, confirmer).await,
        Command::Mine(command) => mine(config, session, command, confirmer).await,
        Command::New(args) => new_reservation(session, args).await,
        Command::Tables(command) => tables(config, session, command).await,
        Command::Calendar { month, day } => calendar(session, month, day).await,
        Command::Blocks(command) => blocks(config, session, command, confirmer).await,
        Command::Users(command) => users(config, session, command, confirmer).await,
        Command::Profile(command) => profile(session, command).await,
    }
}

/// Abre una pestaña o explica por qué no se puede
fn open_tab(session: &Session, tab: Tab) -> AppResult<()> {
    match Router::resolve(session.current(), tab)? {
        Screen::Tab(_) => Ok(()),
        _ => Err(AppError::Unauthorized("Debe iniciar sesión".to_string())),
    }
}

/// Muestra los errores por campo y los avisos de un formulario
fn report<T>(result: AppResult<T>, status: &FormStatus) -> AppResult<T> {
    render::warnings(status.warnings());
    if result.is_err() {
        for (field, message) in status.errors.iter() {
            eprintln!("  {}: {}", field, message);
        }
    }
    result
}

async fn login(session: &mut Session, username: String, password: Option<String>) -> AppResult<()> {
    let mut form = LoginForm::new();
    form.username = username;
    form.password = match password {
        Some(password) => password,
        None => read_line("Contraseña: ")?,
    };

    let result = form.submit(session).await;
    let established = report(result, &form.status)?;

    let router = Router::new(Some(&established));
    println!("Bienvenido, {}", established.full_name);
    if let Screen::Tab(tab) = router.current() {
        println!("Pestaña inicial: {}", tab.label());
    }
    Ok(())
}

async fn register(session: &mut Session, args: RegisterArgs) -> AppResult<()> {
    let mut form = RegisterForm::new();
    form.username = args.username;
    form.email = args.email;
    form.first_name = args.first_name;
    form.last_name = args.last_name;
    form.set_phone(&args.phone);
    form.set_tax_id(&args.rut);
    match args.password {
        Some(password) => {
            form.password_confirmation = password.clone();
            form.password = password;
        }
        None => {
            form.password = read_line("Contraseña: ")?;
            form.password_confirmation = read_line("Repita la contraseña: ")?;
        }
    }

    let result = form.submit(session).await;
    let established = report(result, &form.status)?;
    println!("Cuenta creada. Bienvenido, {}", established.full_name);
    Ok(())
}

async fn book(session: &mut Session, args: BookArgs) -> AppResult<()> {
    let mut router = Router::new(session.current());
    if let Screen::Tab(tab) = router.open_public(session.current(), Screen::PublicReservation) {
        return Err(AppError::Validation(format!(
            "Ya hay una sesión iniciada; use la pestaña {} (reservas new)",
            tab.label()
        )));
    }

    let mut form = PublicReservationForm::new(session.api());
    form.client_name = args.name;
    form.email = args.email;
    form.set_tax_id(&args.rut);
    form.set_phone(&args.phone);
    form.notes = args.notes.unwrap_or_default();
    form.set_party_size(args.party).await?;
    form.set_date(args.date).await?;

    let Some(time) = args.time else {
        render::slots(form.slots());
        return Ok(());
    };
    let selected = form.select_time(time);
    if selected.is_err() {
        render::slots(form.slots());
    }
    report(selected, &form.status)?;

    let result = form.submit().await;
    if matches!(result, Err(AppError::Unavailable { .. })) {
        render::slots(form.slots());
    }
    let created = report(result, &form.status)?;
    render::reservation_created(&created);
    println!("Revise su correo: incluye el enlace para activar una cuenta");
    Ok(())
}

async fn activate(
    session: &mut Session,
    token: String,
    username: Option<String>,
    password: Option<String>,
) -> AppResult<()> {
    let mut form = ActivationForm::new(token);
    let verified = form.verify(&session.api()).await.map(|invitation| invitation.clone());
    let invitation = report(verified, &form.status)?;
    println!("Invitación de {} <{}>", invitation.full_name, invitation.email);

    if let Some(username) = username {
        form.username = username;
    }
    println!("Usuario: {}", form.username);
    match password {
        Some(password) => {
            form.password_confirmation = password.clone();
            form.password = password;
        }
        None => {
            form.password = read_line("Contraseña: ")?;
            form.password_confirmation = read_line("Repita la contraseña: ")?;
        }
    }

    let result = form.submit(session).await;
    let established = report(result, &form.status)?;
    println!("Cuenta activada. Bienvenido, {}", established.full_name);
    Ok(())
}

async fn reservations(
    config: &Config,
    session: &mut Session,
    command: ReservationsCommand,
    confirmer: &mut dyn Confirmer,
) -> AppResult<()> {
    open_tab(session, Tab::ReservationsPanel)?;

    match command {
        ReservationsCommand::List {
            date,
            status,
            search,
            sort,
            reset,
            watch: watch_args,
        } => {
            let mut prefs = FilterPrefs::new(FileStore::open(config.filters_path())?);
            if reset {
                prefs.clear(FILTERS_KEY)?;
            }
            let mut panel = ReservationsPanel::restore(session.api(), config.page_size, &prefs);
            if status.is_some() {
                panel.set_status_filter(status);
            }
            if let Some(search) = search {
                panel.set_search(search);
            }
            if let Some(key) = sort {
                panel.sort_by(reservation_sort(&key)?);
            }
            match date {
                Some(date) => panel.set_date(Some(date)).await?,
                None => panel.refresh().await?,
            };
            panel
                .save_filters(&mut prefs)
                .best_effort("saving reservation filters");

            panel.set_page(watch_args.page);
            render::reservations(&panel.page());
            if watch_args.watch {
                watch(&mut panel, watch_interval(config), |p| render::reservations(&p.page())).await?;
            }
            Ok(())
        }
        ReservationsCommand::Status { id, status } => {
            let mut panel = ReservationsPanel::new(session.api(), config.page_size);
            panel.refresh().await?;
            match panel.change_status(id, status, confirmer).await? {
                ActionOutcome::Applied(updated) => {
                    println!("Reserva #{} ahora está {}", updated.id, updated.status.label().to_lowercase())
                }
                ActionOutcome::Declined => println!("Sin cambios"),
            }
            Ok(())
        }
    }
}

async fn mine(
    config: &Config,
    session: &mut Session,
    command: MineCommand,
    confirmer: &mut dyn Confirmer,
) -> AppResult<()> {
    open_tab(session, Tab::MyReservations)?;

    let mut view = MyReservations::new(session.api(), config.page_size);
    view.refresh().await?;

    match command {
        MineCommand::List => {
            let now = Local::now().naive_local();
            render::own_reservations(&view.upcoming(now), &view.past(now));
        }
        MineCommand::Cancel { id } => match view.cancel(id, confirmer).await? {
            ActionOutcome::Applied(updated) => println!("Reserva #{} cancelada", updated.id),
            ActionOutcome::Declined => println!("Sin cambios"),
        },
    }
    Ok(())
}

async fn new_reservation(session: &mut Session, args: NewArgs) -> AppResult<()> {
    open_tab(session, Tab::NewReservation)?;

    let mut form = NewReservationForm::new(session.api());
    form.on_success(Box::new(|reservation| {
        tracing::info!(reservation_id = reservation.id, "Reservation created");
    }));
    form.notes = args.notes.unwrap_or_default();
    form.set_party_size(args.party).await?;
    form.set_date(args.date).await?;

    let Some(time) = args.time else {
        render::slots(form.slots());
        return Ok(());
    };
    let selected = form.set_time(time).await;
    if selected.is_err() {
        render::slots(form.slots());
    }
    report(selected, &form.status)?;

    let Some(table_id) = args.table else {
        render::table_choices(form.tables());
        return Ok(());
    };
    form.select_table(table_id);

    let result = form.submit().await;
    if matches!(result, Err(AppError::Unavailable { .. })) {
        render::table_choices(form.tables());
    }
    let created = report(result, &form.status)?;
    render::reservation_created(&created);
    Ok(())
}

async fn tables(config: &Config, session: &mut Session, command: TablesCommand) -> AppResult<()> {
    open_tab(session, Tab::Tables)?;

    let mut view = TableManagement::new(session.api(), config.page_size);
    match command {
        TablesCommand::List {
            date,
            time,
            party,
            status,
            sort,
            watch: watch_args,
        } => {
            view.set_status_filter(status);
            if let Some(key) = sort {
                view.sort_by(table_sort(&key)?);
            }
            let query = TableQuery {
                date,
                time,
                party_size: party,
            };
            if query == TableQuery::default() {
                view.refresh().await?;
            } else {
                view.set_availability(query).await?;
            }

            view.set_page(watch_args.page);
            render::tables(&view.page());
            if watch_args.watch {
                watch(&mut view, watch_interval(config), |v| render::tables(&v.page())).await?;
            }
        }
        TablesCommand::Status { id, status } => {
            view.refresh().await?;
            let updated = view.change_status(id, status).await?;
            println!("{} ahora está {}", updated.label(), updated.status.label().to_lowercase());
        }
    }
    Ok(())
}

async fn calendar(session: &mut Session, month: Option<String>, day: Option<NaiveDate>) -> AppResult<()> {
    open_tab(session, Tab::Calendar)?;

    let reference = match (month, day) {
        (Some(month), _) => parse_month(&month)?,
        (None, Some(day)) => day,
        (None, None) => Local::now().date_naive(),
    };

    let mut view = CalendarView::new(session.api(), reference);
    view.load().await?;
    render::calendar(&view);

    if let Some(day) = day {
        println!();
        println!("{}", day.format("%d-%m-%Y"));
        render::day_detail(view.day_detail(day)?);
    }
    Ok(())
}

async fn blocks(
    config: &Config,
    session: &mut Session,
    command: BlocksCommand,
    confirmer: &mut dyn Confirmer,
) -> AppResult<()> {
    open_tab(session, Tab::Blocks)?;

    let mut view = BlockList::new(session.api(), config.page_size);
    match command {
        BlocksCommand::List {
            active,
            category,
            table,
        } => {
            view.set_filters(BlockFilters {
                active,
                category,
                table_id: table,
            })
            .await?;
            // Elegir mesa ya recarga desde el servidor
            if table.is_none() {
                view.refresh().await?;
            }
            render::blocks(&view.page());
        }
        BlocksCommand::Create {
            table,
            from,
            to,
            start,
            end,
            reason,
            category,
            notes,
        } => {
            let data = NewBlock {
                table_id: table,
                date_start: from,
                date_end: to.unwrap_or(from),
                time_start: start,
                time_end: end,
                reason,
                category,
                notes,
            };
            let block = view.create(&data).await?;
            println!("Bloqueo #{} creado para la mesa {}", block.id, block.table_number);
        }
        BlocksCommand::Activate { id } => {
            view.refresh().await?;
            view.activate(id).await?;
            println!("Bloqueo #{} activado", id);
        }
        BlocksCommand::Deactivate { id } => {
            view.refresh().await?;
            view.deactivate(id).await?;
            println!("Bloqueo #{} desactivado", id);
        }
        BlocksCommand::Delete { id } => {
            view.refresh().await?;
            match view.delete(id, confirmer).await? {
                ActionOutcome::Applied(()) => println!("Bloqueo #{} eliminado", id),
                ActionOutcome::Declined => println!("Sin cambios"),
            }
        }
    }
    Ok(())
}

async fn users(
    config: &Config,
    session: &mut Session,
    command: UsersCommand,
    confirmer: &mut dyn Confirmer,
) -> AppResult<()> {
    open_tab(session, Tab::Users)?;

    let current_user_id = session.require()?.user_id;
    let mut view = UserManagement::new(session.api(), config.page_size, current_user_id);
    view.refresh().await?;

    match command {
        UsersCommand::List { search, role } => {
            if let Some(search) = search {
                view.set_search(search);
            }
            view.set_role_filter(role);
            render::users(&view.page());
        }
        UsersCommand::Role { id, role } => match view.change_role(id, role, confirmer).await? {
            ActionOutcome::Applied(user) => println!("{} ahora es {}", user.username, user.role),
            ActionOutcome::Declined => println!("Sin cambios"),
        },
    }
    Ok(())
}

async fn profile(session: &mut Session, command: ProfileCommand) -> AppResult<()> {
    open_tab(session, Tab::Profile)?;

    let mut form = ProfileForm::load(session).await?;
    match command {
        ProfileCommand::Show => render::profile(form.profile()),
        ProfileCommand::Update {
            email,
            first_name,
            last_name,
            phone,
            rut,
        } => {
            if let Some(email) = email {
                form.email = email;
            }
            if let Some(first_name) = first_name {
                form.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                form.last_name = last_name;
            }
            if let Some(phone) = phone {
                form.set_phone(&phone);
            }
            if let Some(rut) = rut {
                form.set_tax_id(&rut);
            }

            if form.changes().is_empty() {
                println!("Sin cambios");
                return Ok(());
            }
            let result = form.submit(session).await;
            let updated = report(result, &form.status)?;
            render::profile(&updated);
        }
    }
    Ok(())
}

/// Recarga la vista en cada tick hasta Ctrl-C
///
/// Los errores de recarga se muestran y se sigue esperando, salvo un 401.
async fn watch<V, F>(view: &mut V, interval: Duration, mut show: F) -> AppResult<()>
where
    V: Refreshable,
    F: FnMut(&V),
{
    let (refresher, mut ticks) = AutoRefresh::start(interval);
    tracing::info!(interval_secs = interval.as_secs(), "Watching for changes, Ctrl-C to stop");

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            tick = ticks.recv() => {
                if tick.is_none() {
                    break Ok(());
                }
                match list::refresh(view).await {
                    Ok(true) => show(view),
                    Ok(false) => {}
                    Err(error @ AppError::Unauthorized(_)) => break Err(error),
                    Err(error) => eprintln!("No se pudo recargar: {}", error.user_message()),
                }
            }
        }
    };

    refresher.stop();
    view.teardown();
    outcome
}

fn watch_interval(config: &Config) -> Duration {
    config.auto_refresh.unwrap_or(DEFAULT_WATCH_INTERVAL)
}

fn reservation_sort(key: &str) -> AppResult<ReservationSort> {
    match key.trim().to_lowercase().as_str() {
        "date" | "fecha" => Ok(ReservationSort::Date),
        "time" | "hora" => Ok(ReservationSort::Time),
        "client" | "cliente" => Ok(ReservationSort::Client),
        "party" | "personas" => Ok(ReservationSort::PartySize),
        "status" | "estado" => Ok(ReservationSort::Status),
        other => Err(AppError::Validation(format!("Orden '{}' no reconocido", other))),
    }
}

fn table_sort(key: &str) -> AppResult<TableSort> {
    match key.trim().to_lowercase().as_str() {
        "number" | "numero" | "número" => Ok(TableSort::Number),
        "capacity" | "capacidad" => Ok(TableSort::Capacity),
        "status" | "estado" => Ok(TableSort::Status),
        other => Err(AppError::Validation(format!("Orden '{}' no reconocido", other))),
    }
}

/// `AAAA-MM` al primer día de ese mes
fn parse_month(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err_validation("Mes inválido, use AAAA-MM")
}

fn read_line(prompt: &str) -> AppResult<String> {
    prompt_line(&mut io::stdin().lock(), &mut io::stdout(), prompt)
}

/// Errores de la terminal son internos: no tocan el estado persistido
fn prompt_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> AppResult<String> {
    write!(output, "{}", prompt).map_err_internal("Could not write prompt")?;
    output.flush().map_err_internal("Could not flush stdout")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err_internal("Could not read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Pregunta en la terminal; cualquier respuesta distinta de "s" es un no
struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &str) -> bool {
        match read_line(&format!("{} [s/N] ", prompt)) {
            Ok(answer) => matches!(
                answer.trim().to_lowercase().as_str(),
                "s" | "si" | "sí" | "y" | "yes"
            ),
            Err(error) => {
                tracing::warn!(error = %error, "Could not read confirmation, declining");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_keys_accept_both_languages() {
        assert_eq!(reservation_sort("Cliente").unwrap(), ReservationSort::Client);
        assert_eq!(reservation_sort("party").unwrap(), ReservationSort::PartySize);
        assert_eq!(table_sort("capacidad").unwrap(), TableSort::Capacity);
        assert!(table_sort("color").is_err());
    }

    struct BrokenInput;

    impl io::Read for BrokenInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
        }
    }

    #[test]
    fn prompt_reads_one_trimmed_line() {
        let mut input = io::Cursor::new("secreta123\r\nresto\n");
        let mut output = Vec::new();
        let line = prompt_line(&mut input, &mut output, "Contraseña: ").unwrap();
        assert_eq!(line, "secreta123");
        assert_eq!(output, "Contraseña: ".as_bytes());
    }

    #[test]
    fn terminal_failures_are_internal_errors() {
        let mut input = io::BufReader::new(BrokenInput);
        let error = prompt_line(&mut input, &mut Vec::new(), "? ").unwrap_err();
        assert!(matches!(error, AppError::InternalWithTrace { .. }));
    }

    #[test]
    fn month_argument_is_first_day() {
        assert_eq!(parse_month("2026-10").unwrap(), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert!(parse_month("octubre").unwrap_err().is_validation());
    }
}
