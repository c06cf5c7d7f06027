//! Salida en terminal de cada vista

use reservas_cliente::models::{Block, Profile, Reservation, Session, Table, TimeSlot, User};
use reservas_cliente::views::calendar::{CalendarView, OccupancyTier, WEEKDAY_HEADERS};
use reservas_cliente::views::list::Page;
use reservas_cliente::views::Tab;

pub fn session(session: Option<&Session>, tabs: &[Tab]) {
    match session {
        None => println!("Sin sesión iniciada"),
        Some(s) => {
            println!("{} ({}) - {}", s.full_name, s.username, s.email);
            println!("Rol: {}", s.role_display_name);
            let labels: Vec<&str> = tabs.iter().map(Tab::label).collect();
            println!("Pestañas: {}", labels.join(" | "));
        }
    }
}

pub fn reservations(page: &Page<'_, Reservation>) {
    if page.total == 0 {
        println!("No hay reservas para los filtros elegidos");
        return;
    }
    println!(
        "{:>5}  {:<10} {:<5} {:<24} {:>4}  {:<9} {}",
        "ID", "Fecha", "Hora", "Cliente", "Pers", "Mesa", "Estado"
    );
    for r in &page.items {
        println!(
            "{:>5}  {:<10} {:<5} {:<24} {:>4}  {:<9} {}",
            r.id,
            r.date.format("%d-%m-%Y"),
            r.time.format("%H:%M"),
            truncate(&r.client_name, 24),
            r.party_size,
            truncate(&r.table_label, 9),
            r.status
        );
    }
    footer(page.page, page.page_count, page.total);
}

pub fn own_reservations(upcoming: &[&Reservation], past: &[&Reservation]) {
    println!("Próximas");
    if upcoming.is_empty() {
        println!("  (ninguna)");
    }
    for r in upcoming {
        own_line(r);
    }
    println!("Anteriores");
    if past.is_empty() {
        println!("  (ninguna)");
    }
    for r in past {
        own_line(r);
    }
}

fn own_line(r: &Reservation) {
    println!(
        "  #{:<5} {} {}  {} personas  {}  {}",
        r.id,
        r.date.format("%d-%m-%Y"),
        r.time.format("%H:%M"),
        r.party_size,
        r.table_label,
        r.status
    );
}

pub fn reservation_created(r: &Reservation) {
    println!(
        "Reserva #{} registrada: {} a las {} para {} personas ({})",
        r.id,
        r.date.format("%d-%m-%Y"),
        r.time.format("%H:%M"),
        r.party_size,
        r.status
    );
}

pub fn slots(slots: &[TimeSlot]) {
    let available: Vec<String> = slots
        .iter()
        .filter(|s| s.available)
        .map(|s| s.time.format("%H:%M").to_string())
        .collect();
    if available.is_empty() {
        println!("No hay horarios disponibles para esa fecha y cantidad de personas");
    } else {
        println!("Horarios disponibles: {}", available.join(" "));
    }
}

pub fn tables(page: &Page<'_, Table>) {
    if page.total == 0 {
        println!("No hay mesas para los filtros elegidos");
        return;
    }
    println!("{:>5}  {:<8} {:>9}  {}", "ID", "Mesa", "Capacidad", "Estado");
    for t in &page.items {
        println!("{:>5}  {:<8} {:>9}  {}", t.id, t.label(), t.capacity, t.status);
    }
    footer(page.page, page.page_count, page.total);
}

pub fn table_choices(tables: &[Table]) {
    if tables.is_empty() {
        println!("No hay mesas disponibles para ese horario");
        return;
    }
    println!("Mesas disponibles:");
    for t in tables {
        println!("  --table {:<5} {} (hasta {} personas)", t.id, t.label(), t.capacity);
    }
}

pub fn blocks(page: &Page<'_, Block>) {
    if page.total == 0 {
        println!("No hay bloqueos para los filtros elegidos");
        return;
    }
    for b in &page.items {
        let window = match (b.time_start, b.time_end) {
            (Some(start), Some(end)) => format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")),
            _ => "día completo".to_string(),
        };
        println!(
            "#{:<5} Mesa {:<3} {} a {} {:<13} {:<18} {:<8} {}",
            b.id,
            b.table_number,
            b.date_start.format("%d-%m-%Y"),
            b.date_end.format("%d-%m-%Y"),
            window,
            b.category,
            if b.active { "activo" } else { "inactivo" },
            b.reason
        );
    }
    footer(page.page, page.page_count, page.total);
}

pub fn users(page: &Page<'_, User>) {
    if page.total == 0 {
        println!("No hay usuarios para los filtros elegidos");
        return;
    }
    println!(
        "{:>5}  {:<16} {:<24} {:<14} {}",
        "ID", "Usuario", "Nombre", "Rol", "Último ingreso"
    );
    for u in &page.items {
        let last_login = u
            .last_login_at
            .map(|at| at.format("%d-%m-%Y %H:%M").to_string())
            .unwrap_or_else(|| "nunca".to_string());
        println!(
            "{:>5}  {:<16} {:<24} {:<14} {}",
            u.id,
            truncate(&u.username, 16),
            truncate(&u.full_name, 24),
            u.role,
            last_login
        );
    }
    footer(page.page, page.page_count, page.total);
}

pub fn profile(p: &Profile) {
    println!("Usuario:  {}", p.username);
    println!("Nombre:   {}", p.full_name());
    println!("Email:    {}", p.email);
    println!("Teléfono: {}", blank_as_dash(&p.phone));
    println!("RUT:      {}", blank_as_dash(&p.tax_id));
}

pub fn calendar(view: &CalendarView) {
    println!("{}", view.title());
    println!(" {}", WEEKDAY_HEADERS.map(|d| format!("{:<6}", d)).join(""));
    for week in view.weeks() {
        let row: String = week
            .iter()
            .map(|cell| {
                if !cell.in_month {
                    return format!("{:<6}", "");
                }
                let mark = match cell.tier {
                    OccupancyTier::None => ' ',
                    OccupancyTier::Low => '.',
                    OccupancyTier::Medium => '+',
                    OccupancyTier::High => '#',
                };
                format!("{:>2}{}{:<3}", cell.date.format("%d"), mark, count_label(cell.count))
            })
            .collect();
        println!(" {}", row);
    }
    println!("  . 1-5 reservas   + 6-15   # 16 o más");
}

pub fn day_detail(reservations: &[Reservation]) {
    if reservations.is_empty() {
        println!("Sin reservas ese día");
        return;
    }
    for r in reservations {
        println!(
            "  {}  {:<24} {:>2} pers.  {:<9} {}",
            r.time.format("%H:%M"),
            truncate(&r.client_name, 24),
            r.party_size,
            truncate(&r.table_label, 9),
            r.status
        );
    }
}

pub fn warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Aviso: {}", warning);
    }
}

fn count_label(count: usize) -> String {
    if count == 0 {
        String::new()
    } else {
        count.to_string()
    }
}

fn footer(page: usize, page_count: usize, total: usize) {
    println!("Página {} de {} ({} en total)", page, page_count.max(1), total);
}

fn blank_as_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut short: String = value.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}
