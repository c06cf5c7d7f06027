//! # Validaciones y formato de campos
//!
//! Funciones puras usadas por los formularios. Ninguna falla ni entra en
//! pánico: todas devuelven un [`ValidationResult`] uniforme.
//!
//! - RUT chileno con dígito verificador (módulo 11)
//! - Teléfono celular chileno (`+56 9 XXXX XXXX`)
//! - Email, contraseña, nombre de usuario y nombre completo
//! - Selección de mesa, cantidad de personas y fecha de reserva

use chrono::NaiveDate;
use serde::Serialize;

use crate::api::{AppError, AppResult};
use crate::models::Table;

/// Largo mínimo de contraseña exigido por la interfaz
pub const MIN_PASSWORD_LEN: usize = 8;

/// Dígitos del cuerpo de un RUT de persona o empresa
const RUT_BODY_LEN: std::ops::RangeInclusive<usize> = 7..=8;

/// Dígitos de un celular chileno sin código de país
const MOBILE_LEN: usize = 9;

const COUNTRY_CODE: &str = "56";

/// Resultado uniforme de una validación
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }

    /// Convierte el resultado en un error asociado al campo `field`
    pub fn into_result(self, field: &str) -> AppResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(AppError::validation_field(field, &self.message))
        }
    }
}

// ── RUT ─────────────────────────────────────────────────────────────

/// Calcula el dígito verificador de un cuerpo de RUT
///
/// Pesos cíclicos 2..7 desde el dígito menos significativo. Resto 11 → `0`,
/// resto 10 → `K`. Devuelve `None` si el cuerpo contiene algo que no sea dígito.
pub fn rut_check_digit(body: &str) -> Option<char> {
    let mut sum = 0u32;
    let mut weight = 2u32;

    for c in body.chars().rev() {
        let digit = c.to_digit(10)?;
        sum += digit * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }

    match 11 - (sum % 11) {
        11 => Some('0'),
        10 => Some('K'),
        n => char::from_digit(n, 10),
    }
}

/// Valida un RUT chileno con o sin puntos y guion
///
/// # Ejemplo
/// ```
/// use reservas_cliente::validation::validate_rut;
///
/// assert!(validate_rut("12.345.678-5").valid);
/// assert!(!validate_rut("12.345.678-9").valid);
/// ```
pub fn validate_rut(rut: &str) -> ValidationResult {
    let clean: String = rut
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .collect::<String>()
        .to_uppercase();

    if clean.is_empty() {
        return ValidationResult::error("El RUT es obligatorio");
    }

    if clean.chars().count() < 2 {
        return ValidationResult::error("El RUT está incompleto");
    }

    // El verificador puede no ser ASCII: se corta por carácter, no por byte
    let Some(check) = clean.chars().last() else {
        return ValidationResult::error("El RUT está incompleto");
    };
    let body = &clean[..clean.len() - check.len_utf8()];

    if !body.chars().all(|c| c.is_ascii_digit()) {
        return ValidationResult::error("El RUT contiene caracteres inválidos");
    }

    if !(check.is_ascii_digit() || check == 'K') {
        return ValidationResult::error("El dígito verificador debe ser un número o K");
    }

    if !RUT_BODY_LEN.contains(&body.len()) {
        return ValidationResult::error("El RUT debe tener entre 7 y 8 dígitos antes del verificador");
    }

    match rut_check_digit(body) {
        Some(expected) if expected == check => ValidationResult::ok(),
        Some(expected) => ValidationResult::error(format!(
            "RUT inválido. El dígito verificador debería ser {}",
            expected
        )),
        None => ValidationResult::error("El RUT contiene caracteres inválidos"),
    }
}

/// Da formato `12.345.678-5` a un RUT mientras se escribe
///
/// Aplicar el formato sobre un RUT ya formateado devuelve el mismo texto.
pub fn format_rut(input: &str) -> String {
    let clean: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'k' || *c == 'K')
        .map(|c| c.to_ascii_uppercase())
        .take(*RUT_BODY_LEN.end() + 1)
        .collect();

    if clean.len() <= 1 {
        return clean;
    }

    let (body, check) = clean.split_at(clean.len() - 1);
    format!("{}-{}", group_thousands(body), check)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

// ── Teléfono ────────────────────────────────────────────────────────

fn mobile_digits(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix(COUNTRY_CODE) {
        Some(local) if digits.len() == COUNTRY_CODE.len() + MOBILE_LEN => local.to_string(),
        _ => digits,
    }
}

/// Valida un celular chileno: 9 dígitos que comienzan con 9, con o sin +56
pub fn validate_phone(phone: &str) -> ValidationResult {
    let local = mobile_digits(phone);

    if local.is_empty() {
        return ValidationResult::error("El teléfono es obligatorio");
    }

    if local.len() != MOBILE_LEN {
        return ValidationResult::error("El teléfono debe tener 9 dígitos (formato +56 9 XXXX XXXX)");
    }

    if !local.starts_with('9') {
        return ValidationResult::error("El teléfono debe ser un celular que comience con 9");
    }

    ValidationResult::ok()
}

/// Da formato `+56 9 XXXX XXXX` a un teléfono mientras se escribe
pub fn format_phone(input: &str) -> String {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }

    let local: String = digits
        .strip_prefix(COUNTRY_CODE)
        .unwrap_or(&digits)
        .chars()
        .take(MOBILE_LEN)
        .collect();

    let mut formatted = format!("+{}", COUNTRY_CODE);
    for (i, c) in local.chars().enumerate() {
        if i == 0 || i == 1 || i == 5 {
            formatted.push(' ');
        }
        formatted.push(c);
    }
    formatted
}

// ── Cuenta ──────────────────────────────────────────────────────────

/// Validación básica de email
pub fn validate_email(email: &str) -> ValidationResult {
    let email = email.trim();

    if email.is_empty() {
        return ValidationResult::error("El email es obligatorio");
    }

    let invalid = ValidationResult::error("Ingrese un email válido");

    if email.chars().any(char::is_whitespace) {
        return invalid;
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return invalid,
    };

    if local.is_empty() || !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return invalid;
    }

    ValidationResult::ok()
}

pub fn validate_password(password: &str) -> ValidationResult {
    if password.is_empty() {
        return ValidationResult::error("La contraseña es obligatoria");
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return ValidationResult::error(format!(
            "La contraseña debe tener al menos {} caracteres",
            MIN_PASSWORD_LEN
        ));
    }

    ValidationResult::ok()
}

pub fn validate_password_match(password: &str, confirmation: &str) -> ValidationResult {
    if password != confirmation {
        return ValidationResult::error("Las contraseñas no coinciden");
    }
    ValidationResult::ok()
}

pub fn validate_username(username: &str) -> ValidationResult {
    let username = username.trim();
    let len = username.chars().count();

    if len == 0 {
        return ValidationResult::error("El nombre de usuario es obligatorio");
    }

    if !(3..=150).contains(&len) {
        return ValidationResult::error("El nombre de usuario debe tener entre 3 y 150 caracteres");
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return ValidationResult::error(
            "El nombre de usuario sólo admite letras, números y los símbolos _ . @ + -",
        );
    }

    ValidationResult::ok()
}

pub fn validate_full_name(name: &str) -> ValidationResult {
    let name = name.trim();

    if name.is_empty() {
        return ValidationResult::error("El nombre es obligatorio");
    }

    if name.chars().count() < 3 {
        return ValidationResult::error("El nombre debe tener al menos 3 caracteres");
    }

    if !name
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || c == '\'' || c == '-')
    {
        return ValidationResult::error("El nombre sólo puede contener letras y espacios");
    }

    ValidationResult::ok()
}

pub fn validate_required(value: &str, label: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return ValidationResult::error(format!("{} es obligatorio", label));
    }
    ValidationResult::ok()
}

// ── Reserva ─────────────────────────────────────────────────────────

/// Verifica que la mesa elegida siga en la última lista de candidatas
pub fn validate_table_selection(selected_id: Option<i64>, candidates: &[Table]) -> ValidationResult {
    let Some(id) = selected_id else {
        return ValidationResult::error("Debe seleccionar una mesa");
    };

    if !candidates.iter().any(|table| table.id == id) {
        return ValidationResult::error(
            "La mesa seleccionada ya no está disponible. Por favor, seleccione otra",
        );
    }

    ValidationResult::ok()
}

/// La cantidad de personas debe caber en la mesa
pub fn validate_party_size(party_size: u32, table: &Table) -> ValidationResult {
    if party_size == 0 {
        return ValidationResult::error("Debe indicar al menos 1 persona");
    }

    if party_size > table.capacity {
        return ValidationResult::error(format!(
            "La mesa {} tiene capacidad para {} personas",
            table.number, table.capacity
        ));
    }

    ValidationResult::ok()
}

pub fn validate_reservation_date(date: NaiveDate, today: NaiveDate) -> ValidationResult {
    if date < today {
        return ValidationResult::error("No se puede reservar en una fecha pasada");
    }
    ValidationResult::ok()
}
