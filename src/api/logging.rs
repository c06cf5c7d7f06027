//! # Registro de cadenas de error
//!
//! Herramientas para dejar en el log la cadena completa de un error sin
//! interrumpir el flujo. Se usan en dos situaciones:
//!
//! - Acciones principales que fallan: se registra y luego se muestra al usuario
//! - Acciones secundarias (recargar una lista tras una mutación exitosa): sólo
//!   se registra, la acción principal ya fue confirmada

use std::error::Error as StdError;

fn collect_chain<E>(error: &E) -> Vec<String>
where
    E: StdError + 'static,
{
    let mut error_chain = Vec::new();
    let mut current_error: Option<&dyn StdError> = Some(error);

    while let Some(err) = current_error {
        error_chain.push(err.to_string());
        current_error = err.source();
    }

    error_chain
}

/// Registra la cadena completa de errores
///
/// # Parámetros
/// - `error`: Error a analizar y registrar
/// - `context`: Contexto opcional para añadir información
pub fn log_error_chain<E>(error: &E, context: Option<&str>)
where
    E: StdError + 'static,
{
    let error_chain = collect_chain(error);

    if let Some(ctx) = context {
        tracing::error!(
            context = %ctx,
            error_chain = ?error_chain,
            "Error with full chain (with context)"
        );
    } else {
        tracing::error!(error_chain = ?error_chain, "Error with full chain");
    }
}

/// Extension trait para Results que añade logging de la cadena de errores
///
/// # Ejemplo de uso
/// ```ignore
/// api.update_reservation_status(id, status)
///     .await
///     .log_error_context("changing reservation status")?;
/// ```
pub trait ErrorLogExt<T, E> {
    /// Loggea la cadena de errores con contexto adicional
    fn log_error_context(self, context: &str) -> Result<T, E>;

    /// Loggea como advertencia y descarta el error
    ///
    /// Para acciones secundarias cuyo fallo no debe deshacer ni volver a
    /// mostrar el resultado de la acción principal.
    fn best_effort(self, context: &str) -> Option<T>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: StdError + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            log_error_chain(error, Some(context));
        }
        self
    }

    fn best_effort(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let error_chain = collect_chain(&error);
                tracing::warn!(
                    context = %context,
                    error_chain = ?error_chain,
                    "Secondary action failed, ignoring"
                );
                None
            }
        }
    }
}
