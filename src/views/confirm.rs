//! Confirmación de acciones destructivas (cancelar, completar, eliminar)

/// Resultado de una acción que puede requerir confirmación
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    /// El servidor confirmó el cambio
    Applied(T),
    /// El usuario no confirmó; no se envió nada
    Declined,
}

impl<T> ActionOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }
}

pub trait Confirmer {
    /// Devuelve `true` sólo si el usuario acepta explícitamente
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Acepta todo (`--yes` en la línea de comandos)
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirmer for AlwaysConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        tracing::debug!(prompt = %prompt, "Auto-confirmed");
        true
    }
}

#[cfg(test)]
pub(crate) use self::scripted::{AlwaysDecline, RecordingConfirmer};

/// Confirmadores con respuesta fija para las pruebas de las vistas
#[cfg(test)]
mod scripted {
    use super::Confirmer;

    #[derive(Debug, Default, Clone, Copy)]
    pub(crate) struct AlwaysDecline;

    impl Confirmer for AlwaysDecline {
        fn confirm(&mut self, _prompt: &str) -> bool {
            false
        }
    }

    /// Responde siempre lo mismo y guarda las preguntas recibidas
    #[derive(Debug, Default, Clone)]
    pub(crate) struct RecordingConfirmer {
        pub(crate) answer: bool,
        pub(crate) prompts: Vec<String>,
    }

    impl RecordingConfirmer {
        pub(crate) fn answering(answer: bool) -> Self {
            Self {
                answer,
                prompts: Vec::new(),
            }
        }
    }

    impl Confirmer for RecordingConfirmer {
        fn confirm(&mut self, prompt: &str) -> bool {
            self.prompts.push(prompt.to_string());
            self.answer
        }
    }

    #[test]
    fn recording_confirmer_keeps_prompts() {
        let mut confirmer = RecordingConfirmer::answering(false);
        assert!(!confirmer.confirm("¿Cancelar?"));
        assert!(!AlwaysDecline.confirm("¿Eliminar?"));
        assert_eq!(confirmer.prompts, vec!["¿Cancelar?".to_string()]);
    }
}
