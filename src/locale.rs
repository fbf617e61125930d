//! User-visible texts. Spanish is the default; English is selectable with
//! `HORARIOS_LOCALE=en`.

use crate::error::AppError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" | "es-es" => Ok(Locale::Es),
            "en" | "en-gb" | "en-us" => Ok(Locale::En),
            other => Err(format!("unsupported locale `{other}`")),
        }
    }
}

const WEEKDAYS_ES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];
const WEEKDAYS_EN: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

impl Locale {
    pub fn lang(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    /// Monday-first weekday names.
    pub fn weekdays(self) -> &'static [&'static str; 7] {
        match self {
            Locale::Es => &WEEKDAYS_ES,
            Locale::En => &WEEKDAYS_EN,
        }
    }

    pub fn more(self, n: usize) -> String {
        match self {
            Locale::Es => format!("+{n} más"),
            Locale::En => format!("+{n} more"),
        }
    }

    pub fn fill_both_fields(self) -> &'static str {
        match self {
            Locale::Es => "Completa ambos campos",
            Locale::En => "Fill in both fields",
        }
    }

    pub fn fill_all_fields(self) -> &'static str {
        match self {
            Locale::Es => "Completa todos los campos",
            Locale::En => "Fill in all fields",
        }
    }

    /// Why a form was rejected before reaching the store.
    pub fn form_rejected(self, err: &AppError) -> &'static str {
        match (self, err) {
            (Locale::Es, AppError::Invalid("dia_semana")) => "Día de la semana no válido",
            (Locale::En, AppError::Invalid("dia_semana")) => "Invalid day of the week",
            (Locale::Es, AppError::Invalid("fecha")) => "Fecha no válida",
            (Locale::En, AppError::Invalid("fecha")) => "Invalid date",
            _ => self.fill_all_fields(),
        }
    }

    pub fn login_failed(self, err: &AppError) -> String {
        match self {
            Locale::Es => format!("Error al iniciar sesión: {}", self.describe(err)),
            Locale::En => format!("Sign-in failed: {}", self.describe(err)),
        }
    }

    pub fn sign_out_failed(self, err: &AppError) -> String {
        match self {
            Locale::Es => format!("Error al cerrar sesión: {}", self.describe(err)),
            Locale::En => format!("Sign-out failed: {}", self.describe(err)),
        }
    }

    pub fn save_failed(self, err: &AppError) -> String {
        match self {
            Locale::Es => format!("Error al guardar horario: {}", self.describe(err)),
            Locale::En => format!("Error saving schedule: {}", self.describe(err)),
        }
    }

    pub fn load_failed(self, err: &AppError) -> String {
        match self {
            Locale::Es => format!("Error al cargar horarios: {}", self.describe(err)),
            Locale::En => format!("Error loading schedules: {}", self.describe(err)),
        }
    }

    pub fn delete_failed(self, err: &AppError) -> String {
        match self {
            Locale::Es => format!("Error al eliminar: {}", self.describe(err)),
            Locale::En => format!("Error deleting: {}", self.describe(err)),
        }
    }

    /// Human-readable text for an error, localized where the message is ours.
    pub fn describe(self, err: &AppError) -> String {
        match (self, err) {
            (Locale::Es, AppError::NoSession) => "No hay usuario activo".to_string(),
            (Locale::En, AppError::NoSession) => "No active user".to_string(),
            (_, other) => other.to_string(),
        }
    }

    pub fn regular_created(self) -> &'static str {
        match self {
            Locale::Es => "Horario regular creado",
            Locale::En => "Regular schedule created",
        }
    }

    pub fn regular_updated(self) -> &'static str {
        match self {
            Locale::Es => "Horario regular actualizado",
            Locale::En => "Regular schedule updated",
        }
    }

    pub fn regular_deleted(self) -> &'static str {
        match self {
            Locale::Es => "Horario regular eliminado",
            Locale::En => "Regular schedule deleted",
        }
    }

    pub fn special_created(self) -> &'static str {
        match self {
            Locale::Es => "Horario especial creado",
            Locale::En => "Special schedule created",
        }
    }

    pub fn special_updated(self) -> &'static str {
        match self {
            Locale::Es => "Horario especial actualizado",
            Locale::En => "Special schedule updated",
        }
    }

    pub fn special_deleted(self) -> &'static str {
        match self {
            Locale::Es => "Horario especial eliminado",
            Locale::En => "Special schedule deleted",
        }
    }

    pub fn confirm_delete_regular(self) -> &'static str {
        match self {
            Locale::Es => "¿Seguro que quieres eliminar este horario regular?",
            Locale::En => "Delete this regular schedule?",
        }
    }

    pub fn confirm_delete_special(self) -> &'static str {
        match self {
            Locale::Es => "¿Seguro que quieres eliminar este horario especial?",
            Locale::En => "Delete this special schedule?",
        }
    }

    pub fn default_user(self) -> &'static str {
        match self {
            Locale::Es => "Usuario",
            Locale::En => "User",
        }
    }

    pub fn active(self, active: bool) -> &'static str {
        match (self, active) {
            (Locale::Es, true) => "Activo",
            (Locale::Es, false) => "Inactivo",
            (Locale::En, true) => "Active",
            (Locale::En, false) => "Inactive",
        }
    }

    pub fn no_regular(self) -> &'static str {
        match self {
            Locale::Es => "No hay horarios regulares",
            Locale::En => "No regular schedules",
        }
    }

    pub fn no_special(self) -> &'static str {
        match self {
            Locale::Es => "No hay horarios especiales",
            Locale::En => "No special schedules",
        }
    }

    pub fn save(self) -> &'static str {
        match self {
            Locale::Es => "Guardar",
            Locale::En => "Save",
        }
    }

    pub fn update(self) -> &'static str {
        match self {
            Locale::Es => "Actualizar",
            Locale::En => "Update",
        }
    }

    pub fn cancel(self) -> &'static str {
        match self {
            Locale::Es => "Cancelar",
            Locale::En => "Cancel",
        }
    }

    pub fn add(self) -> &'static str {
        match self {
            Locale::Es => "Añadir",
            Locale::En => "Add",
        }
    }

    pub fn sign_in(self) -> &'static str {
        match self {
            Locale::Es => "Iniciar sesión",
            Locale::En => "Sign in",
        }
    }

    pub fn sign_out(self) -> &'static str {
        match self {
            Locale::Es => "Cerrar sesión",
            Locale::En => "Sign out",
        }
    }

    pub fn password(self) -> &'static str {
        match self {
            Locale::Es => "Contraseña",
            Locale::En => "Password",
        }
    }

    pub fn regular_title(self) -> &'static str {
        match self {
            Locale::Es => "Horarios regulares",
            Locale::En => "Regular schedules",
        }
    }

    pub fn special_title(self) -> &'static str {
        match self {
            Locale::Es => "Horarios especiales",
            Locale::En => "Special schedules",
        }
    }

    /// Column headers: day, date, description, time ranges, status, actions.
    pub fn headers(self) -> [&'static str; 6] {
        match self {
            Locale::Es => ["Día", "Fecha", "Descripción", "Horarios", "Estado", "Acciones"],
            Locale::En => ["Day", "Date", "Description", "Time ranges", "Status", "Actions"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_names() {
        assert_eq!("ES".parse::<Locale>(), Ok(Locale::Es));
        assert_eq!("en-GB".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn no_session_is_localized() {
        assert_eq!(
            Locale::Es.save_failed(&AppError::NoSession),
            "Error al guardar horario: No hay usuario activo"
        );
        assert_eq!(
            Locale::En.load_failed(&AppError::Remote("boom".into())),
            "Error loading schedules: boom"
        );
    }

    #[test]
    fn rejected_forms_name_the_bad_value() {
        assert_eq!(
            Locale::Es.form_rejected(&AppError::Invalid("dia_semana")),
            "Día de la semana no válido"
        );
        assert_eq!(Locale::En.form_rejected(&AppError::Invalid("fecha")), "Invalid date");
        assert_eq!(
            Locale::Es.form_rejected(&AppError::Validation("horarios")),
            "Completa todos los campos"
        );
    }
}
