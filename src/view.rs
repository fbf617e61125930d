use crate::capability::{AuthProvider, Confirm, DataStore};
use crate::error::{AppError, AppResult};
use crate::formatter::{self, TimeRanges};
use crate::locale::Locale;
use crate::models::{
    RecordId, RegularFields, RegularSchedule, SpecialFields, SpecialSchedule,
};
use crate::notifier::{Notifier, Severity};
use crate::store::RecordStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Hidden,
    Creating,
    Editing(RecordId),
}

impl FormMode {
    pub fn is_visible(&self) -> bool {
        !matches!(self, FormMode::Hidden)
    }

    pub fn editing_id(&self) -> Option<&RecordId> {
        match self {
            FormMode::Editing(id) => Some(id),
            _ => None,
        }
    }
}

/// Raw form input, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularDraft {
    pub day_of_week: String,
    pub time_ranges: String,
    pub active: bool,
}

impl Default for RegularDraft {
    fn default() -> Self {
        Self {
            day_of_week: String::new(),
            time_ranges: String::new(),
            active: true,
        }
    }
}

impl RegularDraft {
    fn validate(&self) -> AppResult<RegularFields> {
        let day = self.day_of_week.trim();
        if day.is_empty() {
            return Err(AppError::Validation("dia_semana"));
        }
        if self.time_ranges.trim().is_empty() {
            return Err(AppError::Validation("horarios"));
        }
        let day_of_week = day
            .parse::<u8>()
            .ok()
            .filter(|d| (1..=7).contains(d))
            .ok_or(AppError::Invalid("dia_semana"))?;
        Ok(RegularFields {
            day_of_week,
            time_ranges: self.time_ranges.clone(),
            active: self.active,
        })
    }
}

impl From<&RegularSchedule> for RegularDraft {
    fn from(row: &RegularSchedule) -> Self {
        Self {
            day_of_week: row.day_of_week.to_string(),
            time_ranges: row.time_ranges.clone(),
            active: row.active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialDraft {
    pub date: String,
    pub description: String,
    pub time_ranges: String,
    pub active: bool,
}

impl Default for SpecialDraft {
    fn default() -> Self {
        Self {
            date: String::new(),
            description: String::new(),
            time_ranges: String::new(),
            active: true,
        }
    }
}

impl SpecialDraft {
    fn validate(&self) -> AppResult<SpecialFields> {
        let date = self.date.trim();
        if date.is_empty() {
            return Err(AppError::Validation("fecha"));
        }
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::Invalid("fecha"))?;
        Ok(SpecialFields {
            date,
            description: non_blank(&self.description),
            time_ranges: non_blank(&self.time_ranges),
            active: self.active,
        })
    }
}

impl From<&SpecialSchedule> for SpecialDraft {
    fn from(row: &SpecialSchedule) -> Self {
        Self {
            date: row.date.format("%Y-%m-%d").to_string(),
            description: row.description.clone().unwrap_or_default(),
            time_ranges: row.time_ranges.clone().unwrap_or_default(),
            active: row.active,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState<D> {
    pub mode: FormMode,
    pub draft: D,
}

impl<D: Default> FormState<D> {
    fn reset(&mut self) {
        self.draft = D::default();
        if self.mode.is_visible() {
            self.mode = FormMode::Creating;
        }
    }

    fn hide(&mut self) {
        self.mode = FormMode::Hidden;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiState {
    pub regular: FormState<RegularDraft>,
    pub special: FormState<SpecialDraft>,
}

impl UiState {
    /// Clears both forms' drafts and edit ids; a visible form stays open in
    /// create mode. Opening or hiding either form goes through here.
    pub fn reset_all_forms(&mut self) {
        self.regular.reset();
        self.special.reset();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegularRow {
    pub id: RecordId,
    pub day: String,
    pub time_ranges: TimeRanges,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialRow {
    pub id: RecordId,
    pub date: String,
    pub description: Option<String>,
    pub time_ranges: TimeRanges,
    pub active: bool,
}

pub struct ViewController {
    regular: RecordStore<RegularSchedule>,
    special: RecordStore<SpecialSchedule>,
    notifier: Notifier,
    locale: Locale,
    state: UiState,
    regular_rows: Vec<RegularSchedule>,
    special_rows: Vec<SpecialSchedule>,
}

impl ViewController {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        data: Arc<dyn DataStore>,
        notifier: Notifier,
        locale: Locale,
    ) -> Self {
        Self {
            regular: RecordStore::new(Arc::clone(&auth), Arc::clone(&data)),
            special: RecordStore::new(auth, data),
            notifier,
            locale,
            state: UiState::default(),
            regular_rows: Vec::new(),
            special_rows: Vec::new(),
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn regular_records(&self) -> &[RegularSchedule] {
        &self.regular_rows
    }

    pub fn special_records(&self) -> &[SpecialSchedule] {
        &self.special_rows
    }

    pub fn regular_table(&self) -> Vec<RegularRow> {
        self.regular_rows
            .iter()
            .map(|row| RegularRow {
                id: row.id.clone(),
                day: formatter::format_day_of_week(row.day_of_week, self.locale)
                    .unwrap_or(formatter::PLACEHOLDER)
                    .to_string(),
                time_ranges: formatter::format_time_ranges(&row.time_ranges),
                active: row.active,
            })
            .collect()
    }

    pub fn special_table(&self) -> Vec<SpecialRow> {
        self.special_rows
            .iter()
            .map(|row| SpecialRow {
                id: row.id.clone(),
                date: formatter::format_calendar_date(row.date, self.locale),
                description: row.description.clone().filter(|d| !d.is_empty()),
                time_ranges: formatter::format_time_ranges(
                    row.time_ranges.as_deref().unwrap_or_default(),
                ),
                active: row.active,
            })
            .collect()
    }

    pub fn reset_all_forms(&mut self) {
        self.state.reset_all_forms();
    }

    /// Forgets everything tied to the signed-in user: both forms close with
    /// their drafts and edit ids, and both tables are emptied.
    pub fn clear(&mut self) {
        self.state = UiState::default();
        self.regular_rows.clear();
        self.special_rows.clear();
    }

    pub fn open_regular_create(&mut self) {
        self.reset_all_forms();
        self.state.regular.mode = FormMode::Creating;
    }

    pub fn open_special_create(&mut self) {
        self.reset_all_forms();
        self.state.special.mode = FormMode::Creating;
    }

    pub fn cancel_regular(&mut self) {
        self.state.regular.hide();
        self.reset_all_forms();
    }

    pub fn cancel_special(&mut self) {
        self.state.special.hide();
        self.reset_all_forms();
    }

    /// Opens the regular form on a loaded row. Unknown ids are ignored.
    pub fn edit_regular(&mut self, id: &RecordId) {
        let Some(row) = self.regular_rows.iter().find(|r| &r.id == id) else {
            debug!(%id, "edit of unknown regular row ignored");
            return;
        };
        self.state.regular.draft = RegularDraft::from(row);
        self.state.regular.mode = FormMode::Editing(id.clone());
    }

    pub fn edit_special(&mut self, id: &RecordId) {
        let Some(row) = self.special_rows.iter().find(|r| &r.id == id) else {
            debug!(%id, "edit of unknown special row ignored");
            return;
        };
        self.state.special.draft = SpecialDraft::from(row);
        self.state.special.mode = FormMode::Editing(id.clone());
    }

    pub async fn submit_regular(&mut self, draft: RegularDraft) {
        self.state.regular.draft = draft;
        let fields = match self.state.regular.draft.validate() {
            Ok(fields) => fields,
            Err(err) => {
                debug!(%err, "regular form rejected");
                self.notifier
                    .notify(self.locale.form_rejected(&err), Severity::Error);
                return;
            }
        };

        let (result, done) = match self.state.regular.mode.editing_id() {
            Some(id) => (
                self.regular.update(id, &fields).await,
                self.locale.regular_updated(),
            ),
            None => (
                self.regular.create(&fields).await,
                self.locale.regular_created(),
            ),
        };

        match result {
            Ok(()) => {
                self.notifier.notify(done, Severity::Success);
                self.cancel_regular();
                self.load_regular().await;
            }
            Err(err) => {
                warn!(%err, "saving regular schedule failed");
                self.notifier
                    .notify(self.locale.save_failed(&err), Severity::Error);
            }
        }
    }

    pub async fn submit_special(&mut self, draft: SpecialDraft) {
        self.state.special.draft = draft;
        let fields = match self.state.special.draft.validate() {
            Ok(fields) => fields,
            Err(err) => {
                debug!(%err, "special form rejected");
                self.notifier
                    .notify(self.locale.form_rejected(&err), Severity::Error);
                return;
            }
        };

        let (result, done) = match self.state.special.mode.editing_id() {
            Some(id) => (
                self.special.update(id, &fields).await,
                self.locale.special_updated(),
            ),
            None => (
                self.special.create(&fields).await,
                self.locale.special_created(),
            ),
        };

        match result {
            Ok(()) => {
                self.notifier.notify(done, Severity::Success);
                self.cancel_special();
                self.load_special().await;
            }
            Err(err) => {
                warn!(%err, "saving special schedule failed");
                self.notifier
                    .notify(self.locale.save_failed(&err), Severity::Error);
            }
        }
    }

    pub async fn delete_regular(&mut self, id: &RecordId, confirm: &dyn Confirm) {
        if !confirm.confirm(self.locale.confirm_delete_regular()).await {
            debug!(%id, "regular delete declined");
            return;
        }
        match self.regular.delete(id).await {
            Ok(()) => {
                self.notifier
                    .notify(self.locale.regular_deleted(), Severity::Success);
                self.load_regular().await;
            }
            Err(err) => {
                warn!(%err, %id, "deleting regular schedule failed");
                self.notifier
                    .notify(self.locale.delete_failed(&err), Severity::Error);
            }
        }
    }

    pub async fn delete_special(&mut self, id: &RecordId, confirm: &dyn Confirm) {
        if !confirm.confirm(self.locale.confirm_delete_special()).await {
            debug!(%id, "special delete declined");
            return;
        }
        match self.special.delete(id).await {
            Ok(()) => {
                self.notifier
                    .notify(self.locale.special_deleted(), Severity::Success);
                self.load_special().await;
            }
            Err(err) => {
                warn!(%err, %id, "deleting special schedule failed");
                self.notifier
                    .notify(self.locale.delete_failed(&err), Severity::Error);
            }
        }
    }

    /// Loads both tables concurrently; each result only touches its own rows.
    pub async fn load_all(&mut self) {
        let (regular, special) = tokio::join!(self.regular.list(), self.special.list());
        self.apply_regular(regular);
        self.apply_special(special);
    }

    pub async fn load_regular(&mut self) {
        let listed = self.regular.list().await;
        self.apply_regular(listed);
    }

    pub async fn load_special(&mut self) {
        let listed = self.special.list().await;
        self.apply_special(listed);
    }

    fn apply_regular(&mut self, listed: AppResult<Vec<RegularSchedule>>) {
        match listed {
            Ok(rows) => self.regular_rows = rows,
            Err(err) => {
                warn!(%err, "loading regular schedules failed");
                self.notifier
                    .notify(self.locale.load_failed(&err), Severity::Error);
            }
        }
    }

    fn apply_special(&mut self, listed: AppResult<Vec<SpecialSchedule>>) {
        match listed {
            Ok(rows) => self.special_rows = rows,
            Err(err) => {
                warn!(%err, "loading special schedules failed");
                self.notifier
                    .notify(self.locale.load_failed(&err), Severity::Error);
            }
        }
    }
}
