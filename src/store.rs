use crate::capability::{AuthProvider, DataStore, Filter, Order, Select};
use crate::error::{AppError, AppResult};
use crate::models::{RecordId, RegularFields, RegularSchedule, SpecialFields, SpecialSchedule};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// A schedule table: its name, its row shape, and the column it is listed by.
pub trait ScheduleRecord: DeserializeOwned + Clone + Send + Sync + 'static {
    type Fields: Serialize + Send + Sync;

    const TABLE: &'static str;
    const ORDER_BY: &'static str;

    fn id(&self) -> &RecordId;
}

impl ScheduleRecord for RegularSchedule {
    type Fields = RegularFields;

    const TABLE: &'static str = "horarios_regulares";
    const ORDER_BY: &'static str = "dia_semana";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl ScheduleRecord for SpecialSchedule {
    type Fields = SpecialFields;

    const TABLE: &'static str = "horarios_especiales";
    const ORDER_BY: &'static str = "fecha";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

#[derive(Serialize)]
struct Owned<'a, F> {
    user_id: &'a str,
    #[serde(flatten)]
    fields: &'a F,
}

/// CRUD over one table, scoped to the signed-in user. Row-level access is
/// enforced by the remote store; the owner filter only narrows what is listed.
pub struct RecordStore<R> {
    auth: Arc<dyn AuthProvider>,
    data: Arc<dyn DataStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R: ScheduleRecord> RecordStore<R> {
    pub fn new(auth: Arc<dyn AuthProvider>, data: Arc<dyn DataStore>) -> Self {
        Self {
            auth,
            data,
            _record: PhantomData,
        }
    }

    /// The current user's rows in ascending order. Without a user the list
    /// is empty rather than an error.
    pub async fn list(&self) -> AppResult<Vec<R>> {
        let Some(user) = self.auth.get_current_user().await? else {
            debug!(table = R::TABLE, "no user, nothing to list");
            return Ok(Vec::new());
        };

        let rows = self
            .data
            .select(Select {
                table: R::TABLE,
                columns: "*",
                filter: Filter::eq("user_id", user.id),
                order: Order {
                    column: R::ORDER_BY,
                    ascending: true,
                },
            })
            .await?;

        let records = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<R>, _>>()?;
        debug!(table = R::TABLE, count = records.len(), "listed");
        Ok(records)
    }

    pub async fn create(&self, fields: &R::Fields) -> AppResult<()> {
        let user = self.auth.get_current_user().await?.ok_or(AppError::NoSession)?;
        let row = serde_json::to_value(Owned {
            user_id: &user.id,
            fields,
        })?;
        self.data.insert(R::TABLE, vec![row]).await?;
        info!(table = R::TABLE, user = %user.id, "row created");
        Ok(())
    }

    pub async fn update(&self, id: &RecordId, fields: &R::Fields) -> AppResult<()> {
        self.auth.get_current_user().await?.ok_or(AppError::NoSession)?;
        let fields = serde_json::to_value(fields)?;
        self.data
            .update(R::TABLE, fields, Filter::eq("id", id.0.clone()))
            .await?;
        info!(table = R::TABLE, %id, "row updated");
        Ok(())
    }

    pub async fn delete(&self, id: &RecordId) -> AppResult<()> {
        self.data.delete(R::TABLE, Filter::eq("id", id.0.clone())).await?;
        info!(table = R::TABLE, %id, "row deleted");
        Ok(())
    }
}
