use async_trait::async_trait;
use chrono::NaiveDate;
use entity::employees;
use platform_db::DbPool;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    EntityTrait, QueryOrder,
};

/// The writable fields of an employee record. Identifiers are assigned by
/// the store; a draft never carries one.
#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeDraft {
    pub name: String,
    pub salary: f64,
    pub department: String,
    pub designation: String,
    pub employment_type: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

/// Minimal persistence contract the payroll engine consumes.
///
/// `find_all` returns records in ascending id order so every aggregation
/// downstream sees a stable encounter order. `delete_by_id` succeeds
/// silently when the id is absent; callers check existence first.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn create(&self, draft: EmployeeDraft) -> anyhow::Result<employees::Model>;
    async fn find_all(&self) -> anyhow::Result<Vec<employees::Model>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<employees::Model>>;
    async fn save(&self, record: employees::Model) -> anyhow::Result<employees::Model>;
    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()>;
}

/// sea-orm backed store.
#[derive(Clone)]
pub struct DbEmployeeStore {
    pool: DbPool,
}

impl DbEmployeeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for DbEmployeeStore {
    async fn create(&self, draft: EmployeeDraft) -> anyhow::Result<employees::Model> {
        let active = employees::ActiveModel {
            id: NotSet,
            name: Set(draft.name),
            salary: Set(draft.salary),
            department: Set(draft.department),
            designation: Set(draft.designation),
            employment_type: Set(draft.employment_type),
            hire_date: Set(draft.hire_date),
        };
        Ok(active.insert(&self.pool).await?)
    }

    async fn find_all(&self) -> anyhow::Result<Vec<employees::Model>> {
        Ok(employees::Entity::find()
            .order_by_asc(employees::Column::Id)
            .all(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<employees::Model>> {
        Ok(employees::Entity::find_by_id(id).one(&self.pool).await?)
    }

    async fn save(&self, record: employees::Model) -> anyhow::Result<employees::Model> {
        let active = employees::ActiveModel {
            id: Set(record.id),
            name: Set(record.name),
            salary: Set(record.salary),
            department: Set(record.department),
            designation: Set(record.designation),
            employment_type: Set(record.employment_type),
            hire_date: Set(record.hire_date),
        };
        Ok(active.update(&self.pool).await?)
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<()> {
        employees::Entity::delete_by_id(id).exec(&self.pool).await?;
        Ok(())
    }
}
