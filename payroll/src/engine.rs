use std::collections::BTreeMap;

use chrono::{Months, NaiveDate, Utc};
use entity::employees;
use platform_api::{ApiError, ApiResult};
use tracing::info;

use crate::{
    base_salary::BaseSalaryTable,
    store::{EmployeeDraft, EmployeeStore},
};

/// Payload of the payroll-by-job-title operation. The computed total is
/// logged, not returned; the payload keeps the shape the service has always
/// exposed.
#[derive(Clone, Debug, PartialEq)]
pub struct JobTitlePayroll {
    pub job_title: String,
    pub employees: Vec<employees::Model>,
}

/// Aggregation and business-rule layer over an [`EmployeeStore`].
///
/// Stateless apart from the immutable base-salary table; every operation is
/// a pure function of the current store contents and its arguments.
pub struct PayrollEngine<S> {
    store: S,
    rates: BaseSalaryTable,
}

impl<S: EmployeeStore> PayrollEngine<S> {
    pub fn new(store: S, rates: BaseSalaryTable) -> Self {
        Self { store, rates }
    }

    /// Engine over the standard rate card.
    pub fn standard(store: S) -> Self {
        Self::new(store, BaseSalaryTable::standard())
    }

    pub async fn create_employee(&self, draft: EmployeeDraft) -> ApiResult<employees::Model> {
        let created = self.store.create(draft).await?;
        info!(id = created.id, name = %created.name, "employee created");
        Ok(created)
    }

    pub async fn all_employees(&self) -> ApiResult<Vec<employees::Model>> {
        Ok(self.store.find_all().await?)
    }

    pub async fn employee_by_id(&self, id: i64) -> ApiResult<employees::Model> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Employee with ID {id} not found")))
    }

    /// Replaces the mutable fields of an existing record. The hire date is
    /// not among them and keeps its stored value.
    pub async fn update_employee(
        &self,
        id: i64,
        draft: EmployeeDraft,
    ) -> ApiResult<employees::Model> {
        let mut current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Employee with ID {id} not found")))?;
        current.name = draft.name;
        current.salary = draft.salary;
        current.department = draft.department;
        current.designation = draft.designation;
        current.employment_type = draft.employment_type;
        let saved = self.store.save(current).await?;
        info!(id, "employee updated");
        Ok(saved)
    }

    pub async fn delete_employee(&self, id: i64) -> ApiResult<()> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Employee with ID {id} not found")))?;
        self.store.delete_by_id(id).await?;
        info!(id, "employee deleted");
        Ok(())
    }

    /// Sum of (base salary + individual salary) across all employees.
    ///
    /// One unrecognized designation aborts the whole computation; employees
    /// are never silently skipped.
    pub async fn total_payroll(&self) -> ApiResult<f64> {
        let employees = self.store.find_all().await?;
        let mut total = 0.0;
        for employee in &employees {
            let base = self.rates.base_for(&employee.designation).ok_or_else(|| {
                ApiError::not_found(format!(
                    "Salary base not found for role: {}",
                    employee.designation
                ))
            })?;
            total += base + employee.salary;
        }
        info!(total, count = employees.len(), "total payroll computed");
        Ok(total)
    }

    /// Arithmetic mean of the individual salary over one department.
    /// Department matching here is case-sensitive, unlike the filter
    /// operations below.
    pub async fn average_salary_by_department(&self, department: &str) -> ApiResult<f64> {
        let salaries: Vec<f64> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter(|employee| employee.department == department)
            .map(|employee| employee.salary)
            .collect();
        if salaries.is_empty() {
            return Err(ApiError::not_found("No Employee Present in this Department"));
        }
        Ok(salaries.iter().sum::<f64>() / salaries.len() as f64)
    }

    /// Department → employee names, names in first-appearance order.
    pub async fn grouped_by_department(&self) -> ApiResult<BTreeMap<String, Vec<String>>> {
        let employees = self.store.find_all().await?;
        if employees.is_empty() {
            return Err(ApiError::not_found("No Employees found in any Department"));
        }
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for employee in employees {
            groups.entry(employee.department).or_default().push(employee.name);
        }
        Ok(groups)
    }

    /// Up to `n` employees by descending salary; ties keep store order.
    /// Zero or negative `n` is an empty result, not an error.
    pub async fn top_n_highest_paid(&self, n: i64) -> ApiResult<Vec<employees::Model>> {
        if n <= 0 {
            return Ok(Vec::new());
        }
        let mut employees = self.store.find_all().await?;
        employees.sort_by(|a, b| b.salary.total_cmp(&a.salary));
        employees.truncate(n as usize);
        Ok(employees)
    }

    pub async fn payroll_by_job_title(&self, job_title: &str) -> ApiResult<JobTitlePayroll> {
        if job_title.trim().is_empty() {
            return Err(ApiError::invalid_argument(
                "Job title must not be null or empty.",
            ));
        }
        let matching: Vec<employees::Model> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter(|employee| employee.designation == job_title)
            .collect();
        if matching.is_empty() {
            return Err(ApiError::not_found(format!(
                "No employee found with the designation: {job_title}"
            )));
        }
        let base = self.rates.base_for(job_title).ok_or_else(|| {
            ApiError::not_found(format!("No base salary defined for job title: {job_title}"))
        })?;
        let total: f64 = matching.iter().map(|employee| base + employee.salary).sum();
        info!(job_title, total, "payroll computed for job title");
        Ok(JobTitlePayroll {
            job_title: job_title.to_string(),
            employees: matching,
        })
    }

    /// Employees hired strictly after today minus `months` calendar months.
    /// Records without a hire date are excluded.
    pub async fn hired_in_last_months(&self, months: u32) -> ApiResult<Vec<employees::Model>> {
        let today = Utc::now().date_naive();
        let cutoff = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Ok(self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter(|employee| employee.hire_date.is_some_and(|hired| hired > cutoff))
            .collect())
    }

    /// Names of the employees in one department, matched case-insensitively.
    pub async fn employees_by_department(&self, department: &str) -> ApiResult<Vec<String>> {
        let names: Vec<String> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .filter(|employee| employee.department.eq_ignore_ascii_case(department))
            .map(|employee| employee.name)
            .collect();
        if names.is_empty() {
            return Err(ApiError::not_found(format!(
                "No employee found in the Department: {department}"
            )));
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<MemoryRows>,
    }

    #[derive(Default)]
    struct MemoryRows {
        next_id: i64,
        records: Vec<employees::Model>,
    }

    #[async_trait]
    impl EmployeeStore for MemoryStore {
        async fn create(&self, draft: EmployeeDraft) -> anyhow::Result<employees::Model> {
            let mut rows = self.rows.lock().unwrap();
            rows.next_id += 1;
            let model = employees::Model {
                id: rows.next_id,
                name: draft.name,
                salary: draft.salary,
                department: draft.department,
                designation: draft.designation,
                employment_type: draft.employment_type,
                hire_date: draft.hire_date,
            };
            rows.records.push(model.clone());
            Ok(model)
        }

        async fn find_all(&self) -> anyhow::Result<Vec<employees::Model>> {
            Ok(self.rows.lock().unwrap().records.clone())
        }

        async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<employees::Model>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .records
                .iter()
                .find(|record| record.id == id)
                .cloned())
        }

        async fn save(&self, record: employees::Model) -> anyhow::Result<employees::Model> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(slot) = rows.records.iter_mut().find(|r| r.id == record.id) {
                *slot = record.clone();
            } else {
                rows.records.push(record.clone());
            }
            Ok(record)
        }

        async fn delete_by_id(&self, id: i64) -> anyhow::Result<()> {
            self.rows.lock().unwrap().records.retain(|r| r.id != id);
            Ok(())
        }
    }

    fn draft(
        name: &str,
        salary: f64,
        department: &str,
        designation: &str,
        employment_type: &str,
        hire_date: Option<NaiveDate>,
    ) -> EmployeeDraft {
        EmployeeDraft {
            name: name.to_string(),
            salary,
            department: department.to_string(),
            designation: designation.to_string(),
            employment_type: Some(employment_type.to_string()),
            hire_date,
        }
    }

    fn alice() -> EmployeeDraft {
        draft(
            "Alice",
            2300.45,
            "IT",
            "JuniorEngineer",
            "Full-Time",
            NaiveDate::from_ymd_opt(2023, 1, 1),
        )
    }

    fn clary() -> EmployeeDraft {
        draft(
            "Clary",
            2100.45,
            "HR",
            "HR",
            "Part-Time",
            NaiveDate::from_ymd_opt(2024, 10, 17),
        )
    }

    async fn engine_with(drafts: Vec<EmployeeDraft>) -> PayrollEngine<MemoryStore> {
        let engine = PayrollEngine::standard(MemoryStore::default());
        for d in drafts {
            engine.create_employee(d).await.unwrap();
        }
        engine
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[tokio::test]
    async fn create_assigns_an_identifier_and_round_trips() {
        let engine = engine_with(vec![]).await;
        let created = engine.create_employee(alice()).await.unwrap();
        assert!(created.id > 0);

        let fetched = engine.employee_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Alice");
        assert_eq!(fetched.hire_date, NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[tokio::test]
    async fn all_employees_is_idempotent_between_writes() {
        let engine = engine_with(vec![alice(), clary()]).await;
        let first = engine.all_employees().await.unwrap();
        let second = engine.all_employees().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn employee_by_id_reports_the_missing_identifier() {
        let engine = engine_with(vec![]).await;
        let err = engine.employee_by_id(42).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "Employee with ID 42 not found");
    }

    #[tokio::test]
    async fn update_replaces_fields_but_never_the_hire_date() {
        let engine = engine_with(vec![alice()]).await;
        let mut replacement = clary();
        replacement.hire_date = NaiveDate::from_ymd_opt(1999, 9, 9);

        let updated = engine.update_employee(1, replacement).await.unwrap();
        assert_eq!(updated.name, "Clary");
        assert_close(updated.salary, 2100.45);
        assert_eq!(updated.department, "HR");
        assert_eq!(updated.designation, "HR");
        assert_eq!(updated.employment_type.as_deref(), Some("Part-Time"));
        // hire date keeps the stored value, not the draft's
        assert_eq!(updated.hire_date, NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[tokio::test]
    async fn update_of_missing_employee_is_not_found() {
        let engine = engine_with(vec![]).await;
        let err = engine.update_employee(7, alice()).await.unwrap_err();
        assert_eq!(err.to_string(), "Employee with ID 7 not found");
    }

    #[tokio::test]
    async fn delete_removes_the_record_or_reports_not_found() {
        let engine = engine_with(vec![alice()]).await;
        engine.delete_employee(1).await.unwrap();
        assert!(engine.all_employees().await.unwrap().is_empty());

        let err = engine.delete_employee(1).await.unwrap_err();
        assert_eq!(err.to_string(), "Employee with ID 1 not found");
    }

    #[tokio::test]
    async fn total_payroll_sums_base_plus_salary() {
        let engine = engine_with(vec![alice(), clary()]).await;
        let total = engine.total_payroll().await.unwrap();
        // (15000 + 2300.45) + (20000 + 2100.45)
        assert_close(total, 39_400.90);
    }

    #[tokio::test]
    async fn total_payroll_over_empty_store_is_zero() {
        let engine = engine_with(vec![]).await;
        assert_close(engine.total_payroll().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn one_unknown_designation_aborts_total_payroll() {
        let engine = engine_with(vec![
            alice(),
            draft("Morgana", 5000.0, "IT", "Wizard", "Full-Time", None),
        ])
        .await;
        let err = engine.total_payroll().await.unwrap_err();
        assert_eq!(err.to_string(), "Salary base not found for role: Wizard");
    }

    #[tokio::test]
    async fn average_salary_is_case_sensitive_on_department() {
        let engine = engine_with(vec![alice(), clary()]).await;
        assert_close(
            engine.average_salary_by_department("IT").await.unwrap(),
            2300.45,
        );

        // same department, different case: no match for this operation
        let err = engine.average_salary_by_department("it").await.unwrap_err();
        assert_eq!(err.to_string(), "No Employee Present in this Department");
    }

    #[tokio::test]
    async fn average_salary_averages_over_the_filtered_set() {
        let engine = engine_with(vec![
            alice(),
            draft("Ben", 2500.55, "IT", "Tester", "Full-Time", None),
            clary(),
        ])
        .await;
        assert_close(
            engine.average_salary_by_department("IT").await.unwrap(),
            2400.50,
        );
    }

    #[tokio::test]
    async fn grouping_preserves_first_appearance_order_within_groups() {
        let engine = engine_with(vec![
            alice(),
            clary(),
            draft("Zoe", 1000.0, "IT", "Tester", "Full-Time", None),
        ])
        .await;
        let groups = engine.grouped_by_department().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["IT"], vec!["Alice".to_string(), "Zoe".to_string()]);
        assert_eq!(groups["HR"], vec!["Clary".to_string()]);
    }

    #[tokio::test]
    async fn grouping_an_empty_store_is_not_found() {
        let engine = engine_with(vec![]).await;
        let err = engine.grouped_by_department().await.unwrap_err();
        assert_eq!(err.to_string(), "No Employees found in any Department");
    }

    #[tokio::test]
    async fn top_n_sorts_by_salary_descending() {
        let engine = engine_with(vec![alice(), clary()]).await;

        let top_one = engine.top_n_highest_paid(1).await.unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].name, "Alice");

        let top_five = engine.top_n_highest_paid(5).await.unwrap();
        assert_eq!(top_five.len(), 2);
        assert_eq!(top_five[0].name, "Alice");
        assert_eq!(top_five[1].name, "Clary");
    }

    #[tokio::test]
    async fn top_n_breaks_ties_by_store_order() {
        let engine = engine_with(vec![
            draft("First", 2000.0, "IT", "Tester", "Full-Time", None),
            draft("Second", 2000.0, "IT", "Tester", "Full-Time", None),
            draft("Richer", 3000.0, "IT", "Tester", "Full-Time", None),
        ])
        .await;
        let top = engine.top_n_highest_paid(3).await.unwrap();
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Richer", "First", "Second"]);
    }

    #[tokio::test]
    async fn top_n_of_zero_or_negative_is_empty_not_an_error() {
        let engine = engine_with(vec![alice()]).await;
        assert!(engine.top_n_highest_paid(0).await.unwrap().is_empty());
        assert!(engine.top_n_highest_paid(-3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_job_title_is_rejected() {
        let engine = engine_with(vec![alice()]).await;
        for title in ["", "   "] {
            let err = engine.payroll_by_job_title(title).await.unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)));
            assert_eq!(err.to_string(), "Job title must not be null or empty.");
        }
    }

    #[tokio::test]
    async fn payroll_by_job_title_returns_title_and_matching_employees() {
        let engine = engine_with(vec![
            draft("Sam", 4000.0, "IT", "SeniorEngineer", "Full-Time", None),
            clary(),
        ])
        .await;
        let payload = engine.payroll_by_job_title("SeniorEngineer").await.unwrap();
        assert_eq!(payload.job_title, "SeniorEngineer");
        assert_eq!(payload.employees.len(), 1);
        assert_eq!(payload.employees[0].name, "Sam");
    }

    #[tokio::test]
    async fn payroll_by_job_title_distinguishes_its_two_not_found_cases() {
        let engine = engine_with(vec![
            draft("Morgana", 5000.0, "IT", "Wizard", "Full-Time", None),
        ])
        .await;

        let err = engine.payroll_by_job_title("Analyst").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No employee found with the designation: Analyst"
        );

        // an employee exists with the title, but the rate card has no entry
        let err = engine.payroll_by_job_title("Wizard").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No base salary defined for job title: Wizard"
        );
    }

    #[tokio::test]
    async fn recent_hires_use_a_strict_cutoff_and_skip_null_dates() {
        let today = Utc::now().date_naive();
        let two_months_ago = today.checked_sub_months(Months::new(2)).unwrap();
        let three_years_ago = today.checked_sub_months(Months::new(36)).unwrap();

        let engine = engine_with(vec![
            draft("Old", 1000.0, "IT", "Tester", "Full-Time", Some(three_years_ago)),
            draft("New", 1000.0, "IT", "Tester", "Full-Time", Some(two_months_ago)),
            draft("Dateless", 1000.0, "IT", "Tester", "Full-Time", None),
        ])
        .await;

        let hires = engine.hired_in_last_months(10).await.unwrap();
        assert_eq!(hires.len(), 1);
        assert_eq!(hires[0].name, "New");

        // hire date exactly on the cutoff is not "after" it
        let boundary = engine.hired_in_last_months(2).await.unwrap();
        assert!(boundary.is_empty());
    }

    #[tokio::test]
    async fn department_filter_is_case_insensitive() {
        let engine = engine_with(vec![alice(), clary()]).await;
        let names = engine.employees_by_department("it").await.unwrap();
        assert_eq!(names, vec!["Alice".to_string()]);

        let err = engine.employees_by_department("Marketing").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No employee found in the Department: Marketing"
        );
    }
}
