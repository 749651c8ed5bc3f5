//! Payroll core: the base-salary table, the employee-store contract, and the
//! aggregation engine that combines the two.

pub mod base_salary;
pub mod engine;
pub mod store;

pub use base_salary::BaseSalaryTable;
pub use engine::{JobTitlePayroll, PayrollEngine};
pub use store::{DbEmployeeStore, EmployeeDraft, EmployeeStore};
