use std::{
    collections::BTreeMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use entity::employees;
use payroll::{DbEmployeeStore, EmployeeDraft, JobTitlePayroll, PayrollEngine};
use platform_api::ApiError;
use platform_db::DbPool;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;

pub type Engine = PayrollEngine<DbEmployeeStore>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub engine: Arc<Engine>,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "payroll server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/employees",
            get(list_employees).post(create_employee),
        )
        .route(
            "/api/employees/{id}",
            get(employee_by_id)
                .put(update_employee)
                .delete(delete_employee),
        )
        .route("/api/employees/payroll", get(total_payroll))
        .route(
            "/api/employees/department/{department}/average-salary",
            get(average_salary_by_department),
        )
        .route(
            "/api/employees/grouped-by-department",
            get(grouped_by_department),
        )
        .route("/api/employees/top-salaries/{n}", get(top_salaries))
        .route(
            "/api/employees/payroll/job-title/{job_title}",
            get(payroll_by_job_title),
        )
        .route("/api/employees/hired-in-last/{months}", get(hired_in_last))
        .route(
            "/api/employees/filter-by-department/{department}",
            get(filter_by_department),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Employee wire shape. `empId` is populated by the store; any value a
/// client sends on create is ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    #[serde(default)]
    pub emp_id: Option<i64>,
    pub name: String,
    pub salary: f64,
    pub department: String,
    pub designation: String,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
}

impl EmployeeDto {
    fn from_model(model: employees::Model) -> Self {
        Self {
            emp_id: Some(model.id),
            name: model.name,
            salary: model.salary,
            department: model.department,
            designation: model.designation,
            employment_type: model.employment_type,
            hire_date: model.hire_date,
        }
    }

    fn into_draft(self) -> EmployeeDraft {
        EmployeeDraft {
            name: self.name,
            salary: self.salary,
            department: self.department,
            designation: self.designation,
            employment_type: self.employment_type,
            hire_date: self.hire_date,
        }
    }
}

/// Response of the payroll-by-job-title endpoint; the keys match the shape
/// this API has always served.
#[derive(Debug, Serialize)]
pub struct JobTitlePayrollDto {
    #[serde(rename = "Designation/JobTitle")]
    pub job_title: String,
    #[serde(rename = "Employees")]
    pub employees: Vec<EmployeeDto>,
}

impl From<JobTitlePayroll> for JobTitlePayrollDto {
    fn from(value: JobTitlePayroll) -> Self {
        Self {
            job_title: value.job_title,
            employees: value
                .employees
                .into_iter()
                .map(EmployeeDto::from_model)
                .collect(),
        }
    }
}

async fn create_employee(
    State(state): State<AppState>,
    Json(body): Json<EmployeeDto>,
) -> HttpResult<(StatusCode, Json<EmployeeDto>)> {
    let created = state.engine.create_employee(body.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(EmployeeDto::from_model(created))))
}

async fn list_employees(State(state): State<AppState>) -> HttpResult<Json<Vec<EmployeeDto>>> {
    let employees = state.engine.all_employees().await?;
    Ok(Json(
        employees.into_iter().map(EmployeeDto::from_model).collect(),
    ))
}

async fn employee_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HttpResult<Json<EmployeeDto>> {
    let employee = state.engine.employee_by_id(id).await?;
    Ok(Json(EmployeeDto::from_model(employee)))
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<EmployeeDto>,
) -> HttpResult<Json<EmployeeDto>> {
    let updated = state.engine.update_employee(id, body.into_draft()).await?;
    Ok(Json(EmployeeDto::from_model(updated)))
}

async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HttpResult<StatusCode> {
    state.engine.delete_employee(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn total_payroll(State(state): State<AppState>) -> HttpResult<Json<f64>> {
    Ok(Json(state.engine.total_payroll().await?))
}

async fn average_salary_by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> HttpResult<Json<f64>> {
    Ok(Json(
        state
            .engine
            .average_salary_by_department(&department)
            .await?,
    ))
}

async fn grouped_by_department(
    State(state): State<AppState>,
) -> HttpResult<Json<BTreeMap<String, Vec<String>>>> {
    Ok(Json(state.engine.grouped_by_department().await?))
}

async fn top_salaries(
    State(state): State<AppState>,
    Path(n): Path<i64>,
) -> HttpResult<Json<Vec<EmployeeDto>>> {
    let employees = state.engine.top_n_highest_paid(n).await?;
    Ok(Json(
        employees.into_iter().map(EmployeeDto::from_model).collect(),
    ))
}

async fn payroll_by_job_title(
    State(state): State<AppState>,
    Path(job_title): Path<String>,
) -> HttpResult<Json<JobTitlePayrollDto>> {
    let payload = state.engine.payroll_by_job_title(&job_title).await?;
    Ok(Json(payload.into()))
}

async fn hired_in_last(
    State(state): State<AppState>,
    Path(months): Path<u32>,
) -> HttpResult<Json<Vec<EmployeeDto>>> {
    let employees = state.engine.hired_in_last_months(months).await?;
    Ok(Json(
        employees.into_iter().map(EmployeeDto::from_model).collect(),
    ))
}

async fn filter_by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> HttpResult<Json<Vec<String>>> {
    Ok(Json(state.engine.employees_by_department(&department).await?))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.pool.ping().await.is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug)]
enum HttpError {
    Classified { status: StatusCode, message: String },
    Unclassified(String),
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(message) => Self::Classified {
                status: StatusCode::NOT_FOUND,
                message,
            },
            ApiError::InvalidArgument(message) => Self::Classified {
                status: StatusCode::BAD_REQUEST,
                message,
            },
            ApiError::Internal(err) => Self::Unclassified(format!("{err:#}")),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    timestamp: DateTime<Utc>,
    message: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            Self::Classified { status, message } => {
                let body = ErrorBody {
                    timestamp: Utc::now(),
                    message,
                    status: status.as_u16(),
                };
                (status, Json(body)).into_response()
            }
            // unclassified faults keep the legacy contract: 400 with the
            // raw failure text, not a structured body
            Self::Unclassified(message) => (StatusCode::BAD_REQUEST, message).into_response(),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
