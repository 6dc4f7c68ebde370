use crate::{
    model::employee::{Employee, EmployeeFilter, NewEmployee},
    store::{EmployeeStore, UpsertOutcome},
};
use actix_web::{
    HttpRequest, HttpResponse, Responder,
    error::{ErrorNotFound, InternalError, JsonPayloadError},
    web,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use utoipa::{IntoParams, ToSchema};

const MISSING_FIELDS: &str = "Missing fields";
const INVALID_FIELDS: &str = "Invalid fields";
const NOT_FOUND: &str = "Employee not found";

/// Request body for PUT and POST. Every field is required; they are
/// optional here so an incomplete body can be echoed back.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct EmployeeBody {
    #[schema(example = "Anna")]
    pub nome: Option<String>,
    #[schema(example = "Bianchi")]
    pub cognome: Option<String>,
    #[schema(example = "Dev")]
    pub posizione: Option<String>,
    #[schema(example = 40000)]
    pub stipendio: Option<i64>,
}

impl EmployeeBody {
    fn complete(&self, id: i64) -> Option<Employee> {
        Some(Employee {
            id,
            nome: self.nome.clone()?,
            cognome: self.cognome.clone()?,
            posizione: self.posizione.clone()?,
            stipendio: self.stipendio?,
        })
    }

    fn echo(self, id: i64) -> PartialEmployee {
        PartialEmployee {
            id,
            nome: self.nome,
            cognome: self.cognome,
            posizione: self.posizione,
            stipendio: self.stipendio,
        }
    }

    pub fn into_new(self) -> Option<NewEmployee> {
        Some(NewEmployee {
            nome: self.nome?,
            cognome: self.cognome?,
            posizione: self.posizione?,
            stipendio: self.stipendio?,
        })
    }
}

/// Partial data echoed on a rejected PUT.
#[derive(Debug, Serialize, ToSchema)]
pub struct PartialEmployee {
    pub id: i64,
    pub nome: Option<String>,
    pub cognome: Option<String>,
    pub posizione: Option<String>,
    pub stipendio: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct MissingFieldsResponse {
    #[schema(example = "Missing fields")]
    pub message: String,
    pub data: PartialEmployee,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Exact match on `nome`
    pub name: Option<String>,
    /// Exact match on `cognome`
    pub surname: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeLinks {
    #[schema(example = "/employee/1")]
    pub delete: String,
    #[schema(example = "/employee/1")]
    pub put: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteLink {
    #[schema(example = "/employee/1")]
    pub delete: String,
}

#[derive(Serialize, ToSchema)]
pub struct CollectionLinks {
    #[schema(example = "/employee/{id}")]
    pub employee: String,
    #[schema(example = "/employee")]
    pub create: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeResponse {
    pub result: Employee,
    pub links: EmployeeLinks,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub result: Vec<Employee>,
    pub links: CollectionLinks,
}

#[derive(Serialize, ToSchema)]
pub struct RegisteredResponse {
    #[schema(example = "Employee registered successfully")]
    pub message: String,
    pub data: Employee,
    pub links: DeleteLink,
}

fn employee_path(id: i64) -> String {
    format!("/employee/{id}")
}

/// Ids are non-negative; anything else names no resource.
fn employee_id(path: web::Path<i64>) -> actix_web::Result<i64> {
    let id = path.into_inner();
    if id < 0 {
        return Err(ErrorNotFound(NOT_FOUND));
    }
    Ok(id)
}

/// Body errors keep the shape of the endpoint's own 400: `{message, data}`
/// for PUT, plain text otherwise.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, method = %req.method(), "Rejected request body");

    let response = if req.method() == actix_web::http::Method::PUT {
        let id = req
            .match_info()
            .get("id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or_default();
        HttpResponse::BadRequest().json(MissingFieldsResponse {
            message: INVALID_FIELDS.to_string(),
            data: EmployeeBody::default().echo(id),
        })
    } else {
        HttpResponse::BadRequest().body(INVALID_FIELDS)
    };

    InternalError::from_response(err, response).into()
}

/// Get Employee by ID
///
/// Safe and idempotent.
#[utoipa::path(
    get,
    path = "/employee/{id}",
    params(
        ("id" = i64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeResponse),
        (status = 404, description = "Employee not found", body = String, example = json!("Employee not found")),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_get", skip(store))]
pub async fn get_employee(
    store: web::Data<dyn EmployeeStore>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let id = employee_id(path)?;

    let employee = store.fetch(id).await.map_err(|e| {
        error!(error = %e, "Failed to fetch employee");
        e
    })?;

    match employee {
        Some(result) => Ok(HttpResponse::Ok().json(EmployeeResponse {
            result,
            links: EmployeeLinks {
                delete: employee_path(id),
                put: employee_path(id),
            },
        })),
        None => {
            debug!("Employee not found");
            Ok(HttpResponse::NotFound().body(NOT_FOUND))
        }
    }
}

/// List Employees
///
/// Filters are optional and combined with AND; without filters every row
/// is returned, in datastore order.
#[utoipa::path(
    get,
    path = "/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employee list", body = EmployeeListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_list", skip_all)]
pub async fn list_employees(
    store: web::Data<dyn EmployeeStore>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();
    let filter = EmployeeFilter {
        name: query.name,
        surname: query.surname,
    };

    let result = store.list(&filter).await.map_err(|e| {
        error!(error = %e, ?filter, "Failed to list employees");
        e
    })?;
    debug!(count = result.len(), "Employees listed");

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        result,
        links: CollectionLinks {
            employee: "/employee/{id}".to_string(),
            create: "/employee".to_string(),
        },
    }))
}

/// Create or Replace Employee
///
/// Idempotent: the same id and body always leave the same row behind,
/// whether or not it existed before.
#[utoipa::path(
    put,
    path = "/employee/{id}",
    params(
        ("id" = i64, Path, description = "Employee ID")
    ),
    request_body = EmployeeBody,
    responses(
        (status = 200, description = "Employee stored", body = RegisteredResponse),
        (status = 400, description = "Missing fields", body = MissingFieldsResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_put", skip(store, body))]
pub async fn put_employee(
    store: web::Data<dyn EmployeeStore>,
    path: web::Path<i64>,
    body: web::Json<EmployeeBody>,
) -> actix_web::Result<impl Responder> {
    let id = employee_id(path)?;
    let body = body.into_inner();

    let Some(employee) = body.complete(id) else {
        info!("Validation failed: missing fields");
        return Ok(HttpResponse::BadRequest().json(MissingFieldsResponse {
            message: MISSING_FIELDS.to_string(),
            data: body.echo(id),
        }));
    };

    let outcome = store.upsert(&employee).await.map_err(|e| {
        error!(error = %e, "Failed to upsert employee");
        e
    })?;

    match outcome {
        UpsertOutcome::Created => info!("Employee inserted"),
        UpsertOutcome::Updated => info!("Employee replaced"),
    }

    Ok(HttpResponse::Ok().json(RegisteredResponse {
        message: "Employee registered successfully".to_string(),
        links: DeleteLink {
            delete: employee_path(id),
        },
        data: employee,
    }))
}

/// Delete Employee
///
/// No existence check: deleting an absent id succeeds too.
#[utoipa::path(
    delete,
    path = "/employee/{id}",
    params(
        ("id" = i64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deleted", body = String, example = json!("Employee deleted")),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_delete", skip(store))]
pub async fn delete_employee(
    store: web::Data<dyn EmployeeStore>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let id = employee_id(path)?;

    let removed = store.delete(id).await.map_err(|e| {
        error!(error = %e, "Failed to delete employee");
        e
    })?;
    info!(removed, "Employee delete issued");

    Ok(HttpResponse::Ok().body("Employee deleted"))
}

/// Create Employee with a new id
///
/// Not idempotent: each call inserts a new row under `max(id) + 1`.
#[utoipa::path(
    post,
    path = "/employee",
    request_body = EmployeeBody,
    responses(
        (status = 200, description = "Employee created", body = RegisteredResponse),
        (status = 400, description = "Missing fields", body = String, example = json!("Missing fields")),
        (status = 409, description = "Synthesized id was taken by a concurrent request"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_post", skip_all)]
pub async fn create_employee(
    store: web::Data<dyn EmployeeStore>,
    body: web::Json<EmployeeBody>,
) -> actix_web::Result<impl Responder> {
    let Some(new_employee) = body.into_inner().into_new() else {
        info!("Validation failed: missing fields");
        return Ok(HttpResponse::BadRequest().body(MISSING_FIELDS));
    };

    let employee = store.create(&new_employee).await.map_err(|e| {
        error!(error = %e, "Failed to create employee");
        e
    })?;
    info!(id = employee.id, "Employee created");

    Ok(HttpResponse::Ok().json(RegisteredResponse {
        message: "Employee created successfully".to_string(),
        links: DeleteLink {
            delete: employee_path(employee.id),
        },
        data: employee,
    }))
}
