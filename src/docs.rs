use crate::api::employee::{
    CollectionLinks, DeleteLink, EmployeeBody, EmployeeLinks, EmployeeListResponse,
    EmployeeQuery, EmployeeResponse, MissingFieldsResponse, PartialEmployee, RegisteredResponse,
};
use crate::model::employee::Employee;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Persona Employee API",
        version = "0.1.0",
        description = r#"
## Employee resource

CRUD over the `persona` table.

- `PUT /employee/{id}` is an **idempotent upsert**: it inserts the row, or
  replaces its four data fields when the id already exists.
- `POST /employee` is **not idempotent**: every call stores a new row under
  the next free id (`max(id) + 1`, starting at 1).
- `DELETE /employee/{id}` succeeds whether or not the row existed.

Links in responses are plain path strings.
"#,
    ),
    paths(
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::put_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::create_employee
    ),
    components(
        schemas(
            Employee,
            EmployeeBody,
            EmployeeQuery,
            PartialEmployee,
            MissingFieldsResponse,
            EmployeeLinks,
            DeleteLink,
            CollectionLinks,
            EmployeeResponse,
            EmployeeListResponse,
            RegisteredResponse
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        assert_eq!(paths, vec!["/employee", "/employee/{id}", "/employees"]);
        assert_eq!(doc.paths.paths["/employee/{id}"].operations.len(), 3);
    }
}
