use crate::api::employee;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // bodies are read as JSON whatever Content-Type the client sent
    cfg.app_data(
        web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(employee::json_error_handler),
    );

    cfg.service(
        web::scope("/employee")
            // /employee
            .service(web::resource("").route(web::post().to(employee::create_employee)))
            // /employee/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(employee::get_employee))
                    .route(web::put().to(employee::put_employee))
                    .route(web::delete().to(employee::delete_employee)),
            ),
    )
    // /employees
    .service(web::resource("/employees").route(web::get().to(employee::list_employees)));
}
