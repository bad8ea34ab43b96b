use crate::{
    api::{attendance, cv, department, event, face, leave_request, leave_type, setting, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            tracing::warn!(requests_per_min, "Invalid limiter settings, using defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    // before /{id}
                    .service(web::resource("/me").route(web::get().to(user::get_me)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    )
                    .service(
                        web::resource("/{id}/cv")
                            .app_data(web::PayloadConfig::new(config.cv_max_bytes))
                            .route(web::put().to(cv::upload_cv))
                            .route(web::get().to(cv::download_cv)),
                    ),
            )
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
                    .service(web::resource("/me").route(web::get().to(attendance::my_attendance)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/export").route(web::get().to(attendance::export_attendance)))
                    .service(
                        web::resource("/absentees").route(web::post().to(attendance::mark_absentees)),
                    ),
            )
            .service(
                web::scope("/face")
                    .service(
                        web::resource("/descriptor").route(web::put().to(face::register_descriptor)),
                    )
                    .service(web::resource("/compare").route(web::post().to(face::compare_face))),
            )
            .service(
                web::scope("/leave-types")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_type::list_leave_types))
                            .route(web::post().to(leave_type::create_leave_type)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(leave_type::update_leave_type))
                            .route(web::delete().to(leave_type::delete_leave_type)),
                    ),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::list_leave))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // before /{id}
                    .service(web::resource("/balance").route(web::get().to(leave_request::leave_balance)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::delete().to(leave_request::cancel_leave)),
                    )
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/events")
                    .service(
                        web::resource("")
                            .route(web::get().to(event::list_events))
                            .route(web::post().to(event::create_event)),
                    )
                    .service(web::resource("/working-day").route(web::get().to(event::working_day)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(event::get_event))
                            .route(web::put().to(event::update_event))
                            .route(web::delete().to(event::delete_event)),
                    ),
            )
            .service(
                web::scope("/settings")
                    .service(web::resource("").route(web::get().to(setting::list_settings)))
                    .service(
                        web::resource("/{key}")
                            .route(web::get().to(setting::get_setting))
                            .route(web::put().to(setting::save_setting)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a rotated token pair

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::jwt::generate_access_token, auth::jwt::subject};
    use actix_web::{App, http::StatusCode, test};
    use sqlx::MySqlPool;

    #[actix_web::test]
    async fn limiter_tolerates_zero_rate() {
        let _ = build_limiter(0);
        let _ = build_limiter(100_000);
    }

    #[actix_web::test]
    async fn protected_routes_require_a_token() {
        let config = Config::for_tests();
        let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(config.clone()))
                .configure(|cfg| configure(cfg, config.clone())),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/users/me")
            .peer_addr("127.0.0.1:1000".parse().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn employees_are_forbidden_from_admin_routes() {
        let config = Config::for_tests();
        let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
        let token = generate_access_token(&subject(3), &config.jwt_secret, 60).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(config.clone()))
                .configure(|cfg| configure(cfg, config.clone())),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/attendance/absentees")
            .peer_addr("127.0.0.1:1000".parse().unwrap())
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
