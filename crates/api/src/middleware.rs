//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use mozsolidaria_common::{AppError, Config, Timer, get_telemetry};
use mozsolidaria_core::{
    BlogService, CommunityService, DonationService, ExportService, MetricsService,
    NotificationService, PartnerService, PermissionService, ProjectService, UserService,
};
use mozsolidaria_db::repositories::{
    BeneficiaryRepository, BlogRepository, DonationRepository, NotificationRepository,
    PartnerRepository, PermissionRepository, ProjectRepository, UserRepository,
    VolunteerRepository,
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub permission_service: PermissionService,
    pub notification_service: NotificationService,
    pub metrics_service: MetricsService,
    pub export_service: ExportService,
    pub project_service: ProjectService,
    pub donation_service: DonationService,
    pub community_service: CommunityService,
    pub partner_service: PartnerService,
    pub blog_service: BlogService,
}

impl AppState {
    /// Wire every service over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let permission_repo = PermissionRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));
        let project_repo = ProjectRepository::new(Arc::clone(&db));
        let donation_repo = DonationRepository::new(Arc::clone(&db));
        let volunteer_repo = VolunteerRepository::new(Arc::clone(&db));
        let beneficiary_repo = BeneficiaryRepository::new(Arc::clone(&db));
        let partner_repo = PartnerRepository::new(Arc::clone(&db));
        let blog_repo = BlogRepository::new(db);

        let notification_service =
            NotificationService::new(notification_repo, user_repo.clone());
        let metrics_service = MetricsService::new(
            project_repo.clone(),
            donation_repo.clone(),
            volunteer_repo.clone(),
            beneficiary_repo.clone(),
            partner_repo.clone(),
        );
        let export_service = ExportService::new(
            project_repo.clone(),
            donation_repo.clone(),
            volunteer_repo.clone(),
            beneficiary_repo.clone(),
            blog_repo.clone(),
            user_repo.clone(),
            metrics_service.clone(),
            config.exports.clone(),
        );

        Self {
            user_service: UserService::new(user_repo.clone()),
            permission_service: PermissionService::new(permission_repo, user_repo),
            project_service: ProjectService::new(project_repo.clone(), metrics_service.clone()),
            donation_service: DonationService::new(
                donation_repo,
                project_repo.clone(),
                notification_service.clone(),
                metrics_service.clone(),
                config.exports.currency.clone(),
            ),
            community_service: CommunityService::new(
                volunteer_repo,
                beneficiary_repo,
                notification_service.clone(),
            ),
            partner_service: PartnerService::new(
                partner_repo,
                project_repo,
                notification_service.clone(),
            ),
            blog_service: BlogService::new(blog_repo),
            notification_service,
            metrics_service,
            export_service,
        }
    }
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Authentication middleware.
///
/// A valid bearer token attaches the user to the request. An unknown token
/// leaves the request anonymous; handlers decide whether that is allowed.
/// A failed lookup ends the request with its error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(&req).map(str::to_owned);
    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => debug!("Ignoring unknown bearer token"),
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}

/// Count every request and its latency.
pub async fn telemetry_middleware(req: Request<Body>, next: Next) -> Response {
    let timer = Timer::start();
    let response = next.run(req).await;
    get_telemetry().record_http_request(response.status().as_u16(), timer.elapsed());
    response
}
