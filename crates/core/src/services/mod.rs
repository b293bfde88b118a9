//! Business logic services.

#![allow(missing_docs)]

pub mod blog;
pub mod community;
pub mod donation;
pub mod export;
pub mod metrics;
pub mod notification;
pub mod partner;
pub mod permission;
pub mod project;
pub mod user;

use serde::{Deserialize, Deserializer};

pub use blog::{AddCommentInput, BlogService, CreatePostInput};
pub use community::{CommunityService, RegisterBeneficiaryInput, RegisterVolunteerInput};
pub use donation::{CreateDonationInput, DonationService, UpdateDonationStatusInput};
pub use export::{
    ExportArea, ExportFormat, ExportOptions, ExportOutput, ExportRequest, ExportService,
    PdfEngine,
};
pub use metrics::{
    AdvancedStats, CommunityStats, FinancialStats, MetricsService, PerformanceStats,
    ProjectMetricsSnapshot, ProjectStats, StatsPeriod,
};
pub use notification::{
    CreateNotificationInput, NotificationDraft, NotificationResponse, NotificationService,
};
pub use partner::{CreateAssignmentInput, PartnerService, SendMessageInput};
pub use permission::{
    EXPORT_REPORTS, GroupSummary, Membership, PERMISSION_TABLE, PERMISSION_TABLE_VERSION,
    PermissionService, SyncReport, VIEW_REPORTS,
};
pub use project::{
    CreateMilestoneInput, CreateProjectInput, CreateUpdateInput, ProjectService,
    UpdateMilestoneInput, UpdateProjectInput, UpdateUpdateInput,
};
pub use user::{TokenRequest, TokenResponse, UserResponse, UserService};

/// Distinguishes an absent field from an explicit `null` in PATCH bodies.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
