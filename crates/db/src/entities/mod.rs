//! Database entities.

pub mod beneficiary_need;
pub mod beneficiary_profile;
pub mod beneficiary_project;
pub mod blog_post;
pub mod comment;
pub mod donation;
pub mod donation_method;
pub mod group_permission;
pub mod need;
pub mod notification;
pub mod partner;
pub mod partner_message;
pub mod partner_project_assignment;
pub mod permission_group;
pub mod program;
pub mod project;
pub mod project_category;
pub mod project_metrics;
pub mod project_milestone;
pub mod project_update;
pub mod skill;
pub mod user;
pub mod user_group;
pub mod volunteer_profile;
pub mod volunteer_skill;

pub use beneficiary_need::Entity as BeneficiaryNeed;
pub use beneficiary_profile::Entity as BeneficiaryProfile;
pub use beneficiary_project::Entity as BeneficiaryProject;
pub use blog_post::Entity as BlogPost;
pub use comment::Entity as Comment;
pub use donation::Entity as Donation;
pub use donation_method::Entity as DonationMethod;
pub use group_permission::Entity as GroupPermission;
pub use need::Entity as Need;
pub use notification::Entity as Notification;
pub use partner::Entity as Partner;
pub use partner_message::Entity as PartnerMessage;
pub use partner_project_assignment::Entity as PartnerProjectAssignment;
pub use permission_group::Entity as PermissionGroup;
pub use program::Entity as Program;
pub use project::Entity as Project;
pub use project_category::Entity as ProjectCategory;
pub use project_metrics::Entity as ProjectMetrics;
pub use project_milestone::Entity as ProjectMilestone;
pub use project_update::Entity as ProjectUpdate;
pub use skill::Entity as Skill;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;
pub use volunteer_profile::Entity as VolunteerProfile;
pub use volunteer_skill::Entity as VolunteerSkill;
