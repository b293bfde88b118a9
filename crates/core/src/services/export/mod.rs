//! Export generator.
//!
//! Loads one area, flattens it into typed rows and renders JSON, CSV or PDF.
//! A PDF that cannot be rendered is returned as JSON with `fallback: true`.

mod pdf;
mod render;
mod rows;
mod title;

pub use pdf::{BuiltinPdfEngine, PdfDocument, PdfEngine, UnavailablePdfEngine};
pub use render::{ExportTable, cell_text, render_csv};
pub use rows::{
    ANONYMOUS_DONOR, BeneficiaryExportRow, BlogExportRow, DonationExportRow, ExportRecord,
    ProjectExportRow, VolunteerExportRow,
};
pub use title::{format_title, wrap_text};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mozsolidaria_common::{AppError, AppResult, ExportConfig, get_telemetry};
use mozsolidaria_db::repositories::{
    BeneficiaryRepository, BlogRepository, DonationFilter, DonationRepository, ProjectRepository,
    TimeWindow, UserRepository, VolunteerRepository,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::metrics::{MetricsService, StatsPeriod};

// ==================== Request ====================

/// Entity area an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportArea {
    Projects,
    Donations,
    Volunteers,
    Beneficiaries,
    Blog,
}

impl ExportArea {
    pub const ALL: [Self; 5] = [
        Self::Projects,
        Self::Donations,
        Self::Volunteers,
        Self::Beneficiaries,
        Self::Blog,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Donations => "donations",
            Self::Volunteers => "volunteers",
            Self::Beneficiaries => "beneficiaries",
            Self::Blog => "blog",
        }
    }
}

impl FromStr for ExportArea {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown export type '{s}', expected one of projects, donations, volunteers, beneficiaries, blog"
                ))
            })
    }
}

impl fmt::Display for ExportArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExportArea {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Json, Self::Csv, Self::Pdf];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown export format '{s}', expected one of json, csv, pdf"
                ))
            })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExportFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Filters applied to the exported records.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportOptions {
    /// First day included (UTC).
    #[serde(default, alias = "dateFrom")]
    pub date_from: Option<NaiveDate>,
    /// Last day included (UTC).
    #[serde(default, alias = "dateTo")]
    pub date_to: Option<NaiveDate>,
    /// Area-specific status, e.g. `active` for projects.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_true", alias = "includeSummary")]
    pub include_summary: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            date_from: None,
            date_to: None,
            status: None,
            include_summary: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

impl ExportOptions {
    /// Creation-time window covering whole days `[date_from, date_to]`.
    pub fn window(&self) -> AppResult<TimeWindow> {
        TimeWindow::from_dates(self.date_from, self.date_to)
    }

    fn status<T: DeserializeOwned>(&self) -> AppResult<Option<T>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => serde_json::from_value(Value::String(raw.to_ascii_lowercase()))
                .map(Some)
                .map_err(|_| AppError::Validation(format!("unknown status '{raw}'"))),
        }
    }
}

/// Body of an export request. `type` and `format` are validated on use.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    #[serde(rename = "type")]
    pub area: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub options: ExportOptions,
}

fn default_format() -> String {
    ExportFormat::Json.as_str().to_string()
}

// ==================== Output ====================

/// A rendered export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub area: ExportArea,
    pub requested_format: ExportFormat,
    /// Format actually rendered; JSON after a fallback.
    pub format: ExportFormat,
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub record_count: usize,
    pub fallback: bool,
    pub fallback_reason: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    #[serde(rename = "type")]
    area: ExportArea,
    filename: &'a str,
    generated_at: DateTime<Utc>,
    fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Value>,
    warnings: &'a [String],
    columns: &'a [&'static str],
    rows: Vec<Value>,
}

/// Keep `[A-Za-z0-9_-]`, replace the rest, and drop a known extension.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let trimmed = raw.trim();
    let stem = ExportFormat::ALL
        .iter()
        .find_map(|f| {
            let suffix = format!(".{}", f.extension());
            trimmed
                .to_ascii_lowercase()
                .ends_with(&suffix)
                .then(|| &trimmed[..trimmed.len() - suffix.len()])
        })
        .unwrap_or(trimmed);

    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

// ==================== Service ====================

/// Export service.
#[derive(Clone)]
pub struct ExportService {
    project_repo: ProjectRepository,
    donation_repo: DonationRepository,
    volunteer_repo: VolunteerRepository,
    beneficiary_repo: BeneficiaryRepository,
    blog_repo: BlogRepository,
    user_repo: UserRepository,
    metrics: MetricsService,
    pdf_engine: Arc<dyn PdfEngine>,
    config: ExportConfig,
}

impl ExportService {
    /// Create a new export service. The PDF engine follows `config.pdf_enabled`.
    #[must_use]
    pub fn new(
        project_repo: ProjectRepository,
        donation_repo: DonationRepository,
        volunteer_repo: VolunteerRepository,
        beneficiary_repo: BeneficiaryRepository,
        blog_repo: BlogRepository,
        user_repo: UserRepository,
        metrics: MetricsService,
        config: ExportConfig,
    ) -> Self {
        let pdf_engine: Arc<dyn PdfEngine> = if config.pdf_enabled {
            Arc::new(BuiltinPdfEngine::new(config.lines_per_page))
        } else {
            Arc::new(UnavailablePdfEngine)
        };

        Self {
            project_repo,
            donation_repo,
            volunteer_repo,
            beneficiary_repo,
            blog_repo,
            user_repo,
            metrics,
            pdf_engine,
            config,
        }
    }

    /// Replace the PDF engine.
    #[must_use]
    pub fn with_pdf_engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.pdf_engine = engine;
        self
    }

    /// Generate an export.
    pub async fn generate(&self, request: ExportRequest) -> AppResult<ExportOutput> {
        self.generate_at(request, Utc::now()).await
    }

    /// Generate an export stamped with `now`.
    pub async fn generate_at(
        &self,
        request: ExportRequest,
        now: DateTime<Utc>,
    ) -> AppResult<ExportOutput> {
        let area: ExportArea = request.area.parse()?;
        let requested_format: ExportFormat = request.format.parse()?;
        let window = request.options.window()?;

        let stem = request
            .filename
            .as_deref()
            .map(sanitize_filename)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{area}_export_{}", now.format("%Y%m%d")));

        let mut warnings = Vec::new();
        let (table, local_summary) = self
            .load(area, &request.options, window, &mut warnings)
            .await?;

        let summary = if request.options.include_summary {
            let platform = match local_summary {
                Some(value) => Some(value),
                None => self.platform_summary(area, now, &mut warnings).await,
            };
            let mut summary = json!({ "records": table.rows.len() });
            if let (Some(platform), Some(object)) = (platform, summary.as_object_mut()) {
                object.insert("platform".to_string(), platform);
            }
            Some(summary)
        } else {
            None
        };

        let generated_at = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let (format, body, fallback_reason) = match requested_format {
            ExportFormat::Json => (ExportFormat::Json, None, None),
            ExportFormat::Csv => (ExportFormat::Csv, Some(render_csv(&table)), None),
            ExportFormat::Pdf => {
                let document = render::pdf_document(
                    &stem,
                    &generated_at,
                    summary.as_ref(),
                    &table,
                    self.config.title_width,
                    self.config.body_width,
                );
                match self.pdf_engine.render(&document) {
                    Ok(bytes) => (ExportFormat::Pdf, Some(bytes), None),
                    Err(e) => {
                        warn!(
                            area = %area,
                            engine = self.pdf_engine.name(),
                            error = %e,
                            "PDF rendering failed, falling back to JSON"
                        );
                        (ExportFormat::Json, None, Some(e.to_string()))
                    }
                }
            }
        };

        let fallback = fallback_reason.is_some();
        let filename = format!("{stem}.{}", format.extension());

        let body = match body {
            Some(bytes) => bytes,
            None => {
                let envelope = JsonEnvelope {
                    area,
                    filename: &filename,
                    generated_at: now,
                    fallback,
                    fallback_reason: fallback_reason.as_deref(),
                    summary: summary.as_ref(),
                    warnings: &warnings,
                    columns: &table.columns,
                    rows: table.row_objects(),
                };
                serde_json::to_vec_pretty(&envelope)
                    .map_err(|e| AppError::Internal(format!("export serialization failed: {e}")))?
            }
        };

        get_telemetry().record_export(fallback);
        info!(
            area = %area,
            format = %format,
            records = table.rows.len(),
            fallback = fallback,
            "Export generated"
        );

        Ok(ExportOutput {
            area,
            requested_format,
            format,
            filename,
            content_type: format.content_type(),
            body,
            record_count: table.rows.len(),
            fallback,
            fallback_reason,
            warnings,
        })
    }

    async fn load(
        &self,
        area: ExportArea,
        options: &ExportOptions,
        window: TimeWindow,
        warnings: &mut Vec<String>,
    ) -> AppResult<(ExportTable, Option<Value>)> {
        match area {
            ExportArea::Projects => {
                let rows = self.project_rows(options, window, warnings).await?;
                Ok((table(&rows), None))
            }
            ExportArea::Donations => {
                let rows = self.donation_rows(options, window, warnings).await?;
                Ok((table(&rows), None))
            }
            ExportArea::Volunteers => {
                let rows = self.volunteer_rows(options, window, warnings).await?;
                Ok((table(&rows), None))
            }
            ExportArea::Beneficiaries => {
                let rows = self.beneficiary_rows(options, window, warnings).await?;
                Ok((table(&rows), None))
            }
            ExportArea::Blog => {
                let rows = self.blog_rows(options, window, warnings).await?;
                let views: i64 = rows.iter().map(|r| i64::from(r.views_count)).sum();
                let comments: u64 = rows.iter().map(|r| r.comments).sum();
                let approved: u64 = rows.iter().map(|r| r.approved_comments).sum();
                let summary = json!({
                    "totalViews": views,
                    "totalComments": comments,
                    "approvedComments": approved,
                });
                Ok((table(&rows), Some(summary)))
            }
        }
    }

    async fn platform_summary(
        &self,
        area: ExportArea,
        now: DateTime<Utc>,
        warnings: &mut Vec<String>,
    ) -> Option<Value> {
        let result = match area {
            ExportArea::Projects => self
                .metrics
                .project_stats()
                .await
                .and_then(|s| to_json(&s)),
            ExportArea::Donations => self
                .metrics
                .financial_stats(StatsPeriod::All, now)
                .await
                .and_then(|s| to_json(&s))
                .map(|mut v| {
                    if let Some(object) = v.as_object_mut() {
                        object.insert("currency".to_string(), json!(self.config.currency));
                    }
                    v
                }),
            ExportArea::Volunteers | ExportArea::Beneficiaries => self
                .metrics
                .community_stats(TimeWindow::ALL)
                .await
                .and_then(|s| to_json(&s)),
            ExportArea::Blog => return None,
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(area = %area, error = %e, "Export summary unavailable");
                warnings.push(format!("summary omitted: {e}"));
                None
            }
        }
    }

    async fn project_rows(
        &self,
        options: &ExportOptions,
        window: TimeWindow,
        warnings: &mut Vec<String>,
    ) -> AppResult<Vec<ProjectExportRow>> {
        let projects = self
            .project_repo
            .find_filtered(options.status()?, window)
            .await?;

        let ids: Vec<String> = projects.iter().map(|p| p.id.clone()).collect();
        let program_ids = distinct(projects.iter().filter_map(|p| p.program_id.clone()));
        let category_ids = distinct(projects.iter().filter_map(|p| p.category_id.clone()));

        let programs: HashMap<String, String> = degrade(
            "program names",
            self.project_repo.find_programs_by_ids(&program_ids).await,
            warnings,
        )
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
        let categories: HashMap<String, String> = degrade(
            "category names",
            self.project_repo.find_categories_by_ids(&category_ids).await,
            warnings,
        )
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
        let metrics: HashMap<String, _> = degrade(
            "project metrics",
            self.project_repo.find_metrics_by_project_ids(&ids).await,
            warnings,
        )
        .into_iter()
        .map(|m| (m.project_id.clone(), m))
        .collect();

        Ok(projects
            .into_iter()
            .map(|p| {
                let program = p.program_id.as_ref().and_then(|id| programs.get(id)).cloned();
                let category = p.category_id.as_ref().and_then(|id| categories.get(id)).cloned();
                let snapshot = metrics.get(&p.id);
                ProjectExportRow::new(p, program, category, snapshot)
            })
            .collect())
    }

    async fn donation_rows(
        &self,
        options: &ExportOptions,
        window: TimeWindow,
        warnings: &mut Vec<String>,
    ) -> AppResult<Vec<DonationExportRow>> {
        let filter = DonationFilter {
            status: options.status()?,
            window,
            project_id: None,
        };
        let donations = self.donation_repo.find_filtered(&filter).await?;

        let method_ids = distinct(donations.iter().filter_map(|d| d.donation_method_id.clone()));
        let project_ids = distinct(donations.iter().filter_map(|d| d.project_id.clone()));

        let methods: HashMap<String, String> = degrade(
            "donation method names",
            self.donation_repo.find_methods_by_ids(&method_ids).await,
            warnings,
        )
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();
        let projects: HashMap<String, String> = degrade(
            "project names",
            self.project_repo.find_by_ids(&project_ids).await,
            warnings,
        )
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

        Ok(donations
            .into_iter()
            .map(|d| {
                let method = d.donation_method_id.as_ref().and_then(|id| methods.get(id)).cloned();
                let project = d.project_id.as_ref().and_then(|id| projects.get(id)).cloned();
                DonationExportRow::new(d, method, project)
            })
            .collect())
    }

    async fn volunteer_rows(
        &self,
        options: &ExportOptions,
        window: TimeWindow,
        warnings: &mut Vec<String>,
    ) -> AppResult<Vec<VolunteerExportRow>> {
        let volunteers = self
            .volunteer_repo
            .find_filtered(options.status()?, window)
            .await?;
        let ids: Vec<String> = volunteers.iter().map(|v| v.id.clone()).collect();

        let links = degrade(
            "volunteer skills",
            self.volunteer_repo.find_skill_links(&ids).await,
            warnings,
        );
        let skill_ids = distinct(links.iter().map(|l| l.skill_id.clone()));
        let names: HashMap<String, String> = degrade(
            "skill names",
            self.volunteer_repo.find_skills_by_ids(&skill_ids).await,
            warnings,
        )
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
        let skills = group_names(links.iter().map(|l| (&l.volunteer_id, &l.skill_id)), &names);

        Ok(volunteers
            .into_iter()
            .map(|v| {
                let list = skills.get(&v.id).cloned().unwrap_or_default();
                VolunteerExportRow::new(v, list)
            })
            .collect())
    }

    async fn beneficiary_rows(
        &self,
        options: &ExportOptions,
        window: TimeWindow,
        warnings: &mut Vec<String>,
    ) -> AppResult<Vec<BeneficiaryExportRow>> {
        let beneficiaries = self
            .beneficiary_repo
            .find_filtered(options.status()?, window)
            .await?;
        let ids: Vec<String> = beneficiaries.iter().map(|b| b.id.clone()).collect();

        let need_links = degrade(
            "beneficiary needs",
            self.beneficiary_repo.find_need_links(&ids).await,
            warnings,
        );
        let need_ids = distinct(need_links.iter().map(|l| l.need_id.clone()));
        let need_names: HashMap<String, String> = degrade(
            "need names",
            self.beneficiary_repo.find_needs_by_ids(&need_ids).await,
            warnings,
        )
        .into_iter()
        .map(|n| (n.id, n.name))
        .collect();

        let project_links = degrade(
            "beneficiary projects",
            self.beneficiary_repo.find_project_links(&ids).await,
            warnings,
        );
        let project_ids = distinct(project_links.iter().map(|l| l.project_id.clone()));
        let project_names: HashMap<String, String> = degrade(
            "project names",
            self.project_repo.find_by_ids(&project_ids).await,
            warnings,
        )
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

        let needs = group_names(
            need_links.iter().map(|l| (&l.beneficiary_id, &l.need_id)),
            &need_names,
        );
        let projects = group_names(
            project_links.iter().map(|l| (&l.beneficiary_id, &l.project_id)),
            &project_names,
        );

        Ok(beneficiaries
            .into_iter()
            .map(|b| {
                let need_list = needs.get(&b.id).cloned().unwrap_or_default();
                let project_list = projects.get(&b.id).cloned().unwrap_or_default();
                BeneficiaryExportRow::new(b, need_list, project_list)
            })
            .collect())
    }

    async fn blog_rows(
        &self,
        options: &ExportOptions,
        window: TimeWindow,
        warnings: &mut Vec<String>,
    ) -> AppResult<Vec<BlogExportRow>> {
        let posts = self
            .blog_repo
            .find_filtered(options.status()?, window)
            .await?;
        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let author_ids = distinct(posts.iter().filter_map(|p| p.author_id.clone()));

        let authors: HashMap<String, String> = degrade(
            "author names",
            self.user_repo.find_by_ids(&author_ids).await,
            warnings,
        )
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

        let mut counts: HashMap<String, (u64, u64)> = HashMap::new();
        let comments = degrade(
            "comment counts",
            self.blog_repo.find_comments_for_posts(&ids).await,
            warnings,
        );
        for c in comments {
            let entry = counts.entry(c.post_id).or_default();
            entry.0 += 1;
            if c.is_approved {
                entry.1 += 1;
            }
        }

        Ok(posts
            .into_iter()
            .map(|p| {
                let author = p.author_id.as_ref().and_then(|id| authors.get(id)).cloned();
                let (total, approved) = counts.get(&p.id).copied().unwrap_or_default();
                BlogExportRow::new(p, author, total, approved)
            })
            .collect())
    }
}

fn table<R: ExportRecord>(rows: &[R]) -> ExportTable {
    ExportTable {
        columns: R::COLUMNS.to_vec(),
        rows: rows.iter().map(ExportRecord::cells).collect(),
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

fn distinct(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut ids: Vec<String> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Resolve `(owner, target)` links into owner -> target names.
fn group_names<'a>(
    links: impl Iterator<Item = (&'a String, &'a String)>,
    names: &HashMap<String, String>,
) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (owner, target) in links {
        if let Some(name) = names.get(target) {
            grouped.entry(owner.clone()).or_default().push(name.clone());
        }
    }
    for list in grouped.values_mut() {
        list.sort();
    }
    grouped
}

/// A joined lookup that failed yields its empty default and a warning.
fn degrade<T: Default>(what: &str, result: AppResult<T>, warnings: &mut Vec<String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(lookup = what, error = %e, "Export lookup failed, using defaults");
            warnings.push(format!("{what} unavailable: {e}"));
            T::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mozsolidaria_db::{
        entities::{beneficiary_project, project_metrics, volunteer_skill},
        repositories::PartnerRepository,
        test_utils,
    };
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn service(db: MockDatabase, config: ExportConfig) -> ExportService {
        let conn = Arc::new(db.into_connection());
        let metrics = MetricsService::new(
            ProjectRepository::new(conn.clone()),
            DonationRepository::new(conn.clone()),
            VolunteerRepository::new(conn.clone()),
            BeneficiaryRepository::new(conn.clone()),
            PartnerRepository::new(conn.clone()),
        );
        ExportService::new(
            ProjectRepository::new(conn.clone()),
            DonationRepository::new(conn.clone()),
            VolunteerRepository::new(conn.clone()),
            BeneficiaryRepository::new(conn.clone()),
            BlogRepository::new(conn.clone()),
            UserRepository::new(conn),
            metrics,
            config,
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn request(area: &str, format: &str) -> ExportRequest {
        ExportRequest {
            area: area.to_string(),
            format: format.to_string(),
            filename: None,
            options: ExportOptions::default(),
        }
    }

    fn without_summary(mut req: ExportRequest) -> ExportRequest {
        req.options.include_summary = false;
        req
    }

    fn body_json(output: &ExportOutput) -> Value {
        serde_json::from_slice(&output.body).unwrap()
    }

    fn contains_placeholder(value: &Value) -> bool {
        match value {
            Value::String(s) => s == "N/A",
            Value::Array(items) => items.iter().any(contains_placeholder),
            Value::Object(map) => map.values().any(contains_placeholder),
            _ => false,
        }
    }

    #[tokio::test]
    async fn test_unknown_area_and_format_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres), ExportConfig::default());

        assert!(matches!(
            svc.generate_at(request("invoices", "json"), now()).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.generate_at(request("projects", "xlsx"), now()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_inverted_date_range_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres), ExportConfig::default());
        let mut req = request("donations", "csv");
        req.options.date_from = NaiveDate::from_ymd_opt(2025, 5, 1);
        req.options.date_to = NaiveDate::from_ymd_opt(2025, 4, 1);

        assert!(matches!(
            svc.generate_at(req, now()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_status_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres), ExportConfig::default());
        let mut req = request("projects", "json");
        req.options.status = Some("archived".to_string());

        assert!(matches!(
            svc.generate_at(req, now()).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_projects_json_has_no_placeholders() {
        let mut metrics = test_utils::metrics("pm1", "p1");
        metrics.progress_percentage = 85;
        let projects = vec![
            test_utils::project("p1", "agua-potavel"),
            test_utils::project("p2", "escola-primaria"),
        ];
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([projects.clone()])
                .append_query_results([[metrics.clone()]])
                // summary: project_stats
                .append_query_results([projects])
                .append_query_results([[metrics]]),
            ExportConfig::default(),
        );

        let output = svc.generate_at(request("projects", "json"), now()).await.unwrap();
        let body = body_json(&output);

        assert_eq!(output.content_type, "application/json");
        assert!(!output.fallback);
        assert_eq!(output.filename, "projects_export_20250601.json");
        assert_eq!(body["type"], json!("projects"));
        assert_eq!(body["fallback"], json!(false));
        assert_eq!(body["summary"]["records"], json!(2));
        assert_eq!(body["summary"]["platform"]["totalProjects"], json!(2));
        assert_eq!(body["rows"][0]["progress_percentage"], json!(85));
        assert_eq!(body["rows"][1]["progress_percentage"], json!(0));
        assert_eq!(body["rows"][1]["program"], Value::Null);
        assert!(!contains_placeholder(&body["rows"]));
    }

    #[tokio::test]
    async fn test_failed_summary_is_omitted_with_warning() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::project("p1", "agua")]])
                .append_query_results([Vec::<project_metrics::Model>::new()])
                .append_query_errors([DbErr::Custom("stats down".into())]),
            ExportConfig::default(),
        );

        let output = svc.generate_at(request("projects", "json"), now()).await.unwrap();
        let body = body_json(&output);

        assert_eq!(body["summary"]["records"], json!(1));
        assert!(body["summary"].get("platform").is_none());
        assert_eq!(output.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_pdf_falls_back_to_json_when_engine_unavailable() {
        let config = ExportConfig {
            pdf_enabled: false,
            ..ExportConfig::default()
        };
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::volunteer("v1", "Ana Machava")]])
                .append_query_results([Vec::<volunteer_skill::Model>::new()]),
            config,
        );
        let mut req = without_summary(request("volunteers", "pdf"));
        req.filename = Some("Voluntários 2025.pdf".to_string());

        let output = svc.generate_at(req, now()).await.unwrap();
        let body = body_json(&output);

        assert!(output.fallback);
        assert_eq!(output.requested_format, ExportFormat::Pdf);
        assert_eq!(output.format, ExportFormat::Json);
        assert_eq!(output.content_type, "application/json");
        assert_eq!(output.filename, "Volunt_rios_2025.json");
        assert_eq!(body["fallback"], json!(true));
        assert!(body["fallback_reason"].is_string());
        assert_eq!(body["rows"][0]["skills"], json!([]));
    }

    #[tokio::test]
    async fn test_beneficiary_lookup_failure_degrades_field() {
        let links = vec![beneficiary_project::Model {
            id: "bp1".to_string(),
            beneficiary_id: "b1".to_string(),
            project_id: "p1".to_string(),
            enrolled_at: test_utils::fixed_time(),
        }];
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::beneficiary("b1", "Rosa Cossa")]])
                .append_query_errors([DbErr::Custom("needs unavailable".into())])
                .append_query_results([links])
                .append_query_results([[test_utils::project("p1", "pocos-comunitarios")]]),
            ExportConfig::default(),
        );

        let output = svc
            .generate_at(without_summary(request("beneficiaries", "json")), now())
            .await
            .unwrap();
        let body = body_json(&output);

        assert_eq!(output.warnings.len(), 1);
        assert_eq!(body["rows"][0]["needs"], json!([]));
        assert_eq!(body["rows"][0]["projects"], json!(["pocos comunitarios"]));
        assert_eq!(body["warnings"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_donations_csv() {
        let mut anonymous = test_utils::donation("d2", 250);
        anonymous.is_anonymous = true;
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::donation("d1", 100), anonymous]]),
            ExportConfig::default(),
        );

        let output = svc
            .generate_at(without_summary(request("donations", "CSV")), now())
            .await
            .unwrap();
        let csv = String::from_utf8(output.body).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(output.content_type, "text/csv; charset=utf-8");
        assert_eq!(output.record_count, 2);
        assert_eq!(lines[0], DonationExportRow::COLUMNS.join(","));
        assert!(lines[1].starts_with("d1,Ana Machava,ana@example.org,100,MZN,,,completed,,"));
        assert!(lines[2].starts_with("d2,Anonymous,,250,MZN,"));
    }

    #[tokio::test]
    async fn test_blog_pdf_renders() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_utils::blog_post("b1", "ola-mundo")]])
                .append_query_results([[
                    test_utils::comment("c1", "b1", true),
                    test_utils::comment("c2", "b1", false),
                ]]),
            ExportConfig::default(),
        );
        let mut req = request("blog", "pdf");
        req.filename = Some("blog report!".to_string());

        let output = svc.generate_at(req, now()).await.unwrap();

        assert!(!output.fallback);
        assert_eq!(output.content_type, "application/pdf");
        assert_eq!(output.filename, "blog_report.pdf");
        assert!(output.body.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn test_options_window_covers_whole_days() {
        let options = ExportOptions {
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 1, 31),
            ..ExportOptions::default()
        };
        let window = options.window().unwrap();

        assert_eq!(window.from, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(window.to, Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_window_rejects_out_of_range_date_to() {
        let req: ExportRequest = serde_json::from_value(json!({
            "type": "donations",
            "options": { "date_to": "+262142-12-31" }
        }))
        .unwrap();

        assert!(matches!(req.options.window(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_request_defaults() {
        let req: ExportRequest = serde_json::from_value(json!({ "type": "projects" })).unwrap();

        assert_eq!(req.format, "json");
        assert!(req.options.include_summary);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("relatório final.PDF"), "relat_rio_final");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("???"), "");
    }
}
