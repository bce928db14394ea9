use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::config::Config;
use crate::dataset::{Cell, Dataset};
use crate::error::Result;
use crate::pipeline::AdmissionData;

const VIEW_COLUMNS: [&str; 18] = [
    "student_id",
    "full_name",
    "major_name",
    "province",
    "gender",
    "admission_year",
    "thpt_total",
    "hsa",
    "tsa",
    "ielts",
    "sat",
    "final_score",
    "method_score_thpt",
    "method_score_hsa",
    "method_score_tsa",
    "method_score_sat",
    "method_score_ielts_dgnl",
    "method_score_ielts_thpt",
];
const MAJOR_COLUMNS: [&str; 3] = ["major_name", "quota", "admitted"];
const PROVINCE_COLUMNS: [&str; 2] = ["province", "student_count"];

const VIEW_QUERY: &str = r#"
    SELECT v.student_id, v.full_name, v.major_name, s.province, s.gender, v.admission_year,
           v.thpt_total::float8 AS thpt_total,
           v.hsa::float8 AS hsa,
           v.tsa::float8 AS tsa,
           v.ielts::float8 AS ielts,
           v.sat::float8 AS sat,
           v.final_score::float8 AS final_score,
           v.method_score_thpt::float8 AS method_score_thpt,
           v.method_score_hsa::float8 AS method_score_hsa,
           v.method_score_tsa::float8 AS method_score_tsa,
           v.method_score_sat::float8 AS method_score_sat,
           v.method_score_ielts_dgnl::float8 AS method_score_ielts_dgnl,
           v.method_score_ielts_thpt::float8 AS method_score_ielts_thpt
    FROM admissions.admission_analysis v
    JOIN admissions.students s ON s.student_id = v.student_id
    WHERE v.admission_year = $1
"#;

const MAJOR_QUERY: &str = r#"
    SELECT m.major_name, m.quota, COUNT(r.student_id) AS admitted
    FROM admissions.majors m
    LEFT JOIN admissions.admission_records r
        ON r.major_code = m.major_code AND r.admission_year = $1
    GROUP BY m.major_code, m.major_name, m.quota
    ORDER BY m.major_name
"#;

const PROVINCE_QUERY: &str = r#"
    SELECT s.province, COUNT(s.student_id) AS student_count
    FROM admissions.students s
    JOIN admissions.admission_records r ON r.student_id = s.student_id
    WHERE r.admission_year = $1
    GROUP BY s.province
    ORDER BY student_count DESC, s.province
"#;

/// Where the raw admission tables come from.
#[async_trait]
pub trait AdmissionSource: Send + Sync {
    /// One row per admitted student with every score column.
    async fn admission_view(&self, year: i32) -> Result<Dataset>;

    /// `major_name`, `quota`, `admitted` per major, sorted by name.
    async fn admission_by_major(&self, year: i32) -> Result<Dataset>;

    /// `province`, `student_count`, sorted by count descending.
    async fn province_counts(&self, year: i32) -> Result<Dataset>;
}

pub async fn fetch_admission_data(
    source: &dyn AdmissionSource,
    year: i32,
) -> Result<AdmissionData> {
    let (view, majors, provinces) = tokio::try_join!(
        source.admission_view(year),
        source.admission_by_major(year),
        source.province_counts(year),
    )?;
    debug!(
        year,
        view_rows = view.row_count(),
        major_rows = majors.row_count(),
        province_rows = provinces.row_count(),
        "fetched admission data"
    );
    Ok(AdmissionData {
        view,
        majors,
        provinces,
    })
}

pub async fn connect(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("admissions schema is up to date");
    Ok(())
}

pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdmissionSource for PgSource {
    async fn admission_view(&self, year: i32) -> Result<Dataset> {
        let rows = sqlx::query(VIEW_QUERY)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_dataset(&rows, &VIEW_COLUMNS))
    }

    async fn admission_by_major(&self, year: i32) -> Result<Dataset> {
        let rows = sqlx::query(MAJOR_QUERY)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_dataset(&rows, &MAJOR_COLUMNS))
    }

    async fn province_counts(&self, year: i32) -> Result<Dataset> {
        let rows = sqlx::query(PROVINCE_QUERY)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_dataset(&rows, &PROVINCE_COLUMNS))
    }
}

/// Columns come from the result set itself; `fallback` names them when
/// nothing was returned.
fn rows_to_dataset(rows: &[PgRow], fallback: &[&str]) -> Dataset {
    let names: Vec<String> = match rows.first() {
        Some(row) => row
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect(),
        None => fallback.iter().map(|name| name.to_string()).collect(),
    };
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let cells: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| {
            (0..names.len())
                .map(|index| cell_at(row, index))
                .collect::<Vec<_>>()
        })
        .collect();
    Dataset::from_rows(&name_refs, cells)
}

/// Undecodable values become `Cell::Null`; the cleaner treats them as
/// missing.
fn cell_at(row: &PgRow, index: usize) -> Cell {
    let Ok(raw) = row.try_get_raw(index) else {
        return Cell::Null;
    };
    if raw.is_null() {
        return Cell::Null;
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "INT2" => row.try_get::<i16, _>(index).map(|v| Cell::Int(v.into())),
        "INT4" => row.try_get::<i32, _>(index).map(|v| Cell::Int(v.into())),
        "INT8" => row.try_get::<i64, _>(index).map(Cell::Int),
        "FLOAT4" => row.try_get::<f32, _>(index).map(|v| Cell::Float(v.into())),
        "FLOAT8" => row.try_get::<f64, _>(index).map(Cell::Float),
        _ => row.try_get::<String, _>(index).map(Cell::Text),
    };

    decoded.unwrap_or_else(|e| {
        debug!(
            column = index,
            type_name = %type_name,
            error = %e,
            "undecodable cell read as missing"
        );
        Cell::Null
    })
}
