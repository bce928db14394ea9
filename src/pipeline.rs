//! Composition of the cleaning, aggregation and chart steps into the
//! response bodies served by the API and the CLI.

use tracing::debug;

use crate::aggregate::{
    analyze_per_method_scores, distribute_scores, rank_majors, rank_provinces, summarize,
};
use crate::chart::{
    major_admission_chart, method_scores_chart, province_pie_chart, score_distribution_chart,
};
use crate::cleaner::{clean, SCORE_COLUMNS};
use crate::dataset::Dataset;
use crate::models::{
    ChartsResponse, DashboardCharts, DashboardResponse, DataQualityReport, MajorAdmissionItem,
    SummaryStatistics,
};

pub const TOP_PROVINCES_LIMIT: usize = 10;

/// Raw query results for one year.
#[derive(Debug, Clone, Default)]
pub struct AdmissionData {
    pub view: Dataset,
    pub majors: Dataset,
    pub provinces: Dataset,
}

fn cleaned_view(view: &Dataset) -> Dataset {
    let (cleaned, report) = clean(view, &SCORE_COLUMNS);
    if !report.is_empty() {
        debug!(
            rows = cleaned.row_count(),
            columns_cleaned = report.len(),
            "cleaned admission view"
        );
    }
    cleaned
}

fn charts_for(
    cleaned: &Dataset,
    majors: &[MajorAdmissionItem],
    provinces: &Dataset,
) -> DashboardCharts {
    let provinces = rank_provinces(provinces, usize::MAX);

    DashboardCharts {
        admission_by_major: major_admission_chart(majors),
        demographics_by_province: province_pie_chart(&provinces),
        score_distribution: score_distribution_chart(&distribute_scores(cleaned)),
        thpt_subject_analysis: method_scores_chart(&analyze_per_method_scores(cleaned)),
    }
}

pub fn build_summary(view: &Dataset) -> SummaryStatistics {
    summarize(&cleaned_view(view))
}

pub fn build_charts(year: i32, data: &AdmissionData) -> ChartsResponse {
    let cleaned = cleaned_view(&data.view);
    ChartsResponse {
        year,
        charts: charts_for(&cleaned, &rank_majors(&data.majors), &data.provinces),
    }
}

pub fn build_dashboard(year: i32, data: &AdmissionData) -> DashboardResponse {
    let cleaned = cleaned_view(&data.view);
    let top_majors = rank_majors(&data.majors);
    DashboardResponse {
        year,
        summary: summarize(&cleaned),
        charts: charts_for(&cleaned, &top_majors, &data.provinces),
        top_majors,
        top_provinces: rank_provinces(&data.provinces, TOP_PROVINCES_LIMIT),
    }
}

pub fn data_quality(view: &Dataset) -> DataQualityReport {
    let (cleaned, report) = clean(view, &SCORE_COLUMNS);
    DataQualityReport {
        total_records: cleaned.row_count(),
        total_columns: cleaned.column_count(),
        columns_cleaned: report.len(),
        cleaning_details: report,
    }
}
