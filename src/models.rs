use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::chart::ChartPayload;

/// Per-column record of what the cleaner substituted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCleaning {
    pub null_count: usize,
    pub zero_count: usize,
    pub total_replaced: usize,
    pub mean_value: f64,
    pub valid_data_count: usize,
}

/// Cleaning entries keyed by column name, in the order the columns were
/// cleaned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    entries: Vec<(String, ColumnCleaning)>,
}

impl CleaningReport {
    pub fn record(&mut self, column: &str, stats: ColumnCleaning) {
        self.entries.push((column.to_string(), stats));
    }

    #[cfg(test)]
    pub fn get(&self, column: &str) -> Option<&ColumnCleaning> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, stats)| stats)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnCleaning)> {
        self.entries.iter().map(|(name, stats)| (name.as_str(), stats))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_students: usize,
    pub avg_thpt_total: f64,
    pub avg_hsa_total: f64,
    pub avg_tsa_total: f64,
    pub top_province: String,
    pub total_majors: usize,
    pub hsa_admission_rate: f64,
    pub ielts_rate: f64,
    pub avg_ielts: f64,
}

impl Default for SummaryStatistics {
    fn default() -> Self {
        Self {
            total_students: 0,
            avg_thpt_total: 0.0,
            avg_hsa_total: 0.0,
            avg_tsa_total: 0.0,
            top_province: "N/A".to_string(),
            total_majors: 0,
            hsa_admission_rate: 0.0,
            ielts_rate: 0.0,
            avg_ielts: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

impl HistogramBin {
    /// Interval notation; the first bin is closed on both ends.
    pub fn label(&self) -> String {
        if self.lower == 0 {
            format!("[{}, {}]", self.lower, self.upper)
        } else {
            format!("({}, {}]", self.lower, self.upper)
        }
    }
}

impl Serialize for CleaningReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, stats) in &self.entries {
            map.serialize_entry(column, stats)?;
        }
        map.end()
    }
}

pub type Histogram = Vec<HistogramBin>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodMean {
    pub method: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MajorAdmissionItem {
    pub major_name: String,
    pub quota: i64,
    pub admitted: i64,
    pub fulfillment_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceCountItem {
    pub province: String,
    pub student_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardCharts {
    pub admission_by_major: ChartPayload,
    pub demographics_by_province: ChartPayload,
    pub score_distribution: ChartPayload,
    pub thpt_subject_analysis: ChartPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartsResponse {
    pub year: i32,
    #[serde(flatten)]
    pub charts: DashboardCharts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponse {
    pub year: i32,
    pub summary: SummaryStatistics,
    pub charts: DashboardCharts,
    pub top_majors: Vec<MajorAdmissionItem>,
    pub top_provinces: Vec<ProvinceCountItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub total_records: usize,
    pub total_columns: usize,
    pub columns_cleaned: usize,
    pub cleaning_details: CleaningReport,
}
