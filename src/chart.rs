use serde::Serialize;

use crate::models::{HistogramBin, MajorAdmissionItem, MethodMean, ProvinceCountItem};

const QUOTA_COLOR: &str = "#D1D5DB";
const ADMITTED_COLOR: &str = "#3B82F6";
const HISTOGRAM_COLOR: &str = "#22C55E";
const METHOD_COLOR: &str = "#3B82F6";
const PIE_PALETTE: [&str; 6] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#E7E9ED",
];
const PIE_TOP_N: usize = 5;
const OTHER_LABEL: &str = "Other";

/// Either one color for the whole series or one per label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorHint {
    Single(String),
    PerLabel(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: ColorHint,
}

impl ChartSeries {
    fn new(label: &str, data: Vec<f64>, color: &str) -> Self {
        Self {
            label: label.to_string(),
            data,
            background_color: ColorHint::Single(color.to_string()),
        }
    }
}

/// Library-agnostic chart view-model: labels shared by every series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

impl ChartPayload {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.datasets.is_empty()
    }
}

/// Grouped bar of quota against admitted students per major.
pub fn major_admission_chart(items: &[MajorAdmissionItem]) -> ChartPayload {
    if items.is_empty() {
        return ChartPayload::default();
    }

    ChartPayload {
        labels: items.iter().map(|item| item.major_name.clone()).collect(),
        datasets: vec![
            ChartSeries::new(
                "Quota",
                items.iter().map(|item| item.quota as f64).collect(),
                QUOTA_COLOR,
            ),
            ChartSeries::new(
                "Admitted",
                items.iter().map(|item| item.admitted as f64).collect(),
                ADMITTED_COLOR,
            ),
        ],
    }
}

/// Pie of the top provinces, with everything past the fifth folded into
/// "Other". Rows are expected sorted by count, descending.
pub fn province_pie_chart(items: &[ProvinceCountItem]) -> ChartPayload {
    if items.is_empty() {
        return ChartPayload::default();
    }

    let mut labels: Vec<String> = Vec::new();
    let mut data: Vec<f64> = Vec::new();
    for item in items.iter().take(PIE_TOP_N) {
        labels.push(item.province.clone());
        data.push(item.student_count as f64);
    }
    if items.len() > PIE_TOP_N {
        let rest: i64 = items[PIE_TOP_N..]
            .iter()
            .map(|item| item.student_count)
            .sum();
        labels.push(OTHER_LABEL.to_string());
        data.push(rest as f64);
    }

    let colors = PIE_PALETTE
        .iter()
        .cycle()
        .take(labels.len())
        .map(|color| color.to_string())
        .collect();

    ChartPayload {
        labels,
        datasets: vec![ChartSeries {
            label: "Students".to_string(),
            data,
            background_color: ColorHint::PerLabel(colors),
        }],
    }
}

pub fn score_distribution_chart(histogram: &[HistogramBin]) -> ChartPayload {
    if histogram.is_empty() {
        return ChartPayload::default();
    }

    ChartPayload {
        labels: histogram.iter().map(HistogramBin::label).collect(),
        datasets: vec![ChartSeries::new(
            "Students",
            histogram.iter().map(|bin| bin.count as f64).collect(),
            HISTOGRAM_COLOR,
        )],
    }
}

pub fn method_scores_chart(methods: &[MethodMean]) -> ChartPayload {
    if methods.is_empty() {
        return ChartPayload::default();
    }

    ChartPayload {
        labels: methods.iter().map(|method| method.method.clone()).collect(),
        datasets: vec![ChartSeries::new(
            "Average admission score",
            methods.iter().map(|method| method.mean).collect(),
            METHOD_COLOR,
        )],
    }
}
