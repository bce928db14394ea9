use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::dataset::{Cell, Dataset};
use crate::models::{
    Histogram, HistogramBin, MajorAdmissionItem, MethodMean, ProvinceCountItem,
    SummaryStatistics,
};
use crate::stats::{mean, percentage, round2, round_half};

pub const METHOD_SCORE_PREFIX: &str = "method_score_";

pub const METHOD_SCORE_COLUMNS: [&str; 6] = [
    "method_score_thpt",
    "method_score_hsa",
    "method_score_tsa",
    "method_score_sat",
    "method_score_ielts_dgnl",
    "method_score_ielts_thpt",
];

const BIN_WIDTH: i64 = 5;
const MIN_UPPER_BOUND: i64 = 20;
const MAX_UPPER_BOUND: i64 = 2000;

pub fn summarize(dataset: &Dataset) -> SummaryStatistics {
    let total = dataset.row_count();
    if total == 0 {
        return SummaryStatistics::default();
    }

    let column_mean = |name: &str| {
        dataset
            .numeric_or_zero(name)
            .and_then(|values| mean(&values))
            .map(round2)
            .unwrap_or(0.0)
    };
    let positives = |name: &str| -> Vec<f64> {
        dataset
            .numeric_or_zero(name)
            .unwrap_or_default()
            .into_iter()
            .filter(|value| *value > 0.0)
            .collect()
    };

    let hsa_admitted = positives("method_score_hsa").len();
    let ielts_scores = positives("ielts");

    SummaryStatistics {
        total_students: total,
        avg_thpt_total: column_mean("thpt_total"),
        avg_hsa_total: column_mean("hsa"),
        avg_tsa_total: column_mean("tsa"),
        top_province: modal_value(dataset, "province").unwrap_or_else(|| "N/A".to_string()),
        total_majors: distinct_count(dataset, "major_name"),
        hsa_admission_rate: percentage(hsa_admitted, total),
        ielts_rate: percentage(ielts_scores.len(), total),
        avg_ielts: mean(&ielts_scores).map(round_half).unwrap_or(0.0),
    }
}

/// Most frequent non-missing value; ties go to the lexicographically
/// smallest value.
fn modal_value(dataset: &Dataset, name: &str) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in dataset.column(name)?.iter().filter_map(Cell::as_text) {
        *counts.entry(value).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_value, a_count), (b_value, b_count)| {
            a_count.cmp(b_count).then_with(|| b_value.cmp(a_value))
        })
        .map(|(value, _)| value)
}

fn distinct_count(dataset: &Dataset, name: &str) -> usize {
    dataset
        .column(name)
        .map(|cells| {
            cells
                .iter()
                .filter_map(Cell::as_text)
                .collect::<HashSet<_>>()
                .len()
        })
        .unwrap_or(0)
}

/// Counts final admission scores in 5-point bins starting at 0.
///
/// The first bin is `[0, 5]`, the rest are `(a, a + 5]`, up to at least 20
/// and at most 2000. Every bin in range is present even when empty; scores
/// beyond the last bin are not counted.
pub fn distribute_scores(dataset: &Dataset) -> Histogram {
    let Some(scores) = dataset.numeric_or_zero("final_score") else {
        return Vec::new();
    };
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if scores.is_empty() || max <= 0.0 {
        return Vec::new();
    }

    let max_score = max.floor().min(MAX_UPPER_BOUND as f64) as i64;
    let upper_bound =
        ((max_score / BIN_WIDTH + 1) * BIN_WIDTH).clamp(MIN_UPPER_BOUND, MAX_UPPER_BOUND);
    let mut bins: Histogram = (0..upper_bound)
        .step_by(BIN_WIDTH as usize)
        .map(|lower| HistogramBin {
            lower,
            upper: lower + BIN_WIDTH,
            count: 0,
        })
        .collect();

    for score in scores {
        if score < 0.0 || score > upper_bound as f64 {
            continue;
        }
        let index = if score <= BIN_WIDTH as f64 {
            0
        } else {
            (score / BIN_WIDTH as f64).ceil() as usize - 1
        };
        if let Some(bin) = bins.get_mut(index) {
            bin.count += 1;
        }
    }

    bins
}

/// Mean of the positive per-method admission scores, for every method with
/// a positive mean.
pub fn analyze_per_method_scores(dataset: &Dataset) -> Vec<MethodMean> {
    METHOD_SCORE_COLUMNS
        .iter()
        .filter(|name| dataset.has_column(name))
        .filter_map(|&name| {
            let positives: Vec<f64> = dataset
                .numeric_or_zero(name)?
                .into_iter()
                .filter(|value| *value > 0.0)
                .collect();
            let avg = mean(&positives).filter(|value| *value > 0.0)?;
            Some(MethodMean {
                method: method_label(name),
                mean: round2(avg),
            })
        })
        .collect()
}

fn method_label(column: &str) -> String {
    column
        .strip_prefix(METHOD_SCORE_PREFIX)
        .unwrap_or(column)
        .to_uppercase()
}

/// Null and empty text read as 0. Floats truncate, text must be a whole
/// number.
fn count_cell(cell: Option<&Cell>) -> Option<i64> {
    match cell {
        None | Some(Cell::Null) => Some(0),
        Some(Cell::Int(value)) => Some(*value),
        Some(Cell::Float(value)) if value.is_finite() => Some(value.trunc() as i64),
        Some(Cell::Float(_)) => None,
        Some(Cell::Text(text)) if text.is_empty() => Some(0),
        Some(Cell::Text(text)) => text.trim().parse::<i64>().ok(),
    }
}

fn label_cell(cell: Option<&Cell>) -> String {
    cell.and_then(Cell::as_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Quota fulfillment per major. Rows with non-numeric quota or admitted
/// values are skipped.
pub fn rank_majors(grouped: &Dataset) -> Vec<MajorAdmissionItem> {
    (0..grouped.row_count())
        .filter_map(|row| {
            let major_name = label_cell(grouped.cell(row, "major_name"));
            let (Some(quota), Some(admitted)) = (
                count_cell(grouped.cell(row, "quota")),
                count_cell(grouped.cell(row, "admitted")),
            ) else {
                debug!(row, major = %major_name, "skipping major row with unparsable counts");
                return None;
            };
            let fulfillment_rate = if quota > 0 {
                round2(admitted as f64 / quota as f64 * 100.0)
            } else {
                0.0
            };
            Some(MajorAdmissionItem {
                major_name,
                quota,
                admitted,
                fulfillment_rate,
            })
        })
        .collect()
}

/// First `limit` provinces in the order given. Rows with a non-numeric
/// count are skipped.
pub fn rank_provinces(grouped: &Dataset, limit: usize) -> Vec<ProvinceCountItem> {
    (0..grouped.row_count().min(limit))
        .filter_map(|row| {
            let province = label_cell(grouped.cell(row, "province"));
            let Some(student_count) = count_cell(grouped.cell(row, "student_count")) else {
                debug!(row, province = %province, "skipping province row with unparsable count");
                return None;
            };
            Some(ProvinceCountItem {
                province,
                student_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::{clean, SCORE_COLUMNS};

    fn view() -> Dataset {
        Dataset::from_rows(
            &[
                "student_id",
                "major_name",
                "province",
                "thpt_total",
                "hsa",
                "tsa",
                "ielts",
                "final_score",
                "method_score_hsa",
                "method_score_thpt",
            ],
            vec![
                vec![
                    Cell::from("001"),
                    Cell::from("Computer Science"),
                    Cell::from("Ha Noi"),
                    Cell::Float(24.5),
                    Cell::Int(90),
                    Cell::Null,
                    Cell::Float(6.1),
                    Cell::Float(23.0),
                    Cell::Float(25.0),
                    Cell::Null,
                ],
                vec![
                    Cell::from("002"),
                    Cell::from("Economics"),
                    Cell::from("Nam Dinh"),
                    Cell::Float(27.5),
                    Cell::Int(0),
                    Cell::Int(60),
                    Cell::Float(6.4),
                    Cell::Float(4.0),
                    Cell::Null,
                    Cell::Float(26.0),
                ],
                vec![
                    Cell::from("003"),
                    Cell::from("Economics"),
                    Cell::from("Ha Noi"),
                    Cell::Null,
                    Cell::Int(110),
                    Cell::Int(70),
                    Cell::Null,
                    Cell::Float(12.5),
                    Cell::Int(0),
                    Cell::Float(28.0),
                ],
            ],
        )
    }

    #[test]
    fn summary_of_empty_dataset_is_zeroed() {
        let summary = summarize(&Dataset::default());

        assert_eq!(
            summary,
            SummaryStatistics {
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
        );
    }

    #[test]
    fn summary_uses_cleaned_columns() {
        let (cleaned, _) = clean(&view(), &SCORE_COLUMNS);

        let summary = summarize(&cleaned);

        assert_eq!(summary.total_students, 3);
        // thpt: [24.5, 27.5, 26.0]
        assert_eq!(summary.avg_thpt_total, 26.0);
        // hsa: [90, 100, 110]
        assert_eq!(summary.avg_hsa_total, 100.0);
        assert_eq!(summary.avg_tsa_total, 65.0);
        assert_eq!(summary.top_province, "Ha Noi");
        assert_eq!(summary.total_majors, 2);
        // method_score_hsa is mean-filled, so every row counts as admitted.
        assert_eq!(summary.hsa_admission_rate, 100.0);
        assert_eq!(summary.ielts_rate, 100.0);
    }

    #[test]
    fn certificate_mean_rounds_to_nearest_half() {
        let dataset = Dataset::from_rows(
            &["ielts"],
            vec![
                vec![Cell::Float(6.1)],
                vec![Cell::Float(6.4)],
                vec![Cell::Int(0)],
            ],
        );

        let summary = summarize(&dataset);

        assert_eq!(summary.avg_ielts, 6.5);
        assert_eq!(summary.ielts_rate, 66.67);
    }

    #[test]
    fn absent_columns_default_to_zero() {
        let dataset = Dataset::from_rows(&["student_id"], vec![vec![Cell::from("001")]]);

        let summary = summarize(&dataset);

        assert_eq!(summary.total_students, 1);
        assert_eq!(summary.top_province, "N/A");
        assert_eq!(summary.total_majors, 0);
        assert_eq!(summary.hsa_admission_rate, 0.0);
        assert_eq!(summary.avg_ielts, 0.0);
    }

    #[test]
    fn modal_province_ties_go_to_smallest_name() {
        let dataset = Dataset::from_rows(
            &["province"],
            vec![
                vec![Cell::from("Nam Dinh")],
                vec![Cell::from("Ha Noi")],
                vec![Cell::Null],
            ],
        );

        assert_eq!(summarize(&dataset).top_province, "Ha Noi");
    }

    #[test]
    fn histogram_covers_every_bin_up_to_bound() {
        let histogram = distribute_scores(&view());

        let labels: Vec<String> = histogram.iter().map(HistogramBin::label).collect();
        assert_eq!(
            labels,
            vec!["[0, 5]", "(5, 10]", "(10, 15]", "(15, 20]", "(20, 25]"]
        );
        let counts: Vec<usize> = histogram.iter().map(|bin| bin.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn histogram_bin_edges_are_right_closed() {
        let dataset = Dataset::from_rows(
            &["final_score"],
            vec![
                vec![Cell::Int(0)],
                vec![Cell::Int(5)],
                vec![Cell::Float(5.5)],
                vec![Cell::Int(10)],
            ],
        );

        let counts: Vec<usize> = distribute_scores(&dataset)
            .iter()
            .map(|bin| bin.count)
            .collect();

        assert_eq!(counts, vec![2, 2, 0, 0]);
    }

    #[test]
    fn histogram_is_empty_without_positive_scores() {
        let zeros = Dataset::from_rows(&["final_score"], vec![vec![Cell::Int(0)]]);
        assert!(distribute_scores(&zeros).is_empty());
        assert!(distribute_scores(&Dataset::default()).is_empty());
        assert!(distribute_scores(&Dataset::new(&["final_score"])).is_empty());
    }

    #[test]
    fn histogram_bound_is_capped_for_huge_scores() {
        let dataset = Dataset::from_rows(
            &["final_score"],
            vec![vec![Cell::Float(1e19)], vec![Cell::Float(23.0)]],
        );

        let histogram = distribute_scores(&dataset);

        assert_eq!(histogram.len(), 400);
        assert_eq!(histogram.last().map(|bin| bin.upper), Some(2000));
        assert_eq!(histogram.iter().map(|bin| bin.count).sum::<usize>(), 1);
        assert_eq!(histogram[4].count, 1);
    }

    #[test]
    fn per_method_means_skip_non_positive_values() {
        let methods = analyze_per_method_scores(&view());

        assert_eq!(
            methods,
            vec![
                MethodMean {
                    method: "THPT".to_string(),
                    mean: 27.0,
                },
                MethodMean {
                    method: "HSA".to_string(),
                    mean: 25.0,
                },
            ]
        );
    }

    #[test]
    fn unparsable_major_rows_are_skipped() {
        let grouped = Dataset::from_rows(
            &["major_name", "quota", "admitted"],
            vec![
                vec![Cell::from("A"), Cell::Int(10), Cell::Int(5)],
                vec![Cell::from("B"), Cell::from("bad"), Cell::Int(3)],
                vec![Cell::from("C"), Cell::Int(0), Cell::Int(4)],
            ],
        );

        let items = rank_majors(&grouped);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].major_name, "A");
        assert_eq!(items[0].fulfillment_rate, 50.0);
        assert_eq!(items[1].major_name, "C");
        assert_eq!(items[1].fulfillment_rate, 0.0);
    }

    #[test]
    fn major_counts_accept_empty_text_but_not_fractions() {
        let grouped = Dataset::from_rows(
            &["major_name", "quota", "admitted"],
            vec![
                vec![Cell::from("A"), Cell::from("10.7"), Cell::from("")],
                vec![Cell::from("B"), Cell::from(" 20 "), Cell::from("")],
                vec![Cell::from("C"), Cell::Float(10.7), Cell::Int(5)],
            ],
        );

        let items = rank_majors(&grouped);

        assert_eq!(
            items,
            vec![
                MajorAdmissionItem {
                    major_name: "B".to_string(),
                    quota: 20,
                    admitted: 0,
                    fulfillment_rate: 0.0,
                },
                MajorAdmissionItem {
                    major_name: "C".to_string(),
                    quota: 10,
                    admitted: 5,
                    fulfillment_rate: 50.0,
                },
            ]
        );
    }

    #[test]
    fn provinces_keep_caller_order_and_limit() {
        let grouped = Dataset::from_rows(
            &["province", "student_count"],
            vec![
                vec![Cell::from("Ha Noi"), Cell::Int(3)],
                vec![Cell::from("Hue"), Cell::from("x")],
                vec![Cell::Null, Cell::Int(9)],
                vec![Cell::from("Da Nang"), Cell::Int(1)],
            ],
        );

        let items = rank_provinces(&grouped, 3);

        assert_eq!(
            items,
            vec![
                ProvinceCountItem {
                    province: "Ha Noi".to_string(),
                    student_count: 3,
                },
                ProvinceCountItem {
                    province: "N/A".to_string(),
                    student_count: 9,
                },
            ]
        );
    }
}
