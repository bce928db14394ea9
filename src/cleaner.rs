use tracing::debug;

use crate::dataset::{Cell, Dataset};
use crate::models::{CleaningReport, ColumnCleaning};
use crate::stats::{mean, round2};

/// Every score column the admissions view can carry.
pub const SCORE_COLUMNS: [&str; 12] = [
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

/// Replaces missing and zero scores with the mean of the column's positive
/// values.
///
/// Only the listed columns are touched, and only when present. A column with
/// no positive values keeps its zeros and has missing cells set to 0. The
/// input is left as is; the cleaned copy and the report are returned
/// together.
pub fn clean(dataset: &Dataset, score_columns: &[&str]) -> (Dataset, CleaningReport) {
    let mut cleaned = dataset.clone();
    let mut report = CleaningReport::default();

    if cleaned.is_empty() {
        return (cleaned, report);
    }

    for &name in score_columns {
        let Some(cells) = cleaned.column_mut(name) else {
            continue;
        };

        let values: Vec<Option<f64>> = cells.iter().map(Cell::as_number).collect();
        let null_count = values.iter().filter(|value| value.is_none()).count();
        let zero_count = values.iter().filter(|value| **value == Some(0.0)).count();
        let valid: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|value| *value > 0.0)
            .collect();
        let column_mean = mean(&valid).filter(|value| *value > 0.0);
        let fill = column_mean.unwrap_or(0.0);

        *cells = values
            .into_iter()
            .map(|value| match value {
                None => Cell::Float(fill),
                Some(v) if v == 0.0 => Cell::Float(fill),
                Some(v) => Cell::Float(v),
            })
            .collect();

        if null_count > 0 || zero_count > 0 {
            debug!(
                column = name,
                null_count,
                zero_count,
                fill,
                "replaced missing score values"
            );
            report.record(
                name,
                ColumnCleaning {
                    null_count,
                    zero_count,
                    total_replaced: null_count + zero_count,
                    mean_value: column_mean.map(round2).unwrap_or(0.0),
                    valid_data_count: valid.len(),
                },
            );
        }
    }

    (cleaned, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_column(cells: Vec<Cell>) -> Dataset {
        Dataset::from_rows(&["hsa"], cells.into_iter().map(|cell| vec![cell]).collect())
    }

    fn numbers(dataset: &Dataset, name: &str) -> Vec<f64> {
        dataset
            .column(name)
            .expect("column present")
            .iter()
            .map(|cell| cell.as_number().expect("numeric cell"))
            .collect()
    }

    #[test]
    fn replaces_missing_and_zero_with_mean_of_positives() {
        let dataset = single_column(vec![
            Cell::Int(0),
            Cell::Float(f64::NAN),
            Cell::Int(10),
            Cell::Int(20),
        ]);

        let (cleaned, report) = clean(&dataset, &["hsa"]);

        assert_eq!(numbers(&cleaned, "hsa"), vec![15.0, 15.0, 10.0, 20.0]);
        let stats = report.get("hsa").expect("hsa reported");
        assert_eq!(stats.null_count, 1);
        assert_eq!(stats.zero_count, 1);
        assert_eq!(stats.total_replaced, 2);
        assert_eq!(stats.mean_value, 15.0);
        assert_eq!(stats.valid_data_count, 2);
    }

    #[test]
    fn unparsable_text_counts_as_missing() {
        let dataset = single_column(vec![Cell::from("n/a"), Cell::from("8"), Cell::Null]);

        let (cleaned, report) = clean(&dataset, &["hsa"]);

        assert_eq!(numbers(&cleaned, "hsa"), vec![8.0, 8.0, 8.0]);
        assert_eq!(report.get("hsa").map(|s| s.null_count), Some(2));
    }

    #[test]
    fn column_without_positive_values_becomes_zero() {
        let dataset = single_column(vec![Cell::Null, Cell::Int(0), Cell::from("bad")]);

        let (cleaned, report) = clean(&dataset, &["hsa"]);

        assert_eq!(numbers(&cleaned, "hsa"), vec![0.0, 0.0, 0.0]);
        let stats = report.get("hsa").expect("hsa reported");
        assert_eq!(stats.total_replaced, 3);
        assert_eq!(stats.mean_value, 0.0);
        assert_eq!(stats.valid_data_count, 0);
    }

    #[test]
    fn cleaning_twice_is_a_no_op() {
        let dataset = single_column(vec![Cell::Null, Cell::Int(4), Cell::Int(0)]);

        let (once, _) = clean(&dataset, &["hsa"]);
        let (twice, report) = clean(&once, &["hsa"]);

        assert_eq!(once, twice);
        assert!(report.is_empty());
    }

    #[test]
    fn unlisted_and_absent_columns_are_untouched() {
        let dataset = Dataset::from_rows(
            &["province", "hsa"],
            vec![
                vec![Cell::from("Ha Noi"), Cell::Null],
                vec![Cell::Null, Cell::Int(90)],
            ],
        );

        let (cleaned, report) = clean(&dataset, &["hsa", "tsa"]);

        assert_eq!(cleaned.column("province"), dataset.column("province"));
        assert!(!cleaned.has_column("tsa"));
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn empty_dataset_is_a_no_op() {
        let dataset = Dataset::new(&SCORE_COLUMNS);

        let (cleaned, report) = clean(&dataset, &SCORE_COLUMNS);

        assert!(cleaned.is_empty());
        assert!(report.is_empty());
    }

    #[test]
    fn mean_in_report_is_rounded() {
        let dataset = single_column(vec![Cell::Int(1), Cell::Int(2), Cell::Int(2), Cell::Null]);

        let (_, report) = clean(&dataset, &["hsa"]);

        assert_eq!(report.get("hsa").map(|s| s.mean_value), Some(1.67));
    }
}
