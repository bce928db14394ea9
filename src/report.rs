use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{DashboardResponse, DataQualityReport};

pub fn build_report(
    dashboard: &DashboardResponse,
    quality: &DataQualityReport,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();
    let summary = &dashboard.summary;

    let _ = writeln!(output, "# Admissions Analytics Report");
    let _ = writeln!(
        output,
        "Admission year {} (generated {})",
        dashboard.year,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if summary.total_students == 0 {
        let _ = writeln!(output, "No admitted students recorded for this year.");
    } else {
        let _ = writeln!(output, "- Students: {}", summary.total_students);
        let _ = writeln!(output, "- Majors: {}", summary.total_majors);
        let _ = writeln!(output, "- Top province: {}", summary.top_province);
        let _ = writeln!(
            output,
            "- Average THPT total {:.2}, HSA {:.2}, TSA {:.2}",
            summary.avg_thpt_total, summary.avg_hsa_total, summary.avg_tsa_total
        );
        let _ = writeln!(
            output,
            "- HSA admission rate {:.2}%",
            summary.hsa_admission_rate
        );
        let _ = writeln!(
            output,
            "- IELTS holders {:.2}% (average band {:.1})",
            summary.ielts_rate, summary.avg_ielts
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Quota Fulfillment");

    if dashboard.top_majors.is_empty() {
        let _ = writeln!(output, "No majors recorded.");
    } else {
        for major in dashboard.top_majors.iter() {
            let _ = writeln!(
                output,
                "- {}: {} of {} admitted ({:.2}%)",
                major.major_name, major.admitted, major.quota, major.fulfillment_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Provinces");

    if dashboard.top_provinces.is_empty() {
        let _ = writeln!(output, "No provinces recorded.");
    } else {
        for province in dashboard.top_provinces.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students",
                province.province, province.student_count
            );
        }
    }

    let distribution = &dashboard.charts.score_distribution;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Final Score Distribution");

    if distribution.is_empty() {
        let _ = writeln!(output, "No positive final scores recorded.");
    }
    for series in distribution.datasets.iter().take(1) {
        for (label, count) in distribution.labels.iter().zip(series.data.iter()) {
            let _ = writeln!(output, "- {label}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Data Quality");
    let _ = writeln!(
        output,
        "{} records across {} columns, {} score columns cleaned.",
        quality.total_records, quality.total_columns, quality.columns_cleaned
    );
    for (column, stats) in quality.cleaning_details.iter() {
        let _ = writeln!(
            output,
            "- {}: {} missing, {} zero, filled with {:.2} from {} valid values",
            column, stats.null_count, stats.zero_count, stats.mean_value, stats.valid_data_count
        );
    }

    output
}
