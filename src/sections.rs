//! Dashboard sections
//!
//! The current page is an explicit `Section` value; rendering a section is a
//! pure function of that value and an analysis report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::AnalysisError;
use crate::types::{AnalysisReport, ClassUsageProfile, RegressionOutcome};

/// One page of the dashboard narrative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Overview,
    Distributions,
    BehaviorByClass,
    Regression,
    Engagement,
    Demographics,
    Summary,
}

impl Section {
    /// Sections in reading order
    pub const ALL: [Section; 7] = [
        Section::Overview,
        Section::Distributions,
        Section::BehaviorByClass,
        Section::Regression,
        Section::Engagement,
        Section::Demographics,
        Section::Summary,
    ];

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<Section> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(&self) -> Option<Section> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Overview => "overview",
            Section::Distributions => "distributions",
            Section::BehaviorByClass => "behavior_by_class",
            Section::Regression => "regression",
            Section::Engagement => "engagement",
            Section::Demographics => "demographics",
            Section::Summary => "summary",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Behavioral Indicators of Phone Addiction",
            Section::Distributions => "Distinct Behavioral Clusters",
            Section::BehaviorByClass => "Behavior by User Class",
            Section::Regression => "Regression: Installed Apps vs. Screen Time",
            Section::Engagement => "Engagement Ratio: App Time / Screen Time",
            Section::Demographics => "Demographics",
            Section::Summary => "Summary",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| AnalysisError::UnknownSection(s.to_string()))
    }
}

/// Rendered content of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionView {
    pub section: Section,
    pub title: String,
    pub markdown: String,
    pub next: Option<Section>,
    pub previous: Option<Section>,
}

/// Render a section's narrative from report values
pub fn render_section(section: Section, report: &AnalysisReport) -> SectionView {
    let markdown = match section {
        Section::Overview => render_overview(report),
        Section::Distributions => render_distributions(report),
        Section::BehaviorByClass => render_behavior_by_class(report),
        Section::Regression => render_regression(report),
        Section::Engagement => render_engagement(report),
        Section::Demographics => render_demographics(report),
        Section::Summary => render_summary(report),
    };

    SectionView {
        section,
        title: section.title().to_string(),
        markdown,
        next: section.next(),
        previous: section.previous(),
    }
}

fn render_overview(report: &AnalysisReport) -> String {
    let provenance = &report.provenance;
    let mut md = String::from(
        "This analysis examines mobile user behavior to uncover patterns of possible phone addiction. \
         It relates app usage, screen time, and demographics to behavioral intensity.\n\n",
    );
    let _ = writeln!(md, "- Observations loaded: **{}**", provenance.observations);
    if provenance.undefined_ratios > 0 {
        let _ = writeln!(
            md,
            "- Records with zero screen-on time (engagement undefined): **{}**",
            provenance.undefined_ratios
        );
    }
    md
}

fn render_distributions(report: &AnalysisReport) -> String {
    let mut md = String::new();
    for distribution in &report.distributions {
        match &distribution.summary {
            Some(s) => {
                let _ = writeln!(
                    md,
                    "- {}: median **{:.1}**, range {:.1} to {:.1} across {} users.",
                    distribution.column, s.median, s.min, s.max, s.count
                );
            }
            None => {
                let _ = writeln!(md, "- {}: no data.", distribution.column);
            }
        }
        if distribution.histogram_unavailable.is_some() {
            let _ = writeln!(
                md,
                "  - Histogram omitted: values span too wide a range to bin."
            );
        }
    }

    if let Some(screen) = report.distributions.get(1).and_then(|d| d.summary.as_ref()) {
        let _ = writeln!(
            md,
            "- Some users keep the screen on up to **{:.1} hours** daily.",
            screen.max
        );
    }
    md
}

fn is_increasing(profile: &[ClassUsageProfile]) -> bool {
    profile
        .windows(2)
        .all(|pair| pair[1].app_usage.mean >= pair[0].app_usage.mean)
}

fn render_behavior_by_class(report: &AnalysisReport) -> String {
    let profile = &report.usage_by_class;
    let (Some(first), Some(last)) = (profile.first(), profile.last()) else {
        return "No behavior classes present.\n".to_string();
    };

    let trend = if is_increasing(profile) {
        "time spent increases consistently"
    } else {
        "time spent does not increase consistently"
    };

    let mut md = String::new();
    let _ = writeln!(
        md,
        "- From **Class {} to {}**, {}.",
        first.behavior_class, last.behavior_class, trend
    );
    let _ = writeln!(
        md,
        "- Class {}: **~{:.0} minutes of app use**, nearly **{:.1} hours** of screen-on time.",
        last.behavior_class,
        last.app_usage.mean,
        last.screen_on.mean / 60.0
    );
    md
}

fn fit_strength(r_squared: f64) -> &'static str {
    if r_squared >= 0.7 {
        "strong"
    } else if r_squared >= 0.4 {
        "moderate"
    } else {
        "weak"
    }
}

fn render_regression(report: &AnalysisReport) -> String {
    match &report.regression {
        RegressionOutcome::Fitted(fit) => format!(
            "Each additional app = approx **{:.2} min/day** extra screen time.\n\
             **R² = {:.3}**: {} predictive power.\n",
            fit.slope,
            fit.r_squared,
            fit_strength(fit.r_squared)
        ),
        RegressionOutcome::Unavailable { reason } => {
            format!("Regression unavailable: {}.\n", reason)
        }
    }
}

fn render_engagement(report: &AnalysisReport) -> String {
    let engagement = &report.engagement_by_class;
    let (Some((low_class, low)), Some((high_class, high))) =
        (engagement.iter().next(), engagement.iter().next_back())
    else {
        return "No engagement ratios could be computed.\n".to_string();
    };

    let mut md = String::new();
    let _ = writeln!(
        md,
        "- Class {} users spend **{:.0}% of their screen time in apps**.",
        high_class,
        high.mean * 100.0
    );
    if low_class != high_class {
        let spread = |sd: Option<f64>| sd.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v));
        let _ = writeln!(
            md,
            "- Class {} averages {:.0}% (sd {}) versus class {} (sd {}).",
            low_class,
            low.mean * 100.0,
            spread(low.std_dev),
            high_class,
            spread(high.std_dev)
        );
    }
    md
}

fn significance_word(significant: bool) -> &'static str {
    if significant {
        "significant"
    } else {
        "not significant"
    }
}

fn render_demographics(report: &AnalysisReport) -> String {
    let findings = &report.demographics;
    let mut md = String::new();

    match &findings.usage_by_gender {
        Some(cmp) => {
            let _ = writeln!(
                md,
                "- App usage, {} vs. {}: t = {:.2}, p = {:.3} ({}).",
                cmp.group_a,
                cmp.group_b,
                cmp.test.t_statistic,
                cmp.test.p_value,
                significance_word(cmp.significant)
            );
        }
        None => md.push_str("- App usage by gender: not enough data.\n"),
    }

    match &findings.gender_by_class {
        Some(assoc) => {
            let _ = writeln!(
                md,
                "- Gender vs. behavior class: χ² = {:.2}, p = {:.3} ({}).",
                assoc.test.chi_square,
                assoc.test.p_value,
                significance_word(assoc.significant)
            );
        }
        None => md.push_str("- Gender vs. behavior class: not enough data.\n"),
    }
    md
}

fn demographics_matter(report: &AnalysisReport) -> bool {
    let findings = &report.demographics;
    findings.usage_by_gender.as_ref().is_some_and(|c| c.significant)
        || findings.gender_by_class.as_ref().is_some_and(|a| a.significant)
}

fn render_summary(report: &AnalysisReport) -> String {
    let mut md = String::from(
        "**Red flags for phone addiction risk:**\n\
         - Surging app usage and screen time\n\
         - Many installed apps\n\
         - High engagement ratio (active time)\n\n",
    );
    if demographics_matter(report) {
        md.push_str("**Demographics?** Significant differences detected; see the demographics section.\n");
    } else {
        md.push_str("**Demographics?** Not significant. Behavioral intensity matters more.\n");
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::encoder::ReportEncoder;
    use crate::features::derive_metrics;
    use crate::types::{BehaviorClass, Demographics, Observation};

    fn make_report(apps: &[u32]) -> AnalysisReport {
        let observations: Vec<Observation> = apps
            .iter()
            .enumerate()
            .map(|(i, &a)| Observation {
                app_usage_time_min_per_day: 50.0 + 6.5 * a as f64 * 0.8,
                screen_on_time_hours_per_day: (50.0 + 6.5 * a as f64) / 60.0,
                number_of_apps_installed: a,
                user_behavior_class: BehaviorClass::new((i % 5) as u8 + 1).unwrap(),
                demographics: Demographics::default(),
            })
            .collect();
        let records = derive_metrics(&observations).unwrap();
        ReportEncoder::new()
            .encode(&records, &AnalysisConfig::default())
            .unwrap()
    }

    #[test]
    fn test_navigation_order() {
        assert_eq!(Section::default(), Section::Overview);
        assert_eq!(Section::Overview.previous(), None);
        assert_eq!(Section::Overview.next(), Some(Section::Distributions));
        assert_eq!(Section::Summary.next(), None);

        let mut visited = vec![Section::Overview];
        while let Some(next) = visited.last().and_then(Section::next) {
            visited.push(next);
        }
        assert_eq!(visited, Section::ALL.to_vec());
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("behavior-by-class".parse::<Section>().unwrap(), Section::BehaviorByClass);
        assert_eq!("Summary".parse::<Section>().unwrap(), Section::Summary);
        assert!(matches!(
            "charts".parse::<Section>(),
            Err(AnalysisError::UnknownSection(_))
        ));
    }

    #[test]
    fn test_render_regression_section() {
        let report = make_report(&[10, 20, 30, 40, 50]);
        let view = render_section(Section::Regression, &report);

        assert_eq!(view.title, Section::Regression.title());
        assert!(view.markdown.contains("**6.50 min/day**"));
        assert!(view.markdown.contains("R² = 1.000"));
        assert!(view.markdown.contains("strong"));
        assert_eq!(view.next, Some(Section::Engagement));
    }

    #[test]
    fn test_render_degenerate_regression() {
        let report = make_report(&[30, 30, 30]);
        let view = render_section(Section::Regression, &report);
        assert!(view.markdown.starts_with("Regression unavailable"));
    }

    #[test]
    fn test_render_behavior_by_class() {
        let report = make_report(&[10, 20, 30, 40, 50]);
        let view = render_section(Section::BehaviorByClass, &report);
        assert!(view.markdown.contains("From **Class 1 to 5**"));
        assert!(view.markdown.contains("increases consistently"));
    }

    #[test]
    fn test_every_section_renders() {
        let report = make_report(&[12, 18, 33, 41, 57, 64]);
        for section in Section::ALL {
            let view = render_section(section, &report);
            assert!(!view.markdown.is_empty(), "{} rendered empty", section);
        }
        let summary = render_section(Section::Summary, &report);
        assert!(summary.markdown.contains("Not significant"));
    }
}
