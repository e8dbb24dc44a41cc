use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::ContentRecord;

/// The persisted filter state. Every field defaults so that stale or
/// partial persisted copies deserialize without error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub page: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub skill_level: String,
    pub frameworks: Vec<String>,
    pub services: Vec<String>,
    pub search_query: String,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            page: "build".to_owned(),
            kind: "all".to_owned(),
            time: "all".to_owned(),
            skill_level: String::new(),
            frameworks: Vec::new(),
            services: Vec::new(),
            search_query: String::new(),
        }
    }
}

impl FilterState {
    /// Resets every filter but keeps the page.
    pub fn clear(&mut self) {
        let page = std::mem::take(&mut self.page);
        *self = FilterState {
            page,
            ..FilterState::default()
        };
    }

    /// Self-heals a stale tab selection, e.g. after moving between pages
    /// with different type vocabularies. Returns whether a reset happened
    /// so the caller can persist the corrected state.
    pub fn validate_type(&mut self, valid: &[&str]) -> bool {
        if valid.contains(&self.kind.as_str()) {
            return false;
        }
        debug!("resetting invalid type filter: {}", self.kind);
        self.kind = "all".to_owned();
        true
    }
}

/// Applies the predicate chain: type, time window, skill level, framework
/// and service intersections, then free-text search. Pure and
/// side-effect-free, so recomputing on every state change is safe.
#[must_use]
pub fn filter<'a>(
    records: impl IntoIterator<Item = &'a ContentRecord>,
    state: &FilterState,
    today: NaiveDate,
) -> Vec<&'a ContentRecord> {
    let cutoff = time_cutoff(&state.time, today);
    let query = state.search_query.to_lowercase();

    records
        .into_iter()
        .filter(|record| state.kind == "all" || record.kind == state.kind)
        .filter(|record| cutoff.map_or(true, |cutoff| record.sort_date() >= cutoff))
        .filter(|record| state.skill_level.is_empty() || record.skill_level == state.skill_level)
        .filter(|record| state.frameworks.is_empty() || intersects(&record.frameworks, &state.frameworks))
        .filter(|record| state.services.is_empty() || intersects(&record.services, &state.services))
        .filter(|record| query.is_empty() || matches_search(record, &query))
        .collect()
}

fn time_cutoff(time: &str, today: NaiveDate) -> Option<NaiveDate> {
    if time.is_empty() || time == "all" {
        return None;
    }
    let days = time.parse::<i64>().ok()?;
    today.checked_sub_signed(Duration::days(days))
}

/// Any selected value appearing in the record's list is a match.
fn intersects(have: &[String], selected: &[String]) -> bool {
    selected.iter().any(|value| have.contains(value))
}

fn matches_search(record: &ContentRecord, lowercase_query: &str) -> bool {
    record.title.to_lowercase().contains(lowercase_query)
        || record.excerpt.to_lowercase().contains(lowercase_query)
}

#[cfg(test)]
mod test {
    use chrono::{Duration, NaiveDate, Utc};
    use pretty_assertions::assert_eq;

    use crate::record::ContentRecord;

    use super::{filter, FilterState};

    macro_rules! s {
        ($v:literal) => {
            $v.to_string()
        };
    }

    fn record(kind: &str, date: &str) -> ContentRecord {
        ContentRecord {
            id: format!("{kind}-{date}"),
            title: s!("Untitled"),
            excerpt: String::new(),
            url: None,
            image: None,
            kind: kind.to_owned(),
            date: date.to_owned(),
            path: String::new(),
            skill_level: String::new(),
            frameworks: Vec::new(),
            services: Vec::new(),
            components: Vec::new(),
            category: None,
            industry: None,
            pricing: None,
            company: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn type_all_excludes_nothing() {
        let records = vec![record("blogs", "2024-01-01"), record("videos", "2024-06-01")];
        let state = FilterState::default();

        assert_eq!(2, filter(&records, &state, today()).len());
    }

    #[test]
    fn type_narrows_to_exact_match() {
        let records = vec![record("blogs", "2024-01-01"), record("videos", "2024-06-01")];
        let state = FilterState {
            kind: s!("videos"),
            ..FilterState::default()
        };

        let filtered = filter(&records, &state, today());
        assert_eq!(1, filtered.len());
        assert_eq!("videos", filtered[0].kind);
    }

    #[test]
    fn time_window_cuts_off_old_records() {
        let now = Utc::now().date_naive();
        let recent = record("blogs", &(now - Duration::days(5)).to_string());
        let stale = record("blogs", &(now - Duration::days(90)).to_string());
        let records = vec![recent.clone(), stale];
        let state = FilterState {
            time: s!("30"),
            ..FilterState::default()
        };

        let filtered = filter(&records, &state, now);
        assert_eq!(vec![&recent], filtered);
    }

    #[test]
    fn unparseable_time_is_skipped() {
        let records = vec![record("blogs", "2001-01-01")];
        let state = FilterState {
            time: s!("soon"),
            ..FilterState::default()
        };

        assert_eq!(1, filter(&records, &state, today()).len());
    }

    #[test]
    fn empty_framework_list_never_matches_a_selection() {
        let mut tagged = record("blogs", "2024-01-01");
        tagged.frameworks = vec![s!("LangChain"), s!("CrewAI")];
        let untagged = record("blogs", "2024-02-01");
        let records = vec![tagged.clone(), untagged];

        let state = FilterState {
            frameworks: vec![s!("CrewAI"), s!("Strands")],
            ..FilterState::default()
        };

        let filtered = filter(&records, &state, today());
        assert_eq!(vec![&tagged], filtered);
    }

    #[test]
    fn services_use_or_intersection() {
        let mut a = record("blogs", "2024-01-01");
        a.services = vec![s!("AWS Lambda")];
        let mut b = record("blogs", "2024-02-01");
        b.services = vec![s!("Amazon Bedrock")];
        let records = vec![a, b];

        let state = FilterState {
            services: vec![s!("Amazon Bedrock"), s!("AWS Lambda")],
            ..FilterState::default()
        };

        assert_eq!(2, filter(&records, &state, today()).len());
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_excerpt() {
        let mut titled = record("blogs", "2024-01-01");
        titled.title = s!("Agents in Production");
        let mut excerpted = record("blogs", "2024-02-01");
        excerpted.excerpt = s!("A quick AGENTS walkthrough");
        let unrelated = record("blogs", "2024-03-01");
        let records = vec![titled, excerpted, unrelated];

        let state = FilterState {
            search_query: s!("agents"),
            ..FilterState::default()
        };

        assert_eq!(2, filter(&records, &state, today()).len());
    }

    #[test]
    fn filter_is_idempotent() {
        let mut a = record("blogs", "2024-01-01");
        a.frameworks = vec![s!("LangChain")];
        let b = record("videos", "2024-02-01");
        let records = vec![a, b];
        let state = FilterState {
            kind: s!("blogs"),
            frameworks: vec![s!("LangChain")],
            ..FilterState::default()
        };

        let once: Vec<ContentRecord> = filter(&records, &state, today())
            .into_iter()
            .cloned()
            .collect();
        let twice = filter(&once, &state, today());

        assert_eq!(once.iter().collect::<Vec<_>>(), twice);
    }

    #[test]
    fn clear_preserves_page_only() {
        let mut state = FilterState {
            page: s!("learn"),
            kind: s!("videos"),
            time: s!("90"),
            skill_level: s!("Beginner"),
            frameworks: vec![s!("LangChain")],
            services: vec![s!("Amazon Bedrock")],
            search_query: s!("x"),
        };
        state.clear();

        assert_eq!(
            FilterState {
                page: s!("learn"),
                ..FilterState::default()
            },
            state
        );
    }

    #[test]
    fn stale_type_resets_to_all() {
        let mut state = FilterState {
            page: s!("learn"),
            kind: s!("patterns"),
            ..FilterState::default()
        };
        assert!(state.validate_type(&["all", "blogs", "videos", "workshops"]));
        assert_eq!("all", state.kind);

        let mut state = FilterState {
            kind: s!("blogs"),
            ..FilterState::default()
        };
        assert!(!state.validate_type(&["all", "blogs"]));
        assert_eq!("blogs", state.kind);
    }

    #[test]
    fn partial_persisted_state_deserializes_with_defaults() {
        let state: FilterState =
            serde_json::from_str(r#"{"page":"learn","unknownField":true}"#).unwrap();

        assert_eq!(
            FilterState {
                page: s!("learn"),
                ..FilterState::default()
            },
            state
        );
    }
}
