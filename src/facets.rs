use serde::Serialize;

use crate::record::ContentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeFacet {
    pub label: &'static str,
    pub values: Vec<TimeOption>,
}

/// A filter dimension: its preset values, plus optionally whatever the
/// loaded records turn out to carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    pub label: &'static str,
    pub values: Vec<String>,
    pub discover_additional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetOptions {
    pub time_filters: TimeFacet,
    pub skill_levels: Facet,
    pub frameworks: Facet,
    pub services: Facet,
}

#[must_use]
pub fn defaults() -> FacetOptions {
    FacetOptions {
        time_filters: TimeFacet {
            label: "Time Period",
            values: vec![
                TimeOption {
                    value: "all",
                    label: "All Time",
                },
                TimeOption {
                    value: "30",
                    label: "Last Month",
                },
                TimeOption {
                    value: "90",
                    label: "Last 3 Months",
                },
                TimeOption {
                    value: "365",
                    label: "Last Year",
                },
            ],
        },
        skill_levels: Facet {
            label: "Skill Level",
            values: preset(&["Beginner", "Intermediate", "Advanced"]),
            discover_additional: false,
        },
        frameworks: Facet {
            label: "Frameworks",
            values: preset(&["Strands", "LangChain", "LlamaIndex", "CrewAI", "LangGraph"]),
            discover_additional: true,
        },
        services: Facet {
            label: "AWS Services",
            values: preset(&[
                "Amazon Bedrock",
                "Amazon SageMaker",
                "Amazon Q",
                "AWS Lambda",
                "Amazon EKS",
                "Amazon OpenSearch",
            ]),
            discover_additional: true,
        },
    }
}

fn preset(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// The preset facets extended with values discovered in the loaded
/// records. The merged services list is sorted; the frameworks list keeps
/// preset-then-discovered order.
#[must_use]
pub fn available(records: &[&ContentRecord]) -> FacetOptions {
    let mut options = defaults();
    if records.is_empty() {
        return options;
    }

    if options.frameworks.discover_additional {
        merge_discovered(&mut options.frameworks.values, records, |record| {
            &record.frameworks
        });
    }
    if options.services.discover_additional {
        merge_discovered(&mut options.services.values, records, |record| {
            &record.services
        });
        options.services.values.sort();
    }

    options
}

fn merge_discovered(
    values: &mut Vec<String>,
    records: &[&ContentRecord],
    pick: fn(&ContentRecord) -> &Vec<String>,
) {
    for record in records {
        for value in pick(record) {
            if !value.is_empty() && !values.contains(value) {
                values.push(value.clone());
            }
        }
    }
}
