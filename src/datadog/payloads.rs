use serde::Serialize;

use crate::recognition::MetricSubmission;

/// Body of `POST /api/v2/series`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SeriesPayload {
    pub series: Vec<Series>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Series {
    pub metric: String,
    /// 0 is `unspecified` in the v2 intake.
    pub r#type: u8,
    pub points: Vec<Point>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Point {
    pub timestamp: i64,
    pub value: i64,
}

impl From<&MetricSubmission> for SeriesPayload {
    fn from(submission: &MetricSubmission) -> Self {
        Self {
            series: vec![Series {
                metric: submission.metric_name.clone(),
                r#type: 0,
                points: vec![Point {
                    timestamp: submission.timestamp_seconds,
                    value: submission.value,
                }],
                tags: submission.tags.clone(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_single_point_series() {
        let submission = MetricSubmission {
            metric_name: "test.hackathon.recognidog.points".to_string(),
            value: 5,
            timestamp_seconds: 1_700_000_000,
            tags: vec!["env:hackathon".to_string(), "sender:Grace".to_string()],
        };

        let body = serde_json::to_value(SeriesPayload::from(&submission)).unwrap();

        assert_eq!(
            body,
            json!({
                "series": [{
                    "metric": "test.hackathon.recognidog.points",
                    "type": 0,
                    "points": [{"timestamp": 1_700_000_000, "value": 5}],
                    "tags": ["env:hackathon", "sender:Grace"]
                }]
            })
        );
    }
}
