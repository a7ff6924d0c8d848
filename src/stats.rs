// src/stats.rs
//! Aggregate statistics over the harvested indexes: shared filter builder,
//! query bodies, and bucket parsers. Queries execute through the
//! [`DocumentStore`] seam; builders and parsers are pure so they test
//! without a live store.
//!
//! Every query carries the valid-score guard `-1.0 <= sentiment_score <=
//! 1.0`: sentinel-scored documents count for nothing here, including the
//! extremes.

use crate::store::DocumentStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Common filter set: optional date range (whole-day bounds), any-of
/// keyword match, excluded keywords.
#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    /// Inclusive start date, `YYYY-MM-DD`.
    pub start: Option<String>,
    /// Inclusive end date, `YYYY-MM-DD`.
    pub end: Option<String>,
    pub keywords: Vec<String>,
    pub exclude: Vec<String>,
}

impl StatsFilter {
    pub fn date_range(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// The bool-filter clauses shared by every stats query.
    pub fn to_filters(&self) -> Vec<Value> {
        let mut filters = Vec::new();

        if let (Some(start), Some(end)) = (&self.start, &self.end) {
            filters.push(json!({
                "range": {
                    "created_at": {
                        "gte": format!("{start} 00:00:00"),
                        "lte": format!("{end} 23:59:59")
                    }
                }
            }));
        }

        if !self.keywords.is_empty() {
            filters.push(json!({
                "bool": {
                    "should": self
                        .keywords
                        .iter()
                        .map(|k| json!({"match": {"matched_keywords": k}}))
                        .collect::<Vec<_>>(),
                    "minimum_should_match": 1
                }
            }));
        }

        if !self.exclude.is_empty() {
            filters.push(json!({
                "bool": {
                    "must_not": self
                        .exclude
                        .iter()
                        .map(|e| json!({"term": {"matched_keywords": e}}))
                        .collect::<Vec<_>>()
                }
            }));
        }

        // keep unscorable-sentinel docs out of every aggregate
        filters.push(json!({
            "range": {"sentiment_score": {"gte": -1.0, "lte": 1.0}}
        }));

        filters
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    MostPositive,
    MostNegative,
}

/// Keyword breakdown: doc count + average sentiment per tracked keyword.
pub fn keyword_breakdown_query(filter: &StatsFilter) -> Value {
    json!({
        "query": {"bool": {"filter": filter.to_filters()}},
        "aggs": {
            "keywords": {
                "terms": {"field": "matched_keywords"},
                "aggs": {
                    "avg_sentiment": {"avg": {"field": "sentiment_score"}}
                }
            }
        },
        "size": 0
    })
}

/// Daily counts + average sentiment over the filtered range.
pub fn daily_counts_query(filter: &StatsFilter) -> Value {
    histogram_query(filter, json!({"calendar_interval": "1d", "format": "yyyy-MM-dd"}))
}

/// Hourly variant, for intra-day drilldowns.
pub fn hourly_counts_query(filter: &StatsFilter) -> Value {
    histogram_query(
        filter,
        json!({"fixed_interval": "1h", "format": "yyyy-MM-dd'T'HH"}),
    )
}

fn histogram_query(filter: &StatsFilter, interval: Value) -> Value {
    let mut histogram = json!({"field": "created_at"});
    if let (Some(h), Some(i)) = (histogram.as_object_mut(), interval.as_object()) {
        for (k, v) in i {
            h.insert(k.clone(), v.clone());
        }
    }
    json!({
        "query": {"bool": {"filter": filter.to_filters()}},
        "aggs": {
            "by_date": {
                "date_histogram": histogram,
                "aggs": {
                    "avg_sentiment": {"avg": {"field": "sentiment_score"}},
                    "count": {"value_count": {"field": "_id"}}
                }
            }
        },
        "size": 0
    })
}

/// Single most positive / most negative post in the filtered range.
pub fn extremes_query(filter: &StatsFilter, order: SortOrder) -> Value {
    let dir = match order {
        SortOrder::MostPositive => "desc",
        SortOrder::MostNegative => "asc",
    };
    json!({
        "query": {"bool": {"filter": filter.to_filters()}},
        "sort": [{"sentiment_score": dir}],
        "size": 1
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordBucket {
    pub keyword: String,
    pub count: u64,
    pub avg_sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateBucket {
    pub date: String,
    pub count: u64,
    pub avg_sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremePost {
    pub author: String,
    pub content: String,
    pub sentiment_score: f64,
    pub matched_keywords: Vec<String>,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub fn parse_keyword_buckets(res: &Value) -> Vec<KeywordBucket> {
    bucket_array(res, "keywords")
        .iter()
        .filter_map(|b| {
            Some(KeywordBucket {
                keyword: b.get("key")?.as_str()?.to_string(),
                count: b.get("doc_count")?.as_u64()?,
                avg_sentiment: round3(avg_value(b)),
            })
        })
        .collect()
}

pub fn parse_date_buckets(res: &Value) -> Vec<DateBucket> {
    bucket_array(res, "by_date")
        .iter()
        .filter_map(|b| {
            Some(DateBucket {
                date: b.get("key_as_string")?.as_str()?.to_string(),
                count: b
                    .get("count")
                    .and_then(|c| c.get("value"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                avg_sentiment: round3(avg_value(b)),
            })
        })
        .collect()
}

pub fn parse_extreme(res: &Value) -> Option<ExtremePost> {
    let src = res
        .get("hits")?
        .get("hits")?
        .as_array()?
        .first()?
        .get("_source")?;
    Some(ExtremePost {
        author: src
            .get("author")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        content: src
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        sentiment_score: src
            .get("sentiment_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        matched_keywords: src
            .get("matched_keywords")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

fn bucket_array<'a>(res: &'a Value, agg: &str) -> Vec<&'a Value> {
    res.get("aggregations")
        .and_then(|a| a.get(agg))
        .and_then(|k| k.get("buckets"))
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

fn avg_value(bucket: &Value) -> f64 {
    bucket
        .get("avg_sentiment")
        .and_then(|a| a.get("value"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

pub async fn keyword_breakdown(
    store: &dyn DocumentStore,
    index: &str,
    filter: &StatsFilter,
) -> Result<Vec<KeywordBucket>> {
    let res = store
        .search(index, &keyword_breakdown_query(filter))
        .await
        .context("keyword breakdown query")?;
    Ok(parse_keyword_buckets(&res))
}

pub async fn daily_counts(
    store: &dyn DocumentStore,
    index: &str,
    filter: &StatsFilter,
) -> Result<Vec<DateBucket>> {
    let res = store
        .search(index, &daily_counts_query(filter))
        .await
        .context("daily counts query")?;
    Ok(parse_date_buckets(&res))
}

pub async fn hourly_counts(
    store: &dyn DocumentStore,
    index: &str,
    filter: &StatsFilter,
) -> Result<Vec<DateBucket>> {
    let res = store
        .search(index, &hourly_counts_query(filter))
        .await
        .context("hourly counts query")?;
    Ok(parse_date_buckets(&res))
}

pub async fn extreme_post(
    store: &dyn DocumentStore,
    index: &str,
    filter: &StatsFilter,
    order: SortOrder,
) -> Result<Option<ExtremePost>> {
    let res = store
        .search(index, &extremes_query(filter, order))
        .await
        .context("extremes query")?;
    Ok(parse_extreme(&res))
}
