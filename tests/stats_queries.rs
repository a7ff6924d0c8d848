// tests/stats_queries.rs
use au_sentiment_harvester::stats::{
    daily_counts_query, extremes_query, hourly_counts_query, keyword_breakdown_query,
    parse_date_buckets, parse_extreme, parse_keyword_buckets, SortOrder, StatsFilter,
};
use serde_json::json;

#[test]
fn filters_carry_day_bounds_and_sentinel_guard() {
    let filter = StatsFilter::date_range("2025-04-01", "2025-04-03")
        .with_keywords(["tariff"])
        .with_exclude(["trump"]);
    let filters = filter.to_filters();

    assert_eq!(
        filters[0]["range"]["created_at"]["gte"],
        json!("2025-04-01 00:00:00")
    );
    assert_eq!(
        filters[0]["range"]["created_at"]["lte"],
        json!("2025-04-03 23:59:59")
    );
    assert_eq!(
        filters[1]["bool"]["should"][0]["match"]["matched_keywords"],
        json!("tariff")
    );
    assert_eq!(
        filters[2]["bool"]["must_not"][0]["term"]["matched_keywords"],
        json!("trump")
    );

    // the guard is always last and keeps sentinel docs out
    let guard = filters.last().unwrap();
    assert_eq!(guard["range"]["sentiment_score"]["gte"], json!(-1.0));
    assert_eq!(guard["range"]["sentiment_score"]["lte"], json!(1.0));
}

#[test]
fn empty_filter_still_guards_sentinels() {
    let filters = StatsFilter::default().to_filters();
    assert_eq!(filters.len(), 1);
    assert!(filters[0]["range"]["sentiment_score"].is_object());
}

#[test]
fn breakdown_query_is_aggregation_only() {
    let q = keyword_breakdown_query(&StatsFilter::default());
    assert_eq!(q["size"], json!(0));
    assert_eq!(
        q["aggs"]["keywords"]["terms"]["field"],
        json!("matched_keywords")
    );
    assert_eq!(
        q["aggs"]["keywords"]["aggs"]["avg_sentiment"]["avg"]["field"],
        json!("sentiment_score")
    );
}

#[test]
fn histogram_queries_pick_their_interval() {
    let daily = daily_counts_query(&StatsFilter::default());
    assert_eq!(
        daily["aggs"]["by_date"]["date_histogram"]["calendar_interval"],
        json!("1d")
    );
    let hourly = hourly_counts_query(&StatsFilter::default());
    assert_eq!(
        hourly["aggs"]["by_date"]["date_histogram"]["fixed_interval"],
        json!("1h")
    );
    assert_eq!(
        hourly["aggs"]["by_date"]["date_histogram"]["field"],
        json!("created_at")
    );
}

#[test]
fn extremes_query_sorts_by_direction_and_keeps_the_guard() {
    let pos = extremes_query(&StatsFilter::default(), SortOrder::MostPositive);
    assert_eq!(pos["sort"][0]["sentiment_score"], json!("desc"));
    assert_eq!(pos["size"], json!(1));
    // sentinel docs must not win "most positive"
    let guard = pos["query"]["bool"]["filter"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(guard["range"]["sentiment_score"]["lte"], json!(1.0));

    let neg = extremes_query(&StatsFilter::default(), SortOrder::MostNegative);
    assert_eq!(neg["sort"][0]["sentiment_score"], json!("asc"));
}

#[test]
fn keyword_buckets_parse_and_round() {
    let res = json!({
        "aggregations": {
            "keywords": {
                "buckets": [
                    {"key": "tariff", "doc_count": 12, "avg_sentiment": {"value": -0.23456}},
                    {"key": "trump", "doc_count": 7, "avg_sentiment": {"value": null}}
                ]
            }
        }
    });
    let buckets = parse_keyword_buckets(&res);
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].keyword, "tariff");
    assert_eq!(buckets[0].count, 12);
    assert_eq!(buckets[0].avg_sentiment, -0.235);
    // null average (no scorable docs) degrades to 0.0
    assert_eq!(buckets[1].avg_sentiment, 0.0);
}

#[test]
fn date_buckets_parse_counts() {
    let res = json!({
        "aggregations": {
            "by_date": {
                "buckets": [
                    {
                        "key_as_string": "2025-04-03",
                        "doc_count": 5,
                        "count": {"value": 5},
                        "avg_sentiment": {"value": 0.1119}
                    }
                ]
            }
        }
    });
    let buckets = parse_date_buckets(&res);
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, "2025-04-03");
    assert_eq!(buckets[0].count, 5);
    assert_eq!(buckets[0].avg_sentiment, 0.112);
}

#[test]
fn extreme_post_parses_from_first_hit() {
    let res = json!({
        "hits": {
            "hits": [
                {
                    "_source": {
                        "author": "au_watcher",
                        "content": "tariffs are terrible news",
                        "sentiment_score": -0.8176,
                        "matched_keywords": ["tariff"]
                    }
                }
            ]
        }
    });
    let post = parse_extreme(&res).unwrap();
    assert_eq!(post.author, "au_watcher");
    assert_eq!(post.sentiment_score, -0.8176);
    assert_eq!(post.matched_keywords, vec!["tariff".to_string()]);

    assert!(parse_extreme(&json!({"hits": {"hits": []}})).is_none());
}

#[test]
fn missing_aggregations_parse_to_empty() {
    assert!(parse_keyword_buckets(&json!({})).is_empty());
    assert!(parse_date_buckets(&json!({"aggregations": {}})).is_empty());
}
