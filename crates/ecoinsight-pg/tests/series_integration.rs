//! Bucket-query behavior against a real TimescaleDB instance.
//!
//! Skipped unless `ECOINSIGHT_TEST_TIMESERIES_URI` is set; CI provides it
//! via a service container.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use ecoinsight_core::climate::{DataType, Metadata};
use ecoinsight_core::timeseries::{TimeseriesPoint, MAX_BUCKETS};
use ecoinsight_pg::SeriesStore;

async fn series_store() -> Option<SeriesStore> {
    let uri = std::env::var("ECOINSIGHT_TEST_TIMESERIES_URI").ok()?;
    Some(
        SeriesStore::connect(&uri, 4, false)
            .await
            .expect("series store"),
    )
}

#[tokio::test]
async fn bucket_query_never_returns_more_than_the_cap() {
    let Some(store) = series_store().await else {
        eprintln!("ECOINSIGHT_TEST_TIMESERIES_URI unset, skipping");
        return;
    };

    let location = format!("site-{}", Uuid::new_v4());
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().expect("base");

    // One point per second across 510 one-second buckets: more distinct
    // buckets than the cap allows.
    let extra = 10;
    let total = MAX_BUCKETS + extra;
    for i in 0..total {
        let id = store
            .insert_point(&TimeseriesPoint {
                location: location.clone(),
                data_type: DataType::Temperature,
                timestamp: base + Duration::seconds(i),
                value: i as f64,
                unit: "°C".to_string(),
                source: "sensor-17".to_string(),
                metadata: Metadata::default(),
            })
            .await
            .expect("insert");
        assert!(id > 0);
    }

    let buckets = store
        .bucket_query(
            &location,
            DataType::Temperature,
            base,
            base + Duration::seconds(total),
            "1 second",
        )
        .await
        .expect("bucket query");

    // Capped at the 500 most recent buckets, newest first: the oldest
    // `extra` seconds fall off the end.
    assert_eq!(buckets.len(), MAX_BUCKETS as usize);
    assert_eq!(buckets[0].value_avg, (total - 1) as f64);
    assert_eq!(buckets[MAX_BUCKETS as usize - 1].value_avg, extra as f64);
    assert!(buckets.windows(2).all(|w| w[0].bucket > w[1].bucket));
}
