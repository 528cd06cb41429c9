//! Plot detail view: reading history over a selectable period.
//!
//! The detail page reloads one plot together with its soil/vision history
//! for a time window ending now, and recomputes status and health from the
//! newest readings in that window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::backend::{FarmDataSource, SourceError, TimeWindow};
use crate::config::{defaults, ThresholdConfig};
use crate::processing::enrich;
use crate::types::{Plot, PlotRecord, Sensor, SoilReading, VisionData};

// ============================================================================
// Time period
// ============================================================================

/// History period offered by the detail view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
}

impl TimePeriod {
    pub const ALL: [Self; 6] = [
        Self::TenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::SixHours,
        Self::TwentyFourHours,
        Self::SevenDays,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenMinutes => "10m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::TwentyFourHours => "24h",
            Self::SevenDays => "7d",
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::TenMinutes => Duration::minutes(10),
            Self::ThirtyMinutes => Duration::minutes(30),
            Self::OneHour => Duration::hours(1),
            Self::SixHours => Duration::hours(6),
            Self::TwentyFourHours => Duration::hours(24),
            Self::SevenDays => Duration::days(7),
        }
    }

    /// `[now - period, now]`
    pub fn window(self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::new(now - self.duration(), now)
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown period '{0}' (expected one of 10m, 30m, 1h, 6h, 24h, 7d)")]
pub struct TimePeriodParseError(String);

impl FromStr for TimePeriod {
    type Err = TimePeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TimePeriodParseError(s.to_string()))
    }
}

// ============================================================================
// Plot detail
// ============================================================================

/// One plot with its reading history for the selected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDetail {
    pub plot: Plot,
    pub period: TimePeriod,
    pub soil_readings: Vec<SoilReading>,
    pub vision_data: Vec<VisionData>,
    pub sensors: Vec<Sensor>,
}

impl PlotDetail {
    /// Attach the newest readings to the record and recompute its derived
    /// values from them.
    fn assemble(
        mut record: PlotRecord,
        period: TimePeriod,
        soil_readings: Vec<SoilReading>,
        vision_data: Vec<VisionData>,
        sensors: Vec<Sensor>,
        thresholds: &ThresholdConfig,
    ) -> Self {
        let latest_soil = latest_by_time(&soil_readings, |r| r.time).cloned();
        let latest_vision = latest_by_time(&vision_data, |v| v.time).cloned();

        record.estimated_yield = latest_vision
            .as_ref()
            .filter(|v| v.fruit_count > 0)
            .map(|v| f64::from(v.fruit_count) * defaults::YIELD_KG_PER_FRUIT);
        record.current_soil_reading = latest_soil;
        record.current_vision_data = latest_vision;
        record.sensors_count = u32::try_from(sensors.len()).ok();
        // Recomputed from this window, not whatever the list endpoint cached
        record.status = None;
        record.health_score = None;

        Self {
            plot: enrich(record, thresholds),
            period,
            soil_readings,
            vision_data,
            sensors,
        }
    }
}

/// Newest item by timestamp; untimed items only win when nothing is timed.
fn latest_by_time<T>(items: &[T], time: impl Fn(&T) -> Option<DateTime<Utc>>) -> Option<&T> {
    items
        .iter()
        .filter(|i| time(i).is_some())
        .max_by_key(|i| time(i))
        .or_else(|| items.first())
}

/// Load one plot's detail for `period` ending at `now`.
///
/// The four fetches run concurrently; any failure fails the whole load.
pub async fn load_plot_detail(
    source: &dyn FarmDataSource,
    plot_id: &str,
    period: TimePeriod,
    now: DateTime<Utc>,
    thresholds: &ThresholdConfig,
) -> Result<PlotDetail, SourceError> {
    let window = period.window(now);
    let (record, soil, vision, sensors) = tokio::try_join!(
        source.get_plot(plot_id),
        source.list_soil_readings(plot_id, window),
        source.list_vision_data(plot_id, window),
        source.list_sensors_for_plot(plot_id),
    )?;

    tracing::debug!(
        plot_id,
        period = %period,
        soil = soil.len(),
        vision = vision.len(),
        sensors = sensors.len(),
        "plot detail loaded"
    );
    Ok(PlotDetail::assemble(record, period, soil, vision, sensors, thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Derived, PlotStatus};
    use chrono::TimeZone;

    #[test]
    fn window_width_matches_period() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        for period in TimePeriod::ALL {
            let w = period.window(now);
            assert_eq!(w.end, now);
            assert_eq!(w.end - w.start, period.duration());
        }
        assert_eq!(TimePeriod::SevenDays.window(now).start, now - Duration::days(7));
    }

    #[test]
    fn period_parses_and_prints() {
        assert_eq!("6h".parse::<TimePeriod>().unwrap(), TimePeriod::SixHours);
        assert_eq!(" 7D ".parse::<TimePeriod>().unwrap(), TimePeriod::SevenDays);
        assert!("2h".parse::<TimePeriod>().is_err());
        assert_eq!(TimePeriod::default().to_string(), "24h");
        let json = serde_json::to_string(&TimePeriod::TenMinutes).unwrap();
        assert_eq!(json, r#""10m""#);
    }

    #[test]
    fn assemble_uses_newest_readings() {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let t1 = t0 + Duration::minutes(5);
        let soil = vec![
            SoilReading {
                time: Some(t0),
                moisture: Some(5.0),
                ..Default::default()
            },
            SoilReading {
                time: Some(t1),
                moisture: Some(22.0),
                ph: Some(6.5),
                temperature: Some(25.0),
                ..Default::default()
            },
        ];
        let vision = vec![VisionData {
            time: Some(t1),
            fruit_count: 100,
            ..Default::default()
        }];
        let record = PlotRecord {
            id: "p1".to_string(),
            farm_id: "f1".to_string(),
            name: "Talhao 1".to_string(),
            status: Some(PlotStatus::Critical),
            ..Default::default()
        };

        let detail = PlotDetail::assemble(
            record,
            TimePeriod::OneHour,
            soil,
            vision,
            Vec::new(),
            &ThresholdConfig::default(),
        );
        assert_eq!(detail.plot.derived_status, Derived::Computed(PlotStatus::Ok));
        assert_eq!(detail.plot.derived_health, Derived::Computed(100.0));
        assert_eq!(detail.plot.record.sensors_count, Some(0));
        let yield_kg = detail.plot.record.estimated_yield.unwrap();
        assert!((yield_kg - 35.0).abs() < 1e-9);
    }

    #[test]
    fn no_readings_means_offline_without_yield() {
        let record = PlotRecord {
            id: "p1".to_string(),
            farm_id: "f1".to_string(),
            name: "Talhao 1".to_string(),
            ..Default::default()
        };
        let detail = PlotDetail::assemble(
            record,
            TimePeriod::TenMinutes,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            &ThresholdConfig::default(),
        );
        assert_eq!(detail.plot.status(), PlotStatus::Offline);
        assert!(detail.plot.record.estimated_yield.is_none());
    }
}
