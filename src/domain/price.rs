//! Price observations and the per-asset price window.

use chrono::{NaiveDateTime, Timelike};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: NaiveDateTime, price: f64) -> Self {
        PricePoint { timestamp, price }
    }

    fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Ascending, de-duplicated sequence of prices for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceWindow {
    asset: String,
    points: Vec<PricePoint>,
}

impl PriceWindow {
    pub fn new(asset: impl Into<String>) -> Self {
        PriceWindow {
            asset: asset.into(),
            points: Vec::new(),
        }
    }

    /// Build a window from raw source rows.
    ///
    /// Rows with a non-positive or non-finite price are dropped. Rows that fall
    /// in the same one-second bucket are averaged into a single point, so the
    /// result never holds two points with the same timestamp.
    pub fn from_points(asset: impl Into<String>, mut raw: Vec<PricePoint>) -> Self {
        raw.retain(PricePoint::is_valid);
        for p in &mut raw {
            p.timestamp = bucket(p.timestamp);
        }
        raw.sort_by_key(|p| p.timestamp);

        let mut points: Vec<PricePoint> = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            let ts = raw[i].timestamp;
            let mut sum = 0.0;
            let mut n = 0usize;
            while i < raw.len() && raw[i].timestamp == ts {
                sum += raw[i].price;
                n += 1;
                i += 1;
            }
            points.push(PricePoint::new(ts, sum / n as f64));
        }

        PriceWindow {
            asset: asset.into(),
            points,
        }
    }

    /// Append a newer observation. Older or same-bucket observations are ignored.
    pub fn push(&mut self, point: PricePoint) -> bool {
        if !point.is_valid() {
            return false;
        }
        let point = PricePoint::new(bucket(point.timestamp), point.price);
        match self.points.last() {
            Some(last) if last.timestamp >= point.timestamp => false,
            _ => {
                self.points.push(point);
                true
            }
        }
    }

    /// Keep only the newest `horizon` points.
    pub fn trim_to(&mut self, horizon: usize) {
        if self.points.len() > horizon {
            let excess = self.points.len() - horizon;
            self.points.drain(..excess);
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn bucket(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}
