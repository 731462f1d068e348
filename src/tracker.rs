//! Single-writer state fed by asynchronous sensor and location sources.
use crate::{
    azimuth::Azimuth,
    geo::GeoPoint,
    orientation::{OrientationFilter, SensorEvent},
    stream::{Feed, Latest, Sink, Subscription},
};
use atomic_float::AtomicF64;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// A push source of raw accelerometer and magnetometer samples.
pub trait SensorSource {
    fn subscribe(&self, sink: Sink<SensorEvent>) -> Subscription;
}

/// A push source of location fixes in the global datum.
pub trait LocationSource {
    fn subscribe(&self, sink: Sink<GeoPoint>) -> Subscription;
}

impl SensorSource for Feed<SensorEvent> {
    fn subscribe(&self, sink: Sink<SensorEvent>) -> Subscription {
        Feed::subscribe(self, sink)
    }
}

impl LocationSource for Feed<GeoPoint> {
    fn subscribe(&self, sink: Sink<GeoPoint>) -> Subscription {
        Feed::subscribe(self, sink)
    }
}

/// Holds the latest smoothed device heading.
///
/// Only the most recently attached sensor callback writes. Readers see a
/// single word, so no lock is needed; NaN marks "no heading yet".
#[derive(Clone, Debug)]
pub struct HeadingTracker {
    heading: Arc<AtomicF64>,
    updates: Arc<AtomicU64>,
    generation: Arc<AtomicU64>,
}

impl Default for HeadingTracker {
    fn default() -> Self {
        Self {
            heading: Arc::new(AtomicF64::new(f64::NAN)),
            updates: Arc::new(AtomicU64::new(0)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl HeadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds samples from `source` through `filter` into this tracker.
    ///
    /// The filter is owned by the callback. Attaching again retires the
    /// previous callback, so the tracker keeps a single writer. Dropping the
    /// returned subscription stops its updates.
    pub fn attach<S: SensorSource + ?Sized>(
        &self,
        source: &S,
        mut filter: OrientationFilter,
    ) -> Subscription {
        let heading = Arc::clone(&self.heading);
        let updates = Arc::clone(&self.updates);
        let generation = Arc::clone(&self.generation);
        let current = generation.fetch_add(1, Ordering::AcqRel) + 1;
        source.subscribe(Box::new(move |event| {
            if generation.load(Ordering::Acquire) != current {
                log::trace!("dropping sample from a replaced sensor source");
                return;
            }
            if let Some(smoothed) = filter.push(event) {
                heading.store(smoothed.degrees(), Ordering::Release);
                updates.fetch_add(1, Ordering::Release);
            }
        }))
    }

    /// Returns the latest smoothed heading, or `None` before the first valid
    /// sensor frame.
    pub fn heading(&self) -> Option<Azimuth> {
        let degrees = self.heading.load(Ordering::Acquire);
        match degrees.is_nan() {
            true => None,
            false => Some(Azimuth::from_degrees(degrees)),
        }
    }

    /// Number of smoothed headings produced so far.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Acquire)
    }
}

/// Holds the latest location fix.
#[derive(Clone, Debug, Default)]
pub struct LocationTracker {
    fix: Latest<GeoPoint>,
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every fix delivered by `source` until the subscription ends.
    pub fn attach<S: LocationSource + ?Sized>(&self, source: &S) -> Subscription {
        let fix = self.fix.clone();
        source.subscribe(Box::new(move |point| fix.publish(point)))
    }

    /// Returns the latest fix, or `None` if no provider has produced one.
    pub fn current(&self) -> Option<GeoPoint> {
        self.fix.get()
    }

    /// Records a fix directly, for callers without a push source.
    pub fn update(&self, point: GeoPoint) {
        self.fix.publish(point);
    }

    pub fn version(&self) -> u64 {
        self.fix.version()
    }
}
