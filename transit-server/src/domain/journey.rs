//! Journey types.
//!
//! A `Journey` is a complete trip from origin to destination: rides on
//! lines, possibly separated by interchange walks.

use chrono::Duration;

use super::{DomainError, LineId, Money, StationCode, StationId};

/// A station as it appears in a journey: its identity plus its short code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stop {
    pub id: StationId,
    pub code: StationCode,
}

impl Stop {
    pub fn new(id: StationId, code: StationCode) -> Self {
        Self { id, code }
    }
}

/// An uninterrupted ride on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub line: LineId,
    /// Every station the ride calls at, boarding and alighting included.
    pub stops: Vec<Stop>,
}

/// An interchange walk between stations on different lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    pub from: Stop,
    pub to: Stop,
    /// Charge for using the interchange, if the operators levy one.
    pub cost: Option<Money>,
}

/// What a segment is.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    Ride(Ride),
    Walk(Walk),
}

/// A segment of a journey: a ride or a walk, with its own and cumulative
/// distance and duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub distance_km: f64,
    pub duration: Duration,
    /// Distance from the journey origin to the end of this segment.
    pub cumulative_distance_km: f64,
    /// Duration from the journey origin to the end of this segment.
    pub cumulative_duration: Duration,
    /// Set when the rider changes line or starts a walk at the start of this
    /// segment. Never set on the first segment.
    pub transfer: bool,
}

impl Segment {
    /// A ride segment. Cumulative figures and the transfer marker are filled
    /// in by [`Journey::new`].
    pub fn ride(line: LineId, stops: Vec<Stop>, distance_km: f64, duration: Duration) -> Self {
        Self {
            kind: SegmentKind::Ride(Ride { line, stops }),
            distance_km,
            duration,
            cumulative_distance_km: 0.0,
            cumulative_duration: Duration::zero(),
            transfer: false,
        }
    }

    /// A walk segment.
    pub fn walk(
        from: Stop,
        to: Stop,
        cost: Option<Money>,
        distance_km: f64,
        duration: Duration,
    ) -> Self {
        Self {
            kind: SegmentKind::Walk(Walk { from, to, cost }),
            distance_km,
            duration,
            cumulative_distance_km: 0.0,
            cumulative_duration: Duration::zero(),
            transfer: false,
        }
    }

    /// Every stop this segment passes through, in order.
    pub fn stops(&self) -> &[Stop] {
        match &self.kind {
            SegmentKind::Ride(ride) => &ride.stops,
            SegmentKind::Walk(walk) => std::slice::from_ref(&walk.from),
        }
    }

    /// Returns the origin stop of this segment.
    pub fn origin(&self) -> Option<&Stop> {
        match &self.kind {
            SegmentKind::Ride(ride) => ride.stops.first(),
            SegmentKind::Walk(walk) => Some(&walk.from),
        }
    }

    /// Returns the destination stop of this segment.
    pub fn destination(&self) -> Option<&Stop> {
        match &self.kind {
            SegmentKind::Ride(ride) => ride.stops.last(),
            SegmentKind::Walk(walk) => Some(&walk.to),
        }
    }

    /// Returns the line for a ride segment.
    pub fn line(&self) -> Option<LineId> {
        self.as_ride().map(|ride| ride.line)
    }

    pub fn is_ride(&self) -> bool {
        matches!(self.kind, SegmentKind::Ride(_))
    }

    pub fn is_walk(&self) -> bool {
        matches!(self.kind, SegmentKind::Walk(_))
    }

    pub fn as_ride(&self) -> Option<&Ride> {
        match &self.kind {
            SegmentKind::Ride(ride) => Some(ride),
            SegmentKind::Walk(_) => None,
        }
    }

    pub fn as_walk(&self) -> Option<&Walk> {
        match &self.kind {
            SegmentKind::Ride(_) => None,
            SegmentKind::Walk(walk) => Some(walk),
        }
    }
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - Every ride calls at two or more stations
/// - Consecutive segments connect (destination of one = origin of next)
/// - Consecutive rides are on different lines (same-line hops are coalesced)
/// - A journey with no segments starts and ends at its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    origin: Stop,
    segments: Vec<Segment>,
    stops: Vec<Stop>,
    weight_mins: i64,
}

impl Journey {
    /// Constructs a journey from segments, filling in cumulative figures and
    /// transfer markers.
    ///
    /// `weight_mins` is the search weight the planner ranked this journey by
    /// (travel minutes plus transfer penalties).
    ///
    /// # Errors
    ///
    /// Returns `Err` if a ride has fewer than two stops, if segments don't
    /// connect, or if two consecutive rides are on the same line.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Duration;
    /// use transit_server::domain::{Journey, LineId, Segment, StationCode, StationId, Stop};
    ///
    /// let stop = |id: u64, code: &str| Stop::new(StationId(id), StationCode::parse(code).unwrap());
    /// let ride = Segment::ride(
    ///     LineId(1),
    ///     vec![stop(1, "A"), stop(2, "B"), stop(3, "C")],
    ///     2.0,
    ///     Duration::minutes(6),
    /// );
    ///
    /// let journey = Journey::new(stop(1, "A"), vec![ride], 6).unwrap();
    /// assert_eq!(journey.segment_count(), 1);
    /// assert_eq!(journey.destination().code.as_str(), "C");
    /// ```
    pub fn new(origin: Stop, segments: Vec<Segment>, weight_mins: i64) -> Result<Self, DomainError> {
        let mut segments = segments;
        let mut stops = vec![origin.clone()];
        let mut distance = 0.0;
        let mut duration = Duration::zero();
        let mut previous_line: Option<LineId> = None;

        for (i, segment) in segments.iter_mut().enumerate() {
            if let SegmentKind::Ride(ride) = &segment.kind {
                if ride.stops.len() < 2 {
                    return Err(DomainError::ShortRide(ride.line));
                }
                if previous_line == Some(ride.line) {
                    return Err(DomainError::UncoalescedRide(ride.line));
                }
            }
            previous_line = segment.line();

            // Both are Some: rides have at least two stops
            let (Some(start), Some(end)) = (segment.origin(), segment.destination()) else {
                return Err(DomainError::EmptyJourney);
            };
            let previous = stops.last().map(|s| s.id).unwrap_or(origin.id);
            if start.id != previous {
                return Err(DomainError::StationsNotConnected(previous, start.id));
            }

            match &segment.kind {
                SegmentKind::Ride(ride) => stops.extend(ride.stops.iter().skip(1).cloned()),
                SegmentKind::Walk(_) => stops.push(end.clone()),
            }

            distance += segment.distance_km;
            duration += segment.duration;
            segment.cumulative_distance_km = distance;
            segment.cumulative_duration = duration;
            segment.transfer = i > 0;
        }

        Ok(Journey {
            origin,
            segments,
            stops,
            weight_mins,
        })
    }

    /// A journey that starts and ends where it is: no segments, no cost.
    pub fn stay(origin: Stop) -> Self {
        Journey {
            stops: vec![origin.clone()],
            origin,
            segments: Vec::new(),
            weight_mins: 0,
        }
    }

    /// Returns all segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the number of rides (excluding walks).
    pub fn ride_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_ride()).count()
    }

    /// Returns the number of transfer points.
    pub fn transfer_count(&self) -> usize {
        self.segments.iter().filter(|s| s.transfer).count()
    }

    /// Returns all rides in order.
    pub fn rides(&self) -> impl Iterator<Item = &Ride> {
        self.segments.iter().filter_map(|s| s.as_ride())
    }

    /// Returns all walks in order.
    pub fn walks(&self) -> impl Iterator<Item = &Walk> {
        self.segments.iter().filter_map(|s| s.as_walk())
    }

    /// Returns the origin stop.
    pub fn origin(&self) -> &Stop {
        &self.origin
    }

    /// Returns the destination stop.
    pub fn destination(&self) -> &Stop {
        self.stops.last().unwrap_or(&self.origin)
    }

    /// Every station passed through, origin and destination included.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Returns the station codes in travel order.
    pub fn station_codes(&self) -> impl Iterator<Item = &StationCode> {
        self.stops.iter().map(|s| &s.code)
    }

    /// Returns the total travel duration, walks included.
    pub fn total_duration(&self) -> Duration {
        self.segments
            .last()
            .map(|s| s.cumulative_duration)
            .unwrap_or_else(Duration::zero)
    }

    /// Returns the total distance travelled.
    pub fn total_distance_km(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.cumulative_distance_km)
            .unwrap_or(0.0)
    }

    /// Returns the search weight: minutes travelled plus transfer penalties.
    pub fn weight_mins(&self) -> i64 {
        self.weight_mins
    }

    /// Returns true if this journey needs no transfer.
    pub fn is_direct(&self) -> bool {
        self.transfer_count() == 0
    }
}
