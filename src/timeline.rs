//! Financial event ledger: dated cash events tagged with the rate regime
//! active when each was appended, and the NPV/MIRR derived from them.

use chrono::{DateTime, TimeDelta, Utc};

/// Mean Gregorian year, used for all date-to-years conversions.
pub const DAYS_PER_YEAR: f64 = 365.2425;

/// A single ledger entry. Created only by the [`Timeline`] append methods;
/// the two `years_*` fields are derived and rewritten on every
/// [`Timeline::recalculate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub date: DateTime<Utc>,
    /// Signed cash amount; zero for rate-change markers.
    pub cash: f64,
    /// Financing (discount) rate in effect for this event.
    pub fin_rate: f64,
    /// Reinvestment (compounding) rate in effect for this event.
    pub re_rate: f64,
    pub years_elapsed: f64,
    pub years_left: f64,
}

/// An ordered sequence of [`Event`]s with cached NPV/MIRR.
///
/// Start is fixed by the first cash event and never moves; End is the
/// running maximum of cash-event dates. A `Timeline` is owned by the
/// decision node that built it; a child extends a clone of its parent's
/// timeline, so siblings never observe each other's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    events: Vec<Event>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    npv: f64,
    /// Magnitude of outflows discounted to Start.
    pv_outflows: f64,
    /// Inflows compounded to End.
    fv_inflows: f64,
    mirr: f64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net present value as of the last [`recalculate`](Self::recalculate).
    pub fn npv(&self) -> f64 {
        self.npv
    }

    /// Modified internal rate of return, as a percentage. Non-finite when
    /// the timeline has no outflows or zero duration.
    pub fn mirr(&self) -> f64 {
        self.mirr * 100.0
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Rates carried by the most recently appended event, zero if empty.
    ///
    /// Rate attribution is by *append order*, not by event date: the rates
    /// inherited by any new event are whatever the last appended event
    /// carried. This is kept deliberately for output compatibility with
    /// diagrams from the original tool; a date-indexed lookup would differ
    /// only if a caller ever appended out of chronological order, which the
    /// valuation passes never do.
    pub fn last_rates(&self) -> (f64, f64) {
        match self.events.last() {
            Some(e) => (e.fin_rate, e.re_rate),
            None => (0.0, 0.0),
        }
    }

    /// Appends a zero-cash marker event switching the given rate(s). A rate
    /// passed as `None` is copied from the last appended event. Does not
    /// move Start or End.
    pub fn record_rate_change(
        &mut self,
        date: DateTime<Utc>,
        fin_rate: Option<f64>,
        re_rate: Option<f64>,
    ) -> &Event {
        let (last_fin, last_re) = self.last_rates();
        self.events.push(Event {
            date,
            cash: 0.0,
            fin_rate: fin_rate.unwrap_or(last_fin),
            re_rate: re_rate.unwrap_or(last_re),
            years_elapsed: 0.0,
            years_left: 0.0,
        });
        self.events.last().expect("BUG: event was just pushed")
    }

    /// Appends a cash event inheriting the current rates. The first cash
    /// event fixes Start; End advances if `date` exceeds it.
    pub fn record_cash_event(&mut self, date: DateTime<Utc>, cash: f64) -> &Event {
        if self.start.is_none() {
            self.start = Some(date);
        }
        if self.end.map_or(true, |end| date > end) {
            self.end = Some(date);
        }
        let (fin_rate, re_rate) = self.last_rates();
        self.events.push(Event {
            date,
            cash,
            fin_rate,
            re_rate,
            years_elapsed: 0.0,
            years_left: 0.0,
        });
        self.events.last().expect("BUG: event was just pushed")
    }

    /// Rescans every event, rewriting its derived `years_*` fields and the
    /// cached NPV/MIRR sums.
    ///
    /// Degenerate inputs do not panic; they propagate as non-finite values:
    /// no outflows leaves `pv_outflows == 0` so MIRR is infinite, and a
    /// zero-duration timeline makes the MIRR exponent undefined (NaN).
    pub fn recalculate(&mut self) {
        self.npv = 0.0;
        self.pv_outflows = 0.0;
        self.fv_inflows = 0.0;
        self.mirr = 0.0;

        let start = match self.start {
            Some(s) => s,
            None => return,
        };
        let years_total = self.end.map_or(0.0, |end| delta_to_years(end - start));

        for e in &mut self.events {
            let years_elapsed = delta_to_years(e.date - start);
            let years_left = years_total - years_elapsed;
            e.years_elapsed = years_elapsed;
            e.years_left = years_left;

            let pv = e.cash / (1.0 + e.fin_rate).powf(years_elapsed);
            self.npv += pv;

            if e.cash < 0.0 {
                self.pv_outflows -= e.cash / (1.0 + e.fin_rate).powf(years_elapsed);
            } else {
                self.fv_inflows += e.cash * (1.0 + e.re_rate).powf(years_left);
            }
        }

        self.mirr = (self.fv_inflows / self.pv_outflows).powf(1.0 / years_total) - 1.0;
    }
}

pub fn delta_to_years(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / (86_400_000.0 * DAYS_PER_YEAR)
}

/// Converts fractional days to a `TimeDelta` with millisecond precision.
pub fn days_to_delta(days: f64) -> TimeDelta {
    TimeDelta::milliseconds((days * 86_400_000.0) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn start_fixed_by_first_cash_event_end_is_running_max() {
        let mut tl = Timeline::new();
        tl.record_cash_event(date(2024, 1, 1), -100.0);
        tl.record_cash_event(date(2025, 1, 1), 50.0);
        tl.record_cash_event(date(2024, 6, 1), 25.0); // earlier than End
        assert_eq!(tl.start(), Some(date(2024, 1, 1)));
        assert_eq!(tl.end(), Some(date(2025, 1, 1)));
    }

    #[test]
    fn rate_changes_do_not_move_start_or_end() {
        let mut tl = Timeline::new();
        tl.record_rate_change(date(2023, 1, 1), Some(0.05), None);
        assert_eq!(tl.start(), None);
        tl.record_cash_event(date(2024, 1, 1), 100.0);
        assert_eq!(tl.start(), Some(date(2024, 1, 1)));
        assert_eq!(tl.end(), Some(date(2024, 1, 1)));
    }

    #[test]
    fn rates_inherit_by_append_order() {
        let mut tl = Timeline::new();
        tl.record_rate_change(date(2024, 1, 1), Some(0.05), None);
        tl.record_rate_change(date(2024, 1, 1), None, Some(0.08));
        let e = tl.record_cash_event(date(2024, 6, 1), 100.0);
        assert_eq!((e.fin_rate, e.re_rate), (0.05, 0.08));
        // A later rate change supersedes, regardless of its date.
        tl.record_rate_change(date(2020, 1, 1), Some(0.10), None);
        let e = tl.record_cash_event(date(2024, 7, 1), 100.0);
        assert_eq!((e.fin_rate, e.re_rate), (0.10, 0.08));
    }

    #[test]
    fn npv_discounts_each_event_to_start() {
        let mut tl = Timeline::new();
        tl.record_rate_change(date(2024, 1, 1), Some(0.10), Some(0.10));
        tl.record_cash_event(date(2024, 1, 1), -1000.0);
        let one_year = days_to_delta(DAYS_PER_YEAR);
        tl.record_cash_event(date(2024, 1, 1) + one_year, 1100.0);
        tl.recalculate();
        // -1000 + 1100 / 1.1^1 = 0
        assert!(tl.npv().abs() < 1e-9, "npv = {}", tl.npv());
    }

    #[test]
    fn mirr_of_simple_loan() {
        // Outflow 1000 at start, inflow 1210 one year out, re-rate 10%.
        // FV(inflows) = 1210 (already at End), PV(outflows) = 1000.
        // MIRR = (1210/1000)^(1/1) - 1 = 21%.
        let mut tl = Timeline::new();
        tl.record_rate_change(date(2024, 1, 1), Some(0.10), Some(0.10));
        tl.record_cash_event(date(2024, 1, 1), -1000.0);
        tl.record_cash_event(date(2024, 1, 1) + days_to_delta(DAYS_PER_YEAR), 1210.0);
        tl.recalculate();
        assert!((tl.mirr() - 21.0).abs() < 1e-6, "mirr = {}", tl.mirr());
    }

    #[test]
    fn no_outflows_gives_infinite_mirr() {
        let mut tl = Timeline::new();
        tl.record_cash_event(date(2024, 1, 1), 100.0);
        tl.record_cash_event(date(2025, 1, 1), 100.0);
        tl.recalculate();
        assert!(tl.mirr().is_infinite());
        assert_eq!(tl.npv(), 200.0); // rates are 0
    }

    #[test]
    fn zero_duration_timeline_gives_non_finite_mirr_not_a_panic() {
        let mut tl = Timeline::new();
        tl.record_cash_event(date(2024, 1, 1), -100.0);
        tl.record_cash_event(date(2024, 1, 1), 150.0);
        tl.recalculate();
        // The MIRR exponent is 1/0; the ratio 1.5 blows up to +inf.
        assert_eq!(tl.npv(), 50.0);
        assert!(!tl.mirr().is_finite());
    }

    #[test]
    fn empty_timeline_recalculates_to_zeroes() {
        let mut tl = Timeline::new();
        tl.recalculate();
        assert_eq!(tl.npv(), 0.0);
        assert_eq!(tl.mirr(), 0.0);
    }

    #[test]
    fn cloned_timeline_extends_privately() {
        let mut parent = Timeline::new();
        parent.record_cash_event(date(2024, 1, 1), -100.0);
        let mut child = parent.clone();
        child.record_cash_event(date(2025, 1, 1), 300.0);
        assert_eq!(parent.events().len(), 1);
        assert_eq!(child.events().len(), 2);
    }
}
