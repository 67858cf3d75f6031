use std::hint::black_box;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use tutor_schedule::{
    compute_available_slots, partition_by_conflict, AvailabilityWindow, BookedSession, ClockTime,
    Frequency, RecurrencePlan,
};

fn busy_week() -> (Vec<AvailabilityWindow>, Vec<BookedSession>) {
    let windows = (0..7u8)
        .flat_map(|day| {
            [
                AvailabilityWindow::new(day, ClockTime::from_hm(8, 0).unwrap(), ClockTime::from_hm(12, 0).unwrap()),
                AvailabilityWindow::new(day, ClockTime::from_hm(13, 0).unwrap(), ClockTime::from_hm(21, 0).unwrap()),
            ]
        })
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let origin = Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap();
    let booked = (0..200)
        .map(|i| BookedSession {
            scheduled_at: origin + Duration::minutes(i * 47),
            duration: 45,
        })
        .collect();
    (windows, booked)
}

fn bench_slots(c: &mut Criterion) {
    let (windows, booked) = busy_week();
    let date = NaiveDate::from_ymd_opt(2026, 3, 18).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
    let tz = chrono_tz::America::New_York;

    c.bench_function("compute_available_slots busy day", |b| {
        b.iter(|| {
            compute_available_slots(
                black_box(date),
                black_box(&windows),
                black_box(&booked),
                60,
                now,
                &tz,
            )
        })
    });

    let plan = RecurrencePlan::new(date, ClockTime::from_hm(15, 0).unwrap(), Frequency::Weekly, 52)
        .unwrap();
    c.bench_function("expand and partition 52 weekly", |b| {
        b.iter(|| {
            let occurrences = plan.expand(&tz);
            partition_by_conflict(black_box(&occurrences), black_box(&booked), 60)
        })
    });
}

criterion_group!(benches, bench_slots);
criterion_main!(benches);
