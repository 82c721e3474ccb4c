use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use pk_zip::{dos_time, ZipArchive};
use std::fs;
use tempfile::tempdir;

// Runs in its own binary so the host time zone can be pinned before the
// first local-time conversion. Every test sets the same zone.

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// Pin New York time; false when the zone database is unavailable.
fn new_york() -> bool {
    std::env::set_var("TZ", "America/New_York");
    if dos_time::is_daylight_saving(at(2023, 7, 15, 12, 0)) {
        true
    } else {
        eprintln!("skipping test: America/New_York zone data not available");
        false
    }
}

/// Save one entry stamped `t` with default options, reopen it and extract it.
/// Returns the stored timestamp and the extracted file's modification time.
fn round_trip(t: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let mut archive = ZipArchive::in_memory();
    archive.add_bytes_with_time("t.txt", b"tick".to_vec(), t).unwrap();
    archive.save().unwrap();

    let reopened = ZipArchive::open_bytes(archive.into_saved_bytes().unwrap()).unwrap();
    let stored = reopened.get("t.txt").unwrap().last_modified();

    let dir = tempdir().unwrap();
    let path = reopened.extract("t.txt", dir.path()).unwrap();
    let modified = fs::metadata(&path).unwrap().modified().unwrap();
    (stored, dos_time::from_system_time(modified))
}

#[test]
fn summer_time_is_stored_an_hour_early_and_restored() {
    if !new_york() {
        return;
    }

    let t = at(2023, 7, 15, 12, 0);
    let (stored, extracted) = round_trip(t);
    assert_eq!(stored, t - TimeDelta::hours(1));
    assert_eq!(extracted, t);
}

#[test]
fn winter_time_is_not_shifted() {
    if !new_york() {
        return;
    }

    let t = at(2023, 1, 15, 12, 0);
    assert!(!dos_time::is_daylight_saving(t));
    let (stored, extracted) = round_trip(t);
    assert_eq!(stored, t);
    assert_eq!(extracted, t);
}

#[test]
fn time_after_spring_forward_keeps_its_mtime() {
    if !new_york() {
        return;
    }

    // 2023-03-12 skips 02:00-03:00; 03:30 is stored as the missing 02:30
    let t = at(2023, 3, 12, 3, 30);
    let (stored, extracted) = round_trip(t);
    assert_eq!(stored, at(2023, 3, 12, 2, 30));
    assert_eq!(extracted, t);
}

#[test]
fn nonexistent_local_time_resolves_past_the_gap() {
    if !new_york() {
        return;
    }

    let resolved = dos_time::to_system_time(at(2023, 3, 12, 2, 30)).unwrap();
    assert_eq!(dos_time::from_system_time(resolved), at(2023, 3, 12, 3, 30));
}
