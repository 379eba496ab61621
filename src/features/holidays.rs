// src/features/holidays.rs
// United States federal holiday calendar, including observed days

use chrono::{Datelike, Days, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: &'static str,
}

fn fixed(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}

/// Saturday holidays are observed on Friday, Sunday ones on Monday.
fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => date.checked_sub_days(Days::new(1)),
        Weekday::Sun => date.checked_add_days(Days::new(1)),
        _ => None,
    }
}

/// Federal holidays of `year`, plus observed days that fall in it.
pub fn us_federal_holidays(year: i32) -> Vec<Holiday> {
    let mut fixed_date = vec![
        ("New Year's Day", fixed(year, 1, 1)),
        ("Independence Day", fixed(year, 7, 4)),
        ("Veterans Day", fixed(year, 11, 11)),
        ("Christmas Day", fixed(year, 12, 25)),
    ];
    if year >= 2021 {
        fixed_date.push(("Juneteenth National Independence Day", fixed(year, 6, 19)));
    }

    let mut floating = vec![
        ("Washington's Birthday", nth_weekday(year, 2, Weekday::Mon, 3)),
        ("Memorial Day", last_weekday(year, 5, Weekday::Mon)),
        ("Labor Day", nth_weekday(year, 9, Weekday::Mon, 1)),
        ("Columbus Day", nth_weekday(year, 10, Weekday::Mon, 2)),
        ("Thanksgiving", nth_weekday(year, 11, Weekday::Thu, 4)),
    ];
    if year >= 1986 {
        floating.push(("Martin Luther King Jr. Day", nth_weekday(year, 1, Weekday::Mon, 3)));
    }

    let mut holidays = Vec::new();
    for (name, date) in fixed_date {
        let Some(date) = date else { continue };
        holidays.push(Holiday { date, name });
        if let Some(shifted) = observed(date).filter(|d| d.year() == year) {
            holidays.push(Holiday { date: shifted, name });
        }
    }
    for (name, date) in floating {
        if let Some(date) = date {
            holidays.push(Holiday { date, name });
        }
    }

    // A Saturday New Year's Day is observed on the last day of the previous year
    if let Some(next_new_year) = fixed(year + 1, 1, 1) {
        if let Some(shifted) = observed(next_new_year).filter(|d| d.year() == year) {
            holidays.push(Holiday { date: shifted, name: "New Year's Day" });
        }
    }

    holidays.sort_by_key(|h| h.date);
    holidays
}

/// Name of the holiday on `date`, if any.
pub fn us_holiday_name(date: NaiveDate) -> Option<&'static str> {
    us_federal_holidays(date.year())
        .into_iter()
        .find(|h| h.date == date)
        .map(|h| h.name)
}

pub fn is_us_holiday(date: NaiveDate) -> bool {
    us_holiday_name(date).is_some()
}
