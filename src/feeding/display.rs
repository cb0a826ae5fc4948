use time::{Date, Month};

/// Human-readable age. With a birthday on file and at least four weeks of
/// age the breakdown is calendar-accurate; otherwise it is bucketed from the
/// raw week count. `today` is passed in so the function stays deterministic.
pub fn format_age(age_weeks: f64, birthday: Option<Date>, today: Date) -> String {
    if let Some(birthday) = birthday {
        if age_weeks >= 4.0 {
            return calendar_breakdown(birthday, today);
        }
    }
    week_breakdown(age_weeks)
}

fn week_breakdown(age_weeks: f64) -> String {
    let weeks = age_weeks.max(0.0).floor() as i64;
    if weeks < 12 {
        return plural(weeks, "week");
    }
    if weeks < 52 {
        return join_parts(&[(weeks / 4, "month"), (weeks % 4, "week")]);
    }
    join_parts(&[(weeks / 52, "year"), (weeks % 52 / 4, "month")])
}

fn calendar_breakdown(birthday: Date, today: Date) -> String {
    let mut years = today.year() - birthday.year();
    let mut months = i32::from(today.month() as u8) - i32::from(birthday.month() as u8);
    let mut days = i32::from(today.day()) - i32::from(birthday.day());

    // Borrow days from the month(s) preceding today until the day count is
    // non-negative.
    let (mut y, mut m) = (today.year(), today.month());
    while days < 0 {
        months -= 1;
        let (py, pm) = match m {
            Month::January => (y - 1, Month::December),
            _ => (y, m.previous()),
        };
        days += i32::from(time::util::days_in_year_month(py, pm));
        y = py;
        m = pm;
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }

    join_parts(&[
        (i64::from(years), "year"),
        (i64::from(months), "month"),
        (i64::from(days), "day"),
    ])
}

/// Known stage codes map to display labels; anything else is title-cased
/// with underscores turned into spaces.
pub fn format_life_stage(code: &str) -> String {
    match code {
        "kitten_0_4m" => "Kitten 0–4 months".to_string(),
        "kitten_4_12m" => "Kitten 4–12 months".to_string(),
        "adult_neutered" => "Adult, neutered".to_string(),
        "adult_intact" => "Adult, intact".to_string(),
        "adult_obese_prone" => "Adult, obese-prone".to_string(),
        other => title_case(other),
    }
}

fn title_case(code: &str) -> String {
    code.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Join non-zero components; an all-zero breakdown keeps the last unit so
/// something is always shown.
fn join_parts(parts: &[(i64, &str)]) -> String {
    let nonzero: Vec<String> = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|&(n, unit)| plural(n, unit))
        .collect();
    if nonzero.is_empty() {
        let &(n, unit) = parts.last().expect("at least one part");
        return plural(n, unit);
    }
    nonzero.join(", ")
}
