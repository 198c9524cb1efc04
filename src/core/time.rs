use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Academic year label (`2025-2026`) containing `date`, for a school year that opens on the
/// first day of `start_month`.
pub(crate) fn academic_year_for(date: Date, start_month: u8) -> String {
    let year = date.year();
    let start = if u8::from(date.month()) >= start_month { year } else { year - 1 };
    format!("{start}-{}", start + 1)
}

pub(crate) fn current_academic_year(start_month: u8) -> String {
    academic_year_for(OffsetDateTime::now_utc().date(), start_month)
}

pub(crate) fn is_academic_year(value: &str) -> bool {
    let Some((first, second)) = value.split_once('-') else {
        return false;
    };
    match (first.parse::<i32>(), second.parse::<i32>()) {
        (Ok(first), Ok(second)) => first.to_string().len() == 4 && second == first + 1,
        _ => false,
    }
}
