use time::format_description::FormatItem;
use time::macros::format_description;

use crate::models::types::LocalDateTime;

const DATETIME_FORMAT: &[FormatItem<'_>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute] [period]"
);

pub fn format_local(date_time: LocalDateTime) -> String {
    let primitive: time::PrimitiveDateTime = date_time.into();
    primitive
        .format(DATETIME_FORMAT)
        .expect("Hard-coded format should be correct")
}
