use chrono::NaiveTime;

use crate::limits::LAST_SLOT_LEAD_MINUTES;
use crate::model::{Minute, minute_of, time_of};

/// Bookable start times from `opening`, every `interval` minutes, up to but
/// not including `closing - 59 minutes`. Empty if closing is not after opening.
pub fn booking_slots(opening: NaiveTime, closing: NaiveTime, interval: Minute) -> Vec<NaiveTime> {
    if interval <= 0 || closing <= opening {
        return Vec::new();
    }
    let last = minute_of(closing) - LAST_SLOT_LEAD_MINUTES;
    (minute_of(opening)..last)
        .step_by(interval as usize)
        .map(time_of)
        .collect()
}
