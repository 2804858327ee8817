use chrono::NaiveTime;

use crate::config::VenueConfig;
use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// Does an existing booking's span take its tables away from `requested`?
///
/// Three cases, unioned:
/// - the existing booking starts strictly inside the requested span,
/// - it ends strictly inside the requested span,
/// - it covers the requested span entirely.
///
/// Bookings all last the same fixed duration, so one can never sit strictly
/// inside another and these cases catch every overlap.
pub fn blocks(existing: &Span, requested: &Span) -> bool {
    requested.strictly_contains(existing.start)
        || requested.strictly_contains(existing.end)
        || existing.covers(requested)
}

pub(crate) fn validate_party_size(config: &VenueConfig, party_size: u32) -> Result<(), EngineError> {
    if party_size == 0 || party_size > config.max_party_size {
        return Err(EngineError::InvalidPartySize(party_size));
    }
    Ok(())
}

/// Start time must be one of the venue's bookable slots.
pub(crate) fn validate_start(config: &VenueConfig, time: NaiveTime) -> Result<(), EngineError> {
    if !config.booking_slots().contains(&time) {
        return Err(EngineError::OutsideOpeningHours(time));
    }
    Ok(())
}

pub(crate) fn validate_table_size(config: &VenueConfig, capacity: u32) -> Result<(), EngineError> {
    if !config.table_sizes.contains(&capacity) {
        return Err(EngineError::InvalidTableSize(capacity));
    }
    Ok(())
}

/// Length caps count characters, not bytes.
pub(crate) fn validate_contact(contact: &Contact) -> Result<(), EngineError> {
    let name = contact.name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidContact("name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::InvalidContact("name too long"));
    }
    let email = contact.email.trim();
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(EngineError::InvalidContact("email too long"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(EngineError::InvalidContact("email is invalid")),
    }
    let phone = contact.phone.trim();
    if phone.is_empty() {
        return Err(EngineError::InvalidContact("phone number is required"));
    }
    if phone.chars().count() > MAX_PHONE_LEN {
        return Err(EngineError::InvalidContact("phone number too long"));
    }
    if let Some(ref req) = contact.special_requirements
        && req.chars().count() > MAX_REQUIREMENTS_LEN
    {
        return Err(EngineError::InvalidContact("special requirements too long"));
    }
    Ok(())
}

pub(crate) fn validate_customer(customer: Option<&str>) -> Result<(), EngineError> {
    if let Some(c) = customer
        && (c.is_empty() || c.chars().count() > MAX_CUSTOMER_ID_LEN)
    {
        return Err(EngineError::LimitExceeded("customer id length"));
    }
    Ok(())
}
