//! User-facing failure texts published through `ModelEvent::ModelError`

use mrtp_core::MrtpError;

pub(crate) fn generic_error(err: &MrtpError) -> String {
    generic_text(&err.engine_message())
}

pub(crate) fn generic_text(text: &str) -> String {
    format!("Error: {}", text)
}

/// `entity` is singular and lowercase, e.g. "station"
pub(crate) fn name_already_used(entity: &str, name: &str) -> String {
    format!(
        "The name {name} is already used by another {entity}. \
         Please choose a different name for each {entity}."
    )
}

pub(crate) fn short_name_already_used(name: &str, station: &str) -> String {
    if station.is_empty() {
        format!(
            "The name {name} is already used as short name for another station. \
             Please choose a different name for each station."
        )
    } else {
        format!(
            "The name {name} is already used as short name for station {station}. \
             Please choose a different name for each station."
        )
    }
}

pub(crate) fn name_equals_short_name(name: &str) -> String {
    format!("Name and short name cannot be equal ({name}).")
}

pub(crate) fn phone_already_used(number: i64) -> String {
    format!(
        "The phone number {number} is already used by another station. \
         Please choose a different phone number for each station."
    )
}

pub(crate) fn station_in_use(name: &str) -> String {
    format!(
        "Cannot delete {name} station because it is still referenced. \
         Please delete all jobs stopping here and remove the station from any line."
    )
}

/// Generic "still referenced" text for every other record kind
pub(crate) fn still_referenced(entity: &str, name: &str) -> String {
    format!("Cannot delete {entity} {name} because it is still referenced.")
}

pub(crate) fn record_gone() -> String {
    generic_text("the record no longer exists, reload the table")
}

pub(crate) fn number_already_used(model: &str, number: i64) -> String {
    format!("Rollingstock {model} number {number} already exists.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texts_name_the_offending_value() {
        assert!(name_already_used("station", "Milano").contains("Milano"));
        assert!(short_name_already_used("MI", "Milano").contains("station Milano"));
        assert!(short_name_already_used("MI", "").contains("another station"));
        assert!(phone_already_used(1234).contains("1234"));
        assert!(station_in_use("Roma").starts_with("Cannot delete Roma station"));
    }

    #[test]
    fn generic_error_strips_variant_prefix() {
        let err = MrtpError::Query("no such column: foo".into());
        assert_eq!(generic_error(&err), "Error: no such column: foo");
    }
}
