//! Display names for collected field keys

/// Known field keys and how they read in the panels
const FIELD_LABELS: &[(&str, &str)] = &[
    ("report_type", "Report type"),
    ("report_name", "Report name"),
    ("merchant_id", "Merchant ID"),
    ("store_id", "Store ID"),
    ("date_range", "Date range"),
    ("start_date", "Start date"),
    ("end_date", "End date"),
    ("frequency", "Frequency"),
    ("schedule_time", "Schedule time"),
    ("day_of_week", "Day of week"),
    ("day_of_month", "Day of month"),
    ("timezone", "Time zone"),
    ("delivery_method", "Delivery method"),
    ("email", "Email"),
    ("recipients", "Recipients"),
    ("format", "Format"),
    ("filters", "Filters"),
    ("metrics", "Metrics"),
    ("language", "Language"),
];

/// Display name for a field key, or the key itself when unknown
pub fn field_label(key: &str) -> &str {
    FIELD_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}
