//! Bidirectional flow correlation (§4.4 steps 1-6): the classic two-sided
//! merge problem. Keys the map with the directional tuple (§9) and merges
//! one arriving record into the stored accumulator in place.

use crate::codec::value::FieldValue;
use crate::codec::Record;

use super::record::AggregationRecord;

/// One correlate-field pair: a non-statistical IE present on only one
/// side of the flow (§4.4, §9's `source-side`/`destination-side` naming).
/// E.g. `source_field = "sourcePodName"`, `destination_field =
/// "destinationPodName"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelateField {
    pub source_field: String,
    pub destination_field: String,
}

impl CorrelateField {
    pub fn new(source_field: impl Into<String>, destination_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            destination_field: destination_field.into(),
        }
    }
}

/// The four element lists `Init`'s `aggregate-elements` input carries
/// (§4.4): which elements overwrite-on-newer, which merge with the
/// Total=max/Delta=sum law, and which get a per-side tracked copy.
#[derive(Debug, Clone, Default)]
pub struct AggregateElements {
    pub non_stats_elements: Vec<String>,
    pub stats_elements: Vec<String>,
    pub source_side_stats_elements: Vec<String>,
    pub destination_side_stats_elements: Vec<String>,
}

/// Which side of a flow an arriving record represents, determined by
/// which correlate-field it carries a non-empty value for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Destination,
    Unknown,
}

fn arrival_side(incoming: &Record, correlate_fields: &[CorrelateField]) -> Side {
    for field in correlate_fields {
        if let Some(v) = incoming.get(&field.source_field) {
            if !v.is_empty_value() {
                return Side::Source;
            }
        }
        if let Some(v) = incoming.get(&field.destination_field) {
            if !v.is_empty_value() {
                return Side::Destination;
            }
        }
    }
    Side::Unknown
}

/// Merges `incoming` into `stored`, implementing spec §4.4 steps 2-6.
/// Step 1 (locate-or-insert) is the caller's responsibility since it
/// owns the flow-record map.
pub fn merge(
    stored: &mut AggregationRecord,
    incoming: &Record,
    correlate_fields: &[CorrelateField],
    elements: &AggregateElements,
) {
    stored.touch();

    // Step 2: copy-if-empty for correlate fields.
    for field in correlate_fields {
        copy_if_empty(&mut stored.record, incoming, &field.source_field);
        copy_if_empty(&mut stored.record, incoming, &field.destination_field);
    }

    // Step 3: non-stats elements overwrite on newer value (ties favor incoming).
    for name in &elements.non_stats_elements {
        if let Some(incoming_value) = incoming.get(name) {
            match (numeric(incoming_value), stored.record.get(name).and_then(numeric)) {
                (Some(new), Some(old)) if new >= old => overwrite(&mut stored.record, incoming, name),
                (Some(_), None) => overwrite(&mut stored.record, incoming, name),
                _ if stored.record.get(name).is_none() => overwrite(&mut stored.record, incoming, name),
                _ => {}
            }
        }
    }

    // Step 4: stats elements merge Total=max, Delta=sum.
    for name in &elements.stats_elements {
        if let Some(incoming_value) = incoming.get(name) {
            let merged = match stored.record.get(name) {
                Some(existing) => merge_stat(name, existing, incoming_value),
                None => incoming_value.clone(),
            };
            set_field(&mut stored.record, incoming, name, merged);
        }
    }

    // Step 5: per-side stats copies, annotated by originating side.
    let side = arrival_side(incoming, correlate_fields);
    match side {
        Side::Source => copy_side_stats(&mut stored.source_side_stats, incoming, &elements.source_side_stats_elements),
        Side::Destination => {
            copy_side_stats(&mut stored.destination_side_stats, incoming, &elements.destination_side_stats_elements)
        }
        Side::Unknown => {}
    }

    // Step 6: correlated iff every correlate-field pair is non-empty on both sides.
    stored.correlated = correlate_fields.iter().all(|field| {
        is_non_empty(&stored.record, &field.source_field) && is_non_empty(&stored.record, &field.destination_field)
    });
}

fn is_non_empty(record: &Record, name: &str) -> bool {
    record.get(name).is_some_and(|v| !v.is_empty_value())
}

fn copy_if_empty(stored: &mut Record, incoming: &Record, name: &str) {
    let Some(incoming_value) = incoming.get(name) else { return };
    if incoming_value.is_empty_value() {
        return;
    }
    let stored_is_empty = stored.get(name).is_none_or(|v| v.is_empty_value());
    if stored_is_empty {
        set_field(stored, incoming, name, incoming_value.clone());
    }
}

fn overwrite(stored: &mut Record, incoming: &Record, name: &str) {
    if let Some(value) = incoming.get(name) {
        set_field(stored, incoming, name, value.clone());
    }
}

fn merge_stat(name: &str, existing: &FieldValue, incoming: &FieldValue) -> FieldValue {
    let (Some(a), Some(b)) = (numeric(existing), numeric(incoming)) else {
        return incoming.clone();
    };
    let merged = if name.contains("Total") {
        a.max(b)
    } else if name.contains("Delta") {
        a.saturating_add(b)
    } else {
        b
    };
    match incoming {
        FieldValue::DateTime(_) => FieldValue::DateTime(merged),
        _ => FieldValue::Unsigned(merged),
    }
}

fn copy_side_stats(side_stats: &mut Record, incoming: &Record, names: &[String]) {
    for name in names {
        if let Some(value) = incoming.get(name) {
            set_field(side_stats, incoming, name, value.clone());
        }
    }
}

/// Sets `name` on `target`, pulling the element definition from
/// `source_of_definition` (the incoming record, which is guaranteed to
/// carry a valid `IeValue` for any field it has).
fn set_field(target: &mut Record, source_of_definition: &Record, name: &str, value: FieldValue) {
    let Some(ie) = source_of_definition.iter().find(|f| f.name() == name) else {
        return;
    };
    let element = ie.element.clone();
    // Record has no in-place "set or insert"; rebuild by removing any
    // existing field with this name then pushing the new one.
    let mut fields: Vec<_> = target.iter().filter(|f| f.name() != name).cloned().collect();
    fields.push(crate::codec::element::IeValue { element, value });
    *target = Record::default();
    for field in fields {
        target.push(field);
    }
}

fn numeric(value: &FieldValue) -> Option<u64> {
    match value {
        FieldValue::Unsigned(v) | FieldValue::DateTime(v) => Some(*v),
        FieldValue::Signed(v) => u64::try_from(*v).ok(),
        _ => None,
    }
}
