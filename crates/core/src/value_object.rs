//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. A
/// `Money` amount of `150.00` equals any other `Money` of `150.00`; a monthly
/// revenue record, in contrast, is an entity identified by its `RecordId`.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
