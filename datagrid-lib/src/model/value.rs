//! Value enum for dynamic field values

use std::cmp::Ordering;
use std::fmt;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::Record;

/// A dynamic value held by a record field or a filter payload.
///
/// # Type Mapping
///
/// | JSON / SQL type | Rust Variant |
/// |-----------------|--------------|
/// | null | `Null` |
/// | boolean | `Bool` |
/// | integer (32 bit) | `Int` |
/// | integer (64 bit) | `Long` |
/// | real | `Float` |
/// | text | `String` |
/// | object | `Record` |
/// | array | `List` |
///
/// `Decimal`, `Guid`, `DateTime` and `Date` are built from typed Rust values;
/// text is never reinterpreted on ingestion.
///
/// The derived serde representation is the binary cache format. JSON goes
/// through [`Value::from_json`] and [`Value::to_json`] instead.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::Value;
///
/// let name = Value::from("Anna");
/// let age = Value::from(30);
/// let active = Value::from(true);
/// let empty = Value::Null;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null/empty value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Arbitrary precision decimal.
    Decimal(Decimal),
    /// String value.
    String(String),
    /// GUID/UUID value.
    Guid(Uuid),
    /// Date and time.
    DateTime(DateTime<Utc>),
    /// Calendar date without a time.
    Date(NaiveDate),
    /// Nested record (a related entity).
    Record(Box<Record>),
    /// Ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value carries no usable content.
    ///
    /// Null, whitespace-only strings and empty lists are blank. Filters whose
    /// value is blank are inactive.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::List(items) => items.iter().all(Value::is_blank),
            _ => false,
        }
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Guid(_) => "guid",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    /// Returns `true` for the numeric variants.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Decimal(_)
        )
    }

    /// Returns the text used for substring matching, or `None` for null and nested records.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::Record(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Reads the value as a float, parsing numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Decimal(d) => d.to_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Reads the value as a boolean.
    ///
    /// Only booleans and the integers `0`/`1` (the usual SQL storage) qualify.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(0) | Value::Long(0) => Some(false),
            Value::Int(1) | Value::Long(1) => Some(true),
            _ => None,
        }
    }

    /// Reads the value as a UTC timestamp.
    ///
    /// Dates are read as midnight UTC. Strings are accepted in RFC 3339,
    /// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` forms.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            Value::String(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Reads the leading numeric portion of the value the way SQL `expr + 0` does.
    ///
    /// `"42abc"` reads as `42`, `"abc"` reads as `0`, null stays `None`.
    pub fn numeric_prefix(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => Some(leading_number(s)),
            other => Some(other.as_f64().unwrap_or(0.0)),
        }
    }

    /// Compares two values across compatible types.
    ///
    /// Numbers compare numerically (numeric strings included), timestamps and
    /// dates chronologically, strings lexicographically. Returns `None` when
    /// the values are not comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Guid(a), Value::Guid(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() || b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (a, b) if a.is_temporal() || b.is_temporal() => {
                Some(a.as_datetime()?.cmp(&b.as_datetime()?))
            }
            (a, b) => Some(a.to_text()?.cmp(&b.to_text()?)),
        }
    }

    /// Loose equality used by `equals` filters.
    ///
    /// `30`, `30.0` and `"30"` are all equal; other values compare by text.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Bool(a), b) | (b, Value::Bool(a)) => b.as_bool() == Some(*a),
            _ => matches!(self.compare(other), Some(Ordering::Equal)),
        }
    }

    fn is_temporal(&self) -> bool {
        matches!(self, Value::DateTime(_) | Value::Date(_))
    }

    /// Converts a JSON value into a `Value`.
    ///
    /// Objects become nested records. Strings stay text as given; temporal
    /// comparisons parse them on demand.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => Value::Int(small),
                        Err(_) => Value::Long(i),
                    }
                } else {
                    n.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Record(Box::new(Record::from_json_map(map))),
        }
    }

    /// Converts the value into its JSON representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Long(n) => serde_json::Value::from(*n),
            Value::Float(n) => serde_json::Value::from(*n),
            Value::Decimal(d) => d
                .to_f64()
                .map(serde_json::Value::from)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Guid(g) => serde_json::Value::String(g.to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::Record(r) => r.to_json(),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

// Longest prefix of `s` that parses as a number, else 0.
fn leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    s[..end].trim_end_matches('.').parse().unwrap_or(0.0)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => f.write_str(s),
            Value::Guid(g) => write!(f, "{}", g),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Record(r) => write!(f, "{}", r.to_json()),
            Value::List(items) => {
                let parts: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Guid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(Box::new(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_equality_across_numeric_types() {
        assert!(Value::from(30).loose_eq(&Value::from(30i64)));
        assert!(Value::from(30).loose_eq(&Value::from("30")));
        assert!(Value::from(30.0).loose_eq(&Value::from(30)));
        assert!(!Value::from(30).loose_eq(&Value::from(25)));
        assert!(!Value::Null.loose_eq(&Value::from(0)));
    }

    #[test]
    fn test_bool_equality_accepts_sql_integers() {
        assert!(Value::from(true).loose_eq(&Value::from(1)));
        assert!(Value::from(0).loose_eq(&Value::from(false)));
        assert!(!Value::from(true).loose_eq(&Value::from("true")));
    }

    #[test]
    fn test_numeric_prefix() {
        assert_eq!(Value::from("42abc").numeric_prefix(), Some(42.0));
        assert_eq!(Value::from("abc").numeric_prefix(), Some(0.0));
        assert_eq!(Value::from("-3.5").numeric_prefix(), Some(-3.5));
        assert_eq!(Value::from("10.").numeric_prefix(), Some(10.0));
        assert_eq!(Value::Null.numeric_prefix(), None);
    }

    #[test]
    fn test_compare_dates_and_strings() {
        let date = Value::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            date.compare(&Value::from("2024-02-28")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::from("apple").compare(&Value::from("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from(1).compare(&Value::Null), None);
    }

    #[test]
    fn test_blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("  ").is_blank());
        assert!(Value::List(vec![]).is_blank());
        assert!(!Value::from(0).is_blank());
        assert!(!Value::from(false).is_blank());
    }

    #[test]
    fn test_from_json_types() {
        let json = serde_json::json!({
            "id": 1,
            "big": 10_000_000_000i64,
            "created": "2024-01-05",
            "opened": "2024-03-05T10:00:00+02:00",
            "tags": ["a", "b"],
        });
        let Value::Record(record) = Value::from_json(json) else {
            panic!("expected nested record");
        };
        assert_eq!(record.get("id"), Some(&Value::Int(1)));
        assert_eq!(record.get("big"), Some(&Value::Long(10_000_000_000)));
        assert_eq!(record.get("created"), Some(&Value::from("2024-01-05")));
        assert_eq!(
            record.get("opened"),
            Some(&Value::from("2024-03-05T10:00:00+02:00"))
        );
        let day = Value::from(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(record.get("opened").unwrap().compare(&day), Some(Ordering::Greater));
        assert_eq!(
            record.get("tags").and_then(Value::to_text),
            Some("a, b".to_string())
        );
    }
}
