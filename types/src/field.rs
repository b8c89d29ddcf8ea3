use serde_json::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Float,
    Text,
}

impl FieldType {
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Int => "INTEGER",
            FieldType::Float => "REAL",
            FieldType::Text => "TEXT",
        }
    }
}

/// What the normalizer does when a mapped column is absent or null.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DefaultPolicy {
    /// Absent values become `None`. Never a numeric stand-in.
    Null,
    /// Absent values fail the row.
    Required,
}

/// One entry of a record's mapping table: provider column to domain field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: &'static str,
    pub column: &'static str,
    pub ty: FieldType,
    pub policy: DefaultPolicy,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MetricValue {
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
}

impl MetricValue {
    pub fn null(ty: FieldType) -> Self {
        match ty {
            FieldType::Int => MetricValue::Int(None),
            FieldType::Float => MetricValue::Float(None),
            FieldType::Text => MetricValue::Text(None),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(
            self,
            MetricValue::Int(None) | MetricValue::Float(None) | MetricValue::Text(None)
        )
    }
}

pub trait FromMetric: Sized {
    fn from_metric(value: MetricValue) -> Self;
}

pub trait ToMetric {
    fn to_metric(&self) -> MetricValue;
}

impl FromMetric for Option<i64> {
    fn from_metric(value: MetricValue) -> Self {
        match value {
            MetricValue::Int(v) => v,
            MetricValue::Float(v) => v.map(|f| f as i64),
            MetricValue::Text(v) => v.and_then(|s| s.parse().ok()),
        }
    }
}

impl FromMetric for Option<f64> {
    fn from_metric(value: MetricValue) -> Self {
        match value {
            MetricValue::Int(v) => v.map(|i| i as f64),
            MetricValue::Float(v) => v,
            MetricValue::Text(v) => v.and_then(|s| s.parse().ok()),
        }
    }
}

impl FromMetric for Option<String> {
    fn from_metric(value: MetricValue) -> Self {
        match value {
            MetricValue::Int(v) => v.map(|i| i.to_string()),
            MetricValue::Float(v) => v.map(|f| f.to_string()),
            MetricValue::Text(v) => v,
        }
    }
}

impl ToMetric for Option<i64> {
    fn to_metric(&self) -> MetricValue {
        MetricValue::Int(*self)
    }
}

impl ToMetric for Option<f64> {
    fn to_metric(&self) -> MetricValue {
        MetricValue::Float(*self)
    }
}

impl ToMetric for Option<String> {
    fn to_metric(&self) -> MetricValue {
        MetricValue::Text(self.clone())
    }
}

/// Why a present value could not be read as the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub expected: FieldType,
    pub found: String,
}

fn is_missing_text(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s == "-"
}

/// Reads an integer. Integral floats and numeric strings are accepted,
/// fractional values are not.
pub fn parse_int(value: &Value) -> Result<Option<i64>, ParseFailure> {
    let fail = || ParseFailure {
        expected: FieldType::Int,
        found: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(fail()),
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if is_missing_text(trimmed) {
                return Ok(None);
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Some(i));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(fail()),
            }
        }
        _ => Err(fail()),
    }
}

/// Reads a float. Percent-suffixed strings ("12.5 %") are read as the bare
/// number.
pub fn parse_float(value: &Value) -> Result<Option<f64>, ParseFailure> {
    let fail = || ParseFailure {
        expected: FieldType::Float,
        found: value.to_string(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(fail),
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim_end();
            if is_missing_text(trimmed) {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Some(f)),
                _ => Err(fail()),
            }
        }
        _ => Err(fail()),
    }
}

pub fn parse_text(value: &Value) -> Result<Option<String>, ParseFailure> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            if is_missing_text(trimmed) {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(ParseFailure {
            expected: FieldType::Text,
            found: value.to_string(),
        }),
    }
}

pub fn parse_value(ty: FieldType, value: &Value) -> Result<MetricValue, ParseFailure> {
    Ok(match ty {
        FieldType::Int => MetricValue::Int(parse_int(value)?),
        FieldType::Float => MetricValue::Float(parse_float(value)?),
        FieldType::Text => MetricValue::Text(parse_text(value)?),
    })
}
