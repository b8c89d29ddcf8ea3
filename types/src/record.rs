use crate::field::{FieldSpec, MetricValue};
use crate::stat_kind::StatKind;

/// A typed per-season stat row together with its column mapping table.
///
/// Implemented through `stat_record!`, which keeps the struct fields, the
/// mapping table and the storage column order in one declaration.
pub trait StatRecord: Clone + Send + Sync + 'static {
    const KIND: StatKind;
    /// Storage table name.
    const TABLE: &'static str;
    /// Columns forming the natural key, used for upserts.
    const CONFLICT_KEY: &'static [&'static str];
    /// Mapping table, in storage column order.
    const FIELDS: &'static [FieldSpec];

    fn new(player_id: i64, year: i32) -> Self;
    fn player_id(&self) -> i64;
    fn year(&self) -> i32;
    fn set_player_id(&mut self, player_id: i64);
    /// Returns false if `field` is not part of this record.
    fn set_metric(&mut self, field: &str, value: MetricValue) -> bool;
    /// One value per entry of `FIELDS`, in the same order.
    fn metrics(&self) -> Vec<MetricValue>;

    /// Natural key values beyond (player_id, year), e.g. the fielding position.
    fn key_parts(&self) -> Vec<Option<String>> {
        Self::FIELDS
            .iter()
            .zip(self.metrics())
            .filter(|(spec, _)| Self::CONFLICT_KEY.contains(&spec.field))
            .map(|(_, value)| match value {
                MetricValue::Int(v) => v.map(|v| v.to_string()),
                MetricValue::Float(v) => v.map(|v| v.to_string()),
                MetricValue::Text(v) => v,
            })
            .collect()
    }
}

macro_rules! stat_record {
    (@ty Int) => { Option<i64> };
    (@ty Float) => { Option<f64> };
    (@ty Text) => { Option<String> };
    (@policy) => { $crate::field::DefaultPolicy::Null };
    (@policy $policy:ident) => { $crate::field::DefaultPolicy::$policy };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            kind: $kind:expr,
            table: $table:literal,
            key: [$($key:literal),* $(,)?],
            fields {
                $( $field:ident : $ty:ident => $column:literal $(=> $policy:ident)? ),* $(,)?
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        $vis struct $name {
            pub player_id: i64,
            pub year: i32,
            $( pub $field: stat_record!(@ty $ty), )*
        }

        impl $crate::record::StatRecord for $name {
            const KIND: $crate::stat_kind::StatKind = $kind;
            const TABLE: &'static str = $table;
            const CONFLICT_KEY: &'static [&'static str] = &[$($key),*];
            const FIELDS: &'static [$crate::field::FieldSpec] = &[
                $(
                    $crate::field::FieldSpec {
                        field: stringify!($field),
                        column: $column,
                        ty: $crate::field::FieldType::$ty,
                        policy: stat_record!(@policy $($policy)?),
                    },
                )*
            ];

            fn new(player_id: i64, year: i32) -> Self {
                Self {
                    player_id,
                    year,
                    ..Default::default()
                }
            }

            fn player_id(&self) -> i64 {
                self.player_id
            }

            fn year(&self) -> i32 {
                self.year
            }

            fn set_player_id(&mut self, player_id: i64) {
                self.player_id = player_id;
            }

            fn set_metric(&mut self, field: &str, value: $crate::field::MetricValue) -> bool {
                $(
                    if field == stringify!($field) {
                        self.$field = $crate::field::FromMetric::from_metric(value);
                        return true;
                    }
                )*
                false
            }

            fn metrics(&self) -> Vec<$crate::field::MetricValue> {
                vec![ $( $crate::field::ToMetric::to_metric(&self.$field), )* ]
            }
        }
    };
}
