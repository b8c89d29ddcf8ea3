#[macro_use]
pub mod record;

pub mod batting;
pub mod field;
pub mod fielding;
pub mod normalize;
pub mod pitching;
pub mod player;
pub mod raw_row;
pub mod stat_kind;
pub mod year_range;

pub use batting::BattingRecord;
pub use field::{DefaultPolicy, FieldSpec, FieldType, MetricValue};
pub use fielding::FieldingRecord;
pub use normalize::{normalize, NormalizedRow, RowMappingError};
pub use pitching::PitchingRecord;
pub use player::{Player, PlayerCandidate};
pub use raw_row::{JoinKey, RawRow};
pub use record::StatRecord;
pub use stat_kind::StatKind;
pub use year_range::{plan_ranges, RangeError, YearRange};
