//! Declarative field tables for the two GDELT datasets.
//!
//! Each dataset is described once: the remote table and date filter, every
//! projected warehouse field with its local column, column type and coercion
//! policy, and the local indexes. Query building, row mapping and storage are
//! all driven from these tables.

use crate::domain::DatasetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// How a warehouse cell becomes a stored value.
///
/// The `*IfTruthy` policies treat `0`, `0.0` and empty text as missing and
/// store null; the plain policies only map a real null to null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Passthrough,
    Integer,
    IntegerIfTruthy,
    Float,
    FloatIfTruthy,
    Text,
    TextIfTruthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name of the field in the warehouse result set.
    pub source: &'static str,
    /// Projection expression when the field is computed in the query.
    pub expression: Option<&'static str>,
    pub column: &'static str,
    pub column_type: ColumnType,
    pub coercion: Coercion,
}

const fn field(
    source: &'static str,
    column: &'static str,
    column_type: ColumnType,
    coercion: Coercion,
) -> FieldSpec {
    FieldSpec {
        source,
        expression: None,
        column,
        column_type,
        coercion,
    }
}

const fn text(source: &'static str, column: &'static str) -> FieldSpec {
    field(source, column, ColumnType::Text, Coercion::Passthrough)
}

const fn integer(source: &'static str, column: &'static str) -> FieldSpec {
    field(source, column, ColumnType::Integer, Coercion::Integer)
}

const fn real(source: &'static str, column: &'static str) -> FieldSpec {
    field(source, column, ColumnType::Real, Coercion::Float)
}

/// Falsy values (`0`, empty text) are stored as null.
const fn truthy_text(
    source: &'static str,
    column: &'static str,
    column_type: ColumnType,
) -> FieldSpec {
    field(source, column, column_type, Coercion::TextIfTruthy)
}

const fn truthy_integer(source: &'static str, column: &'static str) -> FieldSpec {
    field(
        source,
        column,
        ColumnType::Integer,
        Coercion::IntegerIfTruthy,
    )
}

const fn truthy_real(source: &'static str, column: &'static str) -> FieldSpec {
    field(source, column, ColumnType::Real, Coercion::FloatIfTruthy)
}

/// Numeric warehouse ids kept as text.
const fn identifier(source: &'static str, column: &'static str) -> FieldSpec {
    field(source, column, ColumnType::Text, Coercion::Text)
}

const fn derived(
    source: &'static str,
    expression: &'static str,
    column: &'static str,
    column_type: ColumnType,
    coercion: Coercion,
) -> FieldSpec {
    FieldSpec {
        source,
        expression: Some(expression),
        column,
        column_type,
        coercion,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Integer `YYYYMMDD` column compared to integer bounds.
    CompactInteger(&'static str),
    /// Ingestion-time partition column compared to `TIMESTAMP('YYYY-MM-DD')`.
    PartitionTimestamp(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// `INSERT OR IGNORE` against the unique column.
    IgnoreDuplicates,
    /// Plain `INSERT`; re-runs duplicate rows.
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug, PartialEq)]
pub struct DatasetSchema {
    pub kind: DatasetKind,
    pub table: &'static str,
    pub remote_table: &'static str,
    pub date_filter: DateFilter,
    /// Warehouse field that must be non-null for a row to be selected.
    pub required_source: &'static str,
    pub unique_column: Option<&'static str>,
    pub conflict: ConflictPolicy,
    pub fields: &'static [FieldSpec],
    pub indexes: &'static [IndexSpec],
}

impl DatasetSchema {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.column == column)
    }

    pub fn field(&self, column: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.column == column)
    }
}

const EVENT_FIELDS: &[FieldSpec] = &[
    truthy_text("GLOBALEVENTID", "global_event_id", ColumnType::Text),
    truthy_text("SQLDATE", "sql_date", ColumnType::Integer),
    truthy_text("MonthYear", "month_year", ColumnType::Integer),
    truthy_integer("Year", "year"),
    truthy_real("FractionDate", "fraction_date"),
    text("Actor1Code", "actor1_code"),
    text("Actor1Name", "actor1_name"),
    text("Actor1CountryCode", "actor1_country_code"),
    text("Actor1KnownGroupCode", "actor1_known_group_code"),
    text("Actor1EthnicCode", "actor1_ethnic_code"),
    text("Actor1Religion1Code", "actor1_religion1_code"),
    text("Actor1Religion2Code", "actor1_religion2_code"),
    text("Actor1Type1Code", "actor1_type1_code"),
    text("Actor1Type2Code", "actor1_type2_code"),
    text("Actor1Type3Code", "actor1_type3_code"),
    text("Actor2Code", "actor2_code"),
    text("Actor2Name", "actor2_name"),
    text("Actor2CountryCode", "actor2_country_code"),
    text("Actor2KnownGroupCode", "actor2_known_group_code"),
    text("Actor2EthnicCode", "actor2_ethnic_code"),
    text("Actor2Religion1Code", "actor2_religion1_code"),
    text("Actor2Religion2Code", "actor2_religion2_code"),
    text("Actor2Type1Code", "actor2_type1_code"),
    text("Actor2Type2Code", "actor2_type2_code"),
    text("Actor2Type3Code", "actor2_type3_code"),
    integer("IsRootEvent", "is_root_event"),
    text("EventCode", "event_code"),
    text("EventBaseCode", "event_base_code"),
    text("EventRootCode", "event_root_code"),
    integer("QuadClass", "quad_class"),
    real("GoldsteinScale", "goldstein_scale"),
    integer("NumMentions", "num_mentions"),
    integer("NumSources", "num_sources"),
    integer("NumArticles", "num_articles"),
    real("AvgTone", "avg_tone"),
    integer("Actor1Geo_Type", "actor1_geo_type"),
    text("Actor1Geo_FullName", "actor1_geo_full_name"),
    text("Actor1Geo_CountryCode", "actor1_geo_country_code"),
    text("Actor1Geo_ADM1Code", "actor1_geo_adm1_code"),
    text("Actor1Geo_ADM2Code", "actor1_geo_adm2_code"),
    real("Actor1Geo_Lat", "actor1_geo_lat"),
    real("Actor1Geo_Long", "actor1_geo_long"),
    identifier("Actor1Geo_FeatureID", "actor1_geo_feature_id"),
    integer("Actor2Geo_Type", "actor2_geo_type"),
    text("Actor2Geo_FullName", "actor2_geo_full_name"),
    text("Actor2Geo_CountryCode", "actor2_geo_country_code"),
    text("Actor2Geo_ADM1Code", "actor2_geo_adm1_code"),
    text("Actor2Geo_ADM2Code", "actor2_geo_adm2_code"),
    real("Actor2Geo_Lat", "actor2_geo_lat"),
    real("Actor2Geo_Long", "actor2_geo_long"),
    identifier("Actor2Geo_FeatureID", "actor2_geo_feature_id"),
    integer("ActionGeo_Type", "action_geo_type"),
    text("ActionGeo_FullName", "action_geo_full_name"),
    text("ActionGeo_CountryCode", "action_geo_country_code"),
    text("ActionGeo_ADM1Code", "action_geo_adm1_code"),
    text("ActionGeo_ADM2Code", "action_geo_adm2_code"),
    real("ActionGeo_Lat", "action_geo_lat"),
    real("ActionGeo_Long", "action_geo_long"),
    identifier("ActionGeo_FeatureID", "action_geo_feature_id"),
    truthy_text("DATEADDED", "date_added", ColumnType::Integer),
    text("SOURCEURL", "source_url"),
];

pub static EVENTS: DatasetSchema = DatasetSchema {
    kind: DatasetKind::Events,
    table: "events",
    remote_table: "gdelt-bq.gdeltv2.events",
    date_filter: DateFilter::CompactInteger("SQLDATE"),
    required_source: "Actor1Name",
    unique_column: Some("global_event_id"),
    conflict: ConflictPolicy::IgnoreDuplicates,
    fields: EVENT_FIELDS,
    indexes: &[
        IndexSpec {
            name: "idx_events_date",
            column: "sql_date",
        },
        IndexSpec {
            name: "idx_events_actor1",
            column: "actor1_name",
        },
        IndexSpec {
            name: "idx_events_actor2",
            column: "actor2_name",
        },
        IndexSpec {
            name: "idx_events_event_code",
            column: "event_code",
        },
        IndexSpec {
            name: "idx_events_goldstein",
            column: "goldstein_scale",
        },
        IndexSpec {
            name: "idx_events_global_id",
            column: "global_event_id",
        },
    ],
};

const GKG_FIELDS: &[FieldSpec] = &[
    truthy_text("GKGRECORDID", "gkg_record_id", ColumnType::Text),
    truthy_text("DATE", "date", ColumnType::Integer),
    derived(
        "date_ts",
        "PARSE_TIMESTAMP('%Y%m%d%H%M%S', CAST(DATE AS STRING))",
        "date_ts",
        ColumnType::Text,
        Coercion::TextIfTruthy,
    ),
    truthy_text(
        "SourceCollectionIdentifier",
        "source_collection_id",
        ColumnType::Text,
    ),
    text("SourceCommonName", "source_common_name"),
    text("DocumentIdentifier", "document_identifier"),
    text("Counts", "counts"),
    text("V2Counts", "v2_counts"),
    text("Themes", "themes"),
    text("V2Themes", "v2_themes"),
    text("Locations", "locations"),
    text("V2Locations", "v2_locations"),
    text("Persons", "persons"),
    text("V2Persons", "v2_persons"),
    text("Organizations", "organizations"),
    text("V2Organizations", "v2_organizations"),
    text("V2Tone", "v2_tone"),
    text("Dates", "dates"),
    text("GCAM", "gcam"),
    text("SharingImage", "sharing_image"),
    text("RelatedImages", "related_images"),
    text("SocialImageEmbeds", "social_image_embeds"),
    text("SocialVideoEmbeds", "social_video_embeds"),
    text("Quotations", "quotations"),
    text("AllNames", "all_names"),
    text("Amounts", "amounts"),
    text("TranslationInfo", "translation_info"),
    text("Extras", "extras"),
];

pub static GKG: DatasetSchema = DatasetSchema {
    kind: DatasetKind::Gkg,
    table: "gkg",
    remote_table: "gdelt-bq.gdeltv2.gkg_partitioned",
    date_filter: DateFilter::PartitionTimestamp("_PARTITIONTIME"),
    required_source: "DocumentIdentifier",
    unique_column: None,
    conflict: ConflictPolicy::Append,
    fields: GKG_FIELDS,
    indexes: &[
        IndexSpec {
            name: "idx_gkg_date",
            column: "date",
        },
        IndexSpec {
            name: "idx_gkg_source",
            column: "source_common_name",
        },
        IndexSpec {
            name: "idx_gkg_record_id",
            column: "gkg_record_id",
        },
    ],
};
