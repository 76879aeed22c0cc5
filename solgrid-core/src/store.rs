//! Spatial store access for feature sources and persisted tables.
//!
//! The `FeatureStore` trait is the single seam between the pipeline and
//! whatever holds the geometry tables. One store handle is injected into
//! each stage explicitly; stages never open their own connections. The
//! core treats the store as a key-value-by-geometry service: bulk read of
//! a named table, an intersects filter, and create-or-replace persistence
//! of a row set.

use std::collections::BTreeMap;

use geo::{BoundingRect, Geometry, Intersects, Rect};
use thiserror::Error;

use crate::{Extent, ExtentError, FeatureValue, NOT_IMPLEMENTED_SENTINEL};

/// Error raised by [`FeatureStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the backing store failed.
    #[error("failed to open store at {path}")]
    Open {
        /// Location of the store.
        path: String,
        /// Driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A table name contained characters the store cannot quote safely.
    #[error("invalid table name {table:?}")]
    InvalidTableName {
        /// The rejected name.
        table: String,
    },
    /// Reading rows from a table failed.
    #[error("failed to read table {table}")]
    Query {
        /// The table being read.
        table: String,
        /// Driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A persisted geometry or field payload could not be decoded.
    #[error("failed to decode row from table {table}: {detail}")]
    Decode {
        /// The table being read.
        table: String,
        /// Decoder failure detail.
        detail: String,
    },
    /// Writing a table failed.
    #[error("failed to write table {table}")]
    Write {
        /// The table being written.
        table: String,
        /// Driver error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A table's combined bounds do not form a usable extent.
    #[error("table {table} has a degenerate extent")]
    InvalidExtent {
        /// The table whose bounds were accumulated.
        table: String,
        /// Why the bounds were rejected.
        #[source]
        source: ExtentError,
    },
}

/// A scalar field persisted alongside a geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A numeric field.
    Real(f64),
    /// A textual field.
    Text(String),
    /// An absent value.
    Null,
}

impl From<FeatureValue> for FieldValue {
    fn from(value: FeatureValue) -> Self {
        match value {
            FeatureValue::Value(v) => Self::Real(v),
            FeatureValue::Missing => Self::Null,
            FeatureValue::NotImplemented => Self::Text(NOT_IMPLEMENTED_SENTINEL.to_owned()),
        }
    }
}

impl From<&FieldValue> for FeatureValue {
    fn from(field: &FieldValue) -> Self {
        match field {
            FieldValue::Real(v) => Self::from_f64(*v),
            FieldValue::Text(text) => Self::coerce(text),
            FieldValue::Null => Self::Missing,
        }
    }
}

/// A row persisted in, or read from, a store table.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// The row geometry in the grid's reference.
    pub geometry: Geometry<f64>,
    /// Named scalar fields, ordered for deterministic persistence.
    pub fields: BTreeMap<String, FieldValue>,
}

impl StoredRecord {
    /// Build a record from a geometry and `(name, value)` field pairs.
    #[must_use]
    pub fn new(
        geometry: Geometry<f64>,
        fields: impl IntoIterator<Item = (String, FieldValue)>,
    ) -> Self {
        Self {
            geometry,
            fields: fields.into_iter().collect(),
        }
    }
}

/// A feature-source row: geometry plus the coerced attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// The source geometry.
    pub geometry: Geometry<f64>,
    /// The attribute under the requested value column, centrally coerced.
    pub value: FeatureValue,
}

/// Read and write named geometry tables.
///
/// Implementations provide bulk reads and create-or-replace writes; the
/// intersects filter and extent accumulation are derived from those, so a
/// minimal backend only implements two methods.
pub trait FeatureStore {
    /// Read every record of `table` with its full field map.
    ///
    /// Row order is the store's insertion order and must be
    /// deterministic.
    ///
    /// # Errors
    /// Fails when the table does not exist or cannot be decoded; callers
    /// aggregating features treat this as a recoverable degradation.
    fn read_records(&self, table: &str) -> Result<Vec<StoredRecord>, StoreError>;

    /// Create or replace `table` with `records`.
    ///
    /// # Errors
    /// Fails when the rows cannot be encoded or the write fails; a
    /// partial table is never left behind.
    fn replace_table(&self, table: &str, records: &[StoredRecord]) -> Result<(), StoreError>;

    /// Read every row of `table` as a geometry plus one attribute.
    ///
    /// When `value_column` is given, each record's field under that name
    /// is coerced into a [`FeatureValue`]; rows without the column, or
    /// with an unparseable value, read as missing.
    ///
    /// # Errors
    /// Propagates [`FeatureStore::read_records`] failures.
    fn read_rows(
        &self,
        table: &str,
        value_column: Option<&str>,
    ) -> Result<Vec<SourceRow>, StoreError> {
        let records = self.read_records(table)?;
        Ok(records
            .into_iter()
            .map(|record| {
                let value = value_column.map_or(FeatureValue::Missing, |column| {
                    record
                        .fields
                        .get(column)
                        .map_or(FeatureValue::Missing, FeatureValue::from)
                });
                SourceRow {
                    geometry: record.geometry,
                    value,
                }
            })
            .collect())
    }

    /// Rows of `table` whose geometry intersects `geometry`.
    ///
    /// # Errors
    /// Propagates [`FeatureStore::read_rows`] failures.
    fn intersecting(
        &self,
        table: &str,
        value_column: Option<&str>,
        geometry: &Geometry<f64>,
    ) -> Result<Vec<SourceRow>, StoreError> {
        let rows = self.read_rows(table, value_column)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.geometry.intersects(geometry))
            .collect())
    }

    /// The combined bounds of every geometry in `table`.
    ///
    /// Returns `Ok(None)` for an empty table.
    ///
    /// # Errors
    /// Propagates read failures, and rejects bounds that collapse to a
    /// point or line (a grid cannot be built over them).
    fn table_extent(&self, table: &str) -> Result<Option<Extent>, StoreError> {
        let rows = self.read_rows(table, None)?;
        let mut bounds: Option<Rect<f64>> = None;
        for row in rows {
            let Some(rect) = row.geometry.bounding_rect() else {
                continue;
            };
            bounds = Some(match bounds {
                Some(current) => Rect::new(
                    geo::Coord {
                        x: current.min().x.min(rect.min().x),
                        y: current.min().y.min(rect.min().y),
                    },
                    geo::Coord {
                        x: current.max().x.max(rect.max().x),
                        y: current.max().y.max(rect.max().y),
                    },
                ),
                None => rect,
            });
        }
        match bounds {
            None => Ok(None),
            Some(rect) => Extent::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
                .map(Some)
                .map_err(|source| StoreError::InvalidExtent {
                    table: table.to_owned(),
                    source,
                }),
        }
    }
}

#[cfg(feature = "store-sqlite")]
mod sqlite {
    use std::collections::BTreeMap;
    use std::path::Path;

    use geo::Geometry;
    use rusqlite::Connection;

    use super::{FeatureStore, FieldValue, StoreError, StoredRecord};

    /// Feature store backed by a single `SQLite` database.
    ///
    /// Each relation is a table of `(id, geometry, fields)` rows with the
    /// geometry and the scalar fields serialized as JSON. One handle is
    /// opened per pipeline run and passed to every stage.
    #[derive(Debug)]
    pub struct SqliteFeatureStore {
        connection: Connection,
    }

    impl SqliteFeatureStore {
        /// Open (or create) a store at `path`.
        ///
        /// # Errors
        /// Returns [`StoreError::Open`] when the database cannot be
        /// opened or created.
        pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
            let path = path.as_ref();
            let connection = Connection::open(path).map_err(|source| StoreError::Open {
                path: path.display().to_string(),
                source: Box::new(source),
            })?;
            Ok(Self { connection })
        }

        /// Open a transient in-memory store, useful in tests.
        ///
        /// # Errors
        /// Returns [`StoreError::Open`] when `SQLite` cannot allocate the
        /// in-memory database.
        pub fn open_in_memory() -> Result<Self, StoreError> {
            let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
                path: ":memory:".to_owned(),
                source: Box::new(source),
            })?;
            Ok(Self { connection })
        }

        fn validate_table_name(table: &str) -> Result<(), StoreError> {
            let valid = !table.is_empty()
                && table
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if valid {
                Ok(())
            } else {
                Err(StoreError::InvalidTableName {
                    table: table.to_owned(),
                })
            }
        }

        fn decode_fields(
            table: &str,
            payload: &str,
        ) -> Result<BTreeMap<String, FieldValue>, StoreError> {
            let raw: BTreeMap<String, serde_json::Value> =
                serde_json::from_str(payload).map_err(|err| StoreError::Decode {
                    table: table.to_owned(),
                    detail: format!("invalid fields payload: {err}"),
                })?;
            let mut fields = BTreeMap::new();
            for (name, value) in raw {
                let field = match value {
                    serde_json::Value::Number(number) => number
                        .as_f64()
                        .map_or(FieldValue::Null, FieldValue::Real),
                    serde_json::Value::String(text) => FieldValue::Text(text),
                    serde_json::Value::Null => FieldValue::Null,
                    other => FieldValue::Text(other.to_string()),
                };
                fields.insert(name, field);
            }
            Ok(fields)
        }

        fn encode_fields(
            table: &str,
            fields: &BTreeMap<String, FieldValue>,
        ) -> Result<String, StoreError> {
            let raw: BTreeMap<&str, serde_json::Value> = fields
                .iter()
                .map(|(name, field)| {
                    let value = match field {
                        FieldValue::Real(v) if v.is_finite() => {
                            serde_json::Number::from_f64(*v)
                                .map_or(serde_json::Value::Null, serde_json::Value::Number)
                        }
                        FieldValue::Real(_) => serde_json::Value::Null,
                        FieldValue::Text(text) => serde_json::Value::String(text.clone()),
                        FieldValue::Null => serde_json::Value::Null,
                    };
                    (name.as_str(), value)
                })
                .collect();
            serde_json::to_string(&raw).map_err(|err| StoreError::Write {
                table: table.to_owned(),
                source: Box::new(err),
            })
        }
    }

    impl FeatureStore for SqliteFeatureStore {
        fn read_records(&self, table: &str) -> Result<Vec<StoredRecord>, StoreError> {
            Self::validate_table_name(table)?;
            let query = format!("SELECT geometry, fields FROM \"{table}\" ORDER BY id");
            let mut statement =
                self.connection
                    .prepare(&query)
                    .map_err(|source| StoreError::Query {
                        table: table.to_owned(),
                        source: Box::new(source),
                    })?;
            let mut rows = statement.query([]).map_err(|source| StoreError::Query {
                table: table.to_owned(),
                source: Box::new(source),
            })?;

            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(|source| StoreError::Query {
                table: table.to_owned(),
                source: Box::new(source),
            })? {
                let geometry_json: String = row.get(0).map_err(|source| StoreError::Query {
                    table: table.to_owned(),
                    source: Box::new(source),
                })?;
                let fields_json: String = row.get(1).map_err(|source| StoreError::Query {
                    table: table.to_owned(),
                    source: Box::new(source),
                })?;

                let geometry: Geometry<f64> = serde_json::from_str(&geometry_json)
                    .map_err(|err| StoreError::Decode {
                        table: table.to_owned(),
                        detail: format!("invalid geometry payload: {err}"),
                    })?;
                let fields = Self::decode_fields(table, &fields_json)?;
                out.push(StoredRecord { geometry, fields });
            }
            Ok(out)
        }

        fn replace_table(&self, table: &str, records: &[StoredRecord]) -> Result<(), StoreError> {
            Self::validate_table_name(table)?;
            let write_err = |source: rusqlite::Error| StoreError::Write {
                table: table.to_owned(),
                source: Box::new(source),
            };

            let transaction = self.connection.unchecked_transaction().map_err(write_err)?;
            transaction
                .execute_batch(&format!(
                    "DROP TABLE IF EXISTS \"{table}\";
                     CREATE TABLE \"{table}\" (
                         id INTEGER PRIMARY KEY,
                         geometry TEXT NOT NULL,
                         fields TEXT NOT NULL
                     );"
                ))
                .map_err(write_err)?;

            {
                let mut insert = transaction
                    .prepare(&format!(
                        "INSERT INTO \"{table}\" (geometry, fields) VALUES (?1, ?2)"
                    ))
                    .map_err(write_err)?;
                for record in records {
                    let geometry_json =
                        serde_json::to_string(&record.geometry).map_err(|err| {
                            StoreError::Write {
                                table: table.to_owned(),
                                source: Box::new(err),
                            }
                        })?;
                    let fields_json = Self::encode_fields(table, &record.fields)?;
                    insert
                        .execute((geometry_json.as_str(), fields_json.as_str()))
                        .map_err(write_err)?;
                }
            }
            transaction.commit().map_err(write_err)
        }
    }
}

#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteFeatureStore;

#[cfg(all(test, feature = "store-sqlite"))]
mod tests {
    use super::*;
    use geo::{Coord, Rect, polygon};
    use rstest::{fixture, rstest};

    fn square(min: f64, max: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
        ])
    }

    #[fixture]
    fn store() -> SqliteFeatureStore {
        SqliteFeatureStore::open_in_memory().unwrap()
    }

    #[rstest]
    fn round_trips_records(store: SqliteFeatureStore) {
        let record = StoredRecord::new(
            square(0.0, 5.0),
            [
                ("annual".to_owned(), FieldValue::Real(815.0)),
                ("source".to_owned(), FieldValue::Text("atlas".to_owned())),
                ("gap".to_owned(), FieldValue::Null),
            ],
        );
        store.replace_table("atlas_solar", &[record.clone()]).unwrap();

        let rows = store.read_rows("atlas_solar", Some("annual")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].geometry, record.geometry);
        assert_eq!(rows[0].value, FeatureValue::Value(815.0));
    }

    #[rstest]
    fn read_records_preserves_full_field_maps(store: SqliteFeatureStore) {
        let record = StoredRecord::new(
            square(0.0, 5.0),
            [
                ("cell_id".to_owned(), FieldValue::Text("cell_0_0".to_owned())),
                ("score".to_owned(), FieldValue::Real(0.75)),
            ],
        );
        store.replace_table("scored_grid", &[record.clone()]).unwrap();

        let records = store.read_records("scored_grid").unwrap();
        assert_eq!(records, vec![record]);
    }

    #[rstest]
    fn replace_discards_previous_rows(store: SqliteFeatureStore) {
        let first = StoredRecord::new(square(0.0, 1.0), []);
        let second = StoredRecord::new(square(2.0, 3.0), []);
        store.replace_table("t", &[first]).unwrap();
        store.replace_table("t", &[second.clone()]).unwrap();

        let rows = store.read_rows("t", None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].geometry, second.geometry);
    }

    #[rstest]
    fn missing_and_unparseable_values_read_as_missing(store: SqliteFeatureStore) {
        let records = vec![
            StoredRecord::new(
                square(0.0, 1.0),
                [("annual".to_owned(), FieldValue::Text("n/a".to_owned()))],
            ),
            StoredRecord::new(square(1.0, 2.0), []),
            StoredRecord::new(
                square(2.0, 3.0),
                [("annual".to_owned(), FieldValue::Text("810".to_owned()))],
            ),
        ];
        store.replace_table("t", &records).unwrap();

        let rows = store.read_rows("t", Some("annual")).unwrap();
        assert_eq!(rows[0].value, FeatureValue::Missing);
        assert_eq!(rows[1].value, FeatureValue::Missing);
        assert_eq!(rows[2].value, FeatureValue::Value(810.0));
    }

    #[rstest]
    fn not_implemented_survives_a_round_trip(store: SqliteFeatureStore) {
        let record = StoredRecord::new(
            square(0.0, 1.0),
            [(
                "wind_potential".to_owned(),
                FieldValue::from(FeatureValue::NotImplemented),
            )],
        );
        store.replace_table("t", &[record]).unwrap();

        let rows = store.read_rows("t", Some("wind_potential")).unwrap();
        assert_eq!(rows[0].value, FeatureValue::NotImplemented);
    }

    #[rstest]
    fn intersecting_filters_by_geometry(store: SqliteFeatureStore) {
        let records = vec![
            StoredRecord::new(square(0.0, 4.0), []),
            StoredRecord::new(square(10.0, 14.0), []),
        ];
        store.replace_table("t", &records).unwrap();

        let probe = Geometry::Rect(Rect::new(
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 2.0, y: 2.0 },
        ));
        let hits = store.intersecting("t", None, &probe).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].geometry, records[0].geometry);
    }

    #[rstest]
    fn table_extent_combines_all_geometries(store: SqliteFeatureStore) {
        let records = vec![
            StoredRecord::new(square(0.0, 4.0), []),
            StoredRecord::new(square(10.0, 14.0), []),
        ];
        store.replace_table("t", &records).unwrap();

        let extent = store.table_extent("t").unwrap().unwrap();
        assert_eq!(extent.min_x(), 0.0);
        assert_eq!(extent.max_y(), 14.0);
    }

    #[rstest]
    fn empty_table_has_no_extent(store: SqliteFeatureStore) {
        store.replace_table("t", &[]).unwrap();
        assert!(store.table_extent("t").unwrap().is_none());
    }

    #[rstest]
    fn missing_table_is_a_query_error(store: SqliteFeatureStore) {
        let err = store.read_rows("absent", None).unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }

    #[rstest]
    #[case("bad name")]
    #[case("t; DROP TABLE x")]
    #[case("")]
    fn rejects_unquotable_table_names(store: SqliteFeatureStore, #[case] table: &str) {
        let err = store.read_rows(table, None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTableName { .. }));
    }

    #[rstest]
    fn persists_to_disk(store: SqliteFeatureStore) {
        drop(store);
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("features.db");
        {
            let on_disk = SqliteFeatureStore::open(&path).unwrap();
            on_disk
                .replace_table("t", &[StoredRecord::new(square(0.0, 1.0), [])])
                .unwrap();
        }
        let reopened = SqliteFeatureStore::open(&path).unwrap();
        assert_eq!(reopened.read_rows("t", None).unwrap().len(), 1);
    }
}
