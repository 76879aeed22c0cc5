//! Score command implementation for the solgrid CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use solgrid_core::{FeatureColumn, FeatureStore, FeatureTable, FeatureValue, FieldValue};
use solgrid_data::FEATURE_COLUMNS;
use solgrid_scorer::{ColumnStats, ScoreWeights, ScoredTable, score_table};

use crate::{
    ARG_DB, CliError, DEFAULT_FEATURES_TABLE, DEFAULT_SCORED_TABLE, ENV_SCORE_DB, FIELD_CELL_ID,
};

pub(crate) const FIELD_ENERGY_N: &str = "energy_n";
pub(crate) const FIELD_IMPACT_N: &str = "impact_n";
pub(crate) const FIELD_CONNECTION_COST_N: &str = "connection_cost_n";
pub(crate) const FIELD_SCORE: &str = "score";
pub(crate) const FIELD_SCORE_NORM: &str = "score_norm";

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score the persisted feature table and write the ranked \
                 surface back to the database. Weights default to the \
                 standard policy (benefit 0.6, impact 0.25, cost 0.15) and \
                 can be overridden individually.",
    about = "Score the persisted feature table"
)]
#[ortho_config(prefix = "SOLGRID")]
pub(crate) struct ScoreArgs {
    /// Path to the SQLite feature database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
    /// Store table the feature rows are read from.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) features_table: Option<String>,
    /// Store table the scored rows are written to.
    #[arg(long, value_name = "name")]
    #[serde(default)]
    pub(crate) table: Option<String>,
    /// Weight of the normalised benefit term.
    #[arg(long, value_name = "weight")]
    #[serde(default)]
    pub(crate) benefit_weight: Option<f64>,
    /// Weight of the normalised impact penalty.
    #[arg(long, value_name = "weight")]
    #[serde(default)]
    pub(crate) impact_weight: Option<f64>,
    /// Weight of the normalised cost penalty.
    #[arg(long, value_name = "weight")]
    #[serde(default)]
    pub(crate) cost_weight: Option<f64>,
}

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreConfig {
    /// Path to the SQLite feature database.
    pub(crate) db: Utf8PathBuf,
    /// Store table the feature rows are read from.
    pub(crate) features_table: String,
    /// Store table the scored rows are written to.
    pub(crate) table: String,
    /// Validated scoring weights.
    pub(crate) weights: ScoreWeights,
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_DB,
            env: ENV_SCORE_DB,
        })?;
        let defaults = ScoreWeights::default();
        let weights = ScoreWeights::new(
            args.benefit_weight.unwrap_or(defaults.benefit),
            args.impact_weight.unwrap_or(defaults.impact),
            args.cost_weight.unwrap_or(defaults.cost),
        )?;
        Ok(Self {
            db,
            features_table: args
                .features_table
                .unwrap_or_else(|| DEFAULT_FEATURES_TABLE.to_owned()),
            table: args
                .table
                .unwrap_or_else(|| DEFAULT_SCORED_TABLE.to_owned()),
            weights,
        })
    }
}

/// Ranking summary printed after a scoring run.
#[derive(Debug, Serialize)]
pub(crate) struct ScoreSummary {
    /// Number of cells scored.
    pub(crate) cells: usize,
    /// Mean normalised score over the grid.
    pub(crate) mean_score_norm: f64,
    /// Cell ids sharing the highest normalised score.
    pub(crate) best_cells: Vec<String>,
    /// Cell ids sharing the lowest normalised score.
    pub(crate) worst_cells: Vec<String>,
    /// Per-column fraction of cells without a numeric value.
    pub(crate) missing_share: std::collections::BTreeMap<String, f64>,
}

impl ScoreSummary {
    fn new(table: &FeatureTable, scored: &ScoredTable) -> Self {
        let cells = scored.cells().len();
        let mean_score_norm = if cells == 0 {
            0.0
        } else {
            scored.cells().iter().map(|cell| cell.score_norm).sum::<f64>() / cells as f64
        };
        let missing_share = FEATURE_COLUMNS
            .iter()
            .map(|name| {
                let stats = ColumnStats::from_values(
                    table
                        .cell_ids()
                        .iter()
                        .map(|cell_id| table.value(name, cell_id)),
                );
                ((*name).to_owned(), stats.missing_share())
            })
            .collect();
        Self {
            cells,
            mean_score_norm,
            best_cells: scored
                .best_cells()
                .iter()
                .map(|cell| cell.cell_id.clone())
                .collect(),
            worst_cells: scored
                .worst_cells()
                .iter()
                .map(|cell| cell.cell_id.clone())
                .collect(),
            missing_share,
        }
    }
}

pub(super) fn run_score(args: ScoreArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    #[cfg(feature = "store-sqlite")]
    {
        let store = crate::open_store(&config.db)?;
        let mut stdout = std::io::stdout().lock();
        execute_score(&config, &store, &mut stdout)
    }
    #[cfg(not(feature = "store-sqlite"))]
    {
        let _ = config;
        Err(CliError::MissingFeature {
            feature: "store-sqlite",
            action: "scoring the feature table",
        })
    }
}

/// Read the feature table, score it, replace the scored table, and write
/// a ranking summary.
pub(crate) fn execute_score(
    config: &ScoreConfig,
    store: &dyn FeatureStore,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let records = store
        .read_records(&config.features_table)
        .map_err(|source| CliError::ReadTable {
            table: config.features_table.clone(),
            source,
        })?;
    let table = reassemble_table(&config.features_table, &records)?;

    let scorer_config = solgrid_scorer::ScoreConfig {
        weights: config.weights,
        ..solgrid_scorer::ScoreConfig::default()
    };
    let scored = score_table(&table, &scorer_config);

    let out: Vec<solgrid_core::StoredRecord> = records
        .into_iter()
        .zip(scored.cells())
        .map(|(mut record, cell)| {
            record
                .fields
                .insert(FIELD_ENERGY_N.to_owned(), FieldValue::Real(cell.energy_n));
            record
                .fields
                .insert(FIELD_IMPACT_N.to_owned(), FieldValue::Real(cell.impact_n));
            record.fields.insert(
                FIELD_CONNECTION_COST_N.to_owned(),
                FieldValue::Real(cell.connection_cost_n),
            );
            record
                .fields
                .insert(FIELD_SCORE.to_owned(), FieldValue::Real(cell.score));
            record
                .fields
                .insert(FIELD_SCORE_NORM.to_owned(), FieldValue::Real(cell.score_norm));
            record
        })
        .collect();
    store
        .replace_table(&config.table, &out)
        .map_err(|source| CliError::WriteTable {
            table: config.table.clone(),
            source,
        })?;

    write_summary(writer, &ScoreSummary::new(&table, &scored))
}

/// Rebuild the in-memory feature table from persisted rows.
///
/// Row order is the persisted order; every declared feature column is
/// rebuilt, with absent or unparseable fields reading as missing.
pub(crate) fn reassemble_table(
    table: &str,
    records: &[solgrid_core::StoredRecord],
) -> Result<FeatureTable, CliError> {
    let mut cell_ids = Vec::with_capacity(records.len());
    let mut columns: Vec<FeatureColumn> = FEATURE_COLUMNS
        .iter()
        .map(|name| FeatureColumn::new((*name).to_owned()))
        .collect();
    for (row, record) in records.iter().enumerate() {
        let cell_id = match record.fields.get(FIELD_CELL_ID) {
            Some(FieldValue::Text(id)) => id.clone(),
            _ => {
                return Err(CliError::RowMissingCellId {
                    table: table.to_owned(),
                    row,
                });
            }
        };
        for column in &mut columns {
            let value = record
                .fields
                .get(column.name())
                .map_or(FeatureValue::Missing, FeatureValue::from);
            column.insert(&cell_id, value);
        }
        cell_ids.push(cell_id);
    }
    Ok(FeatureTable::from_cell_ids(cell_ids, FEATURE_COLUMNS, columns))
}

fn write_summary(writer: &mut dyn Write, summary: &ScoreSummary) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(summary).map_err(CliError::SerialiseSummary)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteSummary)?;
    writer.write_all(b"\n").map_err(CliError::WriteSummary)
}
