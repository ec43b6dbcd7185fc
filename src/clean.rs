use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    classify::{Classifier, Partition, expand_rows},
    cli::CleanArgs,
    district::DistrictIndex,
    enrich::{PostalCache, PostalDirectory, prefill_from_postal_codes},
    io_utils,
    mapping::{FieldMapping, suggest_mapping},
    rows,
    settings::Settings,
};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub expanded_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub address_validated: usize,
    pub postal_prefilled: usize,
    pub invalid_reasons: BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn from_partition(input_rows: usize, postal_prefilled: usize, partition: &Partition) -> Self {
        let mut invalid_reasons = BTreeMap::new();
        for reason in partition.invalid.iter().filter_map(|row| row.invalid_reason) {
            *invalid_reasons.entry(reason.to_string()).or_insert(0) += 1;
        }
        let address_validated = partition
            .valid
            .iter()
            .chain(partition.invalid.iter())
            .filter(|row| row.address_validated)
            .count();
        Self {
            input_rows,
            expanded_rows: partition.len(),
            valid_rows: partition.valid.len(),
            invalid_rows: partition.invalid.len(),
            address_validated,
            postal_prefilled,
            invalid_reasons,
        }
    }
}

pub fn execute(args: &CleanArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;

    let settings = resolve_settings(args)?;
    let (valid_path, invalid_path) = resolve_output_paths(args, &settings);

    info!(
        "Cleaning '{}' (delimiter '{}')",
        args.input.display(),
        crate::printable_delimiter(delimiter)
    );
    let (headers, mut raw_rows) = rows::read_records(&args.input, delimiter, input_encoding)
        .with_context(|| format!("Reading customers from {:?}", args.input))?;
    info!("Read {} customer row(s)", raw_rows.len());

    let mapping = match &args.mapping {
        Some(path) => {
            FieldMapping::load(path).with_context(|| format!("Loading mapping from {path:?}"))?
        }
        None => {
            info!("No mapping provided; using the suggested mapping");
            suggest_mapping(&headers)
        }
    };
    for column in mapping.missing_columns(&headers) {
        warn!("Mapped column '{column}' is not present in {:?}", args.input);
    }
    for entry in mapping.entries() {
        debug!("Column '{}' -> {}", entry.column, entry.target);
    }

    let districts = match &args.districts {
        Some(path) => {
            let reference_delimiter = io_utils::resolve_input_delimiter(path, args.delimiter);
            let index = DistrictIndex::load(path, reference_delimiter, input_encoding)?;
            info!(
                "Loaded {} district(s) across {} state(s) from {:?}",
                index.len(),
                index.state_count(),
                path
            );
            index
        }
        None => DistrictIndex::default(),
    };

    let postal_prefilled = match &args.postal_codes {
        Some(path) => {
            let directory_delimiter = io_utils::resolve_input_delimiter(path, args.delimiter);
            let directory = PostalDirectory::load(path, directory_delimiter, input_encoding)?;
            let mut cache = PostalCache::new();
            let touched =
                prefill_from_postal_codes(&mut raw_rows, &mapping, &directory, &mut cache);
            info!(
                "Prefilled {} row(s) from {} postal code(s) ({} distinct looked up)",
                touched,
                directory.len(),
                cache.len()
            );
            touched
        }
        None => 0,
    };

    let expanded = expand_rows(&raw_rows, &mapping);
    if expanded.len() != raw_rows.len() {
        info!(
            "Expanded {} row(s) into {} address row(s)",
            raw_rows.len(),
            expanded.len()
        );
    }

    let classifier = Classifier::new(&mapping, &settings, &districts);
    let partition = classifier.classify_with_progress(&expanded, settings.chunk_size, |progress| {
        info!(
            "Classified {}/{} row(s) ({}%)",
            progress.processed,
            progress.total,
            progress.percent()
        );
    });

    let output_delimiter =
        io_utils::resolve_output_delimiter(Some(valid_path.as_path()), args.output_delimiter, delimiter);
    let written = rows::write_records(
        Some(valid_path.as_path()),
        &partition.valid_records(),
        output_delimiter,
        output_encoding,
    )
    .with_context(|| format!("Writing valid rows to {valid_path:?}"))?;
    info!("Wrote {written} valid row(s) to {valid_path:?}");

    let output_delimiter =
        io_utils::resolve_output_delimiter(Some(invalid_path.as_path()), args.output_delimiter, delimiter);
    let written = rows::write_records(
        Some(invalid_path.as_path()),
        &partition.invalid_records(),
        output_delimiter,
        output_encoding,
    )
    .with_context(|| format!("Writing invalid rows to {invalid_path:?}"))?;
    info!("Wrote {written} invalid row(s) to {invalid_path:?}");

    let summary = RunSummary::from_partition(raw_rows.len(), postal_prefilled, &partition);
    for (reason, count) in &summary.invalid_reasons {
        info!("{count} row(s) rejected: {reason}");
    }
    if let Some(path) = &args.summary {
        write_summary(path, &summary)?;
        info!("Run summary written to {path:?}");
    }
    Ok(())
}

fn resolve_settings(args: &CleanArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let overrides = [
        (&args.store_id, &mut settings.store_id),
        (&args.default_city, &mut settings.default_city),
        (&args.default_state, &mut settings.default_state),
        (&args.default_ddd, &mut settings.default_ddd),
    ];
    for (flag, target) in overrides {
        if let Some(value) = flag {
            *target = Some(value.clone());
        }
    }
    if let Some(format) = args.phone_format {
        settings.phone_format = format;
    }
    if args.discard_rows_without_address {
        settings.discard_rows_without_address = true;
    }
    if let Some(size) = args.chunk_size {
        settings.chunk_size = size;
    }
    Ok(settings.validated()?)
}

fn resolve_output_paths(args: &CleanArgs, settings: &Settings) -> (PathBuf, PathBuf) {
    let suffix = match settings.store_id() {
        "" => "list",
        store => store,
    };
    let valid = args
        .valid_output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("customers_valid_{suffix}.csv")));
    let invalid = args
        .invalid_output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("customers_invalid_{suffix}.csv")));
    (valid, invalid)
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating summary directory {parent:?}"))?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).with_context(|| format!("Writing run summary to {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::{InvalidReason, ProcessedRow},
        record::Record,
    };

    fn processed(validated: bool, reason: Option<InvalidReason>) -> ProcessedRow {
        ProcessedRow {
            fields: Record::new(),
            address_validated: validated,
            invalid_reason: reason,
        }
    }

    #[test]
    fn summary_counts_reasons_and_validations() {
        let mut partition = Partition::default();
        partition.push(processed(true, None));
        partition.push(processed(false, Some(InvalidReason::InvalidPhone)));
        partition.push(processed(true, Some(InvalidReason::InvalidPhone)));
        partition.push(processed(false, Some(InvalidReason::IncompleteAddress)));

        let summary = RunSummary::from_partition(3, 0, &partition);

        assert_eq!(summary.expanded_rows, 4);
        assert_eq!(summary.valid_rows, 1);
        assert_eq!(summary.invalid_rows, 3);
        assert_eq!(summary.address_validated, 2);
        assert_eq!(summary.invalid_reasons.get("invalid phone"), Some(&2));
        assert_eq!(
            summary.invalid_reasons.get("unvalidated or incomplete address"),
            Some(&1)
        );
    }
}
