//! Validation of the `inputs` stage.
//!
//! The `inputs` group records which files were loaded and what the loaded
//! dataset looks like. It is checked in two phases: `parameters` first,
//! producing a [`ParamDump`], then `results`, which needs the dump to
//! cross-check sample counts and pick the feature identity layout.
//!
//! A "matrix" is the set of files describing one count matrix: a single
//! HDF5 file for `10X`/`H5AD`, or an `mtx` file plus optional `genes` and
//! `annotations` for `MatrixMarket`. From 1.1, `format` may be a vector with
//! one entry per matrix, in which case `sample_groups` partitions the file
//! records into consecutive runs, one per matrix.

use crate::container::{Group, StringField};
use crate::core::error::{Contextualize, ValidationError, ValidationResult};
use crate::core::types::DataType;
use crate::core::version::{SchemaEra, SchemaVersion};
use crate::validation::identities::{check_permutation, check_unique, IdentityLayout};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name of the stage group at the container root.
pub const STAGE: &str = "inputs";

/// Modality implied by every state older than 2.0.
pub const DEFAULT_MODALITY: &str = "RNA";

/// Details about the loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    /// Modalities in container enumeration order, e.g. `RNA`, `ADT`.
    pub modalities: Vec<String>,
    /// Number of features per modality, parallel to `modalities`.
    /// For multiple matrices this is the size of the intersection.
    pub num_features: Vec<usize>,
    /// Number of cells across all samples.
    pub num_cells: usize,
    /// Number of samples; a single matrix may still hold several.
    pub num_samples: usize,
}

impl Details {
    /// Feature count of a modality, if present.
    pub fn features_for(&self, modality: &str) -> Option<usize> {
        self.modalities
            .iter()
            .position(|m| m == modality)
            .map(|i| self.num_features[i])
    }

    /// Modalities paired with their feature counts.
    pub fn modality_features(&self) -> impl Iterator<Item = (&str, usize)> {
        self.modalities
            .iter()
            .map(String::as_str)
            .zip(self.num_features.iter().copied())
    }
}

/// What the `parameters` phase learned, for use by the `results` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDump {
    /// Number of matrices; at least one.
    pub num_matrices: usize,
    /// Whether `format` listed several matrices.
    pub multi_matrix: bool,
    /// Whether the data covers several samples, either through several
    /// matrices or through a `sample_factor`.
    pub multi_sample: bool,
}

/// Known matrix formats. Anything else is a custom resource whose files
/// are not constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatrixFormat<'a> {
    MatrixMarket,
    TenX,
    H5ad,
    Custom(&'a str),
}

impl<'a> MatrixFormat<'a> {
    fn parse(format: &'a str) -> Self {
        match format {
            "MatrixMarket" => MatrixFormat::MatrixMarket,
            "10X" => MatrixFormat::TenX,
            "H5AD" => MatrixFormat::H5ad,
            other => MatrixFormat::Custom(other),
        }
    }
}

/// Byte range of an embedded file.
#[derive(Debug, Clone, Copy)]
struct FileSpan {
    offset: u64,
    size: u64,
}

/// Check the `inputs` stage.
///
/// `embedded` selects whether file records carry `offset`/`size` into an
/// embedded blob or an `id` into external storage.
pub fn validate(root: &Group, embedded: bool, version: SchemaVersion) -> ValidationResult<Details> {
    let era = version.era();
    debug!("validating '{}' (version {}, era {}, embedded: {})", STAGE, version, era, embedded);

    let handle = root.open_group(STAGE)?;

    let dump = validate_parameters(handle, embedded, era)
        .context_with(|| format!("failed to retrieve parameters from '{}'", STAGE))?;
    trace!("{:?}", dump);

    let details = validate_results(handle, &dump, era)
        .context_with(|| format!("failed to retrieve results from '{}'", STAGE))?;
    debug!(
        "'{}' passed: {} cells, {} sample(s), modalities {:?}",
        STAGE, details.num_cells, details.num_samples, details.modalities
    );

    Ok(details)
}

/// Check `inputs/parameters`.
pub fn validate_parameters(handle: &Group, embedded: bool, era: SchemaEra) -> ValidationResult<ParamDump> {
    let phandle = handle.open_group("parameters")?;

    let (formats, multi_matrix) = match phandle.load_string_or_strings("format")? {
        StringField::Scalar(format) => (vec![format], false),
        StringField::Vector(formats) => {
            if !era.supports_multi_matrix() {
                return Err(ValidationError::invalid(
                    "'format' should be a scalar string in version 1.0",
                ));
            }
            (formats, true)
        }
    };
    if formats.is_empty() {
        return Err(ValidationError::invalid("'format' should list at least one matrix"));
    }

    let files = phandle.open_group("files")?;
    let nfiles = files.len();

    let runs = if multi_matrix {
        check_samples(phandle, formats.len(), nfiles)?
    } else {
        vec![nfiles]
    };

    let mut spans = Vec::with_capacity(nfiles);
    let mut position = 0usize;
    for (format, &run) in formats.iter().zip(&runs) {
        let mut types = Vec::with_capacity(run);
        for _ in 0..run {
            let current = position.to_string();
            let (file_type, span) = check_file(files, &current, embedded)
                .context_with(|| format!("failed to retrieve information for file {}", current))?;
            trace!("file {} has type '{}'", current, file_type);
            types.push(file_type);
            spans.extend(span);
            position += 1;
        }
        check_run_types(MatrixFormat::parse(format), format, &types)?;
    }

    if embedded {
        check_contiguous(&spans)?;
    }

    let multi_sample = if !multi_matrix && phandle.exists("sample_factor") {
        phandle.open_scalar("sample_factor", DataType::String)?;
        true
    } else {
        multi_matrix
    };

    Ok(ParamDump {
        num_matrices: formats.len(),
        multi_matrix,
        multi_sample,
    })
}

/// Check `sample_groups` and `sample_names` for multi-matrix inputs,
/// returning the number of file records in each run.
fn check_samples(phandle: &Group, num_matrices: usize, nfiles: usize) -> ValidationResult<Vec<usize>> {
    let groups = phandle.load_integer_vector("sample_groups")?;
    if groups.len() != num_matrices {
        return Err(ValidationError::invalid(
            "'sample_groups' and 'format' should have the same length",
        ));
    }

    let runs = groups
        .iter()
        .map(|&g| usize::try_from(g))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ValidationError::invalid("'sample_groups' should contain non-negative integers"))?;

    let total = runs.iter().try_fold(0usize, |acc, &r| acc.checked_add(r));
    if total != Some(nfiles) {
        return Err(ValidationError::invalid(
            "sum of 'sample_groups' is not equal to the length of 'files'",
        ));
    }

    let names = phandle.load_string_vector("sample_names")?;
    if names.len() != num_matrices {
        return Err(ValidationError::invalid(
            "'sample_names' and 'format' should have the same length",
        ));
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::invalid(format!(
                "duplicated sample name '{}' in 'sample_names'",
                name
            )));
        }
    }

    Ok(runs)
}

/// Check one file record, returning its type and, when embedded, its span.
fn check_file(files: &Group, name: &str, embedded: bool) -> ValidationResult<(String, Option<FileSpan>)> {
    let record = files.open_group(name)?;

    record.open_scalar("name", DataType::String)?;
    let file_type = record.load_string("type")?;

    let span = if embedded {
        let offset = record.load_integer_scalar("offset")?;
        let size = record.load_integer_scalar("size")?;
        let offset = u64::try_from(offset)
            .map_err(|_| ValidationError::invalid("'offset' should be non-negative"))?;
        let size = u64::try_from(size)
            .map_err(|_| ValidationError::invalid("'size' should be non-negative"))?;
        Some(FileSpan { offset, size })
    } else {
        record.open_scalar("id", DataType::String)?;
        None
    };

    Ok((file_type, span))
}

/// Check the file types collected for one matrix against its format.
fn check_run_types(format: MatrixFormat<'_>, label: &str, types: &[String]) -> ValidationResult<()> {
    match format {
        MatrixFormat::MatrixMarket => {
            let (mut mtx, mut genes, mut annotations) = (0usize, 0usize, 0usize);
            for t in types {
                match t.as_str() {
                    "mtx" => mtx += 1,
                    "genes" => genes += 1,
                    "annotations" => annotations += 1,
                    other => {
                        return Err(ValidationError::invalid(format!(
                            "unknown file type '{}' when format is 'MatrixMarket'",
                            other
                        )))
                    }
                }
            }
            if mtx != 1 {
                return Err(ValidationError::invalid(
                    "expected exactly one 'mtx' file when format is 'MatrixMarket'",
                ));
            }
            if genes > 1 {
                return Err(ValidationError::invalid(
                    "expected no more than one 'genes' file when format is 'MatrixMarket'",
                ));
            }
            if annotations > 1 {
                return Err(ValidationError::invalid(
                    "expected no more than one 'annotations' file when format is 'MatrixMarket'",
                ));
            }
        }
        MatrixFormat::TenX | MatrixFormat::H5ad => {
            if types.len() != 1 || types[0] != "h5" {
                return Err(ValidationError::invalid(format!(
                    "expected exactly one 'h5' file when format is '{}'",
                    label
                )));
            }
        }
        MatrixFormat::Custom(name) => {
            trace!("no file type constraints for custom format '{}'", name);
        }
    }
    Ok(())
}

/// Embedded files must tile the blob in declaration order, starting at zero.
fn check_contiguous(spans: &[FileSpan]) -> ValidationResult<()> {
    let mut expected = 0u64;
    for span in spans {
        if span.offset != expected {
            return Err(ValidationError::invalid(
                "offsets and sizes of 'files' are not sorted and contiguous",
            ));
        }
        expected = expected
            .checked_add(span.size)
            .ok_or_else(|| ValidationError::invalid("sizes of 'files' overflow the embedded blob"))?;
    }
    Ok(())
}

/// Check `inputs/results`.
pub fn validate_results(handle: &Group, dump: &ParamDump, era: SchemaEra) -> ValidationResult<Details> {
    let rhandle = handle.open_group("results")?;

    let (modalities, num_features, num_cells) = if era.is_multimodal() {
        let num_cells = to_count(rhandle.load_integer_scalar("num_cells")?, "'num_cells'")?;

        let fhandle = rhandle.open_group("num_features")?;
        if fhandle.is_empty() {
            return Err(ValidationError::invalid("number of modalities should be positive"));
        }

        let mut modalities = Vec::with_capacity(fhandle.len());
        let mut num_features = Vec::with_capacity(fhandle.len());
        for modality in fhandle.names() {
            let count = fhandle.load_integer_scalar(modality)?;
            num_features.push(to_count(
                count,
                &format!("number of features for modality '{}'", modality),
            )?);
            modalities.push(modality.to_string());
        }
        (modalities, num_features, num_cells)
    } else {
        let dims = rhandle.load_integer_vector("dimensions")?;
        if dims.len() != 2 {
            return Err(ValidationError::invalid("'dimensions' should be a dataset of length 2"));
        }
        let invalid = || ValidationError::invalid("'dimensions' should contain non-negative integers");
        let features = usize::try_from(dims[0]).map_err(|_| invalid())?;
        let cells = usize::try_from(dims[1]).map_err(|_| invalid())?;
        (vec![DEFAULT_MODALITY.to_string()], vec![features], cells)
    };

    let num_samples = if rhandle.exists("num_samples") {
        rhandle.load_integer_scalar("num_samples")?
    } else {
        1
    };
    if dump.multi_matrix {
        if num_samples != dump.num_matrices as i64 {
            return Err(ValidationError::invalid(
                "'num_samples' should be equal to the number of matrices",
            ));
        }
    } else if !dump.multi_sample && num_samples != 1 {
        return Err(ValidationError::invalid(
            "'num_samples' should be 1 for single matrix inputs without 'sample_factor'",
        ));
    }
    if num_samples < 1 {
        return Err(ValidationError::invalid("'num_samples' should be positive"));
    }

    let details = Details {
        modalities,
        num_features,
        num_cells,
        num_samples: num_samples as usize,
    };

    check_identities(rhandle, &details, IdentityLayout::resolve(era, dump.multi_matrix))?;

    Ok(details)
}

fn check_identities(rhandle: &Group, details: &Details, layout: IdentityLayout) -> ValidationResult<()> {
    let field = layout.field();
    match layout {
        IdentityLayout::PerModality => {
            let ihandle = rhandle.open_group(field)?;
            for (modality, count) in details.modality_features() {
                let ids = ihandle.load_integer_vector(modality)?;
                if ids.len() != count {
                    return Err(ValidationError::invalid(format!(
                        "'{}' for modality '{}' should have length equal to its number of features",
                        field, modality
                    )));
                }
                check_unique(ids, &format!("'{}' for modality '{}'", field, modality))?;
            }
        }
        IdentityLayout::Flat | IdentityLayout::Indices | IdentityLayout::Permutation => {
            let ids = rhandle.load_integer_vector(field)?;
            if ids.len() != details.num_features[0] {
                return Err(ValidationError::invalid(format!(
                    "'{}' should have length equal to the number of genes",
                    field
                )));
            }
            if layout == IdentityLayout::Permutation {
                check_permutation(ids)?;
            } else {
                check_unique(ids, &format!("'{}'", field))?;
            }
        }
    }
    Ok(())
}

fn to_count(value: i64, what: &str) -> ValidationResult<usize> {
    usize::try_from(value).map_err(|_| ValidationError::invalid(format!("{} should be non-negative", what)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::error::Violation;
    use crate::core::types::Dataset;

    /// A linked or embedded file record.
    pub(crate) fn file(name: &str, file_type: &str, span: Option<(i64, i64)>) -> Group {
        let record = Group::new()
            .with_dataset("name", Dataset::string_scalar(name))
            .with_dataset("type", Dataset::string_scalar(file_type));
        match span {
            Some((offset, size)) => record
                .with_dataset("offset", Dataset::integer_scalar(offset))
                .with_dataset("size", Dataset::integer_scalar(size)),
            None => record.with_dataset("id", Dataset::string_scalar(format!("id-{}", name))),
        }
    }

    fn files(records: Vec<Group>) -> Group {
        records
            .into_iter()
            .enumerate()
            .fold(Group::new(), |g, (i, r)| g.with_group(i.to_string(), r))
    }

    /// Single 10X matrix, linked, 1.0/1.1 layout with a permutation.
    pub(crate) fn single_matrix_v1(features: usize, cells: usize) -> Group {
        let parameters = Group::new()
            .with_dataset("format", Dataset::string_scalar("10X"))
            .with_group("files", files(vec![file("pbmc.h5", "h5", None)]));
        let results = Group::new()
            .with_dataset("dimensions", Dataset::integers(vec![features as i64, cells as i64]))
            .with_dataset("permutation", Dataset::integers((0..features as i64).rev().collect::<Vec<_>>()));
        Group::new().with_group(
            STAGE,
            Group::new()
                .with_group("parameters", parameters)
                .with_group("results", results),
        )
    }

    /// Single MatrixMarket upload, 2.0 layout with RNA and ADT.
    pub(crate) fn single_matrix_v2(rna: usize, adt: usize, cells: usize) -> Group {
        let parameters = Group::new()
            .with_dataset("format", Dataset::string_scalar("MatrixMarket"))
            .with_group(
                "files",
                files(vec![
                    file("matrix.mtx.gz", "mtx", None),
                    file("features.tsv.gz", "genes", None),
                ]),
            );
        let results = Group::new()
            .with_dataset("num_cells", Dataset::integer_scalar(cells as i64))
            .with_group(
                "num_features",
                Group::new()
                    .with_dataset("RNA", Dataset::integer_scalar(rna as i64))
                    .with_dataset("ADT", Dataset::integer_scalar(adt as i64)),
            )
            .with_group(
                "identities",
                Group::new()
                    .with_dataset("RNA", Dataset::integers((0..rna as i64).collect::<Vec<_>>()))
                    .with_dataset("ADT", Dataset::integers((0..adt as i64).map(|i| i * 2).collect::<Vec<_>>())),
            );
        Group::new().with_group(
            STAGE,
            Group::new()
                .with_group("parameters", parameters)
                .with_group("results", results),
        )
    }

    /// Two embedded matrices (MatrixMarket + H5AD), 1.2 layout.
    fn multi_matrix_v1_2() -> Group {
        let parameters = Group::new()
            .with_dataset("format", Dataset::strings(["MatrixMarket", "H5AD"]))
            .with_dataset("sample_groups", Dataset::integers(vec![2, 1]))
            .with_dataset("sample_names", Dataset::strings(["A", "B"]))
            .with_group(
                "files",
                files(vec![
                    file("a.mtx", "mtx", Some((0, 10))),
                    file("a.tsv", "annotations", Some((10, 20))),
                    file("b.h5ad", "h5", Some((30, 5))),
                ]),
            );
        let results = Group::new()
            .with_dataset("dimensions", Dataset::integers(vec![3, 40]))
            .with_dataset("num_samples", Dataset::integer_scalar(2))
            .with_dataset("identities", Dataset::integers(vec![7, 0, 3]));
        Group::new().with_group(
            STAGE,
            Group::new()
                .with_group("parameters", parameters)
                .with_group("results", results),
        )
    }

    fn parameters_mut(root: &mut Group) -> &mut Group {
        root.group_mut(STAGE).unwrap().group_mut("parameters").unwrap()
    }

    fn results_mut(root: &mut Group) -> &mut Group {
        root.group_mut(STAGE).unwrap().group_mut("results").unwrap()
    }

    #[test]
    fn test_single_matrix_has_one_sample() {
        let root = single_matrix_v1(4, 100);
        let details = validate(&root, false, SchemaVersion::V1_0).unwrap();
        assert_eq!(details.num_samples, 1);
        assert_eq!(details.modalities, vec!["RNA"]);
        assert_eq!(details.num_features, vec![4]);
        assert_eq!(details.num_cells, 100);
    }

    #[test]
    fn test_single_matrix_rejects_extra_samples_without_factor() {
        let mut root = single_matrix_v1(4, 100);
        results_mut(&mut root).insert("num_samples", Dataset::integer_scalar(3));
        let err = validate(&root, false, SchemaVersion::V1_0).unwrap_err();
        assert!(err.to_string().contains("'num_samples' should be 1"));
    }

    #[test]
    fn test_sample_factor_allows_several_samples() {
        let mut root = single_matrix_v1(4, 100);
        parameters_mut(&mut root).insert("sample_factor", Dataset::string_scalar("batch"));
        results_mut(&mut root).insert("num_samples", Dataset::integer_scalar(3));
        let details = validate(&root, false, SchemaVersion::V1_1).unwrap();
        assert_eq!(details.num_samples, 3);

        parameters_mut(&mut root).insert("sample_factor", Dataset::strings(["batch"]));
        assert!(validate(&root, false, SchemaVersion::V1_1).is_err());
    }

    #[test]
    fn test_multi_matrix_embedded_passes() {
        let root = multi_matrix_v1_2();
        let details = validate(&root, true, SchemaVersion::V1_2).unwrap();
        assert_eq!(details.num_samples, 2);
        assert_eq!(details.num_features, vec![3]);
    }

    #[test]
    fn test_multi_matrix_requires_version_1_1() {
        let root = multi_matrix_v1_2();
        let err = validate(&root, true, SchemaVersion::V1_0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to retrieve parameters from 'inputs'\n  - 'format' should be a scalar string in version 1.0"
        );
    }

    #[test]
    fn test_sample_group_sum_mismatch() {
        let mut root = multi_matrix_v1_2();
        parameters_mut(&mut root).insert("sample_groups", Dataset::integers(vec![1, 1]));
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err.to_string().contains("sum of 'sample_groups'"));
    }

    #[test]
    fn test_sum_mismatch_fails_before_file_checks() {
        let mut root = multi_matrix_v1_2();
        let params = parameters_mut(&mut root);
        params.insert("sample_groups", Dataset::integers(vec![3, 1]));
        params.group_mut("files").unwrap().remove("0");
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err.to_string().contains("sum of 'sample_groups'"));
    }

    #[test]
    fn test_duplicate_sample_names() {
        let mut root = multi_matrix_v1_2();
        parameters_mut(&mut root).insert("sample_names", Dataset::strings(["A", "A"]));
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err.to_string().contains("duplicated sample name 'A'"));
    }

    #[test]
    fn test_non_contiguous_offsets() {
        let mut root = multi_matrix_v1_2();
        let params = parameters_mut(&mut root);
        params.insert(
            "files",
            files(vec![
                file("a.mtx", "mtx", Some((0, 10))),
                file("a.tsv", "annotations", Some((0, 20))),
                file("b.h5ad", "h5", Some((10, 5))),
            ]),
        );
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err.to_string().contains("not sorted and contiguous"));
    }

    #[test]
    fn test_embedded_record_needs_offset() {
        let root = single_matrix_v1(4, 100);
        let err = validate(&root, true, SchemaVersion::V1_0).unwrap_err();
        let frames: Vec<_> = err.frames().collect();
        assert_eq!(
            frames,
            vec![
                "failed to retrieve parameters from 'inputs'",
                "failed to retrieve information for file 0"
            ]
        );
        assert_eq!(
            err.violation(),
            &Violation::MissingChild {
                name: "offset".to_string()
            }
        );
    }

    #[test]
    fn test_linked_record_needs_id() {
        let mut root = single_matrix_v1(4, 100);
        parameters_mut(&mut root)
            .group_mut("files")
            .unwrap()
            .group_mut("0")
            .unwrap()
            .remove("id");
        let err = validate(&root, false, SchemaVersion::V1_0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to retrieve parameters from 'inputs'\n  - \
             failed to retrieve information for file 0\n  - 'id' does not exist"
        );
    }

    #[test]
    fn test_negative_offset_or_size() {
        let mut root = multi_matrix_v1_2();
        parameters_mut(&mut root)
            .group_mut("files")
            .unwrap()
            .insert("0", file("a.mtx", "mtx", Some((-1, 10))));
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err.to_string().ends_with("'offset' should be non-negative"));

        parameters_mut(&mut root)
            .group_mut("files")
            .unwrap()
            .insert("0", file("a.mtx", "mtx", Some((0, -10))));
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err.to_string().ends_with("'size' should be non-negative"));
    }

    #[test]
    fn test_sample_vectors_match_matrix_count() {
        let mut root = multi_matrix_v1_2();
        parameters_mut(&mut root).insert("sample_groups", Dataset::integers(vec![3]));
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("'sample_groups' and 'format' should have the same length"));

        let mut root = multi_matrix_v1_2();
        parameters_mut(&mut root).insert("sample_names", Dataset::strings(["A"]));
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("'sample_names' and 'format' should have the same length"));
    }

    #[test]
    fn test_empty_format_vector() {
        let mut root = multi_matrix_v1_2();
        parameters_mut(&mut root).insert("format", Dataset::strings(Vec::<&str>::new()));
        let err = validate(&root, true, SchemaVersion::V1_1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to retrieve parameters from 'inputs'\n  - 'format' should list at least one matrix"
        );
    }

    #[test]
    fn test_matrix_market_single_annotations() {
        let mut root = multi_matrix_v1_2();
        let params = parameters_mut(&mut root);
        params.insert("sample_groups", Dataset::integers(vec![3, 1]));
        params.insert(
            "files",
            files(vec![
                file("a.mtx", "mtx", Some((0, 10))),
                file("a.tsv", "annotations", Some((10, 20))),
                file("a2.tsv", "annotations", Some((30, 20))),
                file("b.h5ad", "h5", Some((50, 5))),
            ]),
        );
        let err = validate(&root, true, SchemaVersion::V1_2).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("expected no more than one 'annotations' file when format is 'MatrixMarket'"));
    }

    #[test]
    fn test_matrix_market_file_types() {
        let mut root = single_matrix_v2(3, 2, 10);
        let params = parameters_mut(&mut root);

        params.insert("files", files(vec![file("x", "mtx", None), file("y", "barcodes", None)]));
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().contains("unknown file type 'barcodes'"));

        let params = parameters_mut(&mut root);
        params.insert("files", files(vec![file("x", "genes", None)]));
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().contains("exactly one 'mtx'"));

        let params = parameters_mut(&mut root);
        params.insert(
            "files",
            files(vec![file("x", "mtx", None), file("y", "genes", None), file("z", "genes", None)]),
        );
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().contains("no more than one 'genes'"));
    }

    #[test]
    fn test_hdf5_formats_need_single_h5() {
        let mut root = single_matrix_v1(4, 100);
        parameters_mut(&mut root).insert(
            "files",
            files(vec![file("a.h5", "h5", None), file("b.h5", "h5", None)]),
        );
        let err = validate(&root, false, SchemaVersion::V1_0).unwrap_err();
        assert!(err.to_string().contains("expected exactly one 'h5' file when format is '10X'"));
    }

    #[test]
    fn test_custom_format_is_unconstrained() {
        let mut root = single_matrix_v1(4, 100);
        let params = parameters_mut(&mut root);
        params.insert("format", Dataset::string_scalar("ExperimentHub"));
        params.insert("files", files(vec![file("a", "anything", None), file("b", "else", None)]));
        assert!(validate(&root, false, SchemaVersion::V1_0).is_ok());
    }

    #[test]
    fn test_permutation_era() {
        let mut root = single_matrix_v1(4, 10);
        results_mut(&mut root).insert("permutation", Dataset::integers(vec![0, 1, 2, 3]));
        assert!(validate(&root, false, SchemaVersion::V1_0).is_ok());

        results_mut(&mut root).insert("permutation", Dataset::integers(vec![0, 1, 1, 3]));
        assert!(validate(&root, false, SchemaVersion::V1_0).is_err());

        results_mut(&mut root).insert("permutation", Dataset::integers(vec![0, 1, 2, 4]));
        let err = validate(&root, false, SchemaVersion::V1_1).unwrap_err();
        assert!(err.to_string().ends_with("'permutation' contains out-of-range values"));
    }

    #[test]
    fn test_indices_for_multi_matrix_1_1() {
        let mut root = multi_matrix_v1_2();
        let results = results_mut(&mut root);
        results.remove("identities");
        results.insert("indices", Dataset::integers(vec![100, 4, 9]));
        assert!(validate(&root, true, SchemaVersion::V1_1).is_ok());

        // 1.2 wants 'identities' instead.
        assert!(validate(&root, true, SchemaVersion::V1_2).is_err());
    }

    #[test]
    fn test_per_modality_identities() {
        let mut root = single_matrix_v2(3, 2, 10);
        let identities = results_mut(&mut root).group_mut("identities").unwrap();
        identities.insert("RNA", Dataset::integers(vec![5, 2, 9]));
        assert!(validate(&root, false, SchemaVersion::V2_0).is_ok());

        let identities = results_mut(&mut root).group_mut("identities").unwrap();
        identities.insert("RNA", Dataset::integers(vec![5, 2, 5]));
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err
            .to_string()
            .ends_with("'identities' for modality 'RNA' contains duplicate values"));

        let identities = results_mut(&mut root).group_mut("identities").unwrap();
        identities.insert("RNA", Dataset::integers(vec![-1, 2, 5]));
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().ends_with("contains negative values"));
    }

    #[test]
    fn test_modalities_follow_enumeration_order() {
        let root = single_matrix_v2(3, 2, 10);
        let details = validate(&root, false, SchemaVersion::V2_0).unwrap();
        assert_eq!(details.modalities, vec!["RNA", "ADT"]);
        assert_eq!(details.num_features, vec![3, 2]);
        assert_eq!(details.features_for("ADT"), Some(2));
        assert_eq!(details.features_for("CRISPR"), None);
    }

    #[test]
    fn test_empty_num_features_group() {
        let mut root = single_matrix_v2(3, 2, 10);
        results_mut(&mut root).insert("num_features", Group::new());
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().ends_with("number of modalities should be positive"));
    }

    #[test]
    fn test_dimensions_must_be_a_pair() {
        let mut root = single_matrix_v1(4, 10);
        results_mut(&mut root).insert("dimensions", Dataset::integers(vec![4, 10, 1]));
        assert!(validate(&root, false, SchemaVersion::V1_0).is_err());

        results_mut(&mut root).insert("dimensions", Dataset::integers(vec![4, -10]));
        let err = validate(&root, false, SchemaVersion::V1_0).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_threshold_uses_upper_branch() {
        // Exactly 2.0.0: the 1.x 'dimensions' layout is not accepted.
        let root = single_matrix_v1(4, 10);
        assert!(validate(&root, false, SchemaVersion::new(1_999_999)).is_err());
        let err = validate(&root, false, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().ends_with("'num_cells' does not exist"));
    }

    #[test]
    fn test_validation_is_repeatable() {
        let root = single_matrix_v2(3, 2, 10);
        let before = root.clone();
        let first = validate(&root, false, SchemaVersion::V2_0).unwrap();
        let second = validate(&root, false, SchemaVersion::V2_0).unwrap();
        assert_eq!(first, second);
        assert_eq!(root, before);
    }
}
