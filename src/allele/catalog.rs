use super::{
    collection::AlleleCollection,
    feature::{Feature, FeatureKind, FeatureStatus},
    locus::{canonical_locus, locus_of},
    record::{AlleleMetadata, AlleleRecord, CwdStatus},
};
use crate::utils::{open_catalog_reader, Error, Result};
use std::{
    collections::{BTreeSet, HashMap},
    io::BufRead,
    path::Path,
};

/// Loads every allele of `locus` from a catalog file (plain or gzipped).
pub fn load_collection(path: &Path, locus: &str) -> Result<AlleleCollection> {
    let locus = canonical_locus(locus)?;
    let reader = open_catalog_reader(path)?;
    let collection = read_collection(reader, &locus)?;
    log::info!(
        "Loaded {} {} alleles ({} complete) from {}",
        collection.len(),
        collection.locus(),
        collection.complete().count(),
        path.display()
    );
    Ok(collection)
}

pub fn read_collection<R: BufRead>(reader: R, locus: &str) -> Result<AlleleCollection> {
    let locus = canonical_locus(locus)?;
    let mut records = Vec::new();
    for (line_number, result_line) in reader.lines().enumerate() {
        let catalog_error = |message: String| Error::Catalog {
            line: line_number + 1,
            message,
        };
        let line = result_line.map_err(|e| catalog_error(e.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = parse_record(line).map_err(catalog_error)?;
        if record.locus().as_deref() == Some(locus.as_str()) {
            records.push(record);
        }
    }
    AlleleCollection::new(&locus, records)
}

/// Decodes one `name sequence info` catalog line.
pub fn parse_record(line: &str) -> std::result::Result<AlleleRecord, String> {
    const EXPECTED_FIELD_COUNT: usize = 3;
    let split_line: Vec<&str> = line.split_whitespace().collect();
    let (name, sequence, info_fields) = match &split_line[..] {
        [name, sequence, info_fields] => (*name, *sequence, *info_fields),
        _ => {
            return Err(format!(
                "Expected {} fields in the format 'name sequence info', found {}",
                EXPECTED_FIELD_COUNT,
                split_line.len()
            ))
        }
    };
    if locus_of(name).is_none() {
        return Err(format!("Allele name without a recognized locus: '{}'", name));
    }

    let fields = decode_fields(info_fields)?;
    let get_field = |key: &str| {
        fields
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| format!("{} field missing", key))
    };

    let features = get_field("FEATURES")?
        .split(',')
        .enumerate()
        .map(|(index, encoding)| decode_feature(encoding, index + 1))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let cwd_status = match fields.get("CWD") {
        Some(value) => value.parse()?,
        None => CwdStatus::Unknown,
    };
    let metadata = AlleleMetadata {
        id: get_field("ID")?.to_string(),
        g_group: fields.get("G").cloned(),
        p_group: fields.get("P").cloned(),
        cwd_status,
        ethnicities: decode_set(fields.get("ETHNICITY")),
        sample_names: decode_set(fields.get("SAMPLES")),
    };

    AlleleRecord::new(name, sequence, features, metadata).map_err(|e| e.to_string())
}

fn decode_feature(encoding: &str, order: usize) -> std::result::Result<Feature, String> {
    let error_message = || {
        format!(
            "Feature must be in 'name:kind:start-end[:status[:frame]]' format: '{}'",
            encoding
        )
    };
    let parts: Vec<&str> = encoding.split(':').collect();
    if parts.len() < 3 || parts.len() > 5 || parts[0].is_empty() {
        return Err(error_message());
    }

    let kind: FeatureKind = parts[1].parse()?;
    let (start, end) = parts[2].split_once('-').ok_or_else(error_message)?;
    let start = start.parse::<usize>().map_err(|_| error_message())?;
    let end = end.parse::<usize>().map_err(|_| error_message())?;

    let status = match parts.get(3) {
        Some(status) => status.parse::<FeatureStatus>()?,
        None => FeatureStatus::Unknown,
    };
    let frame = match parts.get(4) {
        Some(frame) => Some(
            frame
                .parse::<u8>()
                .map_err(|_| format!("Invalid reading frame: '{}'", frame))?,
        ),
        None => None,
    };

    Ok(Feature::new(parts[0], kind, order, start, end)
        .with_status(status)
        .with_frame(frame))
}

fn decode_set(value: Option<&String>) -> BTreeSet<String> {
    value
        .map(|v| {
            v.split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn decode_fields(info_fields: &str) -> std::result::Result<HashMap<&str, String>, String> {
    let mut fields = HashMap::new();
    for field_encoding in info_fields.split(';') {
        let (name, value) = decode_info_field(field_encoding)?;
        if fields.insert(name, value.to_string()).is_some() {
            return Err(format!("Duplicate field name: '{}'", name));
        }
    }
    Ok(fields)
}

fn decode_info_field(encoding: &str) -> std::result::Result<(&str, &str), String> {
    match encoding.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => Ok((name, value)),
        _ => Err(format!("Field must be in 'name=value' format: '{}'", encoding)),
    }
}
