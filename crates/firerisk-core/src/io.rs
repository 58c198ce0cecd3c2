//! Flat-file CSV input and output.
//!
//! Readers take any `io::Read` so tests can feed in-memory text; the
//! `*_csv` wrappers open files. Feature cells that are empty, `NaN`, `nan`
//! or `NA` parse as NaN. Any other non-numeric text is fatal.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::records::{
    FireDetection, ForecastOutput, FusedTable, MeteoObservation, MeteoRow, MeteoTable,
};
use crate::schema::FeatureSchema;

const MISSING_TOKENS: [&str; 4] = ["", "NaN", "nan", "NA"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// ── Field parsing ────────────────────────────────────────────────────────────

/// Parse a numeric cell; missing tokens become NaN.
pub fn parse_value(raw: &str, line: u64, column: &str) -> Result<f64> {
    let s = raw.trim();
    if MISSING_TOKENS.contains(&s) {
        return Ok(f64::NAN);
    }
    s.parse::<f64>().map_err(|_| PipelineError::ParseField {
        line,
        column: column.to_string(),
        value: s.to_string(),
    })
}

/// Parse a date or timestamp. Accepts `YYYY-MM-DD` and ISO-like datetimes
/// with a space or `T` separator, optional fractional seconds and an
/// optional trailing `Z`. Date-only values land at midnight.
pub fn parse_datetime(raw: &str, line: u64) -> Result<NaiveDateTime> {
    let s = raw.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::default()));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| PipelineError::InvalidDate { line, value: raw.to_string() })
}

fn column(headers: &StringRecord, name: &str, file: &str) -> Result<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| PipelineError::MissingColumn {
        file: file.to_string(),
        column: name.to_string(),
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

// ── Readers ──────────────────────────────────────────────────────────────────

/// Read fire detections. Requires `latitude, longitude, acq_date, frp`;
/// other columns are ignored.
pub fn read_fire<R: Read>(reader: R, file: &str) -> Result<Vec<FireDetection>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let lat_i = column(&headers, "latitude", file)?;
    let lon_i = column(&headers, "longitude", file)?;
    let date_i = column(&headers, "acq_date", file)?;
    let frp_i = column(&headers, "frp", file)?;

    let mut out = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let line = line_of(&rec);
        out.push(FireDetection {
            latitude: parse_value(field(&rec, lat_i), line, "latitude")?,
            longitude: parse_value(field(&rec, lon_i), line, "longitude")?,
            acq_date: parse_datetime(field(&rec, date_i), line)?.date(),
            frp: parse_value(field(&rec, frp_i), line, "frp")?,
        });
    }
    debug!(file, rows = out.len(), "read fire detections");
    Ok(out)
}

/// Read a meteorological table. Requires `latitude, longitude, time` and
/// every feature named by `schema`.
pub fn read_meteo<R: Read>(reader: R, file: &str, schema: &FeatureSchema) -> Result<MeteoTable> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let lat_i = column(&headers, "latitude", file)?;
    let lon_i = column(&headers, "longitude", file)?;
    let time_i = column(&headers, "time", file)?;
    let feat_i = schema.locate(&headers, file)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let line = line_of(&rec);
        let features = feat_i
            .iter()
            .zip(schema.names())
            .map(|(&i, name)| parse_value(field(&rec, i), line, name))
            .collect::<Result<Vec<f64>>>()?;
        let observation = MeteoObservation {
            latitude: parse_value(field(&rec, lat_i), line, "latitude")?,
            longitude: parse_value(field(&rec, lon_i), line, "longitude")?,
            time: parse_datetime(field(&rec, time_i), line)?,
            features,
        };
        rows.push(MeteoRow { observation, raw: rec.iter().map(str::to_string).collect() });
    }
    debug!(file, rows = rows.len(), "read meteo observations");
    Ok(MeteoTable {
        headers: headers.iter().map(str::to_string).collect(),
        time_col: time_i,
        schema: schema.clone(),
        rows,
    })
}

pub fn read_fire_csv(path: &Path) -> Result<Vec<FireDetection>> {
    read_fire(File::open(path)?, &path.display().to_string())
}

pub fn read_meteo_csv(path: &Path, schema: &FeatureSchema) -> Result<MeteoTable> {
    read_meteo(File::open(path)?, &path.display().to_string(), schema)
}

// ── Writers ──────────────────────────────────────────────────────────────────

fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

/// Write the fused table as `date, cell_id, frp_max, fire_class, <features…>`.
pub fn write_fused<W: Write>(writer: W, table: &FusedTable) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let mut header = vec!["date".to_string(), "cell_id".into(), "frp_max".into(), "fire_class".into()];
    header.extend(table.schema.names().iter().cloned());
    wtr.write_record(&header)?;

    for r in &table.records {
        let mut row = vec![
            r.date.format("%Y-%m-%d").to_string(),
            r.cell_id.clone(),
            format_value(r.frp_max),
            u8::from(r.fire_class).to_string(),
        ];
        row.extend(r.features.iter().map(|&v| format_value(v)));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every forecast column verbatim plus a trailing `fire_prediction`
/// column, left empty for rows without a prediction.
pub fn write_predictions<W: Write>(writer: W, output: &ForecastOutput) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let mut header = output.headers.clone();
    header.push("fire_prediction".to_string());
    wtr.write_record(&header)?;

    for r in &output.records {
        let mut row = r.row.raw.clone();
        row.push(r.fire_prediction.map(|c| u8::from(c).to_string()).unwrap_or_default());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_fused_csv(path: &Path, table: &FusedTable) -> Result<()> {
    write_fused(File::create(path)?, table)
}

pub fn write_predictions_csv(path: &Path, output: &ForecastOutput) -> Result<()> {
    write_predictions(File::create(path)?, output)
}
